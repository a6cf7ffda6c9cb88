use std::fmt;

use thiserror::Error;
use torrent_parser::error::TorrentParserError;

/// The step of an announce that was running when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnouncePhase {
    Resolve,
    Bind,
    UdpConnect,
    UdpAnnounce,
    HttpRequest,
    HttpBody,
}

impl fmt::Display for AnnouncePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            AnnouncePhase::Resolve => "address resolution",
            AnnouncePhase::Bind => "socket bind",
            AnnouncePhase::UdpConnect => "udp connect",
            AnnouncePhase::UdpAnnounce => "udp announce",
            AnnouncePhase::HttpRequest => "http request",
            AnnouncePhase::HttpBody => "http body read",
        };
        f.write_str(phase)
    }
}

#[derive(Error, Debug)]
pub enum AnnounceError {
    #[error("Torrent Parser Error: {0}")]
    Parse(#[from] TorrentParserError),

    #[error("Invalid Announce URL {url:?}: {reason}")]
    InvalidAnnounceUrl { url: String, reason: String },

    #[error("Invalid Peer ID: expected 20 bytes, got {0}")]
    InvalidPeerId(usize),

    #[error("UDP Handshake Failed: {0}")]
    UdpHandshakeFailed(String),

    #[error("UDP Timeout during {0}")]
    UdpTimeout(AnnouncePhase),

    #[error("Truncated Announce Response: {0} bytes")]
    TruncatedAnnounceResponse(usize),

    #[error("Tracker Rejected Announce: {0}")]
    TrackerRejected(String),

    #[error("Transport IO Error during {phase}: {source}")]
    TransportIo {
        phase: AnnouncePhase,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP Client Error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl AnnounceError {
    pub(crate) fn io(phase: AnnouncePhase, source: std::io::Error) -> Self {
        AnnounceError::TransportIo { phase, source }
    }

    pub(crate) fn invalid_url(url: &str, reason: impl Into<String>) -> Self {
        AnnounceError::InvalidAnnounceUrl {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

pub type AnnounceResult<T> = Result<T, AnnounceError>;
