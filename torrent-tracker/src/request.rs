use torrent_parser::{model::Metainfo, InfoHash};

use crate::peer::{ClientIdentity, PeerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnounceEvent {
    None,
    Completed,
    Started,
    Stopped,
}

impl AnnounceEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnounceEvent::None => "",
            AnnounceEvent::Completed => "completed",
            AnnounceEvent::Started => "started",
            AnnounceEvent::Stopped => "stopped",
        }
    }

    pub fn as_udp_id(&self) -> u32 {
        match self {
            AnnounceEvent::None => 0,
            AnnounceEvent::Completed => 1,
            AnnounceEvent::Started => 2,
            AnnounceEvent::Stopped => 3,
        }
    }
}

/// Everything a tracker is told in one announce, independent of transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnounceRequest {
    pub info_hash: InfoHash,
    pub peer_id: PeerId,
    pub port: u16,
    pub uploaded: u64,
    pub downloaded: u64,
    pub left: u64,
    pub event: AnnounceEvent,
}

impl AnnounceRequest {
    /// First announce of a fresh download: nothing transferred yet, the
    /// whole payload left.
    pub fn started(metainfo: &Metainfo, identity: &ClientIdentity) -> Self {
        AnnounceRequest {
            info_hash: *metainfo.info_hash(),
            peer_id: identity.peer_id,
            port: identity.listen_port,
            uploaded: 0,
            downloaded: 0,
            left: metainfo.total_length(),
            event: AnnounceEvent::Started,
        }
    }

    pub fn with_event(mut self, event: AnnounceEvent) -> Self {
        self.event = event;
        self
    }
}
