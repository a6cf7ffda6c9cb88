//! Tracker announce client.
//!
//! Given a parsed [`Metainfo`](torrent_parser::model::Metainfo) and a
//! [`ClientIdentity`], [`TrackerClient`] picks the transport from the
//! announce URL scheme (`udp://` or HTTP) and returns the tracker's raw
//! response bytes. Decoding that response is left to the caller.

pub mod config;
pub mod error;
mod http;
pub mod peer;
pub mod random;
pub mod request;
pub mod tracker;
mod udp;

pub use config::TrackerConfig;
pub use error::{AnnounceError, AnnouncePhase, AnnounceResult};
pub use peer::{ClientIdentity, PeerId};
pub use random::{ThreadRngSource, TransactionIdSource};
pub use request::{AnnounceEvent, AnnounceRequest};
pub use tracker::{TrackerClient, Transport};
