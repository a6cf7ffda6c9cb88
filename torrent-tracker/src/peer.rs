use std::fmt;

use rand::{distr::Alphanumeric, Rng};

use crate::error::{AnnounceError, AnnounceResult};

pub const PEER_ID_LEN: usize = 20;

/// The 20-byte id a client presents to trackers and peers.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerId([u8; PEER_ID_LEN]);

impl PeerId {
    /// Builds an Azureus-style id: `-` + client specifier + version + `-`,
    /// followed by 12 random alphanumeric characters.
    pub fn generate<R: Rng>(specifier: &[u8; 2], version: &[u8; 4], rng: &mut R) -> Self {
        let mut id = [0u8; PEER_ID_LEN];
        id[0] = b'-';
        id[1..3].copy_from_slice(specifier);
        id[3..7].copy_from_slice(version);
        id[7] = b'-';
        for byte in &mut id[8..] {
            *byte = rng.sample(Alphanumeric);
        }
        PeerId(id)
    }

    pub fn from_bytes(bytes: &[u8]) -> AnnounceResult<Self> {
        let id = bytes
            .try_into()
            .map_err(|_| AnnounceError::InvalidPeerId(bytes.len()))?;
        Ok(PeerId(id))
    }

    pub fn as_bytes(&self) -> &[u8; PEER_ID_LEN] {
        &self.0
    }
}

impl TryFrom<&str> for PeerId {
    type Error = AnnounceError;

    fn try_from(value: &str) -> AnnounceResult<Self> {
        PeerId::from_bytes(value.as_bytes())
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({:?})", String::from_utf8_lossy(&self.0))
    }
}

/// Who we are, as far as a tracker is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIdentity {
    pub peer_id: PeerId,
    pub listen_port: u16,
}

impl ClientIdentity {
    pub fn new(peer_id: PeerId, listen_port: u16) -> Self {
        ClientIdentity {
            peer_id,
            listen_port,
        }
    }
}
