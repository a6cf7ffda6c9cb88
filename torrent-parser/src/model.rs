use std::slice::ChunksExact;

use crate::info_hash::{InfoHash, INFO_HASH_LEN};

/// Typed view of the info dictionary of a single-file torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoDescriptor {
    pub name: String,
    pub piece_length: u64,
    /// Concatenated 20-byte SHA-1 digests, one per piece.
    pub pieces: Vec<u8>,
    pub length: u64,
}

impl InfoDescriptor {
    pub fn piece_hashes(&self) -> ChunksExact<'_, u8> {
        self.pieces.chunks_exact(INFO_HASH_LEN)
    }

    pub fn piece_count(&self) -> usize {
        self.pieces.len() / INFO_HASH_LEN
    }
}

/// A parsed `.torrent` file.
///
/// The info hash is computed from [`Metainfo::info_bytes`], the canonical
/// re-encoding of the info dictionary, so the two always agree. There are no
/// setters; the value is fixed once the parser returns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metainfo {
    announce: String,
    info: InfoDescriptor,
    info_bytes: Vec<u8>,
    info_hash: InfoHash,
}

impl Metainfo {
    pub(crate) fn new(
        announce: String,
        info: InfoDescriptor,
        info_bytes: Vec<u8>,
        info_hash: InfoHash,
    ) -> Self {
        Metainfo {
            announce,
            info,
            info_bytes,
            info_hash,
        }
    }

    /// Tracker URL, empty when the file has none.
    pub fn announce(&self) -> &str {
        &self.announce
    }

    pub fn info(&self) -> &InfoDescriptor {
        &self.info
    }

    pub fn info_bytes(&self) -> &[u8] {
        &self.info_bytes
    }

    pub fn info_hash(&self) -> &InfoHash {
        &self.info_hash
    }

    pub fn total_length(&self) -> u64 {
        self.info.length
    }
}
