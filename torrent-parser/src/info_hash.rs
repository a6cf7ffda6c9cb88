use std::fmt;

use sha1::{Digest, Sha1};

pub const INFO_HASH_LEN: usize = 20;

/// SHA-1 digest of a canonical bencoded info dictionary.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InfoHash([u8; INFO_HASH_LEN]);

impl InfoHash {
    pub fn from_bytes(bytes: [u8; INFO_HASH_LEN]) -> Self {
        InfoHash(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; INFO_HASH_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InfoHash({})", self.to_hex())
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

pub fn compute_info_hash(bencoded_info: &[u8]) -> InfoHash {
    let mut hasher = Sha1::new();
    hasher.update(bencoded_info);
    InfoHash(hasher.finalize().into())
}
