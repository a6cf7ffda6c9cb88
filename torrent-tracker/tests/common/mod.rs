#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use torrent_parser::{model::Metainfo, parse_torrent_metadata};
use torrent_tracker::{ClientIdentity, PeerId, TransactionIdSource};

pub const PEER_ID: &[u8; 20] = b"-RT0001-abcdefghijkl";
pub const TOTAL_LENGTH: u64 = 1024;

/// Hands out a fixed sequence of transaction ids.
pub struct FixedIds(Mutex<Vec<u32>>);

impl FixedIds {
    pub fn new(ids: &[u32]) -> Arc<Self> {
        let mut ids = ids.to_vec();
        ids.reverse();
        Arc::new(FixedIds(Mutex::new(ids)))
    }
}

impl TransactionIdSource for FixedIds {
    fn next_transaction_id(&self) -> u32 {
        self.0
            .lock()
            .unwrap()
            .pop()
            .expect("no transaction ids left")
    }
}

pub fn metainfo(announce: &str) -> Metainfo {
    let bencoded = format!(
        "d8:announce{}:{}4:infod6:lengthi{}e4:name8:test.bin12:piece lengthi16384e6:pieces20:aaaaaaaaaaaaaaaaaaaaee",
        announce.len(),
        announce,
        TOTAL_LENGTH,
    );
    parse_torrent_metadata(bencoded.into_bytes()).unwrap()
}

pub fn identity() -> ClientIdentity {
    ClientIdentity::new(PeerId::from_bytes(PEER_ID).unwrap(), 6881)
}
