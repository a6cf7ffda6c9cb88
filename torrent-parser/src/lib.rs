use std::path::Path;

use error::TorrentParserError;
use field::{decode_field, encode_field, Field};
use info_hash::compute_info_hash;
use model::{InfoDescriptor, Metainfo};

pub mod error;
pub mod field;
pub mod info_hash;
pub mod model;
mod schema;

pub use info_hash::InfoHash;

pub fn parse_torrent_metadata(bencoded: Vec<u8>) -> Result<Metainfo, TorrentParserError> {
    let parsed_structure =
        decode_field(bencoded).map_err(|e| TorrentParserError::MalformedContainer(e.to_string()))?;

    // the root element should be a dictionary
    let mut dict = match parsed_structure {
        Field::Dict(dict) => dict,
        other => {
            return Err(TorrentParserError::MalformedContainer(format!(
                "expected Dict at top level, found {}",
                other.field_type()
            )))
        }
    };

    // announce is optional here, only tracker selection needs it
    let announce = match dict.get(b"announce".as_slice()) {
        Some(Field::String(announce)) => String::from_utf8_lossy(announce).into_owned(),
        _ => String::new(),
    };

    let info = match dict.remove(b"info".as_slice()) {
        Some(info @ Field::Dict(_)) => info,
        None => {
            return Err(TorrentParserError::MissingInfoSection(
                "no info key".to_string(),
            ))
        }
        Some(other) => {
            return Err(TorrentParserError::MissingInfoSection(format!(
                "expected Dict, found {}",
                other.field_type()
            )))
        }
    };

    // hash the canonical re-encoding, not the file slice
    let info_bytes = encode_field(&info);
    let info_hash = compute_info_hash(&info_bytes);

    let canonical = decode_field(info_bytes.clone())?;
    let info = InfoDescriptor::from_field(&canonical)?;

    Ok(Metainfo::new(announce, info, info_bytes, info_hash))
}

pub fn parse_torrent_file(file_path: impl AsRef<Path>) -> Result<Metainfo, TorrentParserError> {
    let bencoded = std::fs::read(file_path)?;
    parse_torrent_metadata(bencoded)
}
