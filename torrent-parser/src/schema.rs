//! Key table and strict validation for the info dictionary.

use std::collections::BTreeMap;

use bstr::ByteSlice;

use crate::{error::TorrentParserError, field::Field, model::InfoDescriptor};

pub(crate) const NAME: &str = "name";
pub(crate) const PIECE_LENGTH: &str = "piece length";
pub(crate) const PIECES: &str = "pieces";
pub(crate) const LENGTH: &str = "length";

type Dict = BTreeMap<Vec<u8>, Field>;

impl InfoDescriptor {
    /// Validates a decoded info dictionary into its typed form.
    ///
    /// Keys outside the table are ignored here; they still take part in the
    /// info hash because hashing happens on the whole dictionary.
    pub fn from_field(field: &Field) -> Result<Self, TorrentParserError> {
        let dict = match field {
            Field::Dict(dict) => dict,
            other => {
                return Err(TorrentParserError::MissingInfoSection(format!(
                    "expected Dict, found {}",
                    other.field_type()
                )))
            }
        };

        let name = required_bytes(dict, NAME)?;
        let name = name.to_str().map_err(|_| malformed(NAME, "invalid UTF-8"))?;

        let piece_length = required_integer(dict, PIECE_LENGTH)?;
        if piece_length <= 0 {
            return Err(malformed(PIECE_LENGTH, format!("must be positive, got {}", piece_length)));
        }

        let pieces = required_bytes(dict, PIECES)?;

        let length = required_integer(dict, LENGTH)?;
        if length < 0 {
            return Err(malformed(LENGTH, format!("must not be negative, got {}", length)));
        }

        Ok(InfoDescriptor {
            name: name.to_string(),
            piece_length: piece_length as u64,
            pieces: pieces.to_vec(),
            length: length as u64,
        })
    }

    /// Builds the info dictionary holding exactly the fields of this descriptor.
    pub fn to_field(&self) -> Field {
        let mut dict = Dict::new();
        dict.insert(NAME.into(), Field::String(self.name.clone().into_bytes()));
        dict.insert(PIECE_LENGTH.into(), Field::Integer(self.piece_length as i64));
        dict.insert(PIECES.into(), Field::String(self.pieces.clone()));
        dict.insert(LENGTH.into(), Field::Integer(self.length as i64));
        Field::Dict(dict)
    }
}

fn required_bytes<'a>(dict: &'a Dict, key: &'static str) -> Result<&'a [u8], TorrentParserError> {
    match dict.get(key.as_bytes()) {
        Some(Field::String(bytes)) => Ok(bytes),
        Some(other) => Err(malformed(
            key,
            format!("expected String, found {}", other.field_type()),
        )),
        None => Err(malformed(key, "missing")),
    }
}

fn required_integer(dict: &Dict, key: &'static str) -> Result<i64, TorrentParserError> {
    match dict.get(key.as_bytes()) {
        Some(Field::Integer(value)) => Ok(*value),
        Some(other) => Err(malformed(
            key,
            format!("expected Integer, found {}", other.field_type()),
        )),
        None => Err(malformed(key, "missing")),
    }
}

fn malformed(field: &'static str, reason: impl Into<String>) -> TorrentParserError {
    TorrentParserError::MalformedInfoFields {
        field,
        reason: reason.into(),
    }
}
