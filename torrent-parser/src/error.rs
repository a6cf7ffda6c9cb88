use std::{num::ParseIntError, string::FromUtf8Error};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TorrentParserError {
    #[error("Invalid Structure: {0}")]
    InvalidStructure(String),

    #[error("Parse Int Error: {0}")]
    ParseIntError(#[from] ParseIntError),

    #[error("Unknown Specifier: {0:#04x}")]
    UnknownSpecifier(u8),

    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),

    #[error("Cannot Read File: {0}")]
    CannotReadFile(#[from] std::io::Error),

    #[error("Malformed Container: {0}")]
    MalformedContainer(String),

    #[error("Missing Info Section: {0}")]
    MissingInfoSection(String),

    #[error("Malformed Info Field `{field}`: {reason}")]
    MalformedInfoFields { field: &'static str, reason: String },
}
