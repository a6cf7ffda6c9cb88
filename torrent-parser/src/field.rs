use std::{collections::BTreeMap, fmt, iter::Peekable, vec::IntoIter};

use bstr::BStr;

use crate::error::TorrentParserError;

/// Deepest list/dict nesting the decoder will follow.
const MAX_DEPTH: usize = 64;

/// A decoded bencode value.
///
/// Dictionary keys are kept as raw bytes in a `BTreeMap`, so iterating a
/// `Dict` always yields keys in the lexicographic byte order that canonical
/// bencode requires.
#[derive(Clone, PartialEq, Eq)]
pub enum Field {
    String(Vec<u8>),
    Integer(i64),
    List(Vec<Field>),
    Dict(BTreeMap<Vec<u8>, Field>),
}

impl Field {
    pub fn field_type(&self) -> String {
        match self {
            Field::String(_) => "String".to_string(),
            Field::Integer(_) => "Integer".to_string(),
            Field::List(_) => "List".to_string(),
            Field::Dict(_) => "Dict".to_string(),
        }
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::String(bytes) => write!(f, "{:?}", BStr::new(bytes)),
            Field::Integer(value) => write!(f, "{}", value),
            Field::List(list) => f.debug_list().entries(list).finish(),
            Field::Dict(dict) => f
                .debug_map()
                .entries(dict.iter().map(|(key, value)| (BStr::new(key), value)))
                .finish(),
        }
    }
}

/// Decodes a single bencoded value from the front of `bencoded`.
///
/// Bytes following the first complete value are ignored.
pub fn decode_field(bencoded: Vec<u8>) -> Result<Field, TorrentParserError> {
    let mut buffer = bencoded.into_iter().peekable();
    get_field_type(&mut buffer, 0)?.ok_or(TorrentParserError::InvalidStructure(
        "Expected field".to_string(),
    ))
}

pub(crate) fn get_field_type(
    buffer: &mut Peekable<IntoIter<u8>>,
    depth: usize,
) -> Result<Option<Field>, TorrentParserError> {
    if depth > MAX_DEPTH {
        return Err(TorrentParserError::InvalidStructure(
            "nesting too deep".to_string(),
        ));
    }

    let specifier = buffer.next();

    match specifier {
        None => Ok(None),
        Some(c) => {
            if c.is_ascii_digit() {
                // get until the colon
                let mut length = Vec::new();
                length.push(c);
                loop {
                    match buffer.next() {
                        Some(c) => {
                            if c.is_ascii_digit() {
                                length.push(c);
                            } else if c == b':' {
                                break;
                            } else {
                                return Err(TorrentParserError::InvalidStructure(
                                    "Expected colon for string".to_string(),
                                ));
                            }
                        }
                        None => {
                            return Err(TorrentParserError::InvalidStructure(
                                "Unexpected end for string length".to_string(),
                            ))
                        }
                    }
                }
                let length = String::from_utf8(length)?;
                let length = length.parse::<usize>()?;
                let mut field = Vec::new();
                for i in 0..length {
                    match buffer.next() {
                        Some(c) => field.push(c),
                        None => {
                            return Err(TorrentParserError::InvalidStructure(format!(
                                "Unexpected end for string, expected length {}, ending at {}",
                                length, i
                            )))
                        }
                    }
                }
                Ok(Some(Field::String(field)))
            } else if c == b'i' {
                // get until the e
                let mut field = Vec::new();
                loop {
                    match buffer.next() {
                        Some(c) => {
                            if c == b'e' {
                                break;
                            } else {
                                field.push(c);
                            }
                        }
                        None => {
                            return Err(TorrentParserError::InvalidStructure(
                                "Unexpected end for integer".to_string(),
                            ))
                        }
                    }
                }
                // i64 parsing would take a leading '+'
                if field.first() == Some(&b'+') {
                    return Err(TorrentParserError::InvalidStructure(
                        "Unexpected sign for integer".to_string(),
                    ));
                }
                let field = String::from_utf8(field)?;
                let field = field.parse::<i64>()?;
                Ok(Some(Field::Integer(field)))
            } else if c == b'l' {
                let mut list = Vec::new();
                loop {
                    let peek_next = buffer.peek().ok_or(TorrentParserError::InvalidStructure(
                        "Unexpected end for list".to_string(),
                    ))?;
                    if *peek_next == b'e' {
                        buffer.next();
                        break;
                    }
                    match get_field_type(buffer, depth + 1)? {
                        Some(field) => list.push(field),
                        None => {
                            return Err(TorrentParserError::InvalidStructure(
                                "Unexpected end for list".to_string(),
                            ))
                        }
                    }
                }
                Ok(Some(Field::List(list)))
            } else if c == b'd' {
                let mut dict = BTreeMap::new();
                loop {
                    let peek_next = buffer.peek().ok_or(TorrentParserError::InvalidStructure(
                        "Unexpected end for dict".to_string(),
                    ))?;
                    if *peek_next == b'e' {
                        buffer.next();
                        break;
                    }
                    match get_field_type(buffer, depth + 1)? {
                        Some(field) => {
                            let key = match field {
                                Field::String(key) => key,
                                other => {
                                    return Err(TorrentParserError::InvalidStructure(format!(
                                        "Expected String for dictionary key, found {}",
                                        other.field_type()
                                    )));
                                }
                            };
                            match get_field_type(buffer, depth + 1)? {
                                Some(value) => {
                                    dict.insert(key, value);
                                }
                                None => {
                                    return Err(TorrentParserError::InvalidStructure(
                                        "Expected value for dictionary".to_string(),
                                    ))
                                }
                            }
                        }
                        None => break,
                    }
                }
                Ok(Some(Field::Dict(dict)))
            } else {
                Err(TorrentParserError::UnknownSpecifier(c))
            }
        }
    }
}

/// Encodes `field` in canonical bencode form.
///
/// Dictionaries are written in lexicographic key order, which is what makes
/// the output of decode-then-encode stable across differently ordered input.
pub fn encode_field(field: &Field) -> Vec<u8> {
    let mut out = Vec::new();
    write_field(field, &mut out);
    out
}

fn write_field(field: &Field, out: &mut Vec<u8>) {
    match field {
        Field::String(bytes) => write_string(bytes, out),
        Field::Integer(value) => {
            out.push(b'i');
            out.extend_from_slice(value.to_string().as_bytes());
            out.push(b'e');
        }
        Field::List(list) => {
            out.push(b'l');
            for item in list {
                write_field(item, out);
            }
            out.push(b'e');
        }
        Field::Dict(dict) => {
            out.push(b'd');
            for (key, value) in dict {
                write_string(key, out);
                write_field(value, out);
            }
            out.push(b'e');
        }
    }
}

fn write_string(bytes: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(bytes.len().to_string().as_bytes());
    out.push(b':');
    out.extend_from_slice(bytes);
}
