//! Little-endian binary codec for tag documents.
//!
//! Layout (all integers little-endian):
//!
//! | Field      | Encoding                                            |
//! |------------|-----------------------------------------------------|
//! | document   | root type id (u8) + root payload                    |
//! | string     | length (u16) + UTF-8 bytes                          |
//! | list       | element type id (u8) + count (u32) + payloads       |
//! | compound   | entry count (u32) + entries (name, type id, payload)|
//! | byte array | count (u32) + bytes                                 |
//! | int array  | count (u32) + i32 values                            |
//! | long array | count (u32) + i64 values                            |
//!
//! An empty list stores element type id 0. Nesting depth is capped so a
//! malicious document cannot blow the stack.

use crate::{Compound, Tag};

/// Maximum tag nesting depth accepted by the decoder.
const MAX_DEPTH: u32 = 512;

/// Errors produced while decoding a tag document.
#[derive(Debug, thiserror::Error)]
pub enum TagError {
    /// The input ended before the declared data.
    #[error("truncated document: needed {expected} more bytes, had {actual}")]
    Truncated { expected: usize, actual: usize },
    /// An unknown tag type id was encountered.
    #[error("unknown tag type id: {0}")]
    UnknownTagId(u8),
    /// Nesting exceeded the decoder's depth cap.
    #[error("tag nesting exceeds maximum depth of {MAX_DEPTH}")]
    DepthLimit,
    /// A string was not valid UTF-8.
    #[error("invalid UTF-8 in string tag")]
    InvalidUtf8,
    /// Bytes remained after the root tag was fully decoded.
    #[error("trailing bytes after document: {remaining}")]
    TrailingBytes { remaining: usize },
}

/// Serializes a tag document to bytes.
pub fn to_bytes(tag: &Tag) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(tag.id());
    write_payload(tag, &mut out);
    out
}

/// Deserializes a tag document from bytes, rejecting trailing garbage.
pub fn from_bytes(bytes: &[u8]) -> Result<Tag, TagError> {
    let mut cursor = Cursor { bytes, at: 0 };
    let id = cursor.u8()?;
    let tag = read_payload(id, &mut cursor, 0)?;
    if cursor.at != bytes.len() {
        return Err(TagError::TrailingBytes {
            remaining: bytes.len() - cursor.at,
        });
    }
    Ok(tag)
}

fn write_payload(tag: &Tag, out: &mut Vec<u8>) {
    match tag {
        Tag::Byte(v) => out.push(*v as u8),
        Tag::Short(v) => out.extend_from_slice(&v.to_le_bytes()),
        Tag::Int(v) => out.extend_from_slice(&v.to_le_bytes()),
        Tag::Long(v) => out.extend_from_slice(&v.to_le_bytes()),
        Tag::Float(v) => out.extend_from_slice(&v.to_le_bytes()),
        Tag::Double(v) => out.extend_from_slice(&v.to_le_bytes()),
        Tag::ByteArray(v) => {
            out.extend_from_slice(&(v.len() as u32).to_le_bytes());
            out.extend_from_slice(v);
        }
        Tag::Str(v) => write_string(v, out),
        Tag::List(items) => {
            let elem_id = items.first().map_or(0, Tag::id);
            out.push(elem_id);
            out.extend_from_slice(&(items.len() as u32).to_le_bytes());
            for item in items {
                debug_assert_eq!(item.id(), elem_id, "heterogeneous list");
                write_payload(item, out);
            }
        }
        Tag::Compound(entries) => {
            out.extend_from_slice(&(entries.len() as u32).to_le_bytes());
            for (name, value) in entries {
                write_string(name, out);
                out.push(value.id());
                write_payload(value, out);
            }
        }
        Tag::IntArray(v) => {
            out.extend_from_slice(&(v.len() as u32).to_le_bytes());
            for value in v {
                out.extend_from_slice(&value.to_le_bytes());
            }
        }
        Tag::LongArray(v) => {
            out.extend_from_slice(&(v.len() as u32).to_le_bytes());
            for value in v {
                out.extend_from_slice(&value.to_le_bytes());
            }
        }
    }
}

fn write_string(s: &str, out: &mut Vec<u8>) {
    debug_assert!(s.len() <= u16::MAX as usize, "string too long for wire");
    out.extend_from_slice(&(s.len() as u16).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}

struct Cursor<'a> {
    bytes: &'a [u8],
    at: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], TagError> {
        let remaining = self.bytes.len() - self.at;
        if remaining < n {
            return Err(TagError::Truncated {
                expected: n,
                actual: remaining,
            });
        }
        let slice = &self.bytes[self.at..self.at + n];
        self.at += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, TagError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, TagError> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    fn u32(&mut self) -> Result<u32, TagError> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn string(&mut self) -> Result<String, TagError> {
        let len = self.u16()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| TagError::InvalidUtf8)
    }
}

fn read_payload(id: u8, cursor: &mut Cursor<'_>, depth: u32) -> Result<Tag, TagError> {
    if depth > MAX_DEPTH {
        return Err(TagError::DepthLimit);
    }
    Ok(match id {
        1 => Tag::Byte(cursor.u8()? as i8),
        2 => Tag::Short(i16::from_le_bytes(cursor.take(2)?.try_into().unwrap())),
        3 => Tag::Int(i32::from_le_bytes(cursor.take(4)?.try_into().unwrap())),
        4 => Tag::Long(i64::from_le_bytes(cursor.take(8)?.try_into().unwrap())),
        5 => Tag::Float(f32::from_le_bytes(cursor.take(4)?.try_into().unwrap())),
        6 => Tag::Double(f64::from_le_bytes(cursor.take(8)?.try_into().unwrap())),
        7 => {
            let len = cursor.u32()? as usize;
            Tag::ByteArray(cursor.take(len)?.to_vec())
        }
        8 => Tag::Str(cursor.string()?),
        9 => {
            let elem_id = cursor.u8()?;
            let count = cursor.u32()? as usize;
            if count > 0 && !(1..=12).contains(&elem_id) {
                return Err(TagError::UnknownTagId(elem_id));
            }
            let mut items = Vec::with_capacity(count.min(1 << 16));
            for _ in 0..count {
                items.push(read_payload(elem_id, cursor, depth + 1)?);
            }
            Tag::List(items)
        }
        10 => {
            let count = cursor.u32()? as usize;
            let mut entries = Compound::new();
            for _ in 0..count {
                let name = cursor.string()?;
                let entry_id = cursor.u8()?;
                let value = read_payload(entry_id, cursor, depth + 1)?;
                entries.insert(name, value);
            }
            Tag::Compound(entries)
        }
        11 => {
            let count = cursor.u32()? as usize;
            let mut values = Vec::with_capacity(count.min(1 << 16));
            for _ in 0..count {
                values.push(i32::from_le_bytes(cursor.take(4)?.try_into().unwrap()));
            }
            Tag::IntArray(values)
        }
        12 => {
            let count = cursor.u32()? as usize;
            let mut values = Vec::with_capacity(count.min(1 << 16));
            for _ in 0..count {
                values.push(i64::from_le_bytes(cursor.take(8)?.try_into().unwrap()));
            }
            Tag::LongArray(values)
        }
        other => return Err(TagError::UnknownTagId(other)),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
