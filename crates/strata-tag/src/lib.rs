//! Self-describing tag documents.
//!
//! A [`Tag`] is a dynamically typed tree of named values: the document model
//! used for structure files, block-entity payloads, and entity records.
//! Compounds use ordered maps so serialization is deterministic.

use std::collections::BTreeMap;

use glam::DVec3;
use strata_math::BlockPos;

pub mod container;
pub mod io;

pub use container::{ContainerError, open, seal};
pub use io::{TagError, from_bytes, to_bytes};

/// An ordered name → tag map.
pub type Compound = BTreeMap<String, Tag>;

/// A dynamically typed tag value.
#[derive(Clone, Debug, PartialEq)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<u8>),
    Str(String),
    List(Vec<Tag>),
    Compound(Compound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    /// The wire-format type id of this tag.
    pub fn id(&self) -> u8 {
        match self {
            Tag::Byte(_) => 1,
            Tag::Short(_) => 2,
            Tag::Int(_) => 3,
            Tag::Long(_) => 4,
            Tag::Float(_) => 5,
            Tag::Double(_) => 6,
            Tag::ByteArray(_) => 7,
            Tag::Str(_) => 8,
            Tag::List(_) => 9,
            Tag::Compound(_) => 10,
            Tag::IntArray(_) => 11,
            Tag::LongArray(_) => 12,
        }
    }

    pub fn as_byte(&self) -> Option<i8> {
        match self {
            Tag::Byte(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_short(&self) -> Option<i16> {
        match self {
            Tag::Short(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Tag::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Tag::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Any integer width, widened to `i64`. Readers use this where older
    /// writers stored a narrower type.
    pub fn as_int_any(&self) -> Option<i64> {
        match self {
            Tag::Byte(v) => Some(i64::from(*v)),
            Tag::Short(v) => Some(i64::from(*v)),
            Tag::Int(v) => Some(i64::from(*v)),
            Tag::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Tag::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Tag::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tag::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_byte_array(&self) -> Option<&[u8]> {
        match self {
            Tag::ByteArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Tag]> {
        match self {
            Tag::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Tag::Compound(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_compound_mut(&mut self) -> Option<&mut Compound> {
        match self {
            Tag::Compound(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_long_array(&self) -> Option<&[i64]> {
        match self {
            Tag::LongArray(v) => Some(v),
            _ => None,
        }
    }

    /// Looks up a child by name when this tag is a compound.
    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.as_compound().and_then(|c| c.get(name))
    }
}

/// Encodes a block position as an `{x, y, z}` compound.
pub fn block_pos_tag(pos: BlockPos) -> Tag {
    let mut c = Compound::new();
    c.insert("x".to_string(), Tag::Int(pos.x));
    c.insert("y".to_string(), Tag::Int(pos.y));
    c.insert("z".to_string(), Tag::Int(pos.z));
    Tag::Compound(c)
}

/// Reads a block position from an `{x, y, z}` compound.
pub fn read_block_pos(tag: &Tag) -> Option<BlockPos> {
    Some(BlockPos::new(
        tag.get("x")?.as_int()?,
        tag.get("y")?.as_int()?,
        tag.get("z")?.as_int()?,
    ))
}

/// Writes `x`, `y`, `z` int fields into a compound, replacing any present.
/// Used to stamp a block-entity payload with its home position.
pub fn embed_coords(tag: &mut Tag, pos: BlockPos) {
    if let Some(c) = tag.as_compound_mut() {
        c.insert("x".to_string(), Tag::Int(pos.x));
        c.insert("y".to_string(), Tag::Int(pos.y));
        c.insert("z".to_string(), Tag::Int(pos.z));
    }
}

/// Reads the embedded `x`, `y`, `z` fields of a payload compound.
pub fn read_coords(tag: &Tag) -> Option<BlockPos> {
    read_block_pos(tag)
}

/// Removes the embedded `x`, `y`, `z` fields of a payload compound, leaving
/// the container-local copy position-free.
pub fn strip_coords(tag: &mut Tag) {
    if let Some(c) = tag.as_compound_mut() {
        c.remove("x");
        c.remove("y");
        c.remove("z");
    }
}

/// Writes the `Pos` double list of an entity record.
pub fn set_entity_pos(data: &mut Tag, pos: DVec3) {
    if let Some(c) = data.as_compound_mut() {
        c.insert(
            "Pos".to_string(),
            Tag::List(vec![Tag::Double(pos.x), Tag::Double(pos.y), Tag::Double(pos.z)]),
        );
    }
}

/// Reads the `Pos` double list of an entity record.
pub fn entity_pos(data: &Tag) -> Option<DVec3> {
    let list = data.get("Pos")?.as_list()?;
    if list.len() != 3 {
        return None;
    }
    Some(DVec3::new(
        list[0].as_double()?,
        list[1].as_double()?,
        list[2].as_double()?,
    ))
}

/// Writes the `Rotation` float list (yaw, pitch) of an entity record.
pub fn set_entity_rotation(data: &mut Tag, yaw: f32, pitch: f32) {
    if let Some(c) = data.as_compound_mut() {
        c.insert(
            "Rotation".to_string(),
            Tag::List(vec![Tag::Float(yaw), Tag::Float(pitch)]),
        );
    }
}

/// Reads the `Rotation` float list (yaw, pitch) of an entity record.
pub fn entity_rotation(data: &Tag) -> Option<(f32, f32)> {
    let list = data.get("Rotation")?.as_list()?;
    if list.len() != 2 {
        return None;
    }
    Some((list[0].as_float()?, list[1].as_float()?))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
