//! Legacy fixed-layout schematic codec.
//!
//! The legacy format predates palettes: one byte array of numeric block ids,
//! one of 4-bit metadata values, and an optional `AddBlocks` array extending
//! ids past 255 with packed nibbles (the high nibble of byte `i/2` extends
//! entry `2i`, the low nibble entry `2i+1`). Dimensions are 16-bit, cells are
//! linearized in the same Y-major order as native containers.
//!
//! Numeric ids mean nothing to this library, so import and export go through
//! a caller-supplied [`LegacyRegistry`]. Name resolution prefers the
//! embedded `SchematicaMapping` section, then the `BlockIDs` section, and
//! finally falls back to raw registry order, in which case the import is
//! flagged [`ImportFidelity::RegistryOrder`].

use rustc_hash::FxHashMap;
use strata_math::BlockPos;
use strata_tag::{Compound, Tag, embed_coords, entity_pos, read_coords, strip_coords};
use tracing::warn;

use crate::container::VoxelContainer;
use crate::metadata::StructureMetadata;
use crate::region::{EntityRecord, SubRegion};
use crate::state::BlockState;
use crate::structure::Structure;

/// Highest block id expressible in the legacy format (12 bits).
pub const MAX_LEGACY_ID: u16 = 4095;

/// How faithfully a legacy import resolved its block ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportFidelity {
    /// Ids were resolved through a name mapping embedded in the file.
    Exact,
    /// No name mapping was present; ids were interpreted in raw registry
    /// order, which is only correct when both sides agree on the registry.
    RegistryOrder,
}

/// Resolves between this library's states and legacy numeric ids.
pub trait LegacyRegistry<S: BlockState> {
    /// The state for a registry name plus metadata value.
    fn state_from_name(&self, name: &str, meta: u8) -> Option<S>;

    /// The state for a raw numeric id plus metadata value (registry-order
    /// fallback).
    fn state_from_id(&self, id: u16, meta: u8) -> Option<S>;

    /// The numeric id and metadata for a state, for export.
    fn id_and_meta(&self, state: &S) -> Option<(u16, u8)>;

    /// The registry name of a numeric id, for the export name mapping.
    fn name_for_id(&self, id: u16) -> Option<&str>;
}

/// Errors produced by the legacy codec.
#[derive(Debug, thiserror::Error)]
pub enum LegacyError {
    /// A required top-level field is absent.
    #[error("legacy document missing field {0:?}")]
    MissingField(&'static str),
    /// A dimension was zero or negative.
    #[error("legacy document has invalid dimension {0}")]
    InvalidDimension(i32),
    /// A dimension does not fit the format's 16-bit size fields.
    #[error("dimension {0} exceeds the legacy format's 16-bit limit")]
    OversizedDimension(i32),
    /// A byte array's length disagrees with the declared volume.
    #[error("{field} array holds {actual} entries, dimensions require {expected}")]
    SizeMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    /// The `AddBlocks` nibble array has the wrong length.
    #[error("AddBlocks array holds {actual} bytes, volume requires {expected}")]
    AddArrayMismatch { expected: usize, actual: usize },
    /// The pre-nibble one-byte-per-cell `Add` array is not supported.
    #[error("legacy document uses the unsupported byte-per-cell Add encoding")]
    UnsupportedAddEncoding,
    /// A name mapping entry carries an id outside the format's range.
    #[error("palette entry {name:?} has out-of-range id {id}")]
    InvalidPaletteId { name: String, id: u16 },
    /// An id to be written does not fit the format's 12-bit id space.
    #[error("block id {0} does not fit the legacy id space")]
    IdOutOfRange(u16),
    /// A tile or entity entry is structurally broken.
    #[error("malformed legacy document: {0}")]
    Malformed(String),
}

/// A decoded legacy schematic: one unnamed box.
#[derive(Clone, Debug, PartialEq)]
pub struct LegacyDocument<S: BlockState> {
    pub size: BlockPos,
    pub container: VoxelContainer<S>,
    pub payloads: FxHashMap<BlockPos, Tag>,
    pub entities: Vec<EntityRecord>,
    pub fidelity: ImportFidelity,
}

impl<S: BlockState> LegacyDocument<S> {
    /// Converts this document into a single-region structure. The non-empty
    /// count is recomputed by scanning, since the legacy format stores none.
    pub fn into_structure(self, name: &str, author: &str, data_version: i32) -> Structure<S> {
        let mut metadata = StructureMetadata::new(name, author);
        metadata.region_count = 1;
        metadata.total_volume = self.size.volume();
        metadata.total_blocks = self.container.count_non_empty();
        metadata.enclosing_size = self.size;

        let region = SubRegion {
            position: BlockPos::ZERO,
            size: self.size,
            container: self.container,
            payloads: self.payloads,
            entities: self.entities,
            block_updates: Default::default(),
        };
        let mut regions = std::collections::BTreeMap::new();
        regions.insert(name.to_string(), region);
        Structure::from_parts(regions, metadata, data_version)
    }
}

fn read_dimension(tag: &Tag, field: &'static str) -> Result<i32, LegacyError> {
    let value = tag
        .get(field)
        .and_then(Tag::as_short)
        .ok_or(LegacyError::MissingField(field))?;
    let value = i32::from(value);
    if value <= 0 {
        return Err(LegacyError::InvalidDimension(value));
    }
    Ok(value)
}

/// Decodes a legacy schematic document.
pub fn read_legacy<S: BlockState, R: LegacyRegistry<S>>(
    tag: &Tag,
    registry: &R,
) -> Result<LegacyDocument<S>, LegacyError> {
    let width = read_dimension(tag, "Width")?;
    let height = read_dimension(tag, "Height")?;
    let length = read_dimension(tag, "Length")?;
    let size = BlockPos::new(width, height, length);
    let volume = size.volume() as usize;

    let blocks = tag
        .get("Blocks")
        .and_then(Tag::as_byte_array)
        .ok_or(LegacyError::MissingField("Blocks"))?;
    if blocks.len() != volume {
        return Err(LegacyError::SizeMismatch {
            field: "Blocks",
            expected: volume,
            actual: blocks.len(),
        });
    }
    let data = tag
        .get("Data")
        .and_then(Tag::as_byte_array)
        .ok_or(LegacyError::MissingField("Data"))?;
    if data.len() != volume {
        return Err(LegacyError::SizeMismatch {
            field: "Data",
            expected: volume,
            actual: data.len(),
        });
    }

    if tag.get("Add").is_some() {
        return Err(LegacyError::UnsupportedAddEncoding);
    }
    let add = match tag.get("AddBlocks").and_then(Tag::as_byte_array) {
        Some(add) => {
            let expected = volume.div_ceil(2);
            if add.len() != expected {
                return Err(LegacyError::AddArrayMismatch {
                    expected,
                    actual: add.len(),
                });
            }
            Some(add)
        }
        None => None,
    };

    let (id_to_name, fidelity) = read_name_mapping(tag)?;

    let mut container = VoxelContainer::new(size);
    for i in 0..volume {
        let mut id = u16::from(blocks[i]);
        if let Some(add) = add {
            let nibble = add[i / 2];
            id |= if i % 2 == 0 {
                (u16::from(nibble) & 0xF0) << 4
            } else {
                (u16::from(nibble) & 0x0F) << 8
            };
        }
        let meta = data[i] & 0x0F;

        let state = match &id_to_name {
            Some(names) => match names.get(&id) {
                Some(name) => registry.state_from_name(name, meta),
                None => {
                    if id != 0 {
                        warn!(id, meta, "legacy id missing from name mapping");
                    }
                    None
                }
            },
            None => registry.state_from_id(id, meta),
        };
        let state = match state {
            Some(state) => state,
            None => {
                if id != 0 {
                    warn!(id, meta, "unresolvable legacy block id, importing as empty");
                }
                S::empty()
            }
        };
        if state.is_empty() {
            continue;
        }
        let x = i as i32 % width;
        let y = i as i32 / (width * length);
        let z = (i as i32 / width) % length;
        // Coordinates derived from the linear index are always in bounds.
        let _ = container.set(BlockPos::new(x, y, z), state);
    }

    let mut payloads = FxHashMap::default();
    if let Some(tiles) = tag.get("TileEntities").and_then(Tag::as_list) {
        for entry in tiles {
            let pos = read_coords(entry)
                .ok_or_else(|| LegacyError::Malformed("tile entry without position".into()))?;
            let mut blob = entry.clone();
            strip_coords(&mut blob);
            payloads.insert(pos, blob);
        }
    }

    let mut entities = Vec::new();
    if let Some(list) = tag.get("Entities").and_then(Tag::as_list) {
        for entry in list {
            let pos = entity_pos(entry)
                .ok_or_else(|| LegacyError::Malformed("entity without Pos".into()))?;
            entities.push(EntityRecord {
                pos,
                data: entry.clone(),
            });
        }
    }

    Ok(LegacyDocument {
        size,
        container,
        payloads,
        entities,
        fidelity,
    })
}

type NameMap = FxHashMap<u16, String>;

fn read_name_mapping(tag: &Tag) -> Result<(Option<NameMap>, ImportFidelity), LegacyError> {
    if let Some(mapping) = tag.get("SchematicaMapping").and_then(Tag::as_compound) {
        let mut names = NameMap::default();
        for (name, value) in mapping {
            let id = value.as_short().ok_or_else(|| {
                LegacyError::Malformed(format!("mapping entry {name:?} is not a short"))
            })? as u16;
            if id > MAX_LEGACY_ID {
                return Err(LegacyError::InvalidPaletteId {
                    name: name.clone(),
                    id,
                });
            }
            names.insert(id, name.clone());
        }
        return Ok((Some(names), ImportFidelity::Exact));
    }
    if let Some(mapping) = tag.get("BlockIDs").and_then(Tag::as_compound) {
        let mut names = NameMap::default();
        for (key, value) in mapping {
            let id: u16 = key.parse().map_err(|_| {
                LegacyError::Malformed(format!("BlockIDs key {key:?} is not an id"))
            })?;
            if id > MAX_LEGACY_ID {
                return Err(LegacyError::InvalidPaletteId {
                    name: key.clone(),
                    id,
                });
            }
            let name = value
                .as_str()
                .ok_or_else(|| {
                    LegacyError::Malformed(format!("BlockIDs entry {key:?} is not a string"))
                })?
                .to_string();
            names.insert(id, name);
        }
        return Ok((Some(names), ImportFidelity::Exact));
    }
    warn!("legacy document has no name mapping, falling back to registry order");
    Ok((None, ImportFidelity::RegistryOrder))
}

/// Encodes a legacy schematic document.
pub fn write_legacy<S: BlockState, R: LegacyRegistry<S>>(
    doc: &LegacyDocument<S>,
    registry: &R,
) -> Result<Tag, LegacyError> {
    for dim in [doc.size.x, doc.size.y, doc.size.z] {
        if dim <= 0 {
            return Err(LegacyError::InvalidDimension(dim));
        }
        if dim > i32::from(i16::MAX) {
            return Err(LegacyError::OversizedDimension(dim));
        }
    }
    let volume = doc.size.volume() as usize;
    let (width, length) = (doc.size.x, doc.size.z);

    let mut blocks = vec![0u8; volume];
    let mut data = vec![0u8; volume];
    let mut add = vec![0u8; volume.div_ceil(2)];
    let mut any_add = false;
    let mut used_ids: Vec<u16> = Vec::new();

    for i in 0..volume {
        let x = i as i32 % width;
        let y = i as i32 / (width * length);
        let z = (i as i32 / width) % length;
        // Coordinates derived from the linear index are always in bounds.
        let Ok(state) = doc.container.get(BlockPos::new(x, y, z)) else {
            continue;
        };
        let (id, meta) = match registry.id_and_meta(state) {
            Some(pair) => pair,
            None => {
                if !state.is_empty() {
                    warn!(?state, "state has no legacy id, exporting as empty");
                }
                (0, 0)
            }
        };
        if id > MAX_LEGACY_ID {
            return Err(LegacyError::IdOutOfRange(id));
        }
        blocks[i] = (id & 0xFF) as u8;
        data[i] = meta & 0x0F;
        let high = (id >> 8) as u8;
        if high != 0 {
            any_add = true;
            if i % 2 == 0 {
                add[i / 2] |= high << 4;
            } else {
                add[i / 2] |= high & 0x0F;
            }
        }
        if id != 0 && !used_ids.contains(&id) {
            used_ids.push(id);
        }
    }

    let mut root = Compound::new();
    root.insert("Width".to_string(), Tag::Short(doc.size.x as i16));
    root.insert("Height".to_string(), Tag::Short(doc.size.y as i16));
    root.insert("Length".to_string(), Tag::Short(doc.size.z as i16));
    root.insert("Materials".to_string(), Tag::Str("Alpha".to_string()));
    root.insert("Blocks".to_string(), Tag::ByteArray(blocks));
    root.insert("Data".to_string(), Tag::ByteArray(data));
    if any_add {
        root.insert("AddBlocks".to_string(), Tag::ByteArray(add));
    }

    let mut mapping = Compound::new();
    for id in used_ids {
        match registry.name_for_id(id) {
            Some(name) => {
                mapping.insert(name.to_string(), Tag::Short(id as i16));
            }
            None => warn!(id, "no name for exported legacy id"),
        }
    }
    root.insert("SchematicaMapping".to_string(), Tag::Compound(mapping));

    let mut tiles: Vec<Tag> = doc
        .payloads
        .iter()
        .map(|(pos, blob)| {
            let mut out = blob.clone();
            embed_coords(&mut out, *pos);
            out
        })
        .collect();
    tiles.sort_by_key(|t| read_coords(t));
    root.insert("TileEntities".to_string(), Tag::List(tiles));

    let entities: Vec<Tag> = doc.entities.iter().map(|e| e.data.clone()).collect();
    root.insert("Entities".to_string(), Tag::List(entities));

    Ok(Tag::Compound(root))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::test_registry::table;
    use super::*;
    use crate::state::NamedState;

    fn sample_doc() -> LegacyDocument<NamedState> {
        let size = BlockPos::new(3, 2, 2);
        let mut container = VoxelContainer::new(size);
        container
            .set(BlockPos::new(0, 0, 0), NamedState::new("stone"))
            .unwrap();
        container
            .set(
                BlockPos::new(2, 1, 1),
                NamedState::new("planks").with_property("meta", "3"),
            )
            .unwrap();
        container
            .set(BlockPos::new(1, 0, 1), NamedState::new("concrete"))
            .unwrap();
        LegacyDocument {
            size,
            container,
            payloads: Default::default(),
            entities: Vec::new(),
            fidelity: ImportFidelity::Exact,
        }
    }

    #[test]
    fn test_write_read_roundtrip_with_extended_ids() {
        let registry = table();
        let doc = sample_doc();
        let tag = write_legacy(&doc, &registry).unwrap();

        // Id 700 needs the nibble extension array.
        assert!(tag.get("AddBlocks").is_some());
        assert_eq!(tag.get("Materials").and_then(Tag::as_str), Some("Alpha"));

        let back = read_legacy::<NamedState, _>(&tag, &registry).unwrap();
        assert_eq!(back.fidelity, ImportFidelity::Exact);
        assert_eq!(back.container, doc.container);
        assert_eq!(back.size, doc.size);
    }

    #[test]
    fn test_small_ids_omit_add_array() {
        let registry = table();
        let size = BlockPos::new(2, 1, 1);
        let mut container = VoxelContainer::new(size);
        container
            .set(BlockPos::new(1, 0, 0), NamedState::new("stone"))
            .unwrap();
        let doc = LegacyDocument {
            size,
            container,
            payloads: Default::default(),
            entities: Vec::new(),
            fidelity: ImportFidelity::Exact,
        };
        let tag = write_legacy(&doc, &registry).unwrap();
        assert!(tag.get("AddBlocks").is_none());
    }

    #[test]
    fn test_add_nibbles_extend_even_and_odd_entries() {
        let registry = table();
        let size = BlockPos::new(2, 1, 1);
        let mut container = VoxelContainer::new(size);
        container
            .set(BlockPos::new(0, 0, 0), NamedState::new("concrete"))
            .unwrap();
        container
            .set(BlockPos::new(1, 0, 0), NamedState::new("concrete"))
            .unwrap();
        let doc = LegacyDocument {
            size,
            container,
            payloads: Default::default(),
            entities: Vec::new(),
            fidelity: ImportFidelity::Exact,
        };
        let tag = write_legacy(&doc, &registry).unwrap();
        // 700 = 0x2BC: low byte 0xBC, high nibble 0x2 packed for both cells.
        assert_eq!(tag.get("Blocks").and_then(Tag::as_byte_array), Some(&[0xBC, 0xBC][..]));
        assert_eq!(tag.get("AddBlocks").and_then(Tag::as_byte_array), Some(&[0x22][..]));

        let back = read_legacy::<NamedState, _>(&tag, &registry).unwrap();
        assert_eq!(back.container, doc.container);
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let registry = table();
        let tag = Tag::Compound(Compound::new());
        assert!(matches!(
            read_legacy::<NamedState, _>(&tag, &registry),
            Err(LegacyError::MissingField("Width"))
        ));
    }

    #[test]
    fn test_blocks_length_must_match_volume() {
        let registry = table();
        let mut c = Compound::new();
        c.insert("Width".to_string(), Tag::Short(2));
        c.insert("Height".to_string(), Tag::Short(2));
        c.insert("Length".to_string(), Tag::Short(2));
        c.insert("Blocks".to_string(), Tag::ByteArray(vec![0; 7]));
        c.insert("Data".to_string(), Tag::ByteArray(vec![0; 8]));
        assert!(matches!(
            read_legacy::<NamedState, _>(&Tag::Compound(c), &registry),
            Err(LegacyError::SizeMismatch {
                field: "Blocks",
                expected: 8,
                actual: 7
            })
        ));
    }

    #[test]
    fn test_old_add_encoding_is_rejected() {
        let registry = table();
        let mut c = Compound::new();
        c.insert("Width".to_string(), Tag::Short(1));
        c.insert("Height".to_string(), Tag::Short(1));
        c.insert("Length".to_string(), Tag::Short(1));
        c.insert("Blocks".to_string(), Tag::ByteArray(vec![1]));
        c.insert("Data".to_string(), Tag::ByteArray(vec![0]));
        c.insert("Add".to_string(), Tag::ByteArray(vec![0]));
        assert!(matches!(
            read_legacy::<NamedState, _>(&Tag::Compound(c), &registry),
            Err(LegacyError::UnsupportedAddEncoding)
        ));
    }

    #[test]
    fn test_registry_order_fallback_sets_fidelity() {
        let registry = table();
        let mut c = Compound::new();
        c.insert("Width".to_string(), Tag::Short(1));
        c.insert("Height".to_string(), Tag::Short(1));
        c.insert("Length".to_string(), Tag::Short(1));
        c.insert("Blocks".to_string(), Tag::ByteArray(vec![1]));
        c.insert("Data".to_string(), Tag::ByteArray(vec![0]));
        let back = read_legacy::<NamedState, _>(&Tag::Compound(c), &registry).unwrap();
        assert_eq!(back.fidelity, ImportFidelity::RegistryOrder);
        assert_eq!(
            back.container.get(BlockPos::ZERO).unwrap(),
            &NamedState::new("stone")
        );
    }

    #[test]
    fn test_unresolvable_ids_import_as_empty() {
        let registry = table();
        let mut mapping = Compound::new();
        mapping.insert("mystery".to_string(), Tag::Short(9));
        let mut c = Compound::new();
        c.insert("Width".to_string(), Tag::Short(1));
        c.insert("Height".to_string(), Tag::Short(1));
        c.insert("Length".to_string(), Tag::Short(1));
        c.insert("Blocks".to_string(), Tag::ByteArray(vec![9]));
        c.insert("Data".to_string(), Tag::ByteArray(vec![0]));
        c.insert("SchematicaMapping".to_string(), Tag::Compound(mapping));
        let back = read_legacy::<NamedState, _>(&Tag::Compound(c), &registry).unwrap();
        assert!(back.container.get(BlockPos::ZERO).unwrap().is_empty());
    }

    #[test]
    fn test_into_structure_counts_blocks() {
        let structure = sample_doc().into_structure("imported", "nobody", 0);
        assert_eq!(structure.metadata().total_blocks, 3);
        assert_eq!(structure.metadata().total_volume, 12);
        assert_eq!(structure.metadata().region_count, 1);
        assert!(structure.region("imported").is_some());
    }
}
