//! Versioned tag codec for structures.
//!
//! Document layout (a tag compound):
//!
//! | Key           | Contents                                            |
//! |---------------|-----------------------------------------------------|
//! | `Version`     | format version (int, required)                      |
//! | `DataVersion` | opaque producing-world data stamp (int)             |
//! | `Metadata`    | name, author, timestamps, statistics                |
//! | `Regions`     | compound of region name → region document           |
//!
//! Each region document holds `Position` and `Size` (signed), the
//! `BlockStatePalette` list, the `BlockStates` packed long array,
//! `TileEntities`, `Entities`, and `PendingBlockTicks`.
//!
//! The writer always emits the current version. The reader accepts versions
//! 1 through current: version 1 wrapped block-entity payloads and entity
//! data in `{x, y, z, TileNBT}` / `{x, y, z, EntityData}` envelopes, which
//! are normalized to the embedded-coordinate form on read; pending block
//! ticks exist from version 3 on.

use std::collections::BTreeMap;

use glam::DVec3;
use strata_tag::{
    Compound, Tag, block_pos_tag, embed_coords, entity_pos, read_block_pos, read_coords,
    set_entity_pos, strip_coords,
};

use crate::container::VoxelContainer;
use crate::metadata::StructureMetadata;
use crate::region::{EntityRecord, ScheduledUpdate, SubRegion};
use crate::state::BlockState;
use crate::structure::Structure;

/// Version written by this codec.
pub const FORMAT_VERSION: i32 = 4;

/// Oldest version the reader accepts.
pub const MIN_FORMAT_VERSION: i32 = 1;

/// Pending block ticks exist from this version on.
const TICKS_SINCE_VERSION: i32 = 3;

/// Errors produced while decoding a structure document.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The document has no `Version` tag, so it cannot be interpreted.
    #[error("document has no Version tag")]
    MissingVersionTag,
    /// The document's version is outside the supported range.
    #[error("unsupported format version {0} (supported: {MIN_FORMAT_VERSION}..={FORMAT_VERSION})")]
    UnsupportedVersion(i32),
    /// A required field is missing or has the wrong shape.
    #[error("malformed document: {0}")]
    Malformed(String),
}

fn malformed(what: impl Into<String>) -> CodecError {
    CodecError::Malformed(what.into())
}

/// Serializes a structure to a tag document at the current version.
pub fn write_structure<S: BlockState>(structure: &Structure<S>) -> Tag {
    let mut root = Compound::new();
    root.insert("Version".to_string(), Tag::Int(FORMAT_VERSION));
    root.insert("DataVersion".to_string(), Tag::Int(structure.data_version()));
    root.insert("Metadata".to_string(), write_metadata(structure.metadata()));

    let mut regions = Compound::new();
    for (name, region) in structure.regions() {
        regions.insert(name.clone(), write_region(region));
    }
    root.insert("Regions".to_string(), Tag::Compound(regions));
    Tag::Compound(root)
}

fn write_metadata(meta: &StructureMetadata) -> Tag {
    let mut c = Compound::new();
    c.insert("Name".to_string(), Tag::Str(meta.name.clone()));
    c.insert("Author".to_string(), Tag::Str(meta.author.clone()));
    c.insert("Description".to_string(), Tag::Str(meta.description.clone()));
    c.insert("TimeCreated".to_string(), Tag::Long(meta.time_created));
    c.insert("TimeModified".to_string(), Tag::Long(meta.time_modified));
    c.insert("RegionCount".to_string(), Tag::Int(meta.region_count));
    c.insert("TotalVolume".to_string(), Tag::Long(meta.total_volume));
    c.insert("TotalBlocks".to_string(), Tag::Long(meta.total_blocks));
    c.insert(
        "EnclosingSize".to_string(),
        block_pos_tag(meta.enclosing_size),
    );
    Tag::Compound(c)
}

fn write_region<S: BlockState>(region: &SubRegion<S>) -> Tag {
    let mut c = Compound::new();
    c.insert("Position".to_string(), block_pos_tag(region.position));
    c.insert("Size".to_string(), block_pos_tag(region.size));

    let palette: Vec<Tag> = region
        .container
        .palette()
        .states()
        .iter()
        .map(BlockState::to_tag)
        .collect();
    c.insert("BlockStatePalette".to_string(), Tag::List(palette));

    let words: Vec<i64> = region
        .container
        .storage()
        .words()
        .iter()
        .map(|&w| w as i64)
        .collect();
    c.insert("BlockStates".to_string(), Tag::LongArray(words));

    let mut tiles: Vec<Tag> = region
        .payloads
        .iter()
        .map(|(pos, blob)| {
            let mut out = blob.clone();
            embed_coords(&mut out, *pos);
            out
        })
        .collect();
    // Map order is not deterministic; sort by embedded position.
    tiles.sort_by_key(|t| read_coords(t));
    c.insert("TileEntities".to_string(), Tag::List(tiles));

    let entities: Vec<Tag> = region
        .entities
        .iter()
        .map(|e| {
            let mut data = e.data.clone();
            set_entity_pos(&mut data, e.pos);
            data
        })
        .collect();
    c.insert("Entities".to_string(), Tag::List(entities));

    let mut ticks: Vec<Tag> = region
        .block_updates
        .iter()
        .map(|(pos, update)| {
            let mut t = Compound::new();
            t.insert("x".to_string(), Tag::Int(pos.x));
            t.insert("y".to_string(), Tag::Int(pos.y));
            t.insert("z".to_string(), Tag::Int(pos.z));
            t.insert("Block".to_string(), Tag::Str(update.target.clone()));
            t.insert("Priority".to_string(), Tag::Int(update.priority));
            t.insert("Time".to_string(), Tag::Int(update.delay as i32));
            Tag::Compound(t)
        })
        .collect();
    ticks.sort_by_key(|t| read_coords(t));
    c.insert("PendingBlockTicks".to_string(), Tag::List(ticks));

    Tag::Compound(c)
}

/// Deserializes a structure from a tag document of any supported version.
pub fn read_structure<S: BlockState>(tag: &Tag) -> Result<Structure<S>, CodecError> {
    let version = tag
        .get("Version")
        .and_then(Tag::as_int)
        .ok_or(CodecError::MissingVersionTag)?;
    if !(MIN_FORMAT_VERSION..=FORMAT_VERSION).contains(&version) {
        return Err(CodecError::UnsupportedVersion(version));
    }
    let data_version = tag.get("DataVersion").and_then(Tag::as_int).unwrap_or(0);

    let region_tags = tag
        .get("Regions")
        .and_then(Tag::as_compound)
        .ok_or_else(|| malformed("missing Regions compound"))?;

    let mut regions = BTreeMap::new();
    for (name, region_tag) in region_tags {
        let region = read_region(name, region_tag, version)?;
        regions.insert(name.clone(), region);
    }

    let metadata = read_metadata(tag.get("Metadata"));
    Ok(Structure::from_parts(regions, metadata, data_version))
}

fn read_metadata(tag: Option<&Tag>) -> StructureMetadata {
    let mut meta = StructureMetadata::new("", "");
    let Some(tag) = tag else {
        return meta;
    };
    if let Some(name) = tag.get("Name").and_then(Tag::as_str) {
        meta.name = name.to_string();
    }
    if let Some(author) = tag.get("Author").and_then(Tag::as_str) {
        meta.author = author.to_string();
    }
    if let Some(description) = tag.get("Description").and_then(Tag::as_str) {
        meta.description = description.to_string();
    }
    if let Some(v) = tag.get("TimeCreated").and_then(Tag::as_int_any) {
        meta.time_created = v;
    }
    if let Some(v) = tag.get("TimeModified").and_then(Tag::as_int_any) {
        meta.time_modified = v;
    }
    if let Some(v) = tag.get("RegionCount").and_then(Tag::as_int) {
        meta.region_count = v;
    }
    if let Some(v) = tag.get("TotalVolume").and_then(Tag::as_int_any) {
        meta.total_volume = v;
    }
    if let Some(v) = tag.get("TotalBlocks").and_then(Tag::as_int_any) {
        meta.total_blocks = v;
    }
    if let Some(size) = tag.get("EnclosingSize").and_then(read_block_pos) {
        meta.enclosing_size = size;
    }
    meta.modified_since_saved = false;
    meta
}

fn read_region<S: BlockState>(
    name: &str,
    tag: &Tag,
    version: i32,
) -> Result<SubRegion<S>, CodecError> {
    let position = tag
        .get("Position")
        .and_then(read_block_pos)
        .ok_or_else(|| malformed(format!("region {name:?}: missing Position")))?;
    let size = tag
        .get("Size")
        .and_then(read_block_pos)
        .ok_or_else(|| malformed(format!("region {name:?}: missing Size")))?;
    if size.x == 0 || size.y == 0 || size.z == 0 {
        return Err(malformed(format!("region {name:?}: zero-sized axis")));
    }

    let palette_tags = tag
        .get("BlockStatePalette")
        .and_then(Tag::as_list)
        .ok_or_else(|| malformed(format!("region {name:?}: missing BlockStatePalette")))?;
    let mut states = Vec::with_capacity(palette_tags.len());
    for (i, entry) in palette_tags.iter().enumerate() {
        let state = S::from_tag(entry)
            .ok_or_else(|| malformed(format!("region {name:?}: bad palette entry {i}")))?;
        states.push(state);
    }

    let longs = tag
        .get("BlockStates")
        .and_then(Tag::as_long_array)
        .ok_or_else(|| malformed(format!("region {name:?}: missing BlockStates")))?;
    let words: Vec<u64> = longs.iter().map(|&w| w as u64).collect();

    let container = VoxelContainer::from_raw_parts(size.abs(), states, words)
        .map_err(|e| malformed(format!("region {name:?}: {e}")))?;

    let mut region = SubRegion {
        position,
        size,
        container,
        payloads: Default::default(),
        entities: Vec::new(),
        block_updates: Default::default(),
    };

    if let Some(tiles) = tag.get("TileEntities").and_then(Tag::as_list) {
        for entry in tiles {
            let (pos, blob) = if version == 1 {
                let pos = read_coords(entry).ok_or_else(|| {
                    malformed(format!("region {name:?}: tile entry without position"))
                })?;
                let blob = entry
                    .get("TileNBT")
                    .ok_or_else(|| {
                        malformed(format!("region {name:?}: v1 tile entry without TileNBT"))
                    })?
                    .clone();
                (pos, blob)
            } else {
                let pos = read_coords(entry).ok_or_else(|| {
                    malformed(format!("region {name:?}: tile entry without position"))
                })?;
                let mut blob = entry.clone();
                strip_coords(&mut blob);
                (pos, blob)
            };
            region.payloads.insert(pos, blob);
        }
    }

    if let Some(entities) = tag.get("Entities").and_then(Tag::as_list) {
        for entry in entities {
            let record = if version == 1 {
                let pos = DVec3::new(
                    entry
                        .get("x")
                        .and_then(Tag::as_double)
                        .ok_or_else(|| malformed(format!("region {name:?}: v1 entity without x")))?,
                    entry
                        .get("y")
                        .and_then(Tag::as_double)
                        .ok_or_else(|| malformed(format!("region {name:?}: v1 entity without y")))?,
                    entry
                        .get("z")
                        .and_then(Tag::as_double)
                        .ok_or_else(|| malformed(format!("region {name:?}: v1 entity without z")))?,
                );
                let mut data = entry
                    .get("EntityData")
                    .ok_or_else(|| {
                        malformed(format!("region {name:?}: v1 entity without EntityData"))
                    })?
                    .clone();
                set_entity_pos(&mut data, pos);
                EntityRecord { pos, data }
            } else {
                let pos = entity_pos(entry).ok_or_else(|| {
                    malformed(format!("region {name:?}: entity without Pos"))
                })?;
                EntityRecord {
                    pos,
                    data: entry.clone(),
                }
            };
            region.entities.push(record);
        }
    }

    if version >= TICKS_SINCE_VERSION
        && let Some(ticks) = tag.get("PendingBlockTicks").and_then(Tag::as_list)
    {
        for entry in ticks {
            let pos = read_coords(entry).ok_or_else(|| {
                malformed(format!("region {name:?}: pending tick without position"))
            })?;
            let target = entry
                .get("Block")
                .and_then(Tag::as_str)
                .ok_or_else(|| malformed(format!("region {name:?}: pending tick without Block")))?
                .to_string();
            let priority = entry.get("Priority").and_then(Tag::as_int).unwrap_or(0);
            let delay = entry
                .get("Time")
                .and_then(Tag::as_int_any)
                .ok_or_else(|| malformed(format!("region {name:?}: pending tick without Time")))?;
            region.block_updates.insert(
                pos,
                ScheduledUpdate {
                    target,
                    priority,
                    delay,
                },
            );
        }
    }

    Ok(region)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
