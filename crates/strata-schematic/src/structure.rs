//! Structures: named sub-regions captured from a world, plus metadata.

use std::collections::BTreeMap;
use std::path::PathBuf;

use strata_math::{BlockPos, IntBounds};
use strata_tag::{set_entity_pos, strip_coords};

use crate::metadata::StructureMetadata;
use crate::region::{EntityRecord, ScheduledUpdate, SubRegion};
use crate::state::BlockState;
use crate::world::{ChunkPos, VoxelWorld};

/// One named box of a capture request, in world-absolute corners.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureBox {
    pub name: String,
    pub corner_a: BlockPos,
    pub corner_b: BlockPos,
}

impl CaptureBox {
    pub fn new(name: impl Into<String>, corner_a: BlockPos, corner_b: BlockPos) -> Self {
        Self {
            name: name.into(),
            corner_a,
            corner_b,
        }
    }

    /// The box's world-absolute bounds.
    pub fn bounds(&self) -> IntBounds {
        IntBounds::from_corners(self.corner_a, self.corner_b)
    }

    /// Signed size from corner A to corner B, counting both end cells.
    pub fn signed_size(&self) -> BlockPos {
        fn span(a: i32, b: i32) -> i32 {
            if b >= a { b - a + 1 } else { b - a - 1 }
        }
        BlockPos::new(
            span(self.corner_a.x, self.corner_b.x),
            span(self.corner_a.y, self.corner_b.y),
            span(self.corner_a.z, self.corner_b.z),
        )
    }
}

/// Errors constructing a structure from capture boxes.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// No boxes were given.
    #[error("capture requires at least one box")]
    NoRegions,
    /// Two boxes share a name.
    #[error("duplicate region name: {0:?}")]
    DuplicateRegion(String),
}

/// A collection of named sub-regions with shared metadata.
#[derive(Clone, Debug)]
pub struct Structure<S: BlockState> {
    regions: BTreeMap<String, SubRegion<S>>,
    metadata: StructureMetadata,
    /// Opaque data-format stamp of the producing world, carried through
    /// serialization untouched.
    data_version: i32,
    file: Option<PathBuf>,
}

impl<S: BlockState> Structure<S> {
    /// Creates a structure with empty containers sized for the given boxes.
    /// Region anchors are stored relative to `origin`. Used directly for
    /// chunk-wise capture, where containers fill in incrementally.
    pub fn create_empty(
        boxes: &[CaptureBox],
        origin: BlockPos,
        name: &str,
        author: &str,
        data_version: i32,
    ) -> Result<Self, CaptureError> {
        if boxes.is_empty() {
            return Err(CaptureError::NoRegions);
        }
        let mut regions = BTreeMap::new();
        let mut total_volume = 0i64;
        let mut enclosing: Option<IntBounds> = None;
        for capture_box in boxes {
            let region = SubRegion::new(capture_box.corner_a - origin, capture_box.signed_size());
            let rel_bounds = IntBounds::from_corners(
                region.min_corner(),
                region.min_corner() + region.dims() - BlockPos::new(1, 1, 1),
            );
            enclosing = Some(match enclosing {
                None => rel_bounds,
                Some(acc) => IntBounds {
                    min: acc.min.min(rel_bounds.min),
                    max: acc.max.max(rel_bounds.max),
                },
            });
            total_volume += region.dims().volume();
            if regions
                .insert(capture_box.name.clone(), region)
                .is_some()
            {
                return Err(CaptureError::DuplicateRegion(capture_box.name.clone()));
            }
        }

        let mut metadata = StructureMetadata::new(name, author);
        metadata.region_count = regions.len() as i32;
        metadata.total_volume = total_volume;
        metadata.enclosing_size = enclosing.map(|b| b.dims()).unwrap_or(BlockPos::ZERO);

        Ok(Self {
            regions,
            metadata,
            data_version,
            file: None,
        })
    }

    /// Captures the full contents of the given boxes from a world.
    pub fn capture<W: VoxelWorld<S>>(
        world: &W,
        boxes: &[CaptureBox],
        origin: BlockPos,
        name: &str,
        author: &str,
        include_entities: bool,
        data_version: i32,
    ) -> Result<Self, CaptureError> {
        let mut structure = Self::create_empty(boxes, origin, name, author, data_version)?;
        let mut total_blocks = 0i64;
        for region in structure.regions.values_mut() {
            let abs_min = origin + region.min_corner();
            let portion = IntBounds::from_corners(
                abs_min,
                abs_min + region.dims() - BlockPos::new(1, 1, 1),
            );
            total_blocks += capture_cells(region, world, &portion, abs_min);
            if include_entities {
                capture_entities(region, world, &portion, abs_min);
            }
        }
        structure.metadata.total_blocks = total_blocks;
        Ok(structure)
    }

    /// Captures the parts of every region that intersect one chunk column.
    /// Calling this once per intersecting chunk produces the same structure
    /// as a single [`Structure::capture`].
    pub fn capture_chunk<W: VoxelWorld<S>>(
        &mut self,
        world: &W,
        chunk: ChunkPos,
        origin: BlockPos,
        include_entities: bool,
    ) {
        let mut added = 0i64;
        for region in self.regions.values_mut() {
            let abs_min = origin + region.min_corner();
            let region_bounds = IntBounds::from_corners(
                abs_min,
                abs_min + region.dims() - BlockPos::new(1, 1, 1),
            );
            let column = chunk.column_bounds(region_bounds.min.y, region_bounds.max.y);
            let Some(portion) = region_bounds.intersection(&column) else {
                continue;
            };
            added += capture_cells(region, world, &portion, abs_min);
            if include_entities {
                capture_entities(region, world, &portion, abs_min);
            }
        }
        self.metadata.total_blocks += added;
    }

    /// Writes one container cell, keeping the non-empty count current and
    /// stamping the modification time. Returns `false` if the region does
    /// not exist or the position is outside its container.
    pub fn set_block(&mut self, region_name: &str, local: BlockPos, state: S) -> bool {
        let Some(region) = self.regions.get_mut(region_name) else {
            return false;
        };
        let Ok(old) = region.container.get(local) else {
            return false;
        };
        let delta = match (old.is_empty(), state.is_empty()) {
            (true, false) => 1,
            (false, true) => -1,
            _ => 0,
        };
        if region.container.set(local, state).is_err() {
            return false;
        }
        self.metadata.total_blocks += delta;
        self.metadata.touch();
        true
    }

    pub fn region(&self, name: &str) -> Option<&SubRegion<S>> {
        self.regions.get(name)
    }

    pub fn regions(&self) -> impl Iterator<Item = (&String, &SubRegion<S>)> {
        self.regions.iter()
    }

    pub fn region_names(&self) -> impl Iterator<Item = &String> {
        self.regions.keys()
    }

    pub fn metadata(&self) -> &StructureMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut StructureMetadata {
        &mut self.metadata
    }

    pub fn data_version(&self) -> i32 {
        self.data_version
    }

    pub fn file(&self) -> Option<&PathBuf> {
        self.file.as_ref()
    }

    pub fn set_file(&mut self, path: Option<PathBuf>) {
        self.file = path;
    }

    /// Reassembles a structure from deserialized parts.
    pub(crate) fn from_parts(
        regions: BTreeMap<String, SubRegion<S>>,
        metadata: StructureMetadata,
        data_version: i32,
    ) -> Self {
        Self {
            regions,
            metadata,
            data_version,
            file: None,
        }
    }
}

/// Copies world cells, payloads, and scheduled updates inside `portion` into
/// a region whose minimum corner sits at `abs_min`. Returns the number of
/// non-empty cells written.
fn capture_cells<S: BlockState, W: VoxelWorld<S>>(
    region: &mut SubRegion<S>,
    world: &W,
    portion: &IntBounds,
    abs_min: BlockPos,
) -> i64 {
    let mut non_empty = 0i64;
    for y in portion.min.y..=portion.max.y {
        for z in portion.min.z..=portion.max.z {
            for x in portion.min.x..=portion.max.x {
                let abs = BlockPos::new(x, y, z);
                let local = abs - abs_min;
                let state = world.state(abs);
                if !state.is_empty() {
                    non_empty += 1;
                }
                // Local position is inside the container by construction.
                let _ = region.container.set(local, state);
                if let Some(payload) = world.payload(abs) {
                    let mut blob = payload.clone();
                    strip_coords(&mut blob);
                    region.payloads.insert(local, blob);
                }
            }
        }
    }
    let now = world.time();
    for tick in world.scheduled_updates_in(portion) {
        region.block_updates.insert(
            tick.pos - abs_min,
            ScheduledUpdate {
                target: tick.target,
                priority: tick.priority,
                delay: tick.time - now,
            },
        );
    }
    non_empty
}

/// Copies entities inside `portion` into a region, re-basing their positions
/// to the region's minimum corner. The re-based position is also embedded in
/// each entity's data compound, so a captured record already has the form the
/// serialized formats store.
fn capture_entities<S: BlockState, W: VoxelWorld<S>>(
    region: &mut SubRegion<S>,
    world: &W,
    portion: &IntBounds,
    abs_min: BlockPos,
) {
    for entity in world.entities_in(portion) {
        let local = entity.pos - abs_min.as_dvec3();
        let mut data = entity.data;
        set_entity_pos(&mut data, local);
        region.entities.push(EntityRecord { pos: local, data });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
