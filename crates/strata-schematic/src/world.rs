//! The world seam: what capture and placement need from a voxel world.
//!
//! [`VoxelWorld`] abstracts over the destination/source world; [`GridWorld`]
//! is the in-memory implementation used by tests and tooling.

use glam::DVec3;
use rustc_hash::FxHashMap;
use strata_math::{BlockPos, IntBounds};
use strata_tag::Tag;

use crate::region::EntityRecord;
use crate::state::BlockState;

/// Side length of one world chunk column.
pub const CHUNK_SIZE: i32 = 16;

/// A chunk column coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The chunk column containing a block position.
    pub fn containing(pos: BlockPos) -> Self {
        Self {
            x: pos.x.div_euclid(CHUNK_SIZE),
            z: pos.z.div_euclid(CHUNK_SIZE),
        }
    }

    /// True if a continuous position falls inside this column's horizontal
    /// footprint. The footprint is half-open: a coordinate exactly on the
    /// seam between two columns belongs to the higher one, so every position
    /// lies in exactly one column.
    pub fn contains_vec(&self, pos: DVec3) -> bool {
        let min_x = f64::from(self.x * CHUNK_SIZE);
        let min_z = f64::from(self.z * CHUNK_SIZE);
        pos.x >= min_x
            && pos.x < min_x + f64::from(CHUNK_SIZE)
            && pos.z >= min_z
            && pos.z < min_z + f64::from(CHUNK_SIZE)
    }

    /// The column's world-space box between the given vertical extents.
    pub fn column_bounds(&self, y_min: i32, y_max: i32) -> IntBounds {
        IntBounds::from_corners(
            BlockPos::new(self.x * CHUNK_SIZE, y_min, self.z * CHUNK_SIZE),
            BlockPos::new(
                self.x * CHUNK_SIZE + CHUNK_SIZE - 1,
                y_max,
                self.z * CHUNK_SIZE + CHUNK_SIZE - 1,
            ),
        )
    }
}

/// A block update scheduled in a world, with an absolute firing time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldTick {
    pub pos: BlockPos,
    pub target: String,
    pub priority: i32,
    /// Absolute world time at which the update fires.
    pub time: i64,
}

/// Everything capture and placement need from a voxel world.
pub trait VoxelWorld<S: BlockState> {
    /// Current world time, in the same units tick delays are measured in.
    fn time(&self) -> i64;

    /// True if the position is addressable in this world.
    fn contains(&self, pos: BlockPos) -> bool;

    fn state(&self, pos: BlockPos) -> S;

    /// Writes a state through the normal update path. Returns `false` if the
    /// write was rejected (e.g. out of bounds).
    fn set_state(&mut self, pos: BlockPos, state: S) -> bool;

    /// Writes a state directly into storage, bypassing incremental update
    /// machinery. Used by chunk-wise placement during world generation.
    fn set_state_direct(&mut self, pos: BlockPos, state: S) -> bool {
        self.set_state(pos, state)
    }

    /// The block-entity payload at a position, if any.
    fn payload(&self, pos: BlockPos) -> Option<&Tag>;

    fn set_payload(&mut self, pos: BlockPos, payload: Tag);

    fn remove_payload(&mut self, pos: BlockPos) -> Option<Tag>;

    /// Entities whose positions fall inside the cells of `bounds`, with
    /// world-absolute positions.
    fn entities_in(&self, bounds: &IntBounds) -> Vec<EntityRecord>;

    fn spawn_entity(&mut self, record: EntityRecord);

    fn schedule_update(&mut self, tick: WorldTick);

    /// Scheduled updates whose positions fall inside `bounds`.
    fn scheduled_updates_in(&self, bounds: &IntBounds) -> Vec<WorldTick>;

    /// Requests a neighbor-shape/connection update around a position.
    fn notify_neighbors(&mut self, pos: BlockPos);
}

/// A sparse in-memory voxel world backed by hash maps.
///
/// Cells not present in the map hold the empty state. Write and notify
/// counters let tests assert how many mutations an operation performed.
#[derive(Clone, Debug, Default)]
pub struct GridWorld<S> {
    states: FxHashMap<BlockPos, S>,
    payloads: FxHashMap<BlockPos, Tag>,
    entities: Vec<EntityRecord>,
    ticks: Vec<WorldTick>,
    time: i64,
    limits: Option<IntBounds>,
    write_count: u64,
    notify_count: u64,
}

impl<S: BlockState> GridWorld<S> {
    pub fn new() -> Self {
        Self {
            states: FxHashMap::default(),
            payloads: FxHashMap::default(),
            entities: Vec::new(),
            ticks: Vec::new(),
            time: 0,
            limits: None,
            write_count: 0,
            notify_count: 0,
        }
    }

    /// A world that rejects writes outside the given box.
    pub fn with_limits(limits: IntBounds) -> Self {
        let mut world = Self::new();
        world.limits = Some(limits);
        world
    }

    pub fn set_time(&mut self, time: i64) {
        self.time = time;
    }

    /// Number of state writes since the last counter reset.
    pub fn write_count(&self) -> u64 {
        self.write_count
    }

    /// Number of neighbor notifications since the last counter reset.
    pub fn notify_count(&self) -> u64 {
        self.notify_count
    }

    pub fn reset_counters(&mut self) {
        self.write_count = 0;
        self.notify_count = 0;
    }

    /// All scheduled updates, for test inspection.
    pub fn ticks(&self) -> &[WorldTick] {
        &self.ticks
    }

    /// All entities, for test inspection.
    pub fn entities(&self) -> &[EntityRecord] {
        &self.entities
    }

    /// Iterates all non-empty cells.
    pub fn occupied(&self) -> impl Iterator<Item = (&BlockPos, &S)> {
        self.states.iter()
    }
}

impl<S: BlockState> VoxelWorld<S> for GridWorld<S> {
    fn time(&self) -> i64 {
        self.time
    }

    fn contains(&self, pos: BlockPos) -> bool {
        match &self.limits {
            Some(limits) => limits.contains(pos),
            None => true,
        }
    }

    fn state(&self, pos: BlockPos) -> S {
        self.states.get(&pos).cloned().unwrap_or_else(S::empty)
    }

    fn set_state(&mut self, pos: BlockPos, state: S) -> bool {
        if !self.contains(pos) {
            return false;
        }
        self.write_count += 1;
        if state.is_empty() {
            self.states.remove(&pos);
        } else {
            self.states.insert(pos, state);
        }
        true
    }

    fn payload(&self, pos: BlockPos) -> Option<&Tag> {
        self.payloads.get(&pos)
    }

    fn set_payload(&mut self, pos: BlockPos, payload: Tag) {
        self.payloads.insert(pos, payload);
    }

    fn remove_payload(&mut self, pos: BlockPos) -> Option<Tag> {
        self.payloads.remove(&pos)
    }

    fn entities_in(&self, bounds: &IntBounds) -> Vec<EntityRecord> {
        self.entities
            .iter()
            .filter(|e| bounds.contains_vec(e.pos))
            .cloned()
            .collect()
    }

    fn spawn_entity(&mut self, record: EntityRecord) {
        self.entities.push(record);
    }

    fn schedule_update(&mut self, tick: WorldTick) {
        self.ticks.push(tick);
    }

    fn scheduled_updates_in(&self, bounds: &IntBounds) -> Vec<WorldTick> {
        self.ticks
            .iter()
            .filter(|t| bounds.contains(t.pos))
            .cloned()
            .collect()
    }

    fn notify_neighbors(&mut self, _pos: BlockPos) {
        self.notify_count += 1;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::NamedState;
    use glam::DVec3;

    #[test]
    fn test_chunk_pos_containing_handles_negatives() {
        assert_eq!(ChunkPos::containing(BlockPos::new(0, 0, 0)), ChunkPos::new(0, 0));
        assert_eq!(ChunkPos::containing(BlockPos::new(15, 0, 16)), ChunkPos::new(0, 1));
        assert_eq!(
            ChunkPos::containing(BlockPos::new(-1, 0, -16)),
            ChunkPos::new(-1, -1)
        );
        assert_eq!(
            ChunkPos::containing(BlockPos::new(-17, 0, 31)),
            ChunkPos::new(-2, 1)
        );
    }

    #[test]
    fn test_contains_vec_is_half_open() {
        let chunk = ChunkPos::new(0, 0);
        assert!(chunk.contains_vec(DVec3::new(0.0, 5.0, 15.9)));
        // The seam at 16.0 belongs to the next column.
        assert!(!chunk.contains_vec(DVec3::new(16.0, 0.0, 0.0)));
        assert!(ChunkPos::new(1, 0).contains_vec(DVec3::new(16.0, 0.0, 0.0)));
        assert!(ChunkPos::new(-1, -1).contains_vec(DVec3::new(-0.5, 0.0, -16.0)));
    }

    #[test]
    fn test_column_bounds() {
        let b = ChunkPos::new(-1, 2).column_bounds(0, 63);
        assert_eq!(b.min, BlockPos::new(-16, 0, 32));
        assert_eq!(b.max, BlockPos::new(-1, 63, 47));
    }

    #[test]
    fn test_grid_world_default_cells_are_empty() {
        let world: GridWorld<NamedState> = GridWorld::new();
        assert!(world.state(BlockPos::new(5, 5, 5)).is_empty());
    }

    #[test]
    fn test_writing_empty_clears_the_cell() {
        let mut world = GridWorld::new();
        let pos = BlockPos::new(1, 2, 3);
        world.set_state(pos, NamedState::new("stone"));
        assert!(!world.state(pos).is_empty());
        world.set_state(pos, NamedState::empty());
        assert!(world.state(pos).is_empty());
        assert_eq!(world.occupied().count(), 0);
        assert_eq!(world.write_count(), 2);
    }

    #[test]
    fn test_limits_reject_outside_writes() {
        let limits = IntBounds::from_corners(BlockPos::ZERO, BlockPos::new(7, 7, 7));
        let mut world = GridWorld::with_limits(limits);
        assert!(world.set_state(BlockPos::new(7, 7, 7), NamedState::new("stone")));
        assert!(!world.set_state(BlockPos::new(8, 0, 0), NamedState::new("stone")));
        assert_eq!(world.write_count(), 1);
    }

    #[test]
    fn test_entities_in_filters_by_cell() {
        let mut world: GridWorld<NamedState> = GridWorld::new();
        world.spawn_entity(EntityRecord {
            pos: DVec3::new(0.5, 0.0, 0.5),
            data: Tag::Compound(Default::default()),
        });
        world.spawn_entity(EntityRecord {
            pos: DVec3::new(9.5, 0.0, 0.5),
            data: Tag::Compound(Default::default()),
        });
        let bounds = IntBounds::from_corners(BlockPos::ZERO, BlockPos::new(4, 4, 4));
        assert_eq!(world.entities_in(&bounds).len(), 1);
    }
}
