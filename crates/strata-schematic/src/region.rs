//! Named sub-regions: one captured box of a structure.

use glam::DVec3;
use rustc_hash::FxHashMap;
use strata_math::{BlockPos, relative_end_from_size};
use strata_tag::Tag;

use crate::container::VoxelContainer;
use crate::state::BlockState;

/// A captured entity: a continuous position plus its full data compound.
///
/// Inside a region the position is relative to the region's minimum corner;
/// any coordinates nested in `data` (the `Pos` list, passenger positions) are
/// rewritten when the entity is placed, so the stored copies are only echoes
/// of capture time.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityRecord {
    pub pos: DVec3,
    pub data: Tag,
}

/// A scheduled block update waiting to fire.
///
/// Inside a region the delay is relative: the number of time units between
/// the capturing snapshot and the scheduled firing time. Placement converts
/// it back to an absolute time in the destination world.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledUpdate {
    /// Registry name of the block the update targets.
    pub target: String,
    pub priority: i32,
    pub delay: i64,
}

/// One named box of a structure.
///
/// `position` is the region's anchor corner relative to the structure origin
/// and `size` is signed: a negative component means the box extends in the
/// negative direction from the anchor. Container cells, payload keys, entity
/// positions, and update keys are all relative to the box's *minimum* corner.
#[derive(Clone, Debug, PartialEq)]
pub struct SubRegion<S: BlockState> {
    pub position: BlockPos,
    pub size: BlockPos,
    pub container: VoxelContainer<S>,
    /// Block-entity payloads keyed by container-local position. The stored
    /// blobs carry no embedded coordinates; those are stamped on placement.
    pub payloads: FxHashMap<BlockPos, Tag>,
    pub entities: Vec<EntityRecord>,
    pub block_updates: FxHashMap<BlockPos, ScheduledUpdate>,
}

impl<S: BlockState> SubRegion<S> {
    /// Creates an empty region with the given anchor and signed size.
    pub fn new(position: BlockPos, size: BlockPos) -> Self {
        Self {
            position,
            size,
            container: VoxelContainer::new(size.abs()),
            payloads: FxHashMap::default(),
            entities: Vec::new(),
            block_updates: FxHashMap::default(),
        }
    }

    /// Positive dimensions of the box.
    pub fn dims(&self) -> BlockPos {
        self.size.abs()
    }

    /// The minimum corner relative to the structure origin.
    pub fn min_corner(&self) -> BlockPos {
        self.position
            .min(self.position + relative_end_from_size(self.size))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::NamedState;

    #[test]
    fn test_negative_size_min_corner() {
        let region: SubRegion<NamedState> =
            SubRegion::new(BlockPos::new(10, 0, 10), BlockPos::new(-3, 2, -4));
        assert_eq!(region.dims(), BlockPos::new(3, 2, 4));
        assert_eq!(region.min_corner(), BlockPos::new(8, 0, 7));
    }

    #[test]
    fn test_positive_size_min_corner_is_anchor() {
        let region: SubRegion<NamedState> =
            SubRegion::new(BlockPos::new(-2, 5, 3), BlockPos::new(4, 1, 2));
        assert_eq!(region.min_corner(), BlockPos::new(-2, 5, 3));
    }
}
