//! Inclusive axis-aligned integer bounds.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::pos::BlockPos;

/// An inclusive axis-aligned box on the block lattice.
///
/// Invariant: `min` is componentwise less than or equal to `max`. The
/// constructors sort their inputs, so any two corners describe a valid box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntBounds {
    pub min: BlockPos,
    pub max: BlockPos,
}

impl IntBounds {
    /// Builds bounds from any two opposite corners.
    pub fn from_corners(a: BlockPos, b: BlockPos) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Bounds covering a single cell.
    pub fn single(pos: BlockPos) -> Self {
        Self { min: pos, max: pos }
    }

    /// Number of cells per axis.
    pub fn dims(&self) -> BlockPos {
        self.max - self.min + BlockPos::new(1, 1, 1)
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        pos.x >= self.min.x
            && pos.x <= self.max.x
            && pos.y >= self.min.y
            && pos.y <= self.max.y
            && pos.z >= self.min.z
            && pos.z <= self.max.z
    }

    /// True if a continuous position falls inside the cells of this box.
    pub fn contains_vec(&self, v: DVec3) -> bool {
        self.contains(BlockPos::containing(v))
    }

    pub fn intersects(&self, other: &IntBounds) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// The overlap of two boxes, or `None` when they are disjoint.
    pub fn intersection(&self, other: &IntBounds) -> Option<IntBounds> {
        if !self.intersects(other) {
            return None;
        }
        Some(IntBounds {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corners_are_sorted() {
        let b = IntBounds::from_corners(BlockPos::new(5, -1, 2), BlockPos::new(0, 3, 2));
        assert_eq!(b.min, BlockPos::new(0, -1, 2));
        assert_eq!(b.max, BlockPos::new(5, 3, 2));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let b = IntBounds::from_corners(BlockPos::ZERO, BlockPos::new(2, 2, 2));
        assert!(b.contains(BlockPos::ZERO));
        assert!(b.contains(BlockPos::new(2, 2, 2)));
        assert!(!b.contains(BlockPos::new(3, 0, 0)));
        assert!(!b.contains(BlockPos::new(0, -1, 0)));
    }

    #[test]
    fn test_intersection_of_overlapping_boxes() {
        let a = IntBounds::from_corners(BlockPos::ZERO, BlockPos::new(4, 4, 4));
        let b = IntBounds::from_corners(BlockPos::new(2, 2, 2), BlockPos::new(8, 8, 8));
        let i = a.intersection(&b).unwrap();
        assert_eq!(i.min, BlockPos::new(2, 2, 2));
        assert_eq!(i.max, BlockPos::new(4, 4, 4));
    }

    #[test]
    fn test_disjoint_boxes_do_not_intersect() {
        let a = IntBounds::from_corners(BlockPos::ZERO, BlockPos::new(1, 1, 1));
        let b = IntBounds::from_corners(BlockPos::new(3, 0, 0), BlockPos::new(4, 1, 1));
        assert!(!a.intersects(&b));
        assert!(a.intersection(&b).is_none());
    }

    #[test]
    fn test_dims_counts_cells() {
        let b = IntBounds::from_corners(BlockPos::new(-1, 0, 0), BlockPos::new(1, 0, 4));
        assert_eq!(b.dims(), BlockPos::new(3, 1, 5));
    }
}
