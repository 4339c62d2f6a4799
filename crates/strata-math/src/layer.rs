//! Axis-aligned layer ranges for restricting operations to a slab of layers.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::bounds::IntBounds;
use crate::pos::BlockPos;

/// Horizontal world coordinate limit. Positions beyond this are never
/// addressable, so range boxes clamp to it.
pub const WORLD_LIMIT: i32 = 30_000_000;

/// A coordinate axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// An inclusive span of layers along one axis.
///
/// A position is inside the range when its component on the range's axis lies
/// in `[min, max]`; the other two axes are unconstrained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerRange {
    pub axis: Axis,
    pub min: i32,
    pub max: i32,
}

impl LayerRange {
    /// Builds a range from any two layer indices.
    pub fn new(axis: Axis, a: i32, b: i32) -> Self {
        Self {
            axis,
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        let v = match self.axis {
            Axis::X => pos.x,
            Axis::Y => pos.y,
            Axis::Z => pos.z,
        };
        v >= self.min && v <= self.max
    }

    /// True if the cell containing a continuous position is in range.
    pub fn contains_vec(&self, v: DVec3) -> bool {
        self.contains(BlockPos::containing(v))
    }

    pub fn intersects(&self, bounds: &IntBounds) -> bool {
        let (lo, hi) = match self.axis {
            Axis::X => (bounds.min.x, bounds.max.x),
            Axis::Y => (bounds.min.y, bounds.max.y),
            Axis::Z => (bounds.min.z, bounds.max.z),
        };
        self.min <= hi && self.max >= lo
    }

    /// The world-space box this range permits: the range's span on its own
    /// axis, the world limit on the others.
    pub fn world_bounds(&self) -> IntBounds {
        let mut min = BlockPos::new(-WORLD_LIMIT, -WORLD_LIMIT, -WORLD_LIMIT);
        let mut max = BlockPos::new(WORLD_LIMIT, WORLD_LIMIT, WORLD_LIMIT);
        match self.axis {
            Axis::X => {
                min.x = self.min;
                max.x = self.max;
            }
            Axis::Y => {
                min.y = self.min;
                max.y = self.max;
            }
            Axis::Z => {
                min.z = self.min;
                max.z = self.max;
            }
        }
        IntBounds { min, max }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
