//! Integer block positions and signed sizes.

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A position (or displacement) on the integer block lattice.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const ZERO: BlockPos = BlockPos { x: 0, y: 0, z: 0 };

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Componentwise minimum of two positions.
    pub fn min(self, other: BlockPos) -> BlockPos {
        BlockPos::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.z.min(other.z),
        )
    }

    /// Componentwise maximum of two positions.
    pub fn max(self, other: BlockPos) -> BlockPos {
        BlockPos::new(
            self.x.max(other.x),
            self.y.max(other.y),
            self.z.max(other.z),
        )
    }

    /// Componentwise absolute value. Turns a signed size into dimensions.
    pub fn abs(self) -> BlockPos {
        BlockPos::new(self.x.abs(), self.y.abs(), self.z.abs())
    }

    /// Product of the absolute components, as a volume.
    pub fn volume(self) -> i64 {
        i64::from(self.x.abs()) * i64::from(self.y.abs()) * i64::from(self.z.abs())
    }

    /// The center of this block cell in continuous space.
    pub fn center(self) -> DVec3 {
        DVec3::new(
            f64::from(self.x) + 0.5,
            f64::from(self.y) + 0.5,
            f64::from(self.z) + 0.5,
        )
    }

    /// The minimum corner of this block cell in continuous space.
    pub fn as_dvec3(self) -> DVec3 {
        DVec3::new(f64::from(self.x), f64::from(self.y), f64::from(self.z))
    }

    /// The block cell containing a continuous position (componentwise floor).
    pub fn containing(v: DVec3) -> BlockPos {
        BlockPos::new(
            v.x.floor() as i32,
            v.y.floor() as i32,
            v.z.floor() as i32,
        )
    }
}

impl Add for BlockPos {
    type Output = BlockPos;

    fn add(self, rhs: BlockPos) -> BlockPos {
        BlockPos::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for BlockPos {
    fn add_assign(&mut self, rhs: BlockPos) {
        *self = *self + rhs;
    }
}

impl Sub for BlockPos {
    type Output = BlockPos;

    fn sub(self, rhs: BlockPos) -> BlockPos {
        BlockPos::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for BlockPos {
    fn sub_assign(&mut self, rhs: BlockPos) {
        *self = *self - rhs;
    }
}

impl Neg for BlockPos {
    type Output = BlockPos;

    fn neg(self) -> BlockPos {
        BlockPos::new(-self.x, -self.y, -self.z)
    }
}

/// Converts a signed size into the displacement from a region's anchor corner
/// to its far corner. A size component of `n` covers `n` cells, so the far
/// corner sits `|n| - 1` cells away, in the direction of the sign.
///
/// Size components must be non-zero.
pub fn relative_end_from_size(size: BlockPos) -> BlockPos {
    fn shrink(v: i32) -> i32 {
        debug_assert!(v != 0, "size component must be non-zero");
        if v >= 0 { v - 1 } else { v + 1 }
    }
    BlockPos::new(shrink(size.x), shrink(size.y), shrink(size.z))
}

/// Inverse of [`relative_end_from_size`]: recovers the signed size from the
/// anchor-to-far-corner displacement.
pub fn size_from_relative_end(end: BlockPos) -> BlockPos {
    fn grow(v: i32) -> i32 {
        if v >= 0 { v + 1 } else { v - 1 }
    }
    BlockPos::new(grow(end.x), grow(end.y), grow(end.z))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
