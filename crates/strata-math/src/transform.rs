//! Size-relative lattice transforms with exact inverses.
//!
//! A [`Transform`] pairs a mirror with a rotation. Applied to container-local
//! coordinates it is *size-relative*: the mirror reflects within the footprint
//! (`x ↦ size.x − 1 − x` on the lattice, `x ↦ size.x − x` in continuous
//! space) and the rotation pivots the whole footprint, so results stay inside
//! `[0, transformed_size)` and a 1×1 footprint is a fixed point. Applied to
//! region *offsets* it is origin-relative and results may be negative.
//!
//! Order is always mirror first, then rotation. Inverses undo the rotation
//! first, then the mirror.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::pos::BlockPos;
use crate::rotation::{Mirror, Rotation};

/// A mirror followed by a rotation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transform {
    pub mirror: Mirror,
    pub rotation: Rotation,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        mirror: Mirror::None,
        rotation: Rotation::None,
    };

    pub const fn new(mirror: Mirror, rotation: Rotation) -> Self {
        Self { mirror, rotation }
    }

    pub fn is_identity(self) -> bool {
        self == Self::IDENTITY
    }
}

/// The footprint dimensions after a rotation: quarter turns swap X and Z.
pub fn transformed_size(size: BlockPos, rotation: Rotation) -> BlockPos {
    if rotation.swaps_axes() {
        BlockPos::new(size.z, size.y, size.x)
    } else {
        size
    }
}

/// Transforms a lattice position within a footprint of the given (positive)
/// dimensions. The result lies in `[0, transformed_size(size, t.rotation))`
/// whenever the input lies in `[0, size)`.
pub fn transform_pos(pos: BlockPos, t: Transform, size: BlockPos) -> BlockPos {
    let (mut x, mut z) = (pos.x, pos.z);
    match t.mirror {
        Mirror::None => {}
        Mirror::X => x = size.x - 1 - x,
        Mirror::Z => z = size.z - 1 - z,
    }
    match t.rotation {
        Rotation::None => BlockPos::new(x, pos.y, z),
        Rotation::Cw90 => BlockPos::new(size.z - 1 - z, pos.y, x),
        Rotation::Cw180 => BlockPos::new(size.x - 1 - x, pos.y, size.z - 1 - z),
        Rotation::Ccw90 => BlockPos::new(z, pos.y, size.x - 1 - x),
    }
}

/// Exact inverse of [`transform_pos`]. `size` is the *untransformed*
/// footprint, the same value the forward call received.
pub fn untransform_pos(pos: BlockPos, t: Transform, size: BlockPos) -> BlockPos {
    let (x, z) = match t.rotation {
        Rotation::None => (pos.x, pos.z),
        Rotation::Cw90 => (pos.z, size.z - 1 - pos.x),
        Rotation::Cw180 => (size.x - 1 - pos.x, size.z - 1 - pos.z),
        Rotation::Ccw90 => (size.x - 1 - pos.z, pos.x),
    };
    let (x, z) = match t.mirror {
        Mirror::None => (x, z),
        Mirror::X => (size.x - 1 - x, z),
        Mirror::Z => (x, size.z - 1 - z),
    };
    BlockPos::new(x, pos.y, z)
}

/// Transforms a continuous position within a footprint of the given
/// dimensions. Mirroring maps `v` to `size − v` on the mirrored axis, so a
/// point half a cell inside one face lands half a cell inside the opposite
/// face.
pub fn transform_vec(v: DVec3, t: Transform, size: BlockPos) -> DVec3 {
    let sx = f64::from(size.x);
    let sz = f64::from(size.z);
    let (mut x, mut z) = (v.x, v.z);
    match t.mirror {
        Mirror::None => {}
        Mirror::X => x = sx - x,
        Mirror::Z => z = sz - z,
    }
    match t.rotation {
        Rotation::None => DVec3::new(x, v.y, z),
        Rotation::Cw90 => DVec3::new(sz - z, v.y, x),
        Rotation::Cw180 => DVec3::new(sx - x, v.y, sz - z),
        Rotation::Ccw90 => DVec3::new(z, v.y, sx - x),
    }
}

/// Transforms a signed offset about the origin. Unlike [`transform_pos`]
/// there is no footprint: mirroring negates a component and rotation permutes
/// with sign, so results can be negative.
pub fn transform_offset(offset: BlockPos, t: Transform) -> BlockPos {
    let (mut x, mut z) = (offset.x, offset.z);
    match t.mirror {
        Mirror::None => {}
        Mirror::X => x = -x,
        Mirror::Z => z = -z,
    }
    match t.rotation {
        Rotation::None => BlockPos::new(x, offset.y, z),
        Rotation::Cw90 => BlockPos::new(-z, offset.y, x),
        Rotation::Cw180 => BlockPos::new(-x, offset.y, -z),
        Rotation::Ccw90 => BlockPos::new(z, offset.y, -x),
    }
}

/// Exact inverse of [`transform_offset`].
pub fn untransform_offset(offset: BlockPos, t: Transform) -> BlockPos {
    let (x, z) = match t.rotation {
        Rotation::None => (offset.x, offset.z),
        Rotation::Cw90 => (offset.z, -offset.x),
        Rotation::Cw180 => (-offset.x, -offset.z),
        Rotation::Ccw90 => (-offset.z, offset.x),
    };
    let (x, z) = match t.mirror {
        Mirror::None => (x, z),
        Mirror::X => (-x, z),
        Mirror::Z => (x, -z),
    };
    BlockPos::new(x, offset.y, z)
}

/// The per-state transform sequence produced by nesting a sub-region
/// transform inside a whole-placement transform.
///
/// When the outer rotation is a quarter turn, the inner mirror's axis is
/// swapped so that it reflects across the axis it originally reflected
/// across, as seen after the outer rotation. States apply the outer mirror,
/// then the (possibly swapped) inner mirror, then the combined rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateTransform {
    pub outer_mirror: Mirror,
    pub inner_mirror: Mirror,
    pub rotation: Rotation,
}

impl StateTransform {
    pub const IDENTITY: StateTransform = StateTransform {
        outer_mirror: Mirror::None,
        inner_mirror: Mirror::None,
        rotation: Rotation::None,
    };

    /// Composes an outer (whole-placement) and inner (sub-region) transform.
    pub fn compose(outer: Transform, inner: Transform) -> StateTransform {
        let inner_mirror = if outer.rotation.swaps_axes() {
            inner.mirror.swapped()
        } else {
            inner.mirror
        };
        StateTransform {
            outer_mirror: outer.mirror,
            inner_mirror,
            rotation: outer.rotation.add(inner.rotation),
        }
    }

    pub fn is_identity(self) -> bool {
        self == Self::IDENTITY
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
