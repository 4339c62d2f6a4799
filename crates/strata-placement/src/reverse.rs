//! Reverse mapping: from world space back into a placed region.
//!
//! Editing tools operate on world coordinates while the structure stores
//! container-local cells. These helpers invert a [`RegionFrame`]'s mapping
//! for positions and un-apply the composed transform for states, so an edit
//! made "through" a rotated placement lands in the container such that the
//! next placement reproduces it exactly.

use strata_math::{BlockPos, Mirror, Rotation, StateTransform};
use strata_schematic::BlockState;

use crate::frame::RegionFrame;

/// Maps a world position into the container, clamping each component to the
/// container box. Positions outside the placed region snap to its nearest
/// cell, matching pointer-driven editing where the cursor may overshoot.
pub fn world_to_container_pos(frame: &RegionFrame, world: BlockPos) -> BlockPos {
    let dims = frame.dims();
    let local = frame.world_to_local(world);
    BlockPos::new(
        local.x.clamp(0, dims.x - 1),
        local.y.clamp(0, dims.y - 1),
        local.z.clamp(0, dims.z - 1),
    )
}

/// Maps a world position into the container without clamping. Positions
/// outside the placed region map outside `[0, dims)`.
pub fn world_to_container_pos_unclamped(frame: &RegionFrame, world: BlockPos) -> BlockPos {
    frame.world_to_local(world)
}

/// Un-applies a composed placement transform from a state: the inverse of
/// applying the outer mirror, inner mirror, and combined rotation in order.
pub fn untransformed_state<S: BlockState>(state: &S, t: &StateTransform) -> S {
    let mut out = state.clone();
    if t.rotation != Rotation::None {
        out = out.rotated(t.rotation.reversed());
    }
    if t.inner_mirror != Mirror::None {
        out = out.mirrored(t.inner_mirror);
    }
    if t.outer_mirror != Mirror::None {
        out = out.mirrored(t.outer_mirror);
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
