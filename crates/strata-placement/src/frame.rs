//! Resolved transform frames for one region of one placement.
//!
//! A [`RegionFrame`] freezes everything needed to map between container-local
//! and world coordinates: the two nested transforms, the footprints they act
//! on, and the world position of the transformed box's minimum corner. The
//! forward chain is sub-region transform (within the container footprint),
//! then whole-placement transform (within the sub-transformed footprint),
//! then translation; the reverse chain is its exact inverse.

use glam::DVec3;
use strata_math::{
    BlockPos, IntBounds, StateTransform, Transform, relative_end_from_size, transform_offset,
    transform_pos, transform_vec, transformed_size, untransform_pos,
};
use strata_schematic::{BlockState, Structure};

use crate::placement::{Placement, SubRegionPlacement};

/// The frozen local ↔ world mapping for one placed region.
#[derive(Clone, Copy, Debug)]
pub struct RegionFrame {
    /// Untransformed container dimensions.
    dims: BlockPos,
    /// Dimensions after the sub-region rotation.
    sub_dims: BlockPos,
    /// World position of the transformed box's minimum corner.
    base: BlockPos,
    outer: Transform,
    inner: Transform,
    state_transform: StateTransform,
}

impl RegionFrame {
    /// Resolves the frame for a region of the given signed size.
    pub fn new(placement: &Placement, sub: &SubRegionPlacement, region_size: BlockPos) -> Self {
        let min_rel = sub.offset.min(sub.offset + relative_end_from_size(region_size));
        let dims = region_size.abs();
        Self {
            dims,
            sub_dims: transformed_size(dims, sub.transform.rotation),
            base: placement.origin + transform_offset(min_rel, placement.transform),
            outer: placement.transform,
            inner: sub.transform,
            state_transform: StateTransform::compose(placement.transform, sub.transform),
        }
    }

    /// Looks a region up in both the structure and the placement and
    /// resolves its frame. `None` if either side lacks the region.
    pub fn for_region<S: BlockState>(
        structure: &Structure<S>,
        placement: &Placement,
        region_name: &str,
    ) -> Option<Self> {
        let region = structure.region(region_name)?;
        let sub = placement.region(region_name)?;
        Some(Self::new(placement, sub, region.size))
    }

    /// Untransformed container dimensions.
    pub fn dims(&self) -> BlockPos {
        self.dims
    }

    /// The per-state transform sequence of this frame.
    pub fn state_transform(&self) -> &StateTransform {
        &self.state_transform
    }

    /// Maps a container-local lattice position to a world position.
    pub fn local_to_world(&self, local: BlockPos) -> BlockPos {
        let inner = transform_pos(local, self.inner, self.dims);
        let outer = transform_pos(inner, self.outer, self.sub_dims);
        outer + self.base
    }

    /// Maps a world position back to container-local space. The result is
    /// unclamped: positions outside the placed box map outside `[0, dims)`.
    pub fn world_to_local(&self, world: BlockPos) -> BlockPos {
        let outer = world - self.base;
        let inner = untransform_pos(outer, self.outer, self.sub_dims);
        untransform_pos(inner, self.inner, self.dims)
    }

    /// Maps a container-local continuous position (entity) to world space.
    pub fn local_vec_to_world(&self, local: DVec3) -> DVec3 {
        let inner = transform_vec(local, self.inner, self.dims);
        let outer = transform_vec(inner, self.outer, self.sub_dims);
        outer + self.base.as_dvec3()
    }

    /// The world-space box the placed region occupies.
    pub fn world_bounds(&self) -> IntBounds {
        let final_dims = transformed_size(self.sub_dims, self.outer.rotation);
        IntBounds {
            min: self.base,
            max: self.base + final_dims - BlockPos::new(1, 1, 1),
        }
    }

    /// Reverse-maps a world-space box (a subset of [`Self::world_bounds`])
    /// to the container-local box covering the same cells. Returns `None`
    /// when the mapped box leaves the container, which means the box and
    /// this frame disagree about the placement.
    pub fn local_box_for(&self, world_box: &IntBounds) -> Option<IntBounds> {
        let a = self.world_to_local(world_box.min);
        let b = self.world_to_local(world_box.max);
        let local = IntBounds::from_corners(a, b);
        if local.min.x < 0
            || local.min.y < 0
            || local.min.z < 0
            || local.max.x >= self.dims.x
            || local.max.y >= self.dims.y
            || local.max.z >= self.dims.z
        {
            return None;
        }
        Some(local)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
