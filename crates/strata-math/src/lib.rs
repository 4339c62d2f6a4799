//! Integer lattice math for voxel structures.
//!
//! Block positions, mirror/rotation algebra, size-relative lattice transforms
//! with exact inverses, inclusive integer bounds, and axis-aligned layer
//! ranges. Everything here is pure math with no storage or world knowledge.

pub mod bounds;
pub mod layer;
pub mod pos;
pub mod rotation;
pub mod transform;

pub use bounds::IntBounds;
pub use layer::{Axis, LayerRange};
pub use pos::{BlockPos, relative_end_from_size, size_from_relative_end};
pub use rotation::{Mirror, Rotation};
pub use transform::{
    StateTransform, Transform, transform_offset, transform_pos, transform_vec, transformed_size,
    untransform_offset, untransform_pos,
};
