//! Placement of palette-compressed voxel structures into worlds.
//!
//! A [`Placement`] pairs a world origin and transform with per-region
//! overrides; [`place`] stamps the structure through it, [`place_in_chunk`]
//! does the same one chunk column at a time for generation pipelines, and
//! the `edit` module writes world-space edits back into the structure
//! through the inverse mapping.

pub mod chunked;
pub mod edit;
pub mod engine;
pub mod frame;
pub mod placement;
pub mod reverse;

pub use chunked::place_in_chunk;
pub use edit::{fill_world_box, replace_all_identical, set_block_at_world};
pub use engine::place;
pub use frame::RegionFrame;
pub use placement::{Placement, ReplacePolicy, SubRegionPlacement};
pub use reverse::{untransformed_state, world_to_container_pos, world_to_container_pos_unclamped};
