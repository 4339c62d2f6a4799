//! World-space edits written back through a placement.
//!
//! These operations let tooling modify a structure by pointing at the world:
//! each edit reverse-maps world coordinates through the placed region's frame
//! and un-applies the composed transform from the state, so re-placing the
//! structure reproduces exactly what the user saw.

use strata_math::{BlockPos, IntBounds, LayerRange};
use strata_schematic::{BlockState, Structure};
use tracing::error;

use crate::frame::RegionFrame;
use crate::placement::Placement;
use crate::reverse::{untransformed_state, world_to_container_pos, world_to_container_pos_unclamped};

/// Writes one state into a region through its placed frame. The world
/// position is clamped onto the placed box, so an overshooting cursor edits
/// the nearest cell. Returns `false` if the region is unknown.
pub fn set_block_at_world<S: BlockState>(
    structure: &mut Structure<S>,
    placement: &Placement,
    region_name: &str,
    world_pos: BlockPos,
    state: &S,
) -> bool {
    let Some(frame) = RegionFrame::for_region(structure, placement, region_name) else {
        return false;
    };
    let local = world_to_container_pos(&frame, world_pos);
    let stored = untransformed_state(state, frame.state_transform());
    structure.set_block(region_name, local, stored)
}

/// Fills the intersection of a world-space box and one placed region with a
/// state. Returns `false` if the region is unknown or the box misses it.
pub fn fill_world_box<S: BlockState>(
    structure: &mut Structure<S>,
    placement: &Placement,
    region_name: &str,
    world_box: &IntBounds,
    state: &S,
) -> bool {
    let Some(frame) = RegionFrame::for_region(structure, placement, region_name) else {
        return false;
    };
    let a = world_to_container_pos_unclamped(&frame, world_box.min);
    let b = world_to_container_pos_unclamped(&frame, world_box.max);
    let dims = frame.dims();
    let container = IntBounds::from_corners(BlockPos::ZERO, dims - BlockPos::new(1, 1, 1));
    let Some(local_box) = IntBounds::from_corners(a, b).intersection(&container) else {
        return false;
    };
    let stored = untransformed_state(state, frame.state_transform());
    for y in local_box.min.y..=local_box.max.y {
        for z in local_box.min.z..=local_box.max.z {
            for x in local_box.min.x..=local_box.max.x {
                structure.set_block(region_name, BlockPos::new(x, y, z), stored.clone());
            }
        }
    }
    true
}

/// Replaces every cell holding `find` (as seen in the world, i.e. after the
/// placement transform) with `replace`, across all enabled regions, limited
/// to the optional layer range. Returns `false` if nothing changed.
pub fn replace_all_identical<S: BlockState>(
    structure: &mut Structure<S>,
    placement: &Placement,
    find: &S,
    replace: &S,
    range: Option<&LayerRange>,
) -> bool {
    // Resolve every region's local box and untransformed states up front;
    // set_block needs the structure mutably.
    let mut jobs: Vec<(String, IntBounds, S, S)> = Vec::new();
    for (name, region) in structure.regions() {
        let Some(sub) = placement.region(name) else {
            continue;
        };
        if !sub.enabled {
            continue;
        }
        let frame = RegionFrame::new(placement, sub, region.size);
        let local_box = match range {
            Some(range) => {
                let Some(clip) = frame.world_bounds().intersection(&range.world_bounds()) else {
                    continue;
                };
                let Some(local_box) = frame.local_box_for(&clip) else {
                    error!(region = %name, "reverse-mapped range leaves the container, aborting");
                    return false;
                };
                local_box
            }
            None => {
                let dims = frame.dims();
                IntBounds::from_corners(BlockPos::ZERO, dims - BlockPos::new(1, 1, 1))
            }
        };
        let st = frame.state_transform();
        jobs.push((
            name.clone(),
            local_box,
            untransformed_state(find, st),
            untransformed_state(replace, st),
        ));
    }

    let mut changed = false;
    for (name, local_box, find_local, replace_local) in jobs {
        for y in local_box.min.y..=local_box.max.y {
            for z in local_box.min.z..=local_box.max.z {
                for x in local_box.min.x..=local_box.max.x {
                    let local = BlockPos::new(x, y, z);
                    let matches = structure
                        .region(&name)
                        .and_then(|r| r.container.get(local).ok())
                        .is_some_and(|s| *s == find_local);
                    if matches {
                        changed |= structure.set_block(&name, local, replace_local.clone());
                    }
                }
            }
        }
    }
    changed
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
