//! The placement engine: stamping a structure into a world.
//!
//! Placement walks each enabled region in six steps: clip the iteration box
//! against the optional layer range, verify the destination fits the world,
//! write the transformed voxels (honoring the replace policy, skipping void
//! sentinels, and eliding writes that would not change the world), run a
//! deferred neighbor-notification pass, re-home scheduled block updates, and
//! finally place entities. Writes are idempotent: placing the same structure
//! at the same placement twice performs no second mutation.

use strata_math::{BlockPos, IntBounds, LayerRange, StateTransform};
use strata_schematic::{
    BlockState, ChunkPos, EntityRecord, Structure, SubRegion, VoxelWorld, WorldTick,
    apply_state_transform,
};
use strata_tag::{Tag, embed_coords, entity_rotation, set_entity_pos, set_entity_rotation};
use tracing::{debug, error, warn};

use crate::frame::RegionFrame;
use crate::placement::{Placement, ReplacePolicy};

/// Places a structure into a world.
///
/// `range` restricts the affected cells (and entities) to a slab of layers;
/// `notify` runs a neighbor-notification pass after all voxels are written,
/// so connections form against final states rather than half-placed ones.
///
/// Returns `true` if at least one region was placed. Regions that are
/// disabled, out of range, outside the world, or whose reverse-mapped clip
/// box is inconsistent are skipped with a log.
pub fn place<S, W>(
    world: &mut W,
    structure: &Structure<S>,
    placement: &Placement,
    range: Option<&LayerRange>,
    notify: bool,
    policy: ReplacePolicy,
) -> bool
where
    S: BlockState,
    W: VoxelWorld<S>,
{
    let mut placed_any = false;
    for (name, region) in structure.regions() {
        let Some(sub) = placement.region(name) else {
            warn!(region = %name, "placement has no entry for region, skipping");
            continue;
        };
        if !sub.enabled {
            continue;
        }
        let frame = RegionFrame::new(placement, sub, region.size);
        let bounds = frame.world_bounds();
        if !world.contains(bounds.min) || !world.contains(bounds.max) {
            warn!(region = %name, "placed region extends outside the world, skipping");
            continue;
        }

        let clip_world = match range {
            Some(range) => {
                let Some(clip) = bounds.intersection(&range.world_bounds()) else {
                    debug!(region = %name, "region entirely outside layer range");
                    continue;
                };
                clip
            }
            None => bounds,
        };
        let Some(local_box) = frame.local_box_for(&clip_world) else {
            error!(region = %name, "reverse-mapped clip box leaves the container, skipping");
            continue;
        };

        place_cells(world, region, &frame, &local_box, policy, false);
        if notify {
            notify_cells(world, region, &frame, &local_box);
        }
        place_updates(world, region, &frame, &local_box);
        if !placement.ignore_entities && !sub.ignore_entities {
            place_entities(world, region, &frame, range, None);
        }
        placed_any = true;
    }
    placed_any
}

/// Writes the voxels of one region's local box into the world.
pub(crate) fn place_cells<S, W>(
    world: &mut W,
    region: &SubRegion<S>,
    frame: &RegionFrame,
    local_box: &IntBounds,
    policy: ReplacePolicy,
    direct: bool,
) where
    S: BlockState,
    W: VoxelWorld<S>,
{
    for y in local_box.min.y..=local_box.max.y {
        for z in local_box.min.z..=local_box.max.z {
            for x in local_box.min.x..=local_box.max.x {
                let local = BlockPos::new(x, y, z);
                let Ok(state) = region.container.get(local) else {
                    continue;
                };
                if state.is_void() {
                    continue;
                }
                let world_pos = frame.local_to_world(local);
                let old = world.state(world_pos);
                match policy {
                    ReplacePolicy::SkipNonEmptyDestination if !old.is_empty() => continue,
                    ReplacePolicy::SkipEmptySource if state.is_empty() => continue,
                    _ => {}
                }
                let placed = apply_state_transform(state, frame.state_transform());
                if old == placed {
                    continue;
                }
                if world.payload(world_pos).is_some() {
                    // The destination cell carries a payload belonging to the
                    // state being replaced; drop it before the overwrite.
                    world.remove_payload(world_pos);
                }
                let written = if direct {
                    world.set_state_direct(world_pos, placed)
                } else {
                    world.set_state(world_pos, placed)
                };
                if written && let Some(blob) = region.payloads.get(&local) {
                    let mut blob = blob.clone();
                    embed_coords(&mut blob, world_pos);
                    fold_orientation(&mut blob, frame.state_transform());
                    world.set_payload(world_pos, blob);
                }
            }
        }
    }
}

/// Requests neighbor updates across one region's placed box, after all of
/// its voxels are in place.
pub(crate) fn notify_cells<S, W>(
    world: &mut W,
    region: &SubRegion<S>,
    frame: &RegionFrame,
    local_box: &IntBounds,
) where
    S: BlockState,
    W: VoxelWorld<S>,
{
    for y in local_box.min.y..=local_box.max.y {
        for z in local_box.min.z..=local_box.max.z {
            for x in local_box.min.x..=local_box.max.x {
                let local = BlockPos::new(x, y, z);
                if let Ok(state) = region.container.get(local)
                    && !state.is_void()
                {
                    world.notify_neighbors(frame.local_to_world(local));
                }
            }
        }
    }
}

/// Re-homes a region's scheduled updates: local position through the full
/// transform, relative delay re-based onto the destination world's clock.
pub(crate) fn place_updates<S, W>(
    world: &mut W,
    region: &SubRegion<S>,
    frame: &RegionFrame,
    local_box: &IntBounds,
) where
    S: BlockState,
    W: VoxelWorld<S>,
{
    let now = world.time();
    for (local, update) in &region.block_updates {
        if !local_box.contains(*local) {
            continue;
        }
        world.schedule_update(WorldTick {
            pos: frame.local_to_world(*local),
            target: update.target.clone(),
            priority: update.priority,
            time: now + update.delay,
        });
    }
}

/// Spawns a region's entities at their transformed positions, folding yaw
/// through the frame's mirror/rotation sequence.
///
/// A `column` filter keeps only the entities whose transformed positions fall
/// in that chunk column's half-open footprint. The filter is independent of
/// the region's cell bounds: a mirror can land an entity on the far face of
/// the placed box, one continuous coordinate past the last cell, and that
/// entity still belongs to whichever column contains it.
pub(crate) fn place_entities<S, W>(
    world: &mut W,
    region: &SubRegion<S>,
    frame: &RegionFrame,
    range: Option<&LayerRange>,
    column: Option<ChunkPos>,
) where
    S: BlockState,
    W: VoxelWorld<S>,
{
    for record in &region.entities {
        let world_vec = frame.local_vec_to_world(record.pos);
        if let Some(range) = range
            && !range.contains_vec(world_vec)
        {
            continue;
        }
        if let Some(column) = column
            && !column.contains_vec(world_vec)
        {
            continue;
        }
        let mut data = record.data.clone();
        set_entity_pos(&mut data, world_vec);
        fold_orientation(&mut data, frame.state_transform());
        world.spawn_entity(EntityRecord {
            pos: world_vec,
            data,
        });
    }
}

/// Folds the yaw of a `Rotation` field (entity data or payload blob) through
/// a placement's transform sequence. Pitch is never affected.
fn fold_orientation(data: &mut Tag, st: &StateTransform) {
    if let Some((yaw, pitch)) = entity_rotation(data) {
        set_entity_rotation(data, transformed_yaw(yaw, st), pitch);
    }
}

/// A yaw angle after the outer mirror, inner mirror, and combined rotation.
pub(crate) fn transformed_yaw(yaw: f32, st: &StateTransform) -> f32 {
    let yaw = st.outer_mirror.apply_yaw(yaw);
    let yaw = st.inner_mirror.apply_yaw(yaw);
    yaw + st.rotation.degrees()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use strata_math::{Mirror, Rotation, Transform};
    use strata_schematic::{CaptureBox, GridWorld, NamedState};

    fn stone() -> NamedState {
        NamedState::new("stone")
    }

    fn single_region_structure() -> Structure<NamedState> {
        let mut world: GridWorld<NamedState> = GridWorld::new();
        world.set_state(BlockPos::new(0, 0, 0), stone());
        world.set_state(BlockPos::new(1, 0, 1), NamedState::new("glass"));
        let boxes = [CaptureBox::new(
            "main",
            BlockPos::ZERO,
            BlockPos::new(1, 0, 1),
        )];
        Structure::capture(&world, &boxes, BlockPos::ZERO, "t", "a", true, 0).unwrap()
    }

    #[test]
    fn test_identity_placement_copies_blocks() {
        let structure = single_region_structure();
        let placement = Placement::from_structure(&structure, BlockPos::new(10, 5, 10));
        let mut world: GridWorld<NamedState> = GridWorld::new();
        assert!(place(
            &mut world,
            &structure,
            &placement,
            None,
            false,
            ReplacePolicy::Always
        ));
        assert_eq!(world.state(BlockPos::new(10, 5, 10)), stone());
        assert_eq!(
            world.state(BlockPos::new(11, 5, 11)),
            NamedState::new("glass")
        );
    }

    #[test]
    fn test_disabled_region_is_skipped() {
        let structure = single_region_structure();
        let mut placement = Placement::from_structure(&structure, BlockPos::ZERO);
        placement.region_mut("main").unwrap().enabled = false;
        let mut world: GridWorld<NamedState> = GridWorld::new();
        assert!(!place(
            &mut world,
            &structure,
            &placement,
            None,
            false,
            ReplacePolicy::Always
        ));
        assert_eq!(world.write_count(), 0);
    }

    #[test]
    fn test_world_limits_skip_region() {
        let structure = single_region_structure();
        let placement = Placement::from_structure(&structure, BlockPos::new(7, 0, 0));
        let limits = IntBounds::from_corners(BlockPos::ZERO, BlockPos::new(7, 7, 7));
        let mut world: GridWorld<NamedState> = GridWorld::with_limits(limits);
        // The placed box reaches x = 8, outside the world.
        assert!(!place(
            &mut world,
            &structure,
            &placement,
            None,
            false,
            ReplacePolicy::Always
        ));
        assert_eq!(world.write_count(), 0);
    }

    #[test]
    fn test_transformed_yaw_folds_mirrors_then_rotation() {
        let st = StateTransform::compose(
            Transform::new(Mirror::X, Rotation::Cw90),
            Transform::IDENTITY,
        );
        // Mirror X: 30 → -30, then +90.
        assert_eq!(transformed_yaw(30.0, &st), 60.0);
    }
}
