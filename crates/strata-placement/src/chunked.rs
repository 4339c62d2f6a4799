//! Chunk-wise placement for world-generation pipelines.
//!
//! [`place_in_chunk`] places only the slice of a structure that intersects
//! one chunk column, writing states through [`VoxelWorld::set_state_direct`].
//! Placing a structure chunk by chunk over every intersecting column produces
//! the same world as a single full placement: entities and scheduled updates
//! are included exactly when they fall inside the column's footprint.

use strata_schematic::{BlockState, ChunkPos, Structure, VoxelWorld};
use tracing::{debug, error};

use crate::engine::{notify_cells, place_cells, place_entities, place_updates};
use crate::frame::RegionFrame;
use crate::placement::{Placement, ReplacePolicy};

/// Places the slice of a structure that falls inside one chunk column.
///
/// Returns `true` if any region intersected the column. Regions without a
/// placement entry or with a disabled one are skipped silently; a clip box
/// that reverse-maps outside the container is a transform-composition fault
/// and skips the region with an error log.
pub fn place_in_chunk<S, W>(
    world: &mut W,
    chunk: ChunkPos,
    structure: &Structure<S>,
    placement: &Placement,
    notify: bool,
    policy: ReplacePolicy,
) -> bool
where
    S: BlockState,
    W: VoxelWorld<S>,
{
    let mut touched = false;
    for (name, region) in structure.regions() {
        let Some(sub) = placement.region(name) else {
            continue;
        };
        if !sub.enabled {
            continue;
        }
        let frame = RegionFrame::new(placement, sub, region.size);
        let bounds = frame.world_bounds();
        let column = chunk.column_bounds(bounds.min.y, bounds.max.y);
        let Some(clip) = bounds.intersection(&column) else {
            debug!(region = %name, ?chunk, "region does not reach this column");
            continue;
        };
        let Some(local_box) = frame.local_box_for(&clip) else {
            error!(region = %name, "reverse-mapped column clip leaves the container, skipping");
            continue;
        };

        place_cells(world, region, &frame, &local_box, policy, true);
        if notify {
            notify_cells(world, region, &frame, &local_box);
        }
        place_updates(world, region, &frame, &local_box);
        if !placement.ignore_entities && !sub.ignore_entities {
            place_entities(world, region, &frame, None, Some(chunk));
        }
        touched = true;
    }
    touched
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use strata_math::{BlockPos, Mirror, Rotation, Transform};
    use strata_schematic::{CaptureBox, EntityRecord, GridWorld, NamedState};
    use strata_tag::{Compound, Tag};

    use crate::engine::place;

    fn wide_structure() -> Structure<NamedState> {
        let mut world: GridWorld<NamedState> = GridWorld::new();
        for x in 0..40 {
            world.set_state(BlockPos::new(x, 0, 0), NamedState::new("stone"));
        }
        let boxes = [CaptureBox::new(
            "strip",
            BlockPos::ZERO,
            BlockPos::new(39, 0, 0),
        )];
        Structure::capture(&world, &boxes, BlockPos::ZERO, "t", "a", true, 0).unwrap()
    }

    #[test]
    fn test_only_the_column_slice_is_placed() {
        let structure = wide_structure();
        let placement = Placement::from_structure(&structure, BlockPos::ZERO);
        let mut world: GridWorld<NamedState> = GridWorld::new();
        assert!(place_in_chunk(
            &mut world,
            ChunkPos::new(0, 0),
            &structure,
            &placement,
            false,
            ReplacePolicy::Always
        ));
        assert!(!world.state(BlockPos::new(15, 0, 0)).is_empty());
        assert!(world.state(BlockPos::new(16, 0, 0)).is_empty());
    }

    // A mirror maps an entity on the box's minimum face to the far face,
    // one continuous coordinate past the last cell; the chunk union must
    // still spawn it exactly once.
    #[test]
    fn test_mirrored_boundary_entity_survives_chunking() {
        let mut world: GridWorld<NamedState> = GridWorld::new();
        world.set_state(BlockPos::ZERO, NamedState::new("stone"));
        world.spawn_entity(EntityRecord {
            pos: DVec3::new(0.0, 0.0, 0.5),
            data: Tag::Compound(Compound::new()),
        });
        let boxes = [CaptureBox::new(
            "main",
            BlockPos::ZERO,
            BlockPos::new(1, 0, 1),
        )];
        let structure =
            Structure::capture(&world, &boxes, BlockPos::ZERO, "t", "a", true, 0).unwrap();

        let mut placement = Placement::from_structure(&structure, BlockPos::ZERO);
        placement.transform = Transform::new(Mirror::X, Rotation::None);

        let mut full: GridWorld<NamedState> = GridWorld::new();
        place(
            &mut full,
            &structure,
            &placement,
            None,
            false,
            ReplacePolicy::Always,
        );
        assert_eq!(full.entities().len(), 1);
        assert_eq!(full.entities()[0].pos, DVec3::new(2.0, 0.0, 0.5));

        let mut chunked: GridWorld<NamedState> = GridWorld::new();
        for cx in -1..2 {
            for cz in -1..2 {
                place_in_chunk(
                    &mut chunked,
                    ChunkPos::new(cx, cz),
                    &structure,
                    &placement,
                    false,
                    ReplacePolicy::Always,
                );
            }
        }
        assert_eq!(chunked.entities().len(), 1);
        assert_eq!(chunked.entities()[0].pos, full.entities()[0].pos);
    }

    #[test]
    fn test_non_intersecting_column_is_a_no_op() {
        let structure = wide_structure();
        let placement = Placement::from_structure(&structure, BlockPos::ZERO);
        let mut world: GridWorld<NamedState> = GridWorld::new();
        assert!(!place_in_chunk(
            &mut world,
            ChunkPos::new(0, 5),
            &structure,
            &placement,
            false,
            ReplacePolicy::Always
        ));
        assert_eq!(world.write_count(), 0);
    }
}
