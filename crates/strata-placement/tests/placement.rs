//! End-to-end placement scenarios: capture, file round trip, transformed
//! placement, chunk-wise equivalence, and replace policies.

use glam::DVec3;
use strata_math::{BlockPos, Mirror, Rotation, Transform};
use strata_placement::{Placement, ReplacePolicy, place, place_in_chunk};
use strata_schematic::{
    BlockState, CaptureBox, ChunkPos, EntityRecord, GridWorld, NamedState, Structure, VoxelWorld,
    WorldTick, load_structure, save_structure,
};
use strata_tag::{Compound, Tag, read_coords, set_entity_rotation};

fn stone() -> NamedState {
    NamedState::new("stone")
}

/// A 2×1×2 source world: stone with a payload, an east-facing observer, one
/// entity, and one scheduled update.
fn source_world() -> GridWorld<NamedState> {
    let mut world: GridWorld<NamedState> = GridWorld::new();
    world.set_time(4);
    world.set_state(BlockPos::ZERO, stone());
    world.set_state(
        BlockPos::new(1, 0, 0),
        NamedState::new("observer").with_property("facing", "east"),
    );

    let mut payload = Compound::new();
    payload.insert("Lock".to_string(), Tag::Str("key".to_string()));
    world.set_payload(BlockPos::ZERO, Tag::Compound(payload));

    let mut data = Tag::Compound(Compound::new());
    set_entity_rotation(&mut data, 90.0, 0.0);
    world.spawn_entity(EntityRecord {
        pos: DVec3::new(0.5, 0.0, 0.5),
        data,
    });

    world.schedule_update(WorldTick {
        pos: BlockPos::ZERO,
        target: "stone".to_string(),
        priority: 0,
        time: 10,
    });
    world
}

fn capture_source() -> Structure<NamedState> {
    let world = source_world();
    let boxes = [CaptureBox::new(
        "main",
        BlockPos::ZERO,
        BlockPos::new(1, 0, 1),
    )];
    Structure::capture(&world, &boxes, BlockPos::ZERO, "demo", "tester", true, 100).unwrap()
}

#[test]
fn test_capture_save_load_place_rotated() {
    let mut structure = capture_source();

    let dir = tempfile::tempdir().unwrap();
    let path = save_structure(&mut structure, dir.path(), "demo", false).unwrap();
    let structure: Structure<NamedState> = load_structure(&path).unwrap();

    let mut placement = Placement::from_structure(&structure, BlockPos::new(100, 0, 100));
    placement.transform = Transform::new(Mirror::None, Rotation::Cw90);

    let mut world: GridWorld<NamedState> = GridWorld::new();
    world.set_time(50);
    assert!(place(
        &mut world,
        &structure,
        &placement,
        None,
        true,
        ReplacePolicy::Always
    ));

    // (0,0,0) rotates to (1,0,0) inside the footprint.
    let stone_at = BlockPos::new(101, 0, 100);
    assert_eq!(world.state(stone_at), stone());

    // The payload rides along and is re-homed onto its world position.
    let payload = world.payload(stone_at).unwrap();
    assert_eq!(read_coords(payload), Some(stone_at));
    assert_eq!(payload.get("Lock").and_then(Tag::as_str), Some("key"));

    // The observer turns with the placement: east → south.
    let observer = world.state(BlockPos::new(101, 0, 101));
    assert_eq!(observer.property("facing"), Some("south"));

    // Entity at (0.5, 0, 0.5) lands at (1.5, 0, 0.5); yaw gains 90 degrees.
    let entities = world.entities();
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0].pos, DVec3::new(101.5, 0.0, 100.5));
    assert_eq!(
        strata_tag::entity_rotation(&entities[0].data),
        Some((180.0, 0.0))
    );

    // The captured delay of 6 re-bases onto the destination clock.
    let ticks = world.ticks();
    assert_eq!(ticks.len(), 1);
    assert_eq!(ticks[0].pos, stone_at);
    assert_eq!(ticks[0].time, 56);

    // Every placed non-void cell got a deferred neighbor notification.
    assert_eq!(world.notify_count(), 4);
}

#[test]
fn test_chunk_by_chunk_equals_full_placement() {
    let mut world: GridWorld<NamedState> = GridWorld::new();
    for x in 0..24 {
        for z in 0..20 {
            if (x + z) % 3 != 0 {
                world.set_state(BlockPos::new(x, 0, z), stone());
            }
        }
    }
    world.spawn_entity(EntityRecord {
        pos: DVec3::new(18.5, 0.0, 3.5),
        data: Tag::Compound(Compound::new()),
    });
    world.schedule_update(WorldTick {
        pos: BlockPos::new(5, 0, 5),
        target: "stone".to_string(),
        priority: 1,
        time: 7,
    });
    let boxes = [CaptureBox::new(
        "field",
        BlockPos::ZERO,
        BlockPos::new(23, 0, 19),
    )];
    let structure =
        Structure::capture(&world, &boxes, BlockPos::ZERO, "field", "tester", true, 0).unwrap();

    let mut placement = Placement::from_structure(&structure, BlockPos::new(-7, 0, 13));
    placement.transform = Transform::new(Mirror::X, Rotation::Ccw90);

    let mut full: GridWorld<NamedState> = GridWorld::new();
    assert!(place(
        &mut full,
        &structure,
        &placement,
        None,
        false,
        ReplacePolicy::Always
    ));

    let mut chunked: GridWorld<NamedState> = GridWorld::new();
    for cx in -3..3 {
        for cz in -2..4 {
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

    let mut full_cells: Vec<_> = full.occupied().collect();
    let mut chunked_cells: Vec<_> = chunked.occupied().collect();
    full_cells.sort_by_key(|(p, _)| (p.y, p.z, p.x));
    chunked_cells.sort_by_key(|(p, _)| (p.y, p.z, p.x));
    assert_eq!(full_cells, chunked_cells);

    assert_eq!(full.entities().len(), 1);
    assert_eq!(chunked.entities().len(), 1);
    assert_eq!(full.entities()[0].pos, chunked.entities()[0].pos);
    assert_eq!(full.ticks().len(), 1);
    assert_eq!(chunked.ticks(), full.ticks());
}

#[test]
fn test_placement_is_idempotent() {
    let structure = capture_source();
    let placement = Placement::from_structure(&structure, BlockPos::new(8, 0, 8));

    let mut world: GridWorld<NamedState> = GridWorld::new();
    place(
        &mut world,
        &structure,
        &placement,
        None,
        false,
        ReplacePolicy::Always,
    );
    assert!(world.write_count() > 0);

    world.reset_counters();
    place(
        &mut world,
        &structure,
        &placement,
        None,
        false,
        ReplacePolicy::Always,
    );
    assert_eq!(world.write_count(), 0);
}

#[test]
fn test_replace_policies() {
    let structure = capture_source();
    let placement = Placement::from_structure(&structure, BlockPos::ZERO);
    let bedrock = NamedState::new("bedrock");

    // SkipNonEmptyDestination leaves the occupied destination cell alone.
    let mut world: GridWorld<NamedState> = GridWorld::new();
    world.set_state(BlockPos::ZERO, bedrock.clone());
    place(
        &mut world,
        &structure,
        &placement,
        None,
        false,
        ReplacePolicy::SkipNonEmptyDestination,
    );
    assert_eq!(world.state(BlockPos::ZERO), bedrock);
    assert!(!world.state(BlockPos::new(1, 0, 0)).is_empty());

    // SkipEmptySource keeps destination blocks under the structure's holes.
    let mut world: GridWorld<NamedState> = GridWorld::new();
    world.set_state(BlockPos::new(1, 0, 1), bedrock.clone());
    place(
        &mut world,
        &structure,
        &placement,
        None,
        false,
        ReplacePolicy::SkipEmptySource,
    );
    assert_eq!(world.state(BlockPos::new(1, 0, 1)), bedrock);
    assert_eq!(world.state(BlockPos::ZERO), stone());

    // Always clears destination blocks under the structure's holes.
    let mut world: GridWorld<NamedState> = GridWorld::new();
    world.set_state(BlockPos::new(1, 0, 1), bedrock);
    place(
        &mut world,
        &structure,
        &placement,
        None,
        false,
        ReplacePolicy::Always,
    );
    assert!(world.state(BlockPos::new(1, 0, 1)).is_empty());
}

#[test]
fn test_layer_range_limits_blocks_and_entities() {
    let mut world: GridWorld<NamedState> = GridWorld::new();
    for y in 0..4 {
        world.set_state(BlockPos::new(0, y, 0), stone());
    }
    world.spawn_entity(EntityRecord {
        pos: DVec3::new(0.5, 3.5, 0.5),
        data: Tag::Compound(Compound::new()),
    });
    let boxes = [CaptureBox::new(
        "tower",
        BlockPos::ZERO,
        BlockPos::new(0, 3, 0),
    )];
    let structure =
        Structure::capture(&world, &boxes, BlockPos::ZERO, "tower", "tester", true, 0).unwrap();
    let placement = Placement::from_structure(&structure, BlockPos::ZERO);

    let range = strata_math::LayerRange::new(strata_math::Axis::Y, 0, 1);
    let mut dest: GridWorld<NamedState> = GridWorld::new();
    place(
        &mut dest,
        &structure,
        &placement,
        Some(&range),
        false,
        ReplacePolicy::Always,
    );

    assert!(!dest.state(BlockPos::new(0, 1, 0)).is_empty());
    assert!(dest.state(BlockPos::new(0, 2, 0)).is_empty());
    // The entity sits at y = 3.5, outside the range.
    assert!(dest.entities().is_empty());
}

#[test]
fn test_sub_region_offset_moves_independently() {
    let structure = capture_source();
    let mut placement = Placement::from_structure(&structure, BlockPos::ZERO);
    placement.region_mut("main").unwrap().offset = BlockPos::new(5, 0, 0);

    let mut world: GridWorld<NamedState> = GridWorld::new();
    place(
        &mut world,
        &structure,
        &placement,
        None,
        false,
        ReplacePolicy::Always,
    );
    assert_eq!(world.state(BlockPos::new(5, 0, 0)), stone());
    assert!(world.state(BlockPos::ZERO).is_empty());
}

// The chunk equivalence above exercises the forward mapping; this covers the
// full capture → place → capture cycle preserving content exactly.
#[test]
fn test_recapture_after_identity_placement_matches() {
    let structure = capture_source();
    let placement = Placement::from_structure(&structure, BlockPos::new(30, 0, 30));

    let mut world: GridWorld<NamedState> = GridWorld::new();
    place(
        &mut world,
        &structure,
        &placement,
        None,
        false,
        ReplacePolicy::Always,
    );

    let boxes = [CaptureBox::new(
        "main",
        BlockPos::new(30, 0, 30),
        BlockPos::new(31, 0, 31),
    )];
    let recaptured = Structure::capture(
        &world,
        &boxes,
        BlockPos::new(30, 0, 30),
        "demo",
        "tester",
        true,
        100,
    )
    .unwrap();

    let a = structure.region("main").unwrap();
    let b = recaptured.region("main").unwrap();
    for z in 0..2 {
        for x in 0..2 {
            let p = BlockPos::new(x, 0, z);
            assert_eq!(a.container.get(p).unwrap(), b.container.get(p).unwrap());
        }
    }
    assert_eq!(a.entities.len(), b.entities.len());
    assert_eq!(a.entities[0].pos, b.entities[0].pos);
}
