use glam::{IVec2, IVec4};
use isle_core::{
    Building, BuildingId, Command, Context, Event, FootprintSize, IslandId, PlacementError,
    RemovalError, Rotation, WorldPosition, Zoom,
};
use isle_world::{
    apply,
    file::{IslandRecord, LayerRecord, MapFile, TileRecord},
    query, Catalog, IslandError, LayerError, LayerKind, World, WorldConfig, WorldError, MAP_VERSION,
};

const WORLD_SIDE: i32 = 50;
const ISLAND_WIDTH: i32 = 6;
const ISLAND_HEIGHT: i32 = 5;
const HOUSE: BuildingId = BuildingId::new(900);
const HUT: BuildingId = BuildingId::new(901);
const WAREHOUSE: BuildingId = BuildingId::new(1012);

fn definition(id: u32, gfx: i32, width: i32, height: i32, rotate: i32, posoffs: i32) -> Building {
    Building {
        id: BuildingId::new(id),
        gfx,
        size: FootprintSize::new(width, height),
        rotate,
        posoffs,
    }
}

fn catalog() -> Catalog {
    let mut catalog = Catalog::new(1000);
    for entry in [
        definition(101, 4, 1, 1, 0, 20),
        definition(1201, 758, 1, 1, 0, 0),
        definition(1203, 20, 1, 1, 0, 0),
        definition(1205, 30, 1, 1, 0, 0),
        definition(900, 100, 2, 1, 2, 20),
        definition(901, 200, 2, 1, 0, 20),
        definition(1012, 300, 3, 2, 6, 20),
    ] {
        catalog.insert_building(entry);
    }
    catalog
}

fn tile(id: i64) -> Option<TileRecord> {
    Some(TileRecord {
        id: Some(id),
        rotation: Some(0),
        x: Some(0),
        y: Some(0),
        connected: Some(Vec::new()),
    })
}

/// Grass everywhere except a beach cell in the top-left corner, shallow
/// water along the coast.
fn island(x: i32, y: i32) -> IslandRecord {
    let cells = ISLAND_WIDTH * ISLAND_HEIGHT;
    let coast = (0..cells)
        .map(|index| {
            let (cx, cy) = (index % ISLAND_WIDTH, index / ISLAND_WIDTH);
            let border = cx == 0 || cy == 0 || cx == ISLAND_WIDTH - 1 || cy == ISLAND_HEIGHT - 1;
            if border {
                tile(1203)
            } else {
                None
            }
        })
        .collect();
    let terrain = (0..cells)
        .map(|index| if index == 0 { tile(1205) } else { tile(101) })
        .collect();
    let buildings = (0..cells).map(|_| None).collect();

    IslandRecord {
        width: ISLAND_WIDTH,
        height: ISLAND_HEIGHT,
        x,
        y,
        climate: Some("south".to_owned()),
        layers: vec![
            LayerRecord::Coast(coast),
            LayerRecord::Terrain(terrain),
            LayerRecord::Buildings(buildings),
        ],
    }
}

fn map_with(islands: Vec<IslandRecord>) -> MapFile {
    let mut map = MapFile::new(MAP_VERSION, WORLD_SIDE, WORLD_SIDE);
    map.islands = islands;
    map
}

fn world(catalog: &Catalog) -> World {
    let ctx = Context::from_catalog(catalog);
    World::from_map(&map_with(vec![island(2, 2)]), &ctx, &WorldConfig::default())
        .expect("fixture world builds")
}

fn run(world: &mut World, catalog: &Catalog, command: Command) -> Vec<Event> {
    let ctx = Context::from_catalog(catalog);
    let mut events = Vec::new();
    apply(world, command, &ctx, &mut events).expect("fixture content is valid");
    events
}

fn place(building: BuildingId, x: i32, y: i32, rotation: Rotation) -> Command {
    Command::PlaceBuilding {
        building,
        origin: WorldPosition::new(x, y),
        rotation,
    }
}

fn slot(world: &World, kind: LayerKind, x: i32, y: i32, rotation: Rotation) -> usize {
    let island = query::island_at(world, WorldPosition::new(x, y)).expect("island");
    island
        .layer(kind)
        .and_then(|layer| layer.instance_id(IVec2::new(x, y), rotation))
        .expect("instance slot")
}

#[test]
fn placing_a_building_patches_buildings_and_mixed_layers() {
    let catalog = catalog();
    let mut world = world(&catalog);

    let events = run(&mut world, &catalog, place(HOUSE, 3, 3, Rotation::Deg0));

    assert_eq!(
        events,
        vec![Event::BuildingPlaced {
            island: IslandId::new(0),
            building: HOUSE,
            origin: WorldPosition::new(3, 3),
            rotation: Rotation::Deg0,
            cells: vec![WorldPosition::new(3, 3), WorldPosition::new(4, 3)],
        }]
    );

    let island = &query::islands(&world)[0];
    let house_gfx: Vec<i32> = Rotation::ALL
        .iter()
        .map(|rotation| {
            let instance = slot(&world, LayerKind::Buildings, 3, 3, *rotation);
            island.buildings().gfx_numbers()[instance][rotation.index()]
        })
        .collect();
    assert_eq!(house_gfx, vec![100, 102, 104, 106]);
    let right = slot(&world, LayerKind::Buildings, 4, 3, Rotation::Deg0);
    assert_eq!(island.buildings().gfx_numbers()[right].x, 101);
    assert_eq!(island.buildings().building_ids()[right].x, 900);

    for rotation in Rotation::ALL {
        let r = rotation.index();
        let buildings_slot = slot(&world, LayerKind::Buildings, 4, 3, rotation);
        let mixed_slot = slot(&world, LayerKind::Mixed, 4, 3, rotation);
        assert_eq!(buildings_slot, mixed_slot, "mixed shares the island's render order");
        assert_eq!(
            island.mixed().gfx_numbers()[mixed_slot][r],
            island.buildings().gfx_numbers()[buildings_slot][r],
            "mixed shows the building under {rotation:?}"
        );
        assert_eq!(
            island.mixed().model_matrices(Zoom::Gfx, rotation)[mixed_slot],
            island.buildings().model_matrices(Zoom::Gfx, rotation)[buildings_slot]
        );

        let grass = slot(&world, LayerKind::Mixed, 5, 4, rotation);
        assert_eq!(island.mixed().gfx_numbers()[grass][r], 4, "grass elsewhere");
    }
}

#[test]
fn replacing_a_building_reuses_the_gpu_slots() {
    let catalog = catalog();
    let mut world = world(&catalog);
    let _ = run(&mut world, &catalog, place(HOUSE, 3, 3, Rotation::Deg0));

    let slots_before: Vec<usize> = Rotation::ALL
        .iter()
        .flat_map(|rotation| {
            [(3, 3), (4, 3)].map(|(x, y)| slot(&world, LayerKind::Buildings, x, y, *rotation))
        })
        .collect();
    let matrices_before = query::islands(&world)[0]
        .buildings()
        .model_matrices(Zoom::Mgfx, Rotation::Deg180)
        .len();

    let removed = run(
        &mut world,
        &catalog,
        Command::RemoveBuilding {
            position: WorldPosition::new(4, 3),
        },
    );
    assert!(matches!(
        removed.as_slice(),
        [Event::BuildingRemoved { building, cells, .. }] if *building == HOUSE && cells.len() == 2
    ));
    let _ = run(&mut world, &catalog, place(HUT, 3, 3, Rotation::Deg0));

    let slots_after: Vec<usize> = Rotation::ALL
        .iter()
        .flat_map(|rotation| {
            [(3, 3), (4, 3)].map(|(x, y)| slot(&world, LayerKind::Buildings, x, y, *rotation))
        })
        .collect();
    let island = &query::islands(&world)[0];
    assert_eq!(slots_after, slots_before);
    assert_eq!(
        island
            .buildings()
            .model_matrices(Zoom::Mgfx, Rotation::Deg180)
            .len(),
        matrices_before
    );
    assert_eq!(island.buildings().building_ids()[slots_after[0]].x, 901);
    assert_eq!(
        island.buildings().gfx_numbers()[slots_after[0]].x,
        200,
        "non-rotatable buildings keep one graphic"
    );
}

#[test]
fn invalid_placements_are_rejected_without_mutation() {
    let catalog = catalog();
    let mut world = world(&catalog);
    let _ = run(&mut world, &catalog, place(HOUSE, 3, 3, Rotation::Deg0));
    let before = query::islands(&world)[0].buildings().gfx_numbers().to_vec();

    let cases = [
        (place(BuildingId::new(4242), 5, 5, Rotation::Deg0), PlacementError::UnknownBuilding),
        (place(HOUSE, 40, 40, Rotation::Deg0), PlacementError::NoIsland),
        (place(HOUSE, 2, 2, Rotation::Deg0), PlacementError::NotBuildable),
        (place(WAREHOUSE, 6, 5, Rotation::Deg0), PlacementError::OutOfBounds),
        (place(HUT, 4, 3, Rotation::Deg0), PlacementError::Occupied),
    ];

    for (command, expected) in cases {
        let events = run(&mut world, &catalog, command);
        assert!(
            matches!(
                events.as_slice(),
                [Event::BuildingPlacementRejected { reason, .. }] if *reason == expected
            ),
            "expected {expected:?}, got {events:?}"
        );
    }

    assert_eq!(query::islands(&world)[0].buildings().gfx_numbers(), before.as_slice());
}

#[test]
fn quarter_turns_swap_the_footprint_extent() {
    let catalog = catalog();
    let mut world = world(&catalog);
    let warehouse = definition(1012, 300, 3, 2, 6, 20);

    assert_eq!(
        query::is_buildable_at(&world, WorldPosition::new(6, 3), &warehouse, Rotation::Deg0, &catalog),
        Err(PlacementError::OutOfBounds),
        "three columns starting at island column 4 leave the island"
    );
    assert_eq!(
        query::is_buildable_at(&world, WorldPosition::new(6, 3), &warehouse, Rotation::Deg90, &catalog),
        Ok(())
    );

    let events = run(&mut world, &catalog, place(WAREHOUSE, 6, 3, Rotation::Deg90));
    let Some(Event::BuildingPlaced { cells, .. }) = events.first() else {
        panic!("expected a placement, got {events:?}");
    };
    assert_eq!(cells.len(), 6);
    assert!(cells.contains(&WorldPosition::new(7, 5)));

    let corner = query::tile(&world, LayerKind::Buildings, WorldPosition::new(7, 5)).expect("tile");
    assert_eq!(corner.local_offset(), IVec2::new(1, 2));
    assert_eq!(corner.rotation(), Rotation::Deg90);
    assert_eq!(corner.connected().len(), 5);
}

#[test]
fn removal_requires_a_building() {
    let catalog = catalog();
    let mut world = world(&catalog);

    let events = run(
        &mut world,
        &catalog,
        Command::RemoveBuilding {
            position: WorldPosition::new(4, 4),
        },
    );
    assert_eq!(
        events,
        vec![Event::BuildingRemovalRejected {
            position: WorldPosition::new(4, 4),
            reason: RemovalError::MissingBuilding,
        }]
    );
}

#[test]
fn selection_marks_every_cell_of_the_building() {
    let catalog = catalog();
    let mut world = world(&catalog);
    let _ = run(&mut world, &catalog, place(HOUSE, 3, 3, Rotation::Deg0));

    let events = run(
        &mut world,
        &catalog,
        Command::SelectBuilding {
            position: WorldPosition::new(4, 3),
        },
    );
    assert_eq!(
        events,
        vec![Event::SelectionChanged {
            island: Some(IslandId::new(0)),
            cells: vec![WorldPosition::new(4, 3), WorldPosition::new(3, 3)],
        }]
    );

    for rotation in Rotation::ALL {
        for kind in [LayerKind::Buildings, LayerKind::Mixed] {
            let island = &query::islands(&world)[0];
            let layer = island.layer(kind).expect("island layer");
            let selected = layer.selected()[slot(&world, kind, 3, 3, rotation)];
            assert_eq!(selected[rotation.index()], 1, "{kind:?} under {rotation:?}");
        }
    }

    let _ = run(&mut world, &catalog, Command::ClearSelection);
    let island = &query::islands(&world)[0];
    assert!(island.buildings().selected().iter().all(|flags| *flags == IVec4::ZERO));
    assert!(island.mixed().selected().iter().all(|flags| *flags == IVec4::ZERO));
    assert!(query::selection(&world).is_empty());
}

#[test]
fn removing_the_selected_building_clears_the_selection() {
    let catalog = catalog();
    let mut world = world(&catalog);
    let _ = run(&mut world, &catalog, place(HOUSE, 3, 3, Rotation::Deg0));
    let _ = run(
        &mut world,
        &catalog,
        Command::SelectBuilding {
            position: WorldPosition::new(3, 3),
        },
    );

    let events = run(
        &mut world,
        &catalog,
        Command::RemoveBuilding {
            position: WorldPosition::new(3, 3),
        },
    );

    assert_eq!(
        events.first(),
        Some(&Event::SelectionChanged {
            island: None,
            cells: Vec::new()
        })
    );
    assert!(query::selection(&world).is_empty());
    assert!(query::islands(&world)[0]
        .mixed()
        .selected()
        .iter()
        .all(|flags| *flags == IVec4::ZERO));
}

#[test]
fn saved_maps_restore_the_same_buildings() {
    let catalog = catalog();
    let ctx = Context::from_catalog(&catalog);
    let mut world = world(&catalog);
    let _ = run(&mut world, &catalog, place(WAREHOUSE, 4, 3, Rotation::Deg90));
    let _ = run(&mut world, &catalog, place(HUT, 3, 6, Rotation::Deg0));

    let saved = world.to_map_file();
    let json = saved.to_json_string().expect("map serializes");
    let parsed = MapFile::from_json_str(&json, MAP_VERSION).expect("map parses");
    let restored = World::from_map(&parsed, &ctx, &WorldConfig::default()).expect("map loads");

    assert_eq!(restored.to_map_file(), saved);
    let tile = query::tile(&restored, LayerKind::Buildings, WorldPosition::new(5, 5))
        .expect("warehouse tile");
    assert_eq!(tile.building(), Some(WAREHOUSE));
    assert_eq!(tile.rotation(), Rotation::Deg90);

    let original = &query::islands(&world)[0];
    let reloaded = &query::islands(&restored)[0];
    assert_eq!(reloaded.climate(), Some("south"));
    assert_eq!(reloaded.buildings().gfx_numbers(), original.buildings().gfx_numbers());
    assert_eq!(reloaded.mixed().building_ids(), original.mixed().building_ids());
}

#[test]
fn saving_and_loading_goes_through_the_file_system() {
    let catalog = catalog();
    let ctx = Context::from_catalog(&catalog);
    let mut world = world(&catalog);
    let _ = run(&mut world, &catalog, place(HOUSE, 5, 4, Rotation::Deg180));

    let path = std::env::temp_dir().join(format!("isle-world-{}.map", std::process::id()));
    world.save(&path).expect("world saves");
    let loaded = World::load(&path, &ctx, &WorldConfig::default()).expect("world loads");
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded.to_map_file(), world.to_map_file());
}

#[test]
fn islands_must_fit_the_world_without_overlapping() {
    let catalog = catalog();
    let ctx = Context::from_catalog(&catalog);
    let config = WorldConfig::default();

    let outside = World::from_map(&map_with(vec![island(46, 0)]), &ctx, &config);
    assert!(matches!(outside, Err(WorldError::IslandOutsideWorld { index: 0 })));

    let overlapping = World::from_map(&map_with(vec![island(0, 0), island(5, 4)]), &ctx, &config);
    assert!(matches!(
        overlapping,
        Err(WorldError::OverlappingIslands { first: 0, second: 1 })
    ));

    let mut incomplete = island(0, 0);
    incomplete.layers.pop();
    let missing = World::from_map(&map_with(vec![incomplete]), &ctx, &config);
    assert!(matches!(
        missing,
        Err(WorldError::Island {
            index: 0,
            source: IslandError::MissingLayer { name: "buildings" }
        })
    ));
}

fn house_record(x: i32, connected: Vec<i32>) -> Option<TileRecord> {
    Some(TileRecord {
        id: Some(i64::from(HOUSE.get())),
        rotation: Some(0),
        x: Some(x),
        y: Some(0),
        connected: Some(connected),
    })
}

#[test]
fn broken_building_connections_fail_the_load() {
    let catalog = catalog();
    let ctx = Context::from_catalog(&catalog);
    let config = WorldConfig::default();
    let with_buildings = |cells: Vec<(usize, Option<TileRecord>)>| {
        let mut record = island(2, 2);
        let mut buildings = vec![None; (ISLAND_WIDTH * ISLAND_HEIGHT) as usize];
        for (index, tile) in cells {
            buildings[index] = tile;
        }
        record.layers[2] = LayerRecord::Buildings(buildings);
        World::from_map(&map_with(vec![record]), &ctx, &config)
    };

    let outside = with_buildings(vec![(7, house_record(0, vec![999]))]);
    assert!(
        matches!(
            outside,
            Err(WorldError::Island {
                index: 0,
                source: IslandError::Layer(LayerError::InvalidConnection {
                    x: 1,
                    y: 1,
                    index: 999
                })
            })
        ),
        "{outside:?}"
    );

    let foreign = with_buildings(vec![(7, house_record(0, vec![8])), (8, tile(901))]);
    assert!(
        matches!(
            foreign,
            Err(WorldError::Island {
                source: IslandError::Layer(LayerError::InvalidConnection { index: 8, .. }),
                ..
            })
        ),
        "{foreign:?}"
    );

    let mut world = with_buildings(vec![
        (7, house_record(0, vec![8])),
        (8, house_record(1, vec![7])),
    ])
    .expect("a consistent building loads");
    let events = run(
        &mut world,
        &catalog,
        Command::SelectBuilding {
            position: WorldPosition::new(4, 3),
        },
    );
    assert_eq!(
        events,
        vec![Event::SelectionChanged {
            island: Some(IslandId::new(0)),
            cells: vec![WorldPosition::new(4, 3), WorldPosition::new(3, 3)],
        }]
    );
}

#[test]
fn selecting_an_empty_cell_replaces_the_previous_selection() {
    let catalog = catalog();
    let mut world = world(&catalog);
    let _ = run(&mut world, &catalog, place(HOUSE, 3, 3, Rotation::Deg0));
    let _ = run(
        &mut world,
        &catalog,
        Command::SelectBuilding {
            position: WorldPosition::new(3, 3),
        },
    );

    let events = run(
        &mut world,
        &catalog,
        Command::SelectBuilding {
            position: WorldPosition::new(5, 5),
        },
    );
    assert_eq!(
        events,
        vec![Event::SelectionChanged {
            island: None,
            cells: Vec::new()
        }]
    );
    assert!(query::selection(&world).is_empty());
    assert!(query::islands(&world)[0]
        .buildings()
        .selected()
        .iter()
        .all(|flags| *flags == IVec4::ZERO));
}

#[test]
fn world_scale_layers_cover_the_sea_and_every_cell() {
    let catalog = catalog();
    let world = world(&catalog);
    let cells = usize::try_from(WORLD_SIDE * WORLD_SIDE).expect("positive");
    let island_cells = usize::try_from(ISLAND_WIDTH * ISLAND_HEIGHT).expect("positive");

    assert_eq!(query::deep_water(&world).instances(), cells - island_cells);
    assert_eq!(query::world_grid(&world).instances(), cells);
    assert!(query::deep_water(&world)
        .tile_at_world(IVec2::new(3, 3))
        .is_none());

    let island = &query::islands(&world)[0];
    assert_eq!(island.grid().instances(), island_cells - 1, "beach is not buildable");
    assert_eq!(
        query::instance_id(&world, LayerKind::DeepWater, WorldPosition::new(0, 0)),
        Some(0)
    );
}

#[test]
fn island_layers_sort_consistently_for_every_rotation() {
    let catalog = catalog();
    let world = world(&catalog);
    let island = &query::islands(&world)[0];

    for kind in [LayerKind::Coast, LayerKind::Terrain, LayerKind::Buildings, LayerKind::Mixed] {
        let layer = island.layer(kind).expect("island layer");
        for rotation in Rotation::ALL {
            let order: Vec<_> = layer.sorted_tiles(rotation).collect();
            assert_eq!(order.len(), 30);
            assert!(order
                .windows(2)
                .all(|pair| pair[0].index(rotation) < pair[1].index(rotation)));
            for (instance, tile) in order.iter().enumerate() {
                assert_eq!(tile.instance_id(rotation), instance, "{kind:?} {rotation:?}");
            }
        }
    }
}

#[test]
fn coast_bounds_enclose_the_island_for_every_view() {
    let catalog = catalog();
    let world = world(&catalog);
    let island = &query::islands(&world)[0];

    for zoom in Zoom::ALL {
        for rotation in Rotation::ALL {
            let bounds = island.screen_bounds(zoom, rotation).expect("bounds");
            for matrix in island.terrain().model_matrices(zoom, rotation) {
                assert!(matrix.w_axis.x >= bounds.min.x);
                assert!(matrix.w_axis.x + matrix.x_axis.x <= bounds.max.x);
            }
            let coast = island.coast().model_matrices(zoom, rotation);
            let right_edge = coast
                .iter()
                .map(|matrix| matrix.w_axis.x)
                .fold(f32::MIN, f32::max);
            assert!(
                bounds.max.x > right_edge,
                "{zoom:?} {rotation:?} bounds include the sprite width"
            );
        }
    }
}
