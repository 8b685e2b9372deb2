use glam::Vec2;
use urban_brush_core::{
    Command, ConnectionState, Event, GridConfig, GridSnapshot, LotCoord, Percent, SecCoord,
    TransferBrush,
};
use urban_brush_world::{self as world, query, Grid};

fn grid(rows: u32, columns: u32, seed: u64) -> Grid {
    Grid::new(GridConfig {
        rows,
        columns,
        origin: Vec2::ZERO,
        lot_size: 10.0,
        seed,
        ..GridConfig::default()
    })
}

fn run(grid: &mut Grid, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(grid, command, &mut events);
    events
}

fn assert_no_dead_ends(grid: &Grid) {
    let shape = query::shape(grid);
    for sec in query::intersections(grid) {
        if shape.is_interior_sec(sec.coord()) {
            assert_ne!(
                sec.connections().open_count(),
                1,
                "dead end left at {}",
                sec.coord()
            );
        }
    }
}

fn open_count(grid: &Grid, row: u32, column: u32) -> usize {
    query::intersection(grid, SecCoord::new(row, column))
        .expect("in bounds")
        .connections()
        .open_count()
}

#[test]
fn blocking_interior_segments_only_repairs_real_dead_ends() {
    let mut grid = grid(3, 3, 1);

    let _ = grid
        .set_paired(SecCoord::new(1, 1), SecCoord::new(1, 2), ConnectionState::Blocked)
        .expect("adjacent");
    assert_eq!(open_count(&grid, 1, 1), 3);
    assert!(!grid.keep_roads_consistent().changed());

    let _ = grid
        .set_paired(SecCoord::new(0, 1), SecCoord::new(1, 1), ConnectionState::Blocked)
        .expect("adjacent");
    assert_eq!(open_count(&grid, 1, 1), 2);
    assert!(!grid.keep_roads_consistent().changed());

    let _ = grid
        .set_paired(SecCoord::new(1, 0), SecCoord::new(1, 1), ConnectionState::Blocked)
        .expect("adjacent");
    let report = grid.keep_roads_consistent();

    assert_eq!(report.blocked, 1);
    assert_eq!(open_count(&grid, 1, 1), 0);
    assert_eq!(
        grid.paired_state(SecCoord::new(1, 1), SecCoord::new(2, 1)),
        Ok(ConnectionState::Blocked)
    );
    assert_eq!(open_count(&grid, 2, 1), 3);
    assert_no_dead_ends(&grid);
}

#[test]
fn repulse_restores_what_a_saturated_ring_cannot_take() {
    let mut grid = grid(1, 2, 1);
    let snapshot = GridSnapshot {
        lots: vec![vec![200, 100]],
        secs: query::dump(&grid).secs,
    };
    let events = run(&mut grid, Command::LoadSnapshot { snapshot });
    assert_eq!(events, vec![Event::SnapshotLoaded]);

    let events = run(
        &mut grid,
        Command::RepulseLots {
            anchor: Vec2::new(5.0, 5.0),
            inner_radius: 5.0,
            outer_radius: 15.0,
            amount: Percent::FULL,
        },
    );

    assert_eq!(
        events,
        vec![Event::PopulationTransferred {
            brush: TransferBrush::Repulse,
            sources: 1,
            targets: 1,
            moved: 155,
            restored: 45,
        }]
    );
    let inner = query::lot(&grid, LotCoord::new(0, 0)).expect("in bounds");
    let outer = query::lot(&grid, LotCoord::new(0, 1)).expect("in bounds");
    assert_eq!((inner.population(), inner.buffer()), (45, 0));
    assert_eq!((outer.population(), outer.buffer()), (255, 0));
}

#[test]
fn population_brushes_never_create_population() {
    for seed in 0..8 {
        let mut grid = grid(8, 8, seed);
        let _ = run(&mut grid, Command::Randomize);

        let strokes = [
            Command::RepulseLots {
                anchor: Vec2::new(40.0, 40.0),
                inner_radius: 15.0,
                outer_radius: 35.0,
                amount: Percent::new(60),
            },
            Command::AttractLots {
                anchor: Vec2::new(22.0, 57.0),
                inner_radius: 12.0,
                outer_radius: 30.0,
                amount: Percent::new(33),
            },
            Command::DragLots {
                pickup: Vec2::new(15.0, 15.0),
                drop: Vec2::new(25.0, 15.0),
                inner_radius: 20.0,
                outer_radius: 20.0,
                amount: Percent::FULL,
            },
        ];
        for stroke in strokes {
            let before = query::total_population(&grid);
            let _ = run(&mut grid, stroke);
            assert!(query::total_population(&grid) <= before, "seed {seed}");
            assert!(query::lots(&grid).iter().all(|lot| lot.buffer() == 0));
        }
    }
}

#[test]
fn road_brushes_leave_a_consistent_network() {
    for seed in 0..8 {
        let mut grid = grid(6, 7, seed);
        let strokes = [
            Command::Randomize,
            Command::BreakRoads {
                anchor: Vec2::new(30.0, 30.0),
                radius: 16.0,
                pending: Vec::new(),
            },
            Command::ConnectRoads {
                anchor: Vec2::new(30.0, 30.0),
                inner_radius: 12.0,
                outer_radius: 40.0,
                pending: Vec::new(),
            },
            Command::BreakRoads {
                anchor: Vec2::new(52.0, 18.0),
                radius: 11.0,
                pending: Vec::new(),
            },
        ];
        for stroke in strokes {
            let _ = run(&mut grid, stroke);
            assert_no_dead_ends(&grid);
            assert!(!grid.keep_roads_consistent().changed(), "seed {seed}");
        }
    }
}

#[test]
fn marked_roads_can_be_broken_then_reconnected() {
    let mut grid = grid(4, 4, 3);
    let before = query::open_road_count(&grid);

    let events = run(
        &mut grid,
        Command::MarkRoads {
            anchor: Vec2::new(25.0, 15.0),
        },
    );
    let [Event::RoadsMarked { pairs }] = events.as_slice() else {
        panic!("unexpected events: {events:?}");
    };
    assert_eq!(pairs.len(), 4);
    let edges = query::road_edges(&grid, LotCoord::new(1, 2)).expect("in bounds");
    assert!(edges.iter().all(|edge| edge.focused));

    let events = run(
        &mut grid,
        Command::BreakRoads {
            anchor: Vec2::ZERO,
            radius: 0.0,
            pending: pairs.clone(),
        },
    );
    assert_eq!(events.first(), Some(&Event::RoadsBroken { blocked: 4 }));
    assert!(query::road_edges(&grid, LotCoord::new(1, 2))
        .expect("in bounds")
        .is_empty());

    let events = run(
        &mut grid,
        Command::ConnectRoads {
            anchor: Vec2::ZERO,
            inner_radius: 0.0,
            outer_radius: 0.0,
            pending: pairs.clone(),
        },
    );
    assert_eq!(
        events,
        vec![Event::RoadsConnected {
            activated: 4,
            rebuilt: 0,
        }]
    );
    assert_eq!(query::open_road_count(&grid), before);
}

#[test]
fn dump_and_load_round_trip_on_a_fresh_grid() {
    let mut source = grid(5, 3, 21);
    let _ = run(&mut source, Command::Randomize);
    let snapshot = query::dump(&source);

    let mut fresh = grid(5, 3, 0);
    let events = run(
        &mut fresh,
        Command::LoadSnapshot {
            snapshot: snapshot.clone(),
        },
    );

    assert_eq!(events, vec![Event::SnapshotLoaded]);
    assert_eq!(query::dump(&fresh), snapshot);
    for (left, right) in query::intersections(&source).zip(query::intersections(&fresh)) {
        assert_eq!(left.connections(), right.connections());
    }
}

#[test]
fn rejected_commands_leave_the_grid_untouched() {
    let mut grid = grid(3, 3, 4);
    let _ = run(&mut grid, Command::Randomize);
    let before = query::dump(&grid);
    let outside = grid
        .combine(SecCoord::new(3, 2), SecCoord::new(3, 3))
        .expect("adjacent");
    let stray = urban_brush_core::SecPair::vertical(SecCoord::new(3, 3));

    let events = run(
        &mut grid,
        Command::ConnectRoads {
            anchor: Vec2::ZERO,
            inner_radius: 0.0,
            outer_radius: 0.0,
            pending: vec![outside, stray],
        },
    );

    assert!(matches!(
        events.as_slice(),
        [Event::CommandRejected { .. }]
    ));
    assert_eq!(query::dump(&grid), before);
}
