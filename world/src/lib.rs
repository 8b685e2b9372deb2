#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative grid state for Urban Brush.
//!
//! The [`Grid`] owns every lot, every intersection and the seeded generator
//! used by randomized operations. Adapters mutate it exclusively through
//! [`apply`] and observe it through [`query`].

mod brush;
mod consistency;
mod intersection;
mod lot;
mod snapshot;
mod spatial;
mod transfer;

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::warn;
use urban_brush_core::{
    Command, ConnectionState, Direction, Event, GridConfig, GridError, GridShape, LotCoord, Rect,
    RoadEdge, SecCoord, SecPair,
};

pub use brush::{BreakReport, ConnectReport};
pub use consistency::RepairReport;
pub use intersection::Intersection;
pub use lot::{Lot, TransferOutcome};
pub use transfer::TransferReport;

use intersection::IntersectionLattice;

/// Represents the authoritative lot grid and its road network.
#[derive(Clone, Debug)]
pub struct Grid {
    config: GridConfig,
    shape: GridShape,
    lots: Vec<Lot>,
    secs: IntersectionLattice,
    rng: ChaCha8Rng,
}

impl Grid {
    /// Creates an empty, fully connected grid.
    #[must_use]
    pub fn new(config: GridConfig) -> Self {
        let shape = config.shape();
        let mut lots = Vec::new();
        for row in 0..shape.rows() {
            for column in 0..shape.columns() {
                let anchor =
                    config.origin + Vec2::new(column as f32, row as f32) * config.lot_size;
                lots.push(Lot::new(LotCoord::new(row, column), anchor, config.lot_size));
            }
        }
        let secs = IntersectionLattice::new(shape, config.origin, config.lot_size);
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            config,
            shape,
            lots,
            secs,
            rng,
        }
    }

    /// Dimensions of the grid in lots.
    #[must_use]
    pub const fn shape(&self) -> GridShape {
        self.shape
    }

    /// Configuration the grid was built from.
    #[must_use]
    pub const fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Lot at `coord`.
    pub fn lot(&self, coord: LotCoord) -> Result<&Lot, GridError> {
        let index = self.lot_index(coord)?;
        self.lots.get(index).ok_or(GridError::OutOfBounds {
            row: coord.row(),
            column: coord.column(),
        })
    }

    /// Every lot in row-major order.
    #[must_use]
    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    /// Intersection at `coord`.
    pub fn intersection(&self, coord: SecCoord) -> Result<&Intersection, GridError> {
        self.secs.get(coord)
    }

    /// Every intersection in row-major order.
    pub fn intersections(&self) -> impl Iterator<Item = &Intersection> {
        self.secs.iter()
    }

    /// Pairs two in-bounds, adjacent intersections.
    pub fn combine(&self, first: SecCoord, second: SecCoord) -> Result<SecPair, GridError> {
        self.secs.combine(first, second)
    }

    /// Writes `state` into both slots shared by `pair`.
    pub fn set_pair(&mut self, pair: SecPair, state: ConnectionState) -> Result<(), GridError> {
        self.secs.set_pair(pair, state)
    }

    /// Pairs two intersections and writes `state` into their shared slots.
    pub fn set_paired(
        &mut self,
        first: SecCoord,
        second: SecCoord,
        state: ConnectionState,
    ) -> Result<SecPair, GridError> {
        self.secs.set_paired(first, second, state)
    }

    /// Joint state of the road segment represented by `pair`.
    pub fn pair_state(&self, pair: SecPair) -> Result<ConnectionState, GridError> {
        self.secs.pair_state(pair)
    }

    /// Joint state of the road segment between two intersections.
    pub fn paired_state(
        &self,
        first: SecCoord,
        second: SecCoord,
    ) -> Result<ConnectionState, GridError> {
        self.secs.paired_state(first, second)
    }

    /// Joint state of the edge on the given side of a lot.
    pub fn is_road(
        &self,
        coord: LotCoord,
        direction: Direction,
    ) -> Result<ConnectionState, GridError> {
        let _ = self.lot_index(coord)?;
        self.pair_state(edge_pair(coord, direction))
    }

    /// Non-blocked edges around a lot, in east, north, west, south order.
    ///
    /// Each segment is one unit thick and lies on the lot's outermost pixels.
    pub fn road_edges(&self, coord: LotCoord) -> Result<Vec<RoadEdge>, GridError> {
        let lot = self.lot(coord)?;
        let min = lot.anchor();
        let max = lot.anchor() + Vec2::splat(lot.size() - 1.0);
        let mut edges = Vec::new();
        for direction in Direction::ALL {
            let state = self.is_road(coord, direction)?;
            if !state.is_open() {
                continue;
            }
            let segment = match direction {
                Direction::East => Rect {
                    min: Vec2::new(max.x, min.y),
                    max,
                },
                Direction::North => Rect {
                    min,
                    max: Vec2::new(max.x, min.y),
                },
                Direction::West => Rect {
                    min,
                    max: Vec2::new(min.x, max.y),
                },
                Direction::South => Rect {
                    min: Vec2::new(min.x, max.y),
                    max,
                },
            };
            edges.push(RoadEdge {
                direction,
                segment,
                focused: state == ConnectionState::Focused,
            });
        }
        Ok(edges)
    }

    /// Sum of every lot population.
    #[must_use]
    pub fn total_population(&self) -> u32 {
        self.lots.iter().map(|lot| u32::from(lot.population())).sum()
    }

    /// Number of distinct road segments whose joint state is open.
    #[must_use]
    pub fn open_road_count(&self) -> usize {
        let rows = self.shape.rows();
        let columns = self.shape.columns();
        let horizontal = (0..=rows).flat_map(move |row| {
            (0..columns).map(move |column| SecPair::horizontal(SecCoord::new(row, column)))
        });
        let vertical = (0..rows).flat_map(move |row| {
            (0..=columns).map(move |column| SecPair::vertical(SecCoord::new(row, column)))
        });
        horizontal
            .chain(vertical)
            .filter(|pair| self.pair_state(*pair).map_or(false, ConnectionState::is_open))
            .count()
    }

    fn lot_index(&self, coord: LotCoord) -> Result<usize, GridError> {
        let out_of_bounds = GridError::OutOfBounds {
            row: coord.row(),
            column: coord.column(),
        };
        if !self.shape.contains_lot(coord) {
            return Err(out_of_bounds);
        }
        let row = usize::try_from(coord.row()).map_err(|_| out_of_bounds)?;
        let column = usize::try_from(coord.column()).map_err(|_| out_of_bounds)?;
        let width = usize::try_from(self.shape.columns()).map_err(|_| out_of_bounds)?;
        Ok(row * width + column)
    }
}

/// Pair of intersections bounding the given side of a lot.
fn edge_pair(coord: LotCoord, direction: Direction) -> SecPair {
    match direction {
        Direction::East => SecPair::vertical(coord.corner(false, true)),
        Direction::North => SecPair::horizontal(coord.corner(false, false)),
        Direction::West => SecPair::vertical(coord.corner(false, false)),
        Direction::South => SecPair::horizontal(coord.corner(true, false)),
    }
}

/// Applies the provided command to the grid, mutating state deterministically.
///
/// Commands that fail validation leave the grid untouched and produce a
/// single [`Event::CommandRejected`].
pub fn apply(grid: &mut Grid, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::RepulseLots {
            anchor,
            inner_radius,
            outer_radius,
            amount,
        } => {
            let report = grid.repulse_lots(anchor, inner_radius, outer_radius, amount);
            out_events.push(report.into());
        }
        Command::AttractLots {
            anchor,
            inner_radius,
            outer_radius,
            amount,
        } => {
            let report = grid.attract_lots(anchor, inner_radius, outer_radius, amount);
            out_events.push(report.into());
        }
        Command::DragLots {
            pickup,
            drop,
            inner_radius,
            outer_radius,
            amount,
        } => {
            let report = grid.drag_lots(pickup, drop, inner_radius, outer_radius, amount);
            out_events.push(report.into());
        }
        Command::MarkRoads { anchor } => {
            let pairs = grid.mark_roads(anchor);
            out_events.push(Event::RoadsMarked { pairs });
        }
        Command::BreakRoads {
            anchor,
            radius,
            pending,
        } => match grid.break_roads(anchor, radius, &pending) {
            Ok(report) => {
                out_events.push(Event::RoadsBroken {
                    blocked: report.blocked,
                });
                out_events.extend(report.repair.event());
            }
            Err(reason) => reject(reason, out_events),
        },
        Command::ConnectRoads {
            anchor,
            inner_radius,
            outer_radius,
            pending,
        } => match grid.connect_roads(anchor, inner_radius, outer_radius, &pending) {
            Ok(report) => {
                out_events.push(Event::RoadsConnected {
                    activated: report.activated,
                    rebuilt: report.rebuilt,
                });
                out_events.extend(report.repair.event());
            }
            Err(reason) => reject(reason, out_events),
        },
        Command::Randomize => {
            let repair = grid.randomize();
            out_events.push(Event::GridRandomized);
            out_events.extend(repair.event());
        }
        Command::LoadSnapshot { snapshot } => match grid.load(&snapshot) {
            Ok(()) => out_events.push(Event::SnapshotLoaded),
            Err(reason) => reject(reason, out_events),
        },
    }
}

fn reject(reason: GridError, out_events: &mut Vec<Event>) {
    warn!(%reason, "command rejected");
    out_events.push(Event::CommandRejected { reason });
}

/// Query functions that provide read-only access to the grid state.
pub mod query {
    use glam::Vec2;
    use urban_brush_core::{
        ConnectionState, Direction, GridConfig, GridError, GridShape, GridSnapshot, LotColor,
        LotCoord, Rect, RoadEdge, SecCoord,
    };

    use super::{Grid, Intersection, Lot};

    /// Dimensions of the grid in lots.
    #[must_use]
    pub fn shape(grid: &Grid) -> GridShape {
        grid.shape()
    }

    /// Configuration the grid was built from.
    #[must_use]
    pub fn config(grid: &Grid) -> &GridConfig {
        grid.config()
    }

    /// Lot at `coord`.
    pub fn lot(grid: &Grid, coord: LotCoord) -> Result<&Lot, GridError> {
        grid.lot(coord)
    }

    /// Every lot in row-major order.
    #[must_use]
    pub fn lots(grid: &Grid) -> &[Lot] {
        grid.lots()
    }

    /// Intersection at `coord`.
    pub fn intersection(grid: &Grid, coord: SecCoord) -> Result<&Intersection, GridError> {
        grid.intersection(coord)
    }

    /// Every intersection in row-major order.
    pub fn intersections(grid: &Grid) -> impl Iterator<Item = &Intersection> {
        grid.intersections()
    }

    /// Grayscale tone of the lot at `coord`.
    pub fn lot_color(grid: &Grid, coord: LotCoord) -> Result<LotColor, GridError> {
        grid.lot(coord).map(Lot::color)
    }

    /// Lot rectangle inset by the configured margin.
    pub fn lot_body(grid: &Grid, coord: LotCoord) -> Result<Rect, GridError> {
        let margin = grid.config().lot_margin;
        grid.lot(coord).map(|lot| lot.body(margin))
    }

    /// Non-blocked edges around the lot at `coord`.
    pub fn road_edges(grid: &Grid, coord: LotCoord) -> Result<Vec<RoadEdge>, GridError> {
        grid.road_edges(coord)
    }

    /// Joint state of one edge of the lot at `coord`.
    pub fn is_road(
        grid: &Grid,
        coord: LotCoord,
        direction: Direction,
    ) -> Result<ConnectionState, GridError> {
        grid.is_road(coord, direction)
    }

    /// Lot whose centre is closest to `anchor`.
    #[must_use]
    pub fn nearest_lot(grid: &Grid, anchor: Vec2) -> Option<&Lot> {
        grid.nearest_lot(anchor)
    }

    /// Lots strictly between two distances from `anchor`, nearest first.
    #[must_use]
    pub fn lots_by_distance(grid: &Grid, anchor: Vec2, min: f32, max: f32) -> Vec<&Lot> {
        grid.lots_by_distance(anchor, min, max)
    }

    /// Intersections strictly closer than `radius`.
    #[must_use]
    pub fn secs_by_distance(grid: &Grid, anchor: Vec2, radius: f32) -> Vec<&Intersection> {
        grid.secs_by_distance(anchor, radius)
    }

    /// Ordered pairs of intersections strictly closer than `radius`.
    #[must_use]
    pub fn roads_by_distance(grid: &Grid, anchor: Vec2, radius: f32) -> Vec<(SecCoord, SecCoord)> {
        grid.roads_by_distance(anchor, radius)
    }

    /// Sum of every lot population.
    #[must_use]
    pub fn total_population(grid: &Grid) -> u32 {
        grid.total_population()
    }

    /// Number of open road segments.
    #[must_use]
    pub fn open_road_count(grid: &Grid) -> usize {
        grid.open_road_count()
    }

    /// Plain copy of every population and slot.
    #[must_use]
    pub fn dump(grid: &Grid) -> GridSnapshot {
        grid.dump()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use urban_brush_core::{GridSnapshot, Percent};

    fn small_grid() -> Grid {
        Grid::new(GridConfig {
            rows: 3,
            columns: 3,
            origin: Vec2::ZERO,
            lot_size: 10.0,
            ..GridConfig::default()
        })
    }

    #[test]
    fn new_grid_places_lots_on_the_lattice() {
        let grid = Grid::new(GridConfig::default());
        assert_eq!(grid.lots().len(), 400);
        assert_eq!(grid.intersections().count(), 441);
        let lot = grid.lot(LotCoord::new(1, 2)).expect("in bounds");
        assert_eq!(lot.anchor(), Vec2::new(83.0, 43.0));
        assert_eq!(lot.population(), 0);
        assert!(grid.lot(LotCoord::new(20, 0)).is_err());
    }

    #[test]
    fn lot_edges_follow_the_surrounding_intersections() {
        let mut grid = small_grid();
        let lot = LotCoord::new(1, 1);
        let _ = grid
            .set_paired(SecCoord::new(1, 2), SecCoord::new(2, 2), ConnectionState::Blocked)
            .expect("adjacent");
        let _ = grid
            .set_paired(SecCoord::new(1, 1), SecCoord::new(1, 2), ConnectionState::Focused)
            .expect("adjacent");

        assert_eq!(grid.is_road(lot, Direction::East), Ok(ConnectionState::Blocked));
        assert_eq!(grid.is_road(lot, Direction::North), Ok(ConnectionState::Focused));
        assert_eq!(grid.is_road(lot, Direction::West), Ok(ConnectionState::Active));

        let edges = grid.road_edges(lot).expect("in bounds");
        let directions: Vec<Direction> = edges.iter().map(|edge| edge.direction).collect();
        assert_eq!(directions, vec![Direction::North, Direction::West, Direction::South]);
        assert!(edges[0].focused);
        assert_eq!(
            edges[0].segment,
            Rect {
                min: Vec2::new(10.0, 10.0),
                max: Vec2::new(19.0, 10.0),
            }
        );
        assert_eq!(
            edges[2].segment,
            Rect {
                min: Vec2::new(10.0, 19.0),
                max: Vec2::new(19.0, 19.0),
            }
        );
    }

    #[test]
    fn open_road_count_covers_every_segment_once() {
        let mut grid = small_grid();
        assert_eq!(grid.open_road_count(), 24);
        let _ = grid
            .set_paired(SecCoord::new(1, 1), SecCoord::new(1, 2), ConnectionState::Blocked)
            .expect("adjacent");
        assert_eq!(grid.open_road_count(), 23);
        assert_eq!(
            grid.paired_state(SecCoord::new(1, 2), SecCoord::new(1, 1)),
            Ok(ConnectionState::Blocked)
        );
    }

    #[test]
    fn apply_reports_population_transfers() {
        let mut grid = small_grid();
        grid.lots[4].set_population(100);
        let mut events = Vec::new();

        apply(
            &mut grid,
            Command::RepulseLots {
                anchor: Vec2::new(15.0, 15.0),
                inner_radius: 5.0,
                outer_radius: 11.0,
                amount: Percent::new(40),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::PopulationTransferred {
                brush: urban_brush_core::TransferBrush::Repulse,
                sources: 1,
                targets: 4,
                moved: 40,
                restored: 0,
            }]
        );
        assert_eq!(grid.total_population(), 100);
    }

    #[test]
    fn apply_turns_failures_into_rejections() {
        let mut grid = small_grid();
        let mut events = Vec::new();

        apply(
            &mut grid,
            Command::LoadSnapshot {
                snapshot: GridSnapshot::default(),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::CommandRejected {
                reason: GridError::ShapeMismatch {
                    expected: GridShape::new(3, 3),
                    found: GridShape::new(0, 0),
                },
            }]
        );
    }

    #[test]
    fn apply_break_then_reports_the_repair() {
        let mut grid = small_grid();
        let mut events = Vec::new();
        let first = grid
            .combine(SecCoord::new(1, 1), SecCoord::new(1, 2))
            .expect("adjacent");
        let second = grid
            .combine(SecCoord::new(0, 1), SecCoord::new(1, 1))
            .expect("adjacent");
        let third = grid
            .combine(SecCoord::new(1, 0), SecCoord::new(1, 1))
            .expect("adjacent");

        // Only the southern slot of (1, 1) stays open, leaving a dead end.
        apply(
            &mut grid,
            Command::BreakRoads {
                anchor: Vec2::ZERO,
                radius: 0.0,
                pending: vec![first, second, third],
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::RoadsBroken { blocked: 3 },
                Event::RoadsRepaired {
                    passes: 1,
                    blocked: 1,
                },
            ]
        );
    }
}
