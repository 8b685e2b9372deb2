#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Urban Brush engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative grid, and pure systems. Adapters submit [`Command`] values
//! describing brush strokes, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values describing what
//! changed. Systems consume event streams and respond with new command
//! batches; renderers only ever read derived state.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest population a single lot can hold.
pub const POPULATION_MAX: u8 = 255;

/// Commands that express all permissible grid mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Pushes population from the inner disc outward into the surrounding annulus.
    RepulseLots {
        /// Pointer position the brush is centred on.
        anchor: Vec2,
        /// Radius of the source disc.
        inner_radius: f32,
        /// Outer radius of the target annulus.
        outer_radius: f32,
        /// Share of each source lot's population placed in transit.
        amount: Percent,
    },
    /// Pulls population from the annulus inward into the inner disc.
    AttractLots {
        /// Pointer position the brush is centred on.
        anchor: Vec2,
        /// Radius of the target disc.
        inner_radius: f32,
        /// Outer radius of the source annulus.
        outer_radius: f32,
        /// Share of each source lot's population placed in transit.
        amount: Percent,
    },
    /// Picks population up around one point and deposits it around another.
    DragLots {
        /// Centre of the disc population is taken from.
        pickup: Vec2,
        /// Centre of the disc population is dropped into.
        drop: Vec2,
        /// Radius of the pickup disc.
        inner_radius: f32,
        /// Radius of the drop disc.
        outer_radius: f32,
        /// Share of each source lot's population placed in transit.
        amount: Percent,
    },
    /// Highlights the road segments around the anchor as a pending selection.
    MarkRoads {
        /// Pointer position the selection is centred on.
        anchor: Vec2,
    },
    /// Blocks road segments, either the pending selection or everything in range.
    BreakRoads {
        /// Pointer position the brush is centred on.
        anchor: Vec2,
        /// Radius used when no pending selection is supplied.
        radius: f32,
        /// Previously marked pairs; takes precedence over the radius when non-empty.
        pending: Vec<SecPair>,
    },
    /// Opens road segments, either the pending selection or by rebuilding a neighbourhood.
    ConnectRoads {
        /// Pointer position the brush is centred on.
        anchor: Vec2,
        /// Radius of the intersections that receive a sampled style.
        inner_radius: f32,
        /// Radius of the intersections styles are sampled from.
        outer_radius: f32,
        /// Previously marked pairs; takes precedence over the rebuild when non-empty.
        pending: Vec<SecPair>,
    },
    /// Randomizes populations and the road network.
    Randomize,
    /// Overwrites the grid with a previously dumped snapshot.
    LoadSnapshot {
        /// Snapshot whose shape must match the live grid.
        snapshot: GridSnapshot,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Reports the outcome of a population brush.
    PopulationTransferred {
        /// Brush that moved the population.
        brush: TransferBrush,
        /// Number of lots that contributed population.
        sources: usize,
        /// Number of lots eligible to receive population.
        targets: usize,
        /// Units delivered into target lots.
        moved: u32,
        /// Reserved units that could not be placed and returned to their source.
        restored: u32,
    },
    /// Confirms that road segments were highlighted as a pending selection.
    RoadsMarked {
        /// Pairs that now carry the focused state.
        pairs: Vec<SecPair>,
    },
    /// Confirms that road segments were blocked by a break brush.
    RoadsBroken {
        /// Number of distinct pairs the brush blocked.
        blocked: usize,
    },
    /// Confirms that road segments were opened by a connect brush.
    RoadsConnected {
        /// Number of distinct pairs the brush forced open.
        activated: usize,
        /// Number of intersections that received a sampled style.
        rebuilt: usize,
    },
    /// Reports that the consistency pass erased dead ends.
    RoadsRepaired {
        /// Number of passes that blocked at least one pair.
        passes: u32,
        /// Number of pairs blocked across all passes.
        blocked: u32,
    },
    /// Announces that populations and roads were randomized.
    GridRandomized,
    /// Announces that a snapshot replaced the grid state.
    SnapshotLoaded,
    /// Reports that a command was rejected without mutating the grid.
    CommandRejected {
        /// Specific reason the command failed.
        reason: GridError,
    },
}

/// Population brushes that share the transfer protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferBrush {
    /// Inner disc towards the outer annulus.
    Repulse,
    /// Outer annulus towards the inner disc.
    Attract,
    /// Pickup disc towards the drop disc.
    Drag,
}

/// Errors reported when a grid operation receives malformed input.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridError {
    /// The two intersections are not unit-distance neighbours.
    #[error("intersections {first} and {second} are not adjacent")]
    NotAdjacent {
        /// First intersection supplied to the pairing.
        first: SecCoord,
        /// Second intersection supplied to the pairing.
        second: SecCoord,
    },
    /// The coordinate lies outside the lattice it addresses.
    #[error("coordinate ({row}, {column}) lies outside the lattice")]
    OutOfBounds {
        /// Row of the offending coordinate.
        row: u32,
        /// Column of the offending coordinate.
        column: u32,
    },
    /// The snapshot dimensions disagree with the live grid.
    #[error("snapshot shape {found} does not match grid shape {expected}")]
    ShapeMismatch {
        /// Shape of the live grid.
        expected: GridShape,
        /// Shape described by the snapshot.
        found: GridShape,
    },
}

/// Raised when a serialized connection state carries an unknown ordinal.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("connection state ordinal {0} is not one of 0, 1 or 2")]
pub struct InvalidConnectionState(pub u8);

/// State of one directional road slot on an intersection.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(into = "u8", try_from = "u8")]
pub enum ConnectionState {
    /// No road leaves the intersection in this direction.
    Blocked,
    /// A road leaves the intersection in this direction.
    #[default]
    Active,
    /// A road leaves the intersection and is highlighted as a pending selection.
    Focused,
}

impl ConnectionState {
    /// Numeric ordinal of the state (0, 1 or 2).
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::Blocked => 0,
            Self::Active => 1,
            Self::Focused => 2,
        }
    }

    /// Reports whether a road leaves the intersection through this slot.
    #[must_use]
    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Blocked)
    }

    /// Joint state of the two slots that represent one road segment.
    ///
    /// A segment is blocked as soon as either side is blocked. Otherwise it
    /// reads as focused when either side carries the highlight, so a focused
    /// segment is never mistaken for a missing one.
    #[must_use]
    pub fn joint(self, other: Self) -> Self {
        match (self, other) {
            (Self::Blocked, _) | (_, Self::Blocked) => Self::Blocked,
            (Self::Focused, _) | (_, Self::Focused) => Self::Focused,
            _ => Self::Active,
        }
    }
}

impl From<ConnectionState> for u8 {
    fn from(state: ConnectionState) -> Self {
        state.ordinal()
    }
}

impl TryFrom<u8> for ConnectionState {
    type Error = InvalidConnectionState;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Blocked),
            1 => Ok(Self::Active),
            2 => Ok(Self::Focused),
            other => Err(InvalidConnectionState(other)),
        }
    }
}

/// Cardinal directions of an intersection's road slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Towards increasing column indices.
    East,
    /// Towards decreasing row indices.
    North,
    /// Towards decreasing column indices.
    West,
    /// Towards increasing row indices.
    South,
}

impl Direction {
    /// Every direction in slot order (east, north, west, south).
    pub const ALL: [Direction; 4] = [
        Direction::East,
        Direction::North,
        Direction::West,
        Direction::South,
    ];

    /// Direction pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::East => Self::West,
            Self::North => Self::South,
            Self::West => Self::East,
            Self::South => Self::North,
        }
    }

    /// Axis a road segment in this direction runs along.
    #[must_use]
    pub const fn orientation(self) -> Orientation {
        match self {
            Self::East | Self::West => Orientation::Horizontal,
            Self::North | Self::South => Orientation::Vertical,
        }
    }
}

/// Axis along which two adjacent intersections are paired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Orientation {
    /// Same row, neighbouring columns.
    Horizontal,
    /// Same column, neighbouring rows.
    Vertical,
}

/// The four directional slots carried by an intersection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connections {
    /// Slot towards the eastern neighbour.
    pub east: ConnectionState,
    /// Slot towards the northern neighbour.
    pub north: ConnectionState,
    /// Slot towards the western neighbour.
    pub west: ConnectionState,
    /// Slot towards the southern neighbour.
    pub south: ConnectionState,
}

impl Connections {
    /// Creates a slot set with every direction in the same state.
    #[must_use]
    pub const fn uniform(state: ConnectionState) -> Self {
        Self {
            east: state,
            north: state,
            west: state,
            south: state,
        }
    }

    /// Creates a slot set from an `(east, north, west, south)` tuple.
    #[must_use]
    pub const fn from_array(slots: [ConnectionState; 4]) -> Self {
        let [east, north, west, south] = slots;
        Self {
            east,
            north,
            west,
            south,
        }
    }

    /// Slots as an `(east, north, west, south)` tuple.
    #[must_use]
    pub const fn to_array(self) -> [ConnectionState; 4] {
        [self.east, self.north, self.west, self.south]
    }

    /// State of the slot facing `direction`.
    #[must_use]
    pub const fn get(&self, direction: Direction) -> ConnectionState {
        match direction {
            Direction::East => self.east,
            Direction::North => self.north,
            Direction::West => self.west,
            Direction::South => self.south,
        }
    }

    /// Overwrites the slot facing `direction`.
    pub fn set(&mut self, direction: Direction, state: ConnectionState) {
        match direction {
            Direction::East => self.east = state,
            Direction::North => self.north = state,
            Direction::West => self.west = state,
            Direction::South => self.south = state,
        }
    }

    /// Number of slots that are not blocked.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.to_array()
            .iter()
            .filter(|state| state.is_open())
            .count()
    }

    /// Sum of the slot ordinals.
    #[must_use]
    pub fn ordinal_sum(&self) -> u8 {
        self.to_array().iter().map(|state| state.ordinal()).sum()
    }

    /// Directions whose slot is not blocked, in slot order.
    pub fn open_directions(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL
            .into_iter()
            .filter(|direction| self.get(*direction).is_open())
    }
}

impl Default for Connections {
    fn default() -> Self {
        Self::uniform(ConnectionState::Active)
    }
}

/// Location of a lot expressed as row and column indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LotCoord {
    row: u32,
    column: u32,
}

impl LotCoord {
    /// Creates a new lot coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the lot.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the lot.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Intersection at the given corner of the lot.
    #[must_use]
    pub const fn corner(&self, south: bool, east: bool) -> SecCoord {
        SecCoord::new(self.row + south as u32, self.column + east as u32)
    }
}

impl fmt::Display for LotCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// Location of an intersection on the dual lattice.
///
/// Ordering is row-major, which is also the order in which the earlier
/// member of an adjacent pair is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SecCoord {
    row: u32,
    column: u32,
}

impl SecCoord {
    /// Creates a new intersection coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the intersection.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the intersection.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }
}

impl fmt::Display for SecCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// Two adjacent intersections that jointly represent one road segment.
///
/// Serialized as its two members; deserializing goes through
/// [`SecPair::combine`] so a decoded pair is always adjacent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "(SecCoord, SecCoord)", try_from = "(SecCoord, SecCoord)")]
pub struct SecPair {
    earlier: SecCoord,
    later: SecCoord,
    orientation: Orientation,
}

impl SecPair {
    /// Combines two intersection coordinates into an ordered pair.
    ///
    /// The earlier member has the smaller column for horizontal pairs and the
    /// smaller row for vertical pairs. Coordinates that differ in both axes,
    /// or by more than one step, are rejected.
    pub fn combine(first: SecCoord, second: SecCoord) -> Result<Self, GridError> {
        let row_diff = first.row().abs_diff(second.row());
        let column_diff = first.column().abs_diff(second.column());
        let orientation = match (row_diff, column_diff) {
            (0, 1) => Orientation::Horizontal,
            (1, 0) => Orientation::Vertical,
            _ => return Err(GridError::NotAdjacent { first, second }),
        };

        Ok(Self {
            earlier: first.min(second),
            later: first.max(second),
            orientation,
        })
    }

    /// Pair running east from `earlier`.
    #[must_use]
    pub const fn horizontal(earlier: SecCoord) -> Self {
        Self {
            earlier,
            later: SecCoord::new(earlier.row(), earlier.column() + 1),
            orientation: Orientation::Horizontal,
        }
    }

    /// Pair running south from `earlier`.
    #[must_use]
    pub const fn vertical(earlier: SecCoord) -> Self {
        Self {
            earlier,
            later: SecCoord::new(earlier.row() + 1, earlier.column()),
            orientation: Orientation::Vertical,
        }
    }

    /// Pair leaving `coord` in `direction`, if the neighbour has a non-negative index.
    #[must_use]
    pub fn towards(coord: SecCoord, direction: Direction) -> Option<Self> {
        match direction {
            Direction::East => Some(Self::horizontal(coord)),
            Direction::South => Some(Self::vertical(coord)),
            Direction::West => coord
                .column()
                .checked_sub(1)
                .map(|column| Self::horizontal(SecCoord::new(coord.row(), column))),
            Direction::North => coord
                .row()
                .checked_sub(1)
                .map(|row| Self::vertical(SecCoord::new(row, coord.column()))),
        }
    }

    /// Member with the smaller row or column.
    #[must_use]
    pub const fn earlier(&self) -> SecCoord {
        self.earlier
    }

    /// Member with the larger row or column.
    #[must_use]
    pub const fn later(&self) -> SecCoord {
        self.later
    }

    /// Axis along which the pair is connected.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Slot of the earlier member that faces the later one.
    #[must_use]
    pub const fn forward(&self) -> Direction {
        match self.orientation {
            Orientation::Horizontal => Direction::East,
            Orientation::Vertical => Direction::South,
        }
    }

    /// Slot of the later member that faces the earlier one.
    #[must_use]
    pub const fn backward(&self) -> Direction {
        self.forward().opposite()
    }
}

impl From<SecPair> for (SecCoord, SecCoord) {
    fn from(pair: SecPair) -> Self {
        (pair.earlier, pair.later)
    }
}

impl TryFrom<(SecCoord, SecCoord)> for SecPair {
    type Error = GridError;

    fn try_from((first, second): (SecCoord, SecCoord)) -> Result<Self, Self::Error> {
        Self::combine(first, second)
    }
}

/// Dimensions of a lot grid measured in whole lots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridShape {
    rows: u32,
    columns: u32,
}

impl GridShape {
    /// Creates a new shape descriptor.
    #[must_use]
    pub const fn new(rows: u32, columns: u32) -> Self {
        Self { rows, columns }
    }

    /// Number of lot rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of lot columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of intersection rows (one more than the lot rows).
    #[must_use]
    pub const fn sec_rows(&self) -> u32 {
        self.rows + 1
    }

    /// Number of intersection columns (one more than the lot columns).
    #[must_use]
    pub const fn sec_columns(&self) -> u32 {
        self.columns + 1
    }

    /// Reports whether the lot coordinate lies inside the grid.
    #[must_use]
    pub const fn contains_lot(&self, coord: LotCoord) -> bool {
        coord.row() < self.rows && coord.column() < self.columns
    }

    /// Reports whether the intersection coordinate lies inside the dual lattice.
    #[must_use]
    pub const fn contains_sec(&self, coord: SecCoord) -> bool {
        coord.row() < self.sec_rows() && coord.column() < self.sec_columns()
    }

    /// Reports whether the intersection sits strictly inside the outer border.
    #[must_use]
    pub const fn is_interior_sec(&self, coord: SecCoord) -> bool {
        coord.row() >= 1
            && coord.row() < self.rows
            && coord.column() >= 1
            && coord.column() < self.columns
    }
}

impl fmt::Display for GridShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.columns)
    }
}

/// Construction-time parameters of a grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of lot rows.
    pub rows: u32,
    /// Number of lot columns.
    pub columns: u32,
    /// Top-left anchor of lot (0, 0) and of intersection (0, 0).
    pub origin: Vec2,
    /// Side length of a lot in position units.
    pub lot_size: f32,
    /// Inset between a lot's edge and its body rectangle.
    pub lot_margin: f32,
    /// Seed of the generator used by randomize and the connect rebuild.
    pub seed: u64,
    /// Chance that randomize keeps an interior road segment open.
    pub road_keep_probability: f64,
}

impl GridConfig {
    /// Shape of the lot grid described by the configuration.
    #[must_use]
    pub const fn shape(&self) -> GridShape {
        GridShape::new(self.rows, self.columns)
    }

    /// Keep probability clamped to `0.0..=1.0`; non-finite values fall back to the default.
    #[must_use]
    pub fn keep_probability(&self) -> f64 {
        if self.road_keep_probability.is_finite() {
            self.road_keep_probability.clamp(0.0, 1.0)
        } else {
            Self::default().road_keep_probability
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 20,
            columns: 20,
            origin: Vec2::new(3.0, 3.0),
            lot_size: 40.0,
            lot_margin: 5.0,
            seed: 0x5eed_0f_c1_7e5,
            road_keep_probability: 0.3,
        }
    }
}

/// Plain copy of every lot population and intersection slot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    /// `rows × columns` populations in row-major order.
    pub lots: Vec<Vec<u8>>,
    /// `(rows + 1) × (columns + 1)` slot tuples ordered east, north, west, south.
    pub secs: Vec<Vec<[ConnectionState; 4]>>,
}

impl GridSnapshot {
    /// Lot shape described by the snapshot's population table.
    #[must_use]
    pub fn shape(&self) -> GridShape {
        let rows = self.lots.len();
        let columns = self.lots.first().map_or(0, Vec::len);
        GridShape::new(
            u32::try_from(rows).unwrap_or(u32::MAX),
            u32::try_from(columns).unwrap_or(u32::MAX),
        )
    }
}

/// Share of a population placed in transit by a brush, clamped to `0..=100`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Percent(u8);

impl From<u8> for Percent {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl From<Percent> for u8 {
    fn from(percent: Percent) -> Self {
        percent.0
    }
}

impl Percent {
    /// Full share.
    pub const FULL: Percent = Percent(100);

    /// Creates a new percentage, clamping values above 100.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        if value > 100 {
            Self(100)
        } else {
            Self(value)
        }
    }

    /// Retrieves the percentage value.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Truncated share of `value`.
    #[must_use]
    pub const fn portion_of(&self, value: u8) -> u8 {
        (value as u16 * self.0 as u16 / 100) as u8
    }
}

/// Linear grayscale tone of a lot; darker lots are more populated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LotColor {
    level: u8,
}

impl LotColor {
    /// Derives the tone shown for `population`.
    #[must_use]
    pub const fn for_population(population: u8) -> Self {
        Self {
            level: POPULATION_MAX - population,
        }
    }

    /// Channel intensity shared by red, green and blue.
    #[must_use]
    pub const fn level(&self) -> u8 {
        self.level
    }

    /// `#rrggbb` representation of the tone.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("#{0:02x}{0:02x}{0:02x}", self.level)
    }
}

/// Axis-aligned rectangle expressed in position units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    /// Top-left corner.
    pub min: Vec2,
    /// Bottom-right corner (inclusive).
    pub max: Vec2,
}

/// Road edge bordering a lot, derived from the surrounding intersections.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoadEdge {
    /// Side of the lot the edge runs along.
    pub direction: Direction,
    /// Thin rectangle covering the edge.
    pub segment: Rect,
    /// Indicates whether the edge is part of a pending selection.
    pub focused: bool,
}
