//! Intersections on the dual lattice and the paired-slot protocol.

use glam::Vec2;
use urban_brush_core::{
    ConnectionState, Connections, Direction, GridError, GridShape, SecCoord, SecPair,
};

/// One lattice point with four directional road slots.
#[derive(Clone, Debug, PartialEq)]
pub struct Intersection {
    coord: SecCoord,
    position: Vec2,
    connections: Connections,
}

impl Intersection {
    pub(crate) fn new(coord: SecCoord, position: Vec2) -> Self {
        Self {
            coord,
            position,
            connections: Connections::default(),
        }
    }

    /// Lattice coordinate of the intersection.
    #[must_use]
    pub const fn coord(&self) -> SecCoord {
        self.coord
    }

    /// Position of the intersection in the pointer's coordinate space.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Current state of all four slots.
    #[must_use]
    pub const fn connections(&self) -> Connections {
        self.connections
    }

    /// State of the slot facing `direction`.
    #[must_use]
    pub const fn state(&self, direction: Direction) -> ConnectionState {
        self.connections.get(direction)
    }

    pub(crate) fn set_connections(&mut self, connections: Connections) {
        self.connections = connections;
    }
}

/// Dense `(rows + 1) × (columns + 1)` store of intersections.
///
/// Slots shared by two neighbours are only written through [`SecPair`]s so
/// both members always observe the same value after a call returns.
#[derive(Clone, Debug)]
pub(crate) struct IntersectionLattice {
    shape: GridShape,
    secs: Vec<Intersection>,
}

impl IntersectionLattice {
    pub(crate) fn new(shape: GridShape, origin: Vec2, lot_size: f32) -> Self {
        let mut secs = Vec::new();
        for row in 0..shape.sec_rows() {
            for column in 0..shape.sec_columns() {
                let position = origin + Vec2::new(column as f32, row as f32) * lot_size;
                secs.push(Intersection::new(SecCoord::new(row, column), position));
            }
        }
        Self { shape, secs }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Intersection> {
        self.secs.iter()
    }

    pub(crate) fn get(&self, coord: SecCoord) -> Result<&Intersection, GridError> {
        let index = self.index(coord)?;
        self.secs.get(index).ok_or(out_of_bounds(coord))
    }

    /// Overwrites every slot of one intersection without touching its neighbours.
    pub(crate) fn stamp(
        &mut self,
        coord: SecCoord,
        connections: Connections,
    ) -> Result<(), GridError> {
        let index = self.index(coord)?;
        if let Some(sec) = self.secs.get_mut(index) {
            sec.set_connections(connections);
        }
        Ok(())
    }

    pub(crate) fn reset(&mut self, connections: Connections) {
        for sec in &mut self.secs {
            sec.set_connections(connections);
        }
    }

    /// Pairs two in-bounds intersections, deducing orientation and order.
    pub(crate) fn combine(&self, first: SecCoord, second: SecCoord) -> Result<SecPair, GridError> {
        let _ = self.index(first)?;
        let _ = self.index(second)?;
        SecPair::combine(first, second)
    }

    /// Writes `state` into both shared slots of a pair whose orientation is known.
    ///
    /// Both members are resolved before either is written, so a failure leaves
    /// the lattice untouched.
    pub(crate) fn set_pair(
        &mut self,
        pair: SecPair,
        state: ConnectionState,
    ) -> Result<(), GridError> {
        let earlier = self.index(pair.earlier())?;
        let later = self.index(pair.later())?;
        if let Some(sec) = self.secs.get_mut(earlier) {
            sec.connections.set(pair.forward(), state);
        }
        if let Some(sec) = self.secs.get_mut(later) {
            sec.connections.set(pair.backward(), state);
        }
        Ok(())
    }

    /// Derives the pairing of two intersections, then writes `state` into it.
    pub(crate) fn set_paired(
        &mut self,
        first: SecCoord,
        second: SecCoord,
        state: ConnectionState,
    ) -> Result<SecPair, GridError> {
        let pair = self.combine(first, second)?;
        self.set_pair(pair, state)?;
        Ok(pair)
    }

    /// Joint state of the two slots shared by a pair whose orientation is known.
    pub(crate) fn pair_state(&self, pair: SecPair) -> Result<ConnectionState, GridError> {
        let earlier = self.get(pair.earlier())?.state(pair.forward());
        let later = self.get(pair.later())?.state(pair.backward());
        Ok(earlier.joint(later))
    }

    /// Derives the pairing of two intersections, then reads its joint state.
    pub(crate) fn paired_state(
        &self,
        first: SecCoord,
        second: SecCoord,
    ) -> Result<ConnectionState, GridError> {
        let pair = self.combine(first, second)?;
        self.pair_state(pair)
    }

    /// Verifies that both members of a pair lie inside the lattice and are
    /// one step apart along the pair's orientation.
    pub(crate) fn check_pair(&self, pair: SecPair) -> Result<(), GridError> {
        let _ = self.index(pair.earlier())?;
        let _ = self.index(pair.later())?;
        if SecPair::combine(pair.earlier(), pair.later())? != pair {
            return Err(GridError::NotAdjacent {
                first: pair.earlier(),
                second: pair.later(),
            });
        }
        Ok(())
    }

    fn index(&self, coord: SecCoord) -> Result<usize, GridError> {
        if !self.shape.contains_sec(coord) {
            return Err(out_of_bounds(coord));
        }
        let row = usize::try_from(coord.row()).map_err(|_| out_of_bounds(coord))?;
        let column = usize::try_from(coord.column()).map_err(|_| out_of_bounds(coord))?;
        let width = usize::try_from(self.shape.sec_columns()).map_err(|_| out_of_bounds(coord))?;
        Ok(row * width + column)
    }
}

fn out_of_bounds(coord: SecCoord) -> GridError {
    GridError::OutOfBounds {
        row: coord.row(),
        column: coord.column(),
    }
}
