//! Road network repair passes.

use tracing::trace;
use urban_brush_core::{ConnectionState, Event, SecCoord, SecPair};

use crate::Grid;

/// Work performed by one call to [`Grid::keep_roads_consistent`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Passes that blocked at least one pair.
    pub passes: u32,
    /// Pairs blocked across all passes.
    pub blocked: u32,
}

impl RepairReport {
    /// Reports whether any dead end was erased.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.blocked > 0
    }

    /// Event describing the repair, if it changed anything.
    #[must_use]
    pub fn event(&self) -> Option<Event> {
        self.changed().then_some(Event::RoadsRepaired {
            passes: self.passes,
            blocked: self.blocked,
        })
    }
}

impl Grid {
    /// Erases dead ends until no interior intersection has exactly one open slot.
    ///
    /// Each pass reopens the outer border and then blocks the single open
    /// segment of every dead end it finds. Blocking a segment can turn its far
    /// end into a new dead end, so passes repeat until one blocks nothing.
    /// Focused slots count as open.
    pub fn keep_roads_consistent(&mut self) -> RepairReport {
        let mut report = RepairReport::default();
        loop {
            self.restore_border();
            let blocked = self.erase_dead_ends();
            trace!(pass = report.passes + 1, blocked, "road consistency pass");
            if blocked == 0 {
                return report;
            }
            report.passes += 1;
            report.blocked += blocked;
        }
    }

    /// Forces every segment touching an open slot of an interior intersection open.
    ///
    /// Used after intersections were stamped one by one, which can leave the
    /// two halves of a segment disagreeing.
    pub fn keep_secs_consistent(&mut self) {
        for coord in self.interior_secs() {
            let Ok(sec) = self.secs.get(coord) else {
                continue;
            };
            let connections = sec.connections();
            for direction in connections.open_directions() {
                if let Some(pair) = SecPair::towards(coord, direction) {
                    let _ = self.secs.set_pair(pair, ConnectionState::Active);
                }
            }
        }
    }

    fn restore_border(&mut self) {
        let rows = self.shape.rows();
        let columns = self.shape.columns();
        for row in 0..rows {
            for column in [0, columns] {
                let pair = SecPair::vertical(SecCoord::new(row, column));
                let _ = self.secs.set_pair(pair, ConnectionState::Active);
            }
        }
        for column in 0..columns {
            for row in [0, rows] {
                let pair = SecPair::horizontal(SecCoord::new(row, column));
                let _ = self.secs.set_pair(pair, ConnectionState::Active);
            }
        }
    }

    fn erase_dead_ends(&mut self) -> u32 {
        let mut blocked = 0;
        for coord in self.interior_secs() {
            let Ok(sec) = self.secs.get(coord) else {
                continue;
            };
            let connections = sec.connections();
            if connections.open_count() != 1 {
                continue;
            }
            for direction in connections.open_directions() {
                let Some(pair) = SecPair::towards(coord, direction) else {
                    continue;
                };
                if self.secs.set_pair(pair, ConnectionState::Blocked).is_ok() {
                    blocked += 1;
                }
            }
        }
        blocked
    }

    fn interior_secs(&self) -> impl Iterator<Item = SecCoord> {
        let rows = self.shape.rows();
        let columns = self.shape.columns();
        (1..rows).flat_map(move |row| (1..columns).map(move |column| SecCoord::new(row, column)))
    }
}
