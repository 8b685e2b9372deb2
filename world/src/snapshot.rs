//! Randomizing, dumping and loading the whole grid.

use rand::Rng;
use tracing::debug;
use urban_brush_core::{
    ConnectionState, Connections, GridError, GridShape, GridSnapshot, LotCoord, SecCoord, SecPair,
};

use crate::{consistency::RepairReport, Grid, Lot};

impl Grid {
    /// Draws fresh populations and a fresh road network from the grid's generator.
    ///
    /// Every interior segment keeps its road with the configured probability
    /// and is blocked otherwise, one draw per segment. Dead ends introduced by
    /// the blocking are repaired before returning.
    pub fn randomize(&mut self) -> RepairReport {
        for lot in &mut self.lots {
            lot.set_population(self.rng.gen());
        }
        self.secs.reset(Connections::default());

        let keep = self.config.keep_probability();
        let rows = self.shape.rows();
        let columns = self.shape.columns();
        let horizontal = (1..rows).flat_map(move |row| {
            (0..columns).map(move |column| SecPair::horizontal(SecCoord::new(row, column)))
        });
        let vertical = (0..rows).flat_map(move |row| {
            (1..columns).map(move |column| SecPair::vertical(SecCoord::new(row, column)))
        });
        let mut blocked = 0usize;
        for pair in horizontal.chain(vertical) {
            if self.rng.gen_bool(keep) {
                continue;
            }
            if self.secs.set_pair(pair, ConnectionState::Blocked).is_ok() {
                blocked += 1;
            }
        }

        let repair = self.keep_roads_consistent();
        debug!(blocked, repaired = repair.blocked, "grid randomized");
        repair
    }

    /// Plain copy of every population and every intersection slot.
    #[must_use]
    pub fn dump(&self) -> GridSnapshot {
        let rows = self.shape.rows();
        let columns = self.shape.columns();
        let lots = (0..rows)
            .map(|row| {
                (0..columns)
                    .map(|column| self.lot(LotCoord::new(row, column)).map_or(0, Lot::population))
                    .collect()
            })
            .collect();
        let secs = (0..self.shape.sec_rows())
            .map(|row| {
                (0..self.shape.sec_columns())
                    .map(|column| {
                        self.secs
                            .get(SecCoord::new(row, column))
                            .map_or([ConnectionState::Active; 4], |sec| {
                                sec.connections().to_array()
                            })
                    })
                    .collect()
            })
            .collect();
        GridSnapshot { lots, secs }
    }

    /// Overwrites every population and slot with the snapshot's values.
    ///
    /// The snapshot is written verbatim, without a consistency pass. Its
    /// shape is checked in full before anything is written.
    pub fn load(&mut self, snapshot: &GridSnapshot) -> Result<(), GridError> {
        self.check_snapshot(snapshot)?;

        for (lot, population) in self.lots.iter_mut().zip(snapshot.lots.iter().flatten()) {
            lot.set_population(*population);
        }
        for (row, line) in (0u32..).zip(&snapshot.secs) {
            for (column, slots) in (0u32..).zip(line) {
                self.secs
                    .stamp(SecCoord::new(row, column), Connections::from_array(*slots))?;
            }
        }
        debug!(shape = %self.shape, "snapshot loaded");
        Ok(())
    }

    fn check_snapshot(&self, snapshot: &GridSnapshot) -> Result<(), GridError> {
        let mismatch = |rows: usize, columns: usize| GridError::ShapeMismatch {
            expected: self.shape,
            found: GridShape::new(
                u32::try_from(rows).unwrap_or(u32::MAX),
                u32::try_from(columns).unwrap_or(u32::MAX),
            ),
        };

        let lot_rows = snapshot.lots.len();
        if lot_rows != self.shape.rows() as usize {
            return Err(mismatch(lot_rows, snapshot.lots.first().map_or(0, Vec::len)));
        }
        if let Some(row) = snapshot
            .lots
            .iter()
            .find(|row| row.len() != self.shape.columns() as usize)
        {
            return Err(mismatch(lot_rows, row.len()));
        }

        // Intersection tables are one larger than the lot table in both axes.
        let sec_rows = snapshot.secs.len();
        let sec_columns = snapshot.secs.first().map_or(0, Vec::len);
        if sec_rows != self.shape.sec_rows() as usize {
            return Err(mismatch(
                sec_rows.saturating_sub(1),
                sec_columns.saturating_sub(1),
            ));
        }
        if let Some(row) = snapshot
            .secs
            .iter()
            .find(|row| row.len() != self.shape.sec_columns() as usize)
        {
            return Err(mismatch(sec_rows - 1, row.len().saturating_sub(1)));
        }
        Ok(())
    }
}
