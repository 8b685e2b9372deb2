//! Population and road brushes.

use glam::Vec2;
use rand::seq::SliceRandom;
use tracing::debug;
use urban_brush_core::{ConnectionState, Connections, GridError, Percent, SecPair, TransferBrush};

use crate::{consistency::RepairReport, transfer::TransferReport, Grid};

/// The mark radius divides the lot size by slightly less than √2, so the four
/// corners of the lot under the pointer always fall inside it.
const MARK_RADIUS_DIVISOR: f32 = 1.414;

/// Outcome of a break brush.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BreakReport {
    /// Distinct pairs the brush blocked.
    pub blocked: usize,
    /// Dead ends erased afterwards.
    pub repair: RepairReport,
}

/// Outcome of a connect brush.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectReport {
    /// Distinct pending pairs the brush forced open.
    pub activated: usize,
    /// Intersections that received a sampled style.
    pub rebuilt: usize,
    /// Dead ends erased afterwards.
    pub repair: RepairReport,
}

impl Grid {
    /// Pushes population from the disc `d < inner_radius` into the annulus
    /// `inner_radius < d < outer_radius`.
    pub fn repulse_lots(
        &mut self,
        anchor: Vec2,
        inner_radius: f32,
        outer_radius: f32,
        amount: Percent,
    ) -> TransferReport {
        let sources = self.lot_indices_by_distance(anchor, |distance| distance < inner_radius);
        let targets = self.lot_indices_by_distance(anchor, |distance| {
            inner_radius < distance && distance < outer_radius
        });
        self.transfer_population(TransferBrush::Repulse, sources, targets, amount)
    }

    /// Pulls population from the annulus `inner_radius < d < outer_radius`
    /// into the disc `d < inner_radius`.
    pub fn attract_lots(
        &mut self,
        anchor: Vec2,
        inner_radius: f32,
        outer_radius: f32,
        amount: Percent,
    ) -> TransferReport {
        let sources = self.lot_indices_by_distance(anchor, |distance| {
            inner_radius < distance && distance < outer_radius
        });
        let targets = self.lot_indices_by_distance(anchor, |distance| distance < inner_radius);
        self.transfer_population(TransferBrush::Attract, sources, targets, amount)
    }

    /// Moves population from lots within `inner_radius` of `pickup` into lots
    /// within `outer_radius` of `drop`.
    pub fn drag_lots(
        &mut self,
        pickup: Vec2,
        drop: Vec2,
        inner_radius: f32,
        outer_radius: f32,
        amount: Percent,
    ) -> TransferReport {
        let sources = self.lot_indices_by_distance(pickup, |distance| distance < inner_radius);
        let targets = self.lot_indices_by_distance(drop, |distance| distance < outer_radius);
        self.transfer_population(TransferBrush::Drag, sources, targets, amount)
    }

    /// Highlights every segment around `anchor` and returns them as a pending selection.
    ///
    /// Blocked segments are highlighted too, so a later connect can open them.
    pub fn mark_roads(&mut self, anchor: Vec2) -> Vec<SecPair> {
        let radius = self.config.lot_size / MARK_RADIUS_DIVISOR;
        let pairs = self.pairs_within(anchor, radius);
        for pair in &pairs {
            let _ = self.secs.set_pair(*pair, ConnectionState::Focused);
        }
        debug!(pairs = pairs.len(), "roads marked");
        pairs
    }

    /// Blocks the pending selection, or every segment within `radius` when
    /// nothing is pending, then erases the dead ends this leaves behind.
    ///
    /// A pending pair outside the lattice rejects the whole stroke before
    /// anything is written.
    pub fn break_roads(
        &mut self,
        anchor: Vec2,
        radius: f32,
        pending: &[SecPair],
    ) -> Result<BreakReport, GridError> {
        let pairs = if pending.is_empty() {
            self.pairs_within(anchor, radius)
        } else {
            self.validated(pending)?
        };
        for pair in &pairs {
            let _ = self.secs.set_pair(*pair, ConnectionState::Blocked);
        }
        let repair = self.keep_roads_consistent();
        debug!(blocked = pairs.len(), repaired = repair.blocked, "roads broken");
        Ok(BreakReport {
            blocked: pairs.len(),
            repair,
        })
    }

    /// Opens the pending selection, or rebuilds the neighbourhood when nothing
    /// is pending, then erases any dead ends.
    ///
    /// The rebuild samples the slot styles of every intersection within
    /// `outer_radius`, picks one of them and stamps it onto every intersection
    /// within `inner_radius`.
    pub fn connect_roads(
        &mut self,
        anchor: Vec2,
        inner_radius: f32,
        outer_radius: f32,
        pending: &[SecPair],
    ) -> Result<ConnectReport, GridError> {
        let mut activated = 0;
        let mut rebuilt = 0;
        if pending.is_empty() {
            rebuilt = self.rebuild_roads(anchor, inner_radius, outer_radius);
        } else {
            let pairs = self.validated(pending)?;
            for pair in &pairs {
                let _ = self.secs.set_pair(*pair, ConnectionState::Active);
            }
            activated = pairs.len();
        }
        let repair = self.keep_roads_consistent();
        debug!(activated, rebuilt, repaired = repair.blocked, "roads connected");
        Ok(ConnectReport {
            activated,
            rebuilt,
            repair,
        })
    }

    fn rebuild_roads(&mut self, anchor: Vec2, inner_radius: f32, outer_radius: f32) -> usize {
        let styles: Vec<Connections> = self
            .secs_by_distance(anchor, outer_radius)
            .into_iter()
            .map(|sec| sec.connections())
            .collect();
        let receivers: Vec<_> = self
            .secs_by_distance(anchor, inner_radius)
            .into_iter()
            .map(|sec| sec.coord())
            .collect();

        let Some(style) = styles.choose(&mut self.rng).copied() else {
            return 0;
        };
        let mut rebuilt = 0;
        for coord in receivers {
            if self.secs.stamp(coord, style).is_ok() {
                rebuilt += 1;
            }
        }
        self.keep_secs_consistent();
        rebuilt
    }

    /// Deduplicates pending pairs after checking that every one lies inside the lattice.
    fn validated(&self, pending: &[SecPair]) -> Result<Vec<SecPair>, GridError> {
        for pair in pending {
            self.secs.check_pair(*pair)?;
        }
        let mut pairs = pending.to_vec();
        pairs.sort();
        pairs.dedup();
        Ok(pairs)
    }
}
