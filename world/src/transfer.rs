//! Round-robin population transfer shared by the repulse, attract and drag brushes.

use std::collections::VecDeque;

use tracing::debug;
use urban_brush_core::{Event, Percent, TransferBrush};

use crate::{lot::TransferOutcome, Grid, Lot};

/// Totals gathered while running one population brush.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferReport {
    /// Brush that moved the population.
    pub brush: TransferBrush,
    /// Number of lots that contributed population.
    pub sources: usize,
    /// Number of lots eligible to receive population.
    pub targets: usize,
    /// Units delivered into target lots.
    pub moved: u32,
    /// Reserved units returned to their source.
    pub restored: u32,
}

impl From<TransferReport> for Event {
    fn from(report: TransferReport) -> Self {
        Event::PopulationTransferred {
            brush: report.brush,
            sources: report.sources,
            targets: report.targets,
            moved: report.moved,
            restored: report.restored,
        }
    }
}

impl Grid {
    /// Moves population from `sources` into `targets`, both ordered nearest first.
    ///
    /// Every source reserves its share up front. Each step pairs the heads of
    /// both queues; entries that are neither drained nor saturated go to the
    /// back of their queue so partially served lots take turns. Whatever
    /// remains reserved when either queue runs dry is restored.
    pub(crate) fn transfer_population(
        &mut self,
        brush: TransferBrush,
        mut sources: VecDeque<usize>,
        mut targets: VecDeque<usize>,
        amount: Percent,
    ) -> TransferReport {
        let mut report = TransferReport {
            brush,
            sources: sources.len(),
            targets: targets.len(),
            moved: 0,
            restored: 0,
        };

        for &index in &sources {
            if let Some(lot) = self.lots.get_mut(index) {
                let _ = lot.prepare_buffer(amount);
            }
        }

        while !sources.is_empty() && !targets.is_empty() {
            let (Some(source), Some(target)) = (sources.pop_front(), targets.pop_front()) else {
                break;
            };
            let outcome = transfer_between(&mut self.lots, source, target);
            report.moved += u32::from(outcome.moved);
            if !outcome.source_drained {
                sources.push_back(source);
            }
            if !outcome.target_saturated {
                targets.push_back(target);
            }
        }

        for index in sources {
            if let Some(lot) = self.lots.get_mut(index) {
                report.restored += u32::from(lot.restore_buffer());
            }
        }

        debug!(
            ?brush,
            sources = report.sources,
            targets = report.targets,
            moved = report.moved,
            restored = report.restored,
            "population transferred"
        );
        report
    }
}

fn transfer_between(lots: &mut [Lot], source: usize, target: usize) -> TransferOutcome {
    if source == target {
        if let Some(lot) = lots.get_mut(source) {
            return lot.transfer_within();
        }
    } else if let Some((source_lot, target_lot)) = pair_mut(lots, source, target) {
        return Lot::transfer(source_lot, target_lot);
    }

    TransferOutcome {
        moved: 0,
        source_drained: true,
        target_saturated: true,
    }
}

fn pair_mut(lots: &mut [Lot], first: usize, second: usize) -> Option<(&mut Lot, &mut Lot)> {
    let upper = first.max(second);
    if upper >= lots.len() {
        return None;
    }

    let (head, tail) = lots.split_at_mut(upper);
    let upper_lot = tail.first_mut()?;
    if first < second {
        Some((head.get_mut(first)?, upper_lot))
    } else {
        Some((upper_lot, head.get_mut(second)?))
    }
}
