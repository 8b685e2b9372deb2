//! Lots and the buffered population transfer primitives.

use glam::Vec2;
use urban_brush_core::{LotColor, LotCoord, Percent, Rect, POPULATION_MAX};

/// One lattice cell holding a population and an in-flight transfer buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct Lot {
    coord: LotCoord,
    anchor: Vec2,
    size: f32,
    population: u8,
    buffer: u8,
}

/// Result of moving buffered population from one lot into another.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferOutcome {
    /// Units that left the source buffer.
    pub moved: u8,
    /// The source buffer is empty.
    pub source_drained: bool,
    /// The target reached [`POPULATION_MAX`].
    pub target_saturated: bool,
}

impl Lot {
    pub(crate) fn new(coord: LotCoord, anchor: Vec2, size: f32) -> Self {
        Self {
            coord,
            anchor,
            size,
            population: 0,
            buffer: 0,
        }
    }

    /// Lattice coordinate of the lot.
    #[must_use]
    pub const fn coord(&self) -> LotCoord {
        self.coord
    }

    /// Top-left corner of the lot.
    #[must_use]
    pub const fn anchor(&self) -> Vec2 {
        self.anchor
    }

    /// Side length of the lot.
    #[must_use]
    pub const fn size(&self) -> f32 {
        self.size
    }

    /// Current population.
    #[must_use]
    pub const fn population(&self) -> u8 {
        self.population
    }

    /// Population reserved for delivery by the brush in progress.
    #[must_use]
    pub const fn buffer(&self) -> u8 {
        self.buffer
    }

    /// Point distances are measured from.
    ///
    /// Half the lot size is truncated to whole units so centres land on the
    /// same lattice as anchors.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.anchor + Vec2::splat((self.size / 2.0).floor())
    }

    /// Grayscale tone derived from the population.
    #[must_use]
    pub const fn color(&self) -> LotColor {
        LotColor::for_population(self.population)
    }

    /// Lot rectangle inset by `margin` on every side.
    #[must_use]
    pub fn body(&self, margin: f32) -> Rect {
        Rect {
            min: self.anchor + Vec2::splat(margin),
            max: self.anchor + Vec2::splat(self.size - margin - 1.0),
        }
    }

    /// Height of the building drawn on the lot, proportional to its population.
    #[must_use]
    pub fn building_height(&self) -> f32 {
        (2.0 * self.size * f32::from(self.population) / f32::from(POPULATION_MAX)).floor()
    }

    /// Moves `amount` percent of the population into the buffer.
    ///
    /// The share is truncated, so the reserved quantity depends only on this
    /// lot and never on the order in which lots are visited.
    pub fn prepare_buffer(&mut self, amount: Percent) -> u8 {
        let delta = amount.portion_of(self.population);
        self.population -= delta;
        self.buffer = self.buffer.saturating_add(delta);
        delta
    }

    /// Returns whatever is left in the buffer to the population.
    pub fn restore_buffer(&mut self) -> u8 {
        let leftover = self.buffer;
        self.population = self.population.saturating_add(leftover);
        self.buffer = 0;
        leftover
    }

    /// Moves as much of the source buffer as the target can absorb.
    pub fn transfer(source: &mut Lot, target: &mut Lot) -> TransferOutcome {
        let delta = source.buffer.min(target.headroom());
        source.buffer -= delta;
        target.population += delta;
        TransferOutcome {
            moved: delta,
            source_drained: source.buffer == 0,
            target_saturated: target.population == POPULATION_MAX,
        }
    }

    /// Transfer where the source and the target are the same lot.
    pub(crate) fn transfer_within(&mut self) -> TransferOutcome {
        let delta = self.buffer.min(self.headroom());
        self.buffer -= delta;
        self.population += delta;
        TransferOutcome {
            moved: delta,
            source_drained: self.buffer == 0,
            target_saturated: self.population == POPULATION_MAX,
        }
    }

    pub(crate) fn set_population(&mut self, population: u8) {
        self.population = population;
    }

    fn headroom(&self) -> u8 {
        POPULATION_MAX - self.population
    }
}
