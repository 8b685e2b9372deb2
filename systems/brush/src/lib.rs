#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure brush system translating pointer clicks into grid commands.
//!
//! The system keeps the interaction state that spans several clicks: the
//! pending road selection built up by secondary clicks, the pickup point of a
//! drag, and the last point the user asked to inspect. It never touches the
//! grid directly; adapters forward its commands to the world and feed the
//! resulting events back in.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use urban_brush_core::{Command, Event, Percent, SecPair};

/// Brush selected by the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrushKind {
    /// Pushes population away from the pointer.
    Repulse,
    /// Pulls population towards the pointer.
    Attract,
    /// Carries population from a pickup point to the pointer.
    Drag,
    /// Blocks road segments.
    Break,
    /// Opens road segments.
    Connect,
}

impl BrushKind {
    /// Reports whether the brush edits roads rather than populations.
    #[must_use]
    pub const fn edits_roads(self) -> bool {
        matches!(self, Self::Break | Self::Connect)
    }
}

/// Brush dimensions expressed in lots, plus the transfer share.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushSettings {
    /// Radius of the inner disc, in lots.
    pub inner_radius: f32,
    /// Radius of the outer disc or annulus, in lots.
    pub outer_radius: f32,
    /// Share of each source lot's population placed in transit.
    pub amount: Percent,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            inner_radius: 3.0,
            outer_radius: 6.0,
            amount: Percent::new(20),
        }
    }
}

/// Pointer input distilled from one adapter frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BrushInput {
    /// Position of a primary click, if one happened.
    pub primary_click: Option<Vec2>,
    /// Position of a secondary click, if one happened.
    pub secondary_click: Option<Vec2>,
}

/// Brush system that turns clicks into grid commands.
#[derive(Clone, Debug)]
pub struct Brush {
    kind: BrushKind,
    settings: BrushSettings,
    lot_size: f32,
    pending: Vec<SecPair>,
    pickup: Option<Vec2>,
    inspect: Option<Vec2>,
}

impl Brush {
    /// Creates a brush for a grid whose lots measure `lot_size` units.
    #[must_use]
    pub fn new(kind: BrushKind, settings: BrushSettings, lot_size: f32) -> Self {
        Self {
            kind,
            settings,
            lot_size,
            pending: Vec::new(),
            pickup: None,
            inspect: None,
        }
    }

    /// Currently selected brush.
    #[must_use]
    pub const fn kind(&self) -> BrushKind {
        self.kind
    }

    /// Switches to another brush.
    ///
    /// Marked roads stay highlighted in the grid, so the pending selection
    /// carries over to the next road stroke. A drag pickup does not.
    pub fn select(&mut self, kind: BrushKind) {
        if kind != self.kind {
            self.pickup = None;
        }
        self.kind = kind;
    }

    /// Current brush dimensions.
    #[must_use]
    pub const fn settings(&self) -> BrushSettings {
        self.settings
    }

    /// Replaces the brush dimensions.
    pub fn configure(&mut self, settings: BrushSettings) {
        self.settings = settings;
    }

    /// Road segments marked but not yet broken or connected.
    #[must_use]
    pub fn pending(&self) -> &[SecPair] {
        &self.pending
    }

    /// Pickup point recorded for the next drag.
    #[must_use]
    pub const fn pickup(&self) -> Option<Vec2> {
        self.pickup
    }

    /// Takes the point the user last asked to inspect.
    pub fn take_inspect(&mut self) -> Option<Vec2> {
        self.inspect.take()
    }

    /// Consumes world events and pointer input to emit brush commands.
    ///
    /// A secondary click prepares the next stroke and a primary click
    /// performs it. When both arrive in the same frame the secondary click is
    /// handled first.
    pub fn handle(&mut self, events: &[Event], input: BrushInput, out: &mut Vec<Command>) {
        for event in events {
            if let Event::RoadsMarked { pairs } = event {
                self.pending.extend(pairs.iter().copied());
            }
        }

        if let Some(anchor) = input.secondary_click {
            self.prepare(anchor, out);
        }

        if let Some(anchor) = input.primary_click {
            self.stroke(anchor, out);
        }
    }

    fn prepare(&mut self, anchor: Vec2, out: &mut Vec<Command>) {
        if self.kind.edits_roads() {
            out.push(Command::MarkRoads { anchor });
            return;
        }
        if self.kind == BrushKind::Drag {
            self.pickup = Some(anchor);
        }
        self.inspect = Some(anchor);
    }

    fn stroke(&mut self, anchor: Vec2, out: &mut Vec<Command>) {
        let inner_radius = self.settings.inner_radius * self.lot_size;
        let outer_radius = self.settings.outer_radius * self.lot_size;
        let amount = self.settings.amount;
        let pending = std::mem::take(&mut self.pending);
        let pickup = self.pickup.take();

        let command = match self.kind {
            BrushKind::Repulse => Command::RepulseLots {
                anchor,
                inner_radius,
                outer_radius,
                amount,
            },
            BrushKind::Attract => Command::AttractLots {
                anchor,
                inner_radius,
                outer_radius,
                amount,
            },
            BrushKind::Drag => {
                let Some(pickup) = pickup else {
                    return;
                };
                Command::DragLots {
                    pickup,
                    drop: anchor,
                    inner_radius,
                    outer_radius,
                    amount,
                }
            }
            BrushKind::Break => Command::BreakRoads {
                anchor,
                radius: inner_radius,
                pending,
            },
            BrushKind::Connect => Command::ConnectRoads {
                anchor,
                inner_radius,
                outer_radius,
                pending,
            },
        };
        out.push(command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use urban_brush_core::SecCoord;

    #[test]
    fn switching_brushes_keeps_marked_roads_and_drops_the_pickup() {
        let mut brush = Brush::new(BrushKind::Break, BrushSettings::default(), 10.0);
        let pair = SecPair::horizontal(SecCoord::new(1, 1));
        let mut commands = Vec::new();
        brush.handle(
            &[Event::RoadsMarked { pairs: vec![pair] }],
            BrushInput::default(),
            &mut commands,
        );
        assert!(commands.is_empty());

        brush.select(BrushKind::Connect);
        assert_eq!(brush.pending(), &[pair]);
        brush.handle(
            &[],
            BrushInput {
                primary_click: Some(Vec2::ZERO),
                ..BrushInput::default()
            },
            &mut commands,
        );
        assert!(matches!(
            commands.as_slice(),
            [Command::ConnectRoads { pending, .. }] if pending == &vec![pair]
        ));
        assert!(brush.pending().is_empty());

        brush.select(BrushKind::Drag);
        brush.handle(
            &[],
            BrushInput {
                secondary_click: Some(Vec2::ONE),
                ..BrushInput::default()
            },
            &mut commands,
        );
        assert_eq!(brush.pickup(), Some(Vec2::ONE));
        brush.select(BrushKind::Repulse);
        assert_eq!(brush.pickup(), None);
    }

    #[test]
    fn settings_default_to_three_and_six_lots() {
        let settings = BrushSettings::default();
        assert_eq!(settings.inner_radius, 3.0);
        assert_eq!(settings.outer_radius, 6.0);
        assert_eq!(settings.amount, Percent::new(20));
    }
}
