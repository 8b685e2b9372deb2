//! Distance queries over lots and intersections.
//!
//! Every query measures a plain Euclidean distance between the anchor and a
//! lot centre or intersection position. Results preserve row-major order
//! among equally distant candidates so brush outcomes are reproducible.

use std::collections::{BTreeSet, VecDeque};

use glam::Vec2;
use urban_brush_core::{SecCoord, SecPair};

use crate::{Grid, Intersection, Lot};

impl Grid {
    /// Lots whose centre lies strictly between `min_distance` and `max_distance`,
    /// nearest first.
    #[must_use]
    pub fn lots_by_distance(
        &self,
        anchor: Vec2,
        min_distance: f32,
        max_distance: f32,
    ) -> Vec<&Lot> {
        self.lot_indices_by_distance(anchor, |distance| {
            min_distance < distance && distance < max_distance
        })
        .into_iter()
        .filter_map(|index| self.lots.get(index))
        .collect()
    }

    /// Lots whose centre lies strictly closer than `radius`, nearest first.
    ///
    /// Unlike [`Grid::lots_by_distance`] with a zero lower bound, the lot
    /// centred exactly under the anchor is included.
    #[must_use]
    pub fn lots_within(&self, anchor: Vec2, radius: f32) -> Vec<&Lot> {
        self.lot_indices_by_distance(anchor, |distance| distance < radius)
            .into_iter()
            .filter_map(|index| self.lots.get(index))
            .collect()
    }

    /// Lot whose centre is closest to `anchor`; the first in row-major order wins ties.
    #[must_use]
    pub fn nearest_lot(&self, anchor: Vec2) -> Option<&Lot> {
        self.lots
            .iter()
            .map(|lot| (lot, anchor.distance(lot.center())))
            .min_by(|left, right| left.1.total_cmp(&right.1))
            .map(|(lot, _)| lot)
    }

    /// Intersections strictly closer than `radius`, in row-major order.
    #[must_use]
    pub fn secs_by_distance(&self, anchor: Vec2, radius: f32) -> Vec<&Intersection> {
        self.secs
            .iter()
            .filter(|sec| anchor.distance(sec.position()) < radius)
            .collect()
    }

    /// Every ordered pair of intersections strictly closer than `radius`.
    ///
    /// The cross product includes non-adjacent and identical pairs; callers
    /// combine each pair and skip the ones that are not road segments.
    #[must_use]
    pub fn roads_by_distance(&self, anchor: Vec2, radius: f32) -> Vec<(SecCoord, SecCoord)> {
        let coords: Vec<SecCoord> = self
            .secs_by_distance(anchor, radius)
            .into_iter()
            .map(Intersection::coord)
            .collect();
        coords
            .iter()
            .flat_map(|first| coords.iter().map(move |second| (*first, *second)))
            .collect()
    }

    /// Distinct road segments whose both ends lie strictly closer than `radius`.
    pub(crate) fn pairs_within(&self, anchor: Vec2, radius: f32) -> Vec<SecPair> {
        let pairs: BTreeSet<SecPair> = self
            .roads_by_distance(anchor, radius)
            .into_iter()
            .filter_map(|(first, second)| SecPair::combine(first, second).ok())
            .collect();
        pairs.into_iter().collect()
    }

    pub(crate) fn lot_indices_by_distance<F>(
        &self,
        anchor: Vec2,
        mut accept: F,
    ) -> VecDeque<usize>
    where
        F: FnMut(f32) -> bool,
    {
        let mut candidates: Vec<(usize, f32)> = self
            .lots
            .iter()
            .enumerate()
            .map(|(index, lot)| (index, anchor.distance(lot.center())))
            .filter(|(_, distance)| accept(*distance))
            .collect();
        candidates.sort_by(|left, right| left.1.total_cmp(&right.1));
        candidates.into_iter().map(|(index, _)| index).collect()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use urban_brush_core::{GridConfig, LotCoord, SecCoord};

    use crate::Grid;

    fn grid() -> Grid {
        Grid::new(GridConfig {
            rows: 3,
            columns: 3,
            origin: Vec2::ZERO,
            lot_size: 10.0,
            ..GridConfig::default()
        })
    }

    #[test]
    fn lots_by_distance_sorts_nearest_first_and_excludes_bounds() {
        let grid = grid();
        // Centre of lot (1, 1) is (15, 15); its four edge neighbours sit at distance 10.
        let lots = grid.lots_by_distance(Vec2::new(15.0, 15.0), 0.0, 12.0);
        let coords: Vec<LotCoord> = lots.iter().map(|lot| lot.coord()).collect();
        assert_eq!(
            coords,
            vec![
                LotCoord::new(0, 1),
                LotCoord::new(1, 0),
                LotCoord::new(1, 2),
                LotCoord::new(2, 1),
            ]
        );

        let ring = grid.lots_by_distance(Vec2::new(15.0, 15.0), 10.0, 20.0);
        assert_eq!(ring.len(), 4);
        assert!(ring.iter().all(|lot| lot.coord().row() != 1 && lot.coord().column() != 1));
    }

    #[test]
    fn lots_within_includes_the_lot_under_the_anchor() {
        let grid = grid();
        let lots = grid.lots_within(Vec2::new(15.0, 15.0), 1.0);
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].coord(), LotCoord::new(1, 1));
    }

    #[test]
    fn nearest_lot_breaks_ties_in_row_major_order() {
        let grid = grid();
        let nearest = grid.nearest_lot(Vec2::new(10.0, 10.0)).expect("lots exist");
        assert_eq!(nearest.coord(), LotCoord::new(0, 0));
        let nearest = grid.nearest_lot(Vec2::new(26.0, 4.0)).expect("lots exist");
        assert_eq!(nearest.coord(), LotCoord::new(0, 2));
    }

    #[test]
    fn roads_by_distance_is_the_full_cross_product() {
        let grid = grid();
        let anchor = Vec2::new(15.0, 15.0);
        let secs = grid.secs_by_distance(anchor, 7.5);
        assert_eq!(secs.len(), 4);
        assert_eq!(grid.roads_by_distance(anchor, 7.5).len(), 16);

        let pairs = grid.pairs_within(anchor, 7.5);
        assert_eq!(pairs.len(), 4);
        assert!(pairs.iter().all(|pair| {
            pair.earlier() >= SecCoord::new(1, 1) && pair.later() <= SecCoord::new(2, 2)
        }));
    }
}
