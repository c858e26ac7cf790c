// Copyright 2026 the Starlane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Uniform grid backend for 3D points.
//!
//! This backend buckets points into fixed-size cubic cells and answers queries
//! by touching only the cells overlapping the query primitive. It is intended
//! for workloads with:
//! - moderately uniform spatial density,
//! - query radii comparable to a few cells, and
//! - a cell size chosen close to the typical neighbor distance.
//!
//! Nearest queries walk outward in Chebyshev rings of cells around the query cell
//! and stop once no unvisited ring can beat the current k-th best distance.

use alloc::vec::Vec;
use core::fmt::Debug;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::backend::{Backend, SlotHit};
use crate::types::{Aabb3D, Coord3};
use crate::util::KBest;

type CellKey = (i32, i32, i32);

/// Map a coordinate to a grid coordinate along one axis.
#[allow(
    clippy::cast_possible_truncation,
    reason = "Grid cell indices are intentionally i32; out-of-range values are saturated."
)]
#[inline]
fn cell_coord(value: f64, cell_size: f64) -> i32 {
    let t = value / cell_size;
    let coord = t as i32;

    // Round towards -∞ (the cast above has already truncated).
    if t < 0.0 && f64::from(coord) > t {
        coord.saturating_sub(1)
    } else {
        coord
    }
}

/// Uniform grid backend with fixed cell size.
pub struct Grid {
    cell_size: f64,
    cells: HashMap<CellKey, Cell>,
    points: Vec<Coord3>,
    // Inclusive range of occupied cell coordinates.
    occupied: Option<(CellKey, CellKey)>,
}

#[derive(Default)]
struct Cell {
    slots: SmallVec<[usize; 8]>,
}

impl Debug for Grid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Grid")
            .field("cell_size", &self.cell_size)
            .field("points", &self.points.len())
            .field("cells", &self.cells.len())
            .field("occupied", &self.occupied)
            .finish_non_exhaustive()
    }
}

impl Default for Grid {
    /// A grid with 10-unit cells, matching the default shell step.
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl Grid {
    /// Create a new grid backend with the given cell size, with cell boundaries on
    /// multiples of `cell_size` along each axis.
    ///
    /// `cell_size` must be finite and strictly positive; debug builds assert.
    pub fn new(cell_size: f64) -> Self {
        debug_assert!(
            cell_size.is_finite() && cell_size > 0.0,
            "cell_size must be finite and strictly positive"
        );
        Self {
            cell_size,
            cells: HashMap::new(),
            points: Vec::new(),
            occupied: None,
        }
    }

    fn key_of(&self, p: Coord3) -> CellKey {
        (
            cell_coord(p.x, self.cell_size),
            cell_coord(p.y, self.cell_size),
            cell_coord(p.z, self.cell_size),
        )
    }

    /// Cell range covered by `[min, max]`, clipped to occupied cells.
    fn cell_range(&self, min: Coord3, max: Coord3) -> Option<(CellKey, CellKey)> {
        let (occ_lo, occ_hi) = self.occupied?;
        let lo = self.key_of(min);
        let hi = self.key_of(max);
        let lo = (lo.0.max(occ_lo.0), lo.1.max(occ_lo.1), lo.2.max(occ_lo.2));
        let hi = (hi.0.min(occ_hi.0), hi.1.min(occ_hi.1), hi.2.min(occ_hi.2));
        if lo.0 > hi.0 || lo.1 > hi.1 || lo.2 > hi.2 {
            None
        } else {
            Some((lo, hi))
        }
    }

    /// Visit every slot in cells within `[lo, hi]`.
    ///
    /// Iterates the occupied cell map instead of the range when the range is larger.
    fn visit_cells<F: FnMut(usize)>(&self, lo: CellKey, hi: CellKey, mut f: F) {
        let span = |a: i32, b: i32| u64::from(b.abs_diff(a)) + 1;
        let volume = span(lo.0, hi.0)
            .saturating_mul(span(lo.1, hi.1))
            .saturating_mul(span(lo.2, hi.2));

        if volume > self.cells.len() as u64 {
            for (&(ix, iy, iz), cell) in &self.cells {
                if (lo.0..=hi.0).contains(&ix)
                    && (lo.1..=hi.1).contains(&iy)
                    && (lo.2..=hi.2).contains(&iz)
                {
                    cell.slots.iter().for_each(|&s| f(s));
                }
            }
            return;
        }

        for ix in lo.0..=hi.0 {
            for iy in lo.1..=hi.1 {
                for iz in lo.2..=hi.2 {
                    if let Some(cell) = self.cells.get(&(ix, iy, iz)) {
                        cell.slots.iter().for_each(|&s| f(s));
                    }
                }
            }
        }
    }

    fn offer_cell(&self, key: CellKey, center: Coord3, best: &mut KBest) {
        if let Some(cell) = self.cells.get(&key) {
            for &slot in &cell.slots {
                best.offer(slot, center.distance_sq(self.points[slot]));
            }
        }
    }

    /// Offer every cell at Chebyshev distance exactly `r` from `c`.
    fn offer_ring(&self, c: CellKey, r: i64, center: Coord3, best: &mut KBest) {
        let key = |dx: i64, dy: i64, dz: i64| -> Option<CellKey> {
            Some((
                i32::try_from(i64::from(c.0) + dx).ok()?,
                i32::try_from(i64::from(c.1) + dy).ok()?,
                i32::try_from(i64::from(c.2) + dz).ok()?,
            ))
        };
        if r == 0 {
            if let Some(k) = key(0, 0, 0) {
                self.offer_cell(k, center, best);
            }
            return;
        }
        for dx in -r..=r {
            for dy in -r..=r {
                if dx.abs() == r || dy.abs() == r {
                    for dz in -r..=r {
                        if let Some(k) = key(dx, dy, dz) {
                            self.offer_cell(k, center, best);
                        }
                    }
                } else {
                    for dz in [-r, r] {
                        if let Some(k) = key(dx, dy, dz) {
                            self.offer_cell(k, center, best);
                        }
                    }
                }
            }
        }
    }
}

fn chebyshev(a: CellKey, b: CellKey) -> i64 {
    let d = |x: i32, y: i32| i64::from(x.abs_diff(y));
    d(a.0, b.0).max(d(a.1, b.1)).max(d(a.2, b.2))
}

impl Backend for Grid {
    fn build(&mut self, points: &[Coord3]) {
        self.clear();
        self.points.extend_from_slice(points);
        for (slot, p) in points.iter().enumerate() {
            debug_assert!(!p.is_nan(), "grid input must not contain NaN coordinates");
            let key = self.key_of(*p);
            self.cells.entry(key).or_default().slots.push(slot);
            self.occupied = Some(match self.occupied {
                None => (key, key),
                Some((lo, hi)) => (
                    (lo.0.min(key.0), lo.1.min(key.1), lo.2.min(key.2)),
                    (hi.0.max(key.0), hi.1.max(key.1), hi.2.max(key.2)),
                ),
            });
        }
    }

    fn clear(&mut self) {
        self.cells.clear();
        self.points.clear();
        self.occupied = None;
    }

    fn len(&self) -> usize {
        self.points.len()
    }

    fn visit_box<F: FnMut(usize)>(&self, aabb: Aabb3D, mut f: F) {
        if aabb.is_empty() {
            return;
        }
        let Some((lo, hi)) = self.cell_range(aabb.min, aabb.max) else {
            return;
        };
        self.visit_cells(lo, hi, |slot| {
            if aabb.contains(self.points[slot]) {
                f(slot);
            }
        });
    }

    fn visit_sphere<F: FnMut(usize, f64)>(&self, center: Coord3, radius: f64, mut f: F) {
        if radius < 0.0 {
            return;
        }
        let radius_sq = radius * radius;
        let bound = Aabb3D::around(center, radius);
        let Some((lo, hi)) = self.cell_range(bound.min, bound.max) else {
            return;
        };
        self.visit_cells(lo, hi, |slot| {
            let d = center.distance_sq(self.points[slot]);
            if d <= radius_sq {
                f(slot, d);
            }
        });
    }

    fn nearest(&self, center: Coord3, k: usize, out: &mut Vec<SlotHit>) {
        let Some((occ_lo, occ_hi)) = self.occupied else {
            return;
        };
        if k == 0 {
            return;
        }
        let c = self.key_of(center);
        // Ring that reaches the farthest occupied cell.
        let reach = |c: i32, lo: i32, hi: i32| i64::from(c.abs_diff(lo).max(c.abs_diff(hi)));
        let max_ring = reach(c.0, occ_lo.0, occ_hi.0)
            .max(reach(c.1, occ_lo.1, occ_hi.1))
            .max(reach(c.2, occ_lo.2, occ_hi.2));

        let mut best = KBest::new(k);
        let mut r: i64 = 0;
        loop {
            // Ring cells outnumber occupied cells: finish with one pass over the map.
            let ring_cells = (2 * r + 1).pow(3) - (2 * r - 1).max(0).pow(3);
            if ring_cells as u64 > self.cells.len() as u64 {
                for (&key, cell) in &self.cells {
                    if chebyshev(c, key) >= r {
                        for &slot in &cell.slots {
                            best.offer(slot, center.distance_sq(self.points[slot]));
                        }
                    }
                }
                break;
            }

            self.offer_ring(c, r, center, &mut best);
            if r >= max_ring {
                break;
            }
            // Anything in ring r + 1 is at least r cells away along some axis.
            let gap = r as f64 * self.cell_size;
            if let Some(worst) = best.bound()
                && worst < gap * gap
            {
                break;
            }
            r += 1;
        }
        best.drain_sorted_into(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::FlatVec;
    use alloc::vec;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn build_and_query_point_cells() {
        let mut grid = Grid::new(10.0);
        grid.build(&[Coord3::new(5.0, 5.0, 5.0), Coord3::new(25.0, 25.0, 25.0)]);

        let mut hits = Vec::new();
        grid.visit_box(
            Aabb3D::new(Coord3::new(0.0, 0.0, 0.0), Coord3::new(10.0, 10.0, 10.0)),
            |s| hits.push(s),
        );
        assert_eq!(hits, vec![0]);

        hits.clear();
        grid.visit_sphere(Coord3::new(25.0, 25.0, 20.0), 5.0, |s, _| hits.push(s));
        assert_eq!(hits, vec![1]);
    }

    #[test]
    fn negative_coordinates_round_down() {
        assert_eq!(cell_coord(-0.5, 1.0), -1);
        assert_eq!(cell_coord(-1.0, 1.0), -1);
        assert_eq!(cell_coord(0.0, 1.0), 0);
        assert_eq!(cell_coord(-25.0, 10.0), -3);
    }

    #[test]
    fn cell_coord_saturates() {
        assert_eq!(cell_coord(1e20, 1.0), i32::MAX);
        assert_eq!(cell_coord(-1e20, 1.0), i32::MIN);
    }

    #[test]
    fn nearest_across_sparse_cells() {
        let mut grid = Grid::new(1.0);
        grid.build(&[
            Coord3::new(500.0, 0.0, 0.0),
            Coord3::new(-300.0, 0.0, 0.0),
            Coord3::new(0.5, 0.5, 0.5),
        ]);
        let mut out = Vec::new();
        grid.nearest(Coord3::ORIGIN, 2, &mut out);
        let slots: Vec<usize> = out.iter().map(|h| h.slot).collect();
        assert_eq!(slots, vec![2, 1]);
    }

    #[test]
    fn matches_linear_scan() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let points: Vec<Coord3> = (0..600)
            .map(|_| {
                Coord3::new(
                    rng.gen_range(-200.0..200.0),
                    rng.gen_range(-200.0..200.0),
                    rng.gen_range(-200.0..200.0),
                )
            })
            .collect();
        let mut grid = Grid::new(25.0);
        grid.build(&points);
        let mut flat = FlatVec::default();
        flat.build(&points);

        for _ in 0..40 {
            let q = Coord3::new(
                rng.gen_range(-250.0..250.0),
                rng.gen_range(-250.0..250.0),
                rng.gen_range(-250.0..250.0),
            );
            let k = rng.gen_range(1..30);
            let (mut a, mut b) = (Vec::new(), Vec::new());
            grid.nearest(q, k, &mut a);
            flat.nearest(q, k, &mut b);
            assert_eq!(a, b, "nearest mismatch for {q:?}, k = {k}");

            let r: f64 = rng.gen_range(0.0..120.0);
            let mut sa = Vec::new();
            grid.visit_sphere(q, r, |s, _| sa.push(s));
            let mut sb = Vec::new();
            flat.visit_sphere(q, r, |s, _| sb.push(s));
            sa.sort_unstable();
            sb.sort_unstable();
            assert_eq!(sa, sb, "sphere mismatch for {q:?}, r = {r}");
        }
    }
}
