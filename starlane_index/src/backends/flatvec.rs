// Copyright 2026 the Starlane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat vector backend: linear scans over a dense point array.

use alloc::vec::Vec;

use crate::backend::{Backend, SlotHit};
use crate::types::{Aabb3D, Coord3};
use crate::util::KBest;

/// Linear-scan backend.
///
/// Every query touches every point. This is the reference the other backends are
/// checked against, and the cheapest choice for very small pools.
#[derive(Clone, Debug, Default)]
pub struct FlatVec {
    points: Vec<Coord3>,
}

impl Backend for FlatVec {
    fn build(&mut self, points: &[Coord3]) {
        self.points.clear();
        self.points.extend_from_slice(points);
    }

    fn clear(&mut self) {
        self.points.clear();
    }

    fn len(&self) -> usize {
        self.points.len()
    }

    fn visit_box<F: FnMut(usize)>(&self, aabb: Aabb3D, mut f: F) {
        for (slot, p) in self.points.iter().enumerate() {
            if aabb.contains(*p) {
                f(slot);
            }
        }
    }

    fn visit_sphere<F: FnMut(usize, f64)>(&self, center: Coord3, radius: f64, mut f: F) {
        if radius < 0.0 {
            return;
        }
        let radius_sq = radius * radius;
        for (slot, p) in self.points.iter().enumerate() {
            let d = center.distance_sq(*p);
            if d <= radius_sq {
                f(slot, d);
            }
        }
    }

    fn nearest(&self, center: Coord3, k: usize, out: &mut Vec<SlotHit>) {
        let mut best = KBest::new(k);
        for (slot, p) in self.points.iter().enumerate() {
            best.offer(slot, center.distance_sq(*p));
        }
        best.drain_sorted_into(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn line() -> FlatVec {
        let mut flat = FlatVec::default();
        flat.build(&[
            Coord3::new(3.0, 0.0, 0.0),
            Coord3::new(1.0, 0.0, 0.0),
            Coord3::new(-1.0, 0.0, 0.0),
            Coord3::new(2.0, 0.0, 0.0),
        ]);
        flat
    }

    #[test]
    fn nearest_orders_by_distance_then_slot() {
        let flat = line();
        let mut out = Vec::new();
        flat.nearest(Coord3::ORIGIN, 3, &mut out);
        let slots: Vec<usize> = out.iter().map(|h| h.slot).collect();
        assert_eq!(slots, vec![1, 2, 3]);
        assert_eq!(out[2].dist_sq, 4.0);
    }

    #[test]
    fn box_excludes_upper_faces() {
        let flat = line();
        let b = Aabb3D::new(Coord3::new(0.0, -1.0, -1.0), Coord3::new(3.0, 1.0, 1.0));
        let mut hits = Vec::new();
        flat.visit_box(b, |s| hits.push(s));
        hits.sort_unstable();
        assert_eq!(hits, vec![1, 3], "x = 3 sits on the exclusive upper face");
    }

    #[test]
    fn sphere_is_inclusive() {
        let flat = line();
        let mut hits = Vec::new();
        flat.visit_sphere(Coord3::ORIGIN, 1.0, |s, d| hits.push((s, d)));
        assert_eq!(hits, vec![(1, 1.0), (2, 1.0)]);
    }

    #[test]
    fn clear_empties() {
        let mut flat = line();
        assert_eq!(flat.len(), 4);
        flat.clear();
        assert!(flat.is_empty());
    }
}
