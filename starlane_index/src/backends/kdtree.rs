// Copyright 2026 the Starlane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! KD-tree backend over 3D points.
//!
//! Nodes live in a flat array. Interior nodes split on the axis of largest spread at
//! the median point; leaves hold up to [`LEAF_SIZE`] points. Points are stored in
//! tree order next to their original slots so leaf scans are contiguous.

use alloc::vec::Vec;

use crate::backend::{Backend, SlotHit};
use crate::types::{Aabb3D, Coord3};
use crate::util::KBest;

/// Maximum number of points in a leaf before it is split.
const LEAF_SIZE: usize = 16;

#[derive(Clone, Debug)]
enum Node {
    /// Points with `coord[axis] <= value` are on the left, `>= value` on the right.
    Split {
        axis: usize,
        value: f64,
        left: usize,
        right: usize,
    },
    /// Range `[start, end)` into `points`/`slots`.
    Leaf { start: usize, end: usize },
}

/// KD-tree backend, bulk-built with median splits.
#[derive(Clone, Debug, Default)]
pub struct KdTree {
    nodes: Vec<Node>,
    points: Vec<Coord3>,
    slots: Vec<usize>,
}

impl KdTree {
    fn build_recursive(&mut self, order: &mut [usize], source: &[Coord3], start: usize) -> usize {
        let count = order.len();
        if count <= LEAF_SIZE {
            let idx = self.nodes.len();
            self.nodes.push(Node::Leaf {
                start,
                end: start + count,
            });
            return idx;
        }

        let axis = widest_axis(order, source);
        let mid = count / 2;
        order.select_nth_unstable_by(mid, |&a, &b| {
            source[a].axis(axis).total_cmp(&source[b].axis(axis))
        });
        let value = source[order[mid]].axis(axis);

        // Reserve the parent so children get higher indices.
        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf { start: 0, end: 0 });

        let (lo, hi) = order.split_at_mut(mid);
        let left = self.build_recursive(lo, source, start);
        let right = self.build_recursive(hi, source, start + mid);
        self.nodes[idx] = Node::Split {
            axis,
            value,
            left,
            right,
        };
        idx
    }

    fn visit_box_from<F: FnMut(usize)>(&self, node: usize, aabb: &Aabb3D, f: &mut F) {
        match self.nodes[node] {
            Node::Leaf { start, end } => {
                for i in start..end {
                    if aabb.contains(self.points[i]) {
                        f(self.slots[i]);
                    }
                }
            }
            Node::Split {
                axis,
                value,
                left,
                right,
            } => {
                if aabb.min.axis(axis) <= value {
                    self.visit_box_from(left, aabb, f);
                }
                if value < aabb.max.axis(axis) {
                    self.visit_box_from(right, aabb, f);
                }
            }
        }
    }

    fn visit_sphere_from<F: FnMut(usize, f64)>(
        &self,
        node: usize,
        center: Coord3,
        radius_sq: f64,
        f: &mut F,
    ) {
        match self.nodes[node] {
            Node::Leaf { start, end } => {
                for i in start..end {
                    let d = center.distance_sq(self.points[i]);
                    if d <= radius_sq {
                        f(self.slots[i], d);
                    }
                }
            }
            Node::Split {
                axis,
                value,
                left,
                right,
            } => {
                let diff = center.axis(axis) - value;
                let (near, far) = if diff < 0.0 {
                    (left, right)
                } else {
                    (right, left)
                };
                self.visit_sphere_from(near, center, radius_sq, f);
                if diff * diff <= radius_sq {
                    self.visit_sphere_from(far, center, radius_sq, f);
                }
            }
        }
    }

    fn nearest_from(&self, node: usize, center: Coord3, best: &mut KBest) {
        match self.nodes[node] {
            Node::Leaf { start, end } => {
                for i in start..end {
                    best.offer(self.slots[i], center.distance_sq(self.points[i]));
                }
            }
            Node::Split {
                axis,
                value,
                left,
                right,
            } => {
                let diff = center.axis(axis) - value;
                let (near, far) = if diff < 0.0 {
                    (left, right)
                } else {
                    (right, left)
                };
                self.nearest_from(near, center, best);
                // Equal bounds are still explored: a tie may carry a lower slot.
                if best.admits(diff * diff) {
                    self.nearest_from(far, center, best);
                }
            }
        }
    }
}

fn widest_axis(order: &[usize], source: &[Coord3]) -> usize {
    let mut lo = [f64::INFINITY; 3];
    let mut hi = [f64::NEG_INFINITY; 3];
    for &i in order {
        for axis in 0..3 {
            let v = source[i].axis(axis);
            lo[axis] = lo[axis].min(v);
            hi[axis] = hi[axis].max(v);
        }
    }
    let mut best = 0;
    for axis in 1..3 {
        if hi[axis] - lo[axis] > hi[best] - lo[best] {
            best = axis;
        }
    }
    best
}

impl Backend for KdTree {
    fn build(&mut self, points: &[Coord3]) {
        self.clear();
        if points.is_empty() {
            return;
        }
        debug_assert!(
            points.iter().all(|p| !p.is_nan()),
            "kd-tree input must not contain NaN coordinates"
        );

        let mut order: Vec<usize> = (0..points.len()).collect();
        self.build_recursive(&mut order, points, 0);

        self.points.extend(order.iter().map(|&i| points[i]));
        self.slots = order;
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.points.clear();
        self.slots.clear();
    }

    fn len(&self) -> usize {
        self.points.len()
    }

    fn visit_box<F: FnMut(usize)>(&self, aabb: Aabb3D, mut f: F) {
        if self.nodes.is_empty() || aabb.is_empty() {
            return;
        }
        self.visit_box_from(0, &aabb, &mut f);
    }

    fn visit_sphere<F: FnMut(usize, f64)>(&self, center: Coord3, radius: f64, mut f: F) {
        if self.nodes.is_empty() || radius < 0.0 {
            return;
        }
        self.visit_sphere_from(0, center, radius * radius, &mut f);
    }

    fn nearest(&self, center: Coord3, k: usize, out: &mut Vec<SlotHit>) {
        if self.nodes.is_empty() || k == 0 {
            return;
        }
        let mut best = KBest::new(k);
        self.nearest_from(0, center, &mut best);
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

    fn random_points(rng: &mut ChaCha8Rng, n: usize, extent: f64) -> Vec<Coord3> {
        (0..n)
            .map(|_| {
                Coord3::new(
                    rng.gen_range(-extent..extent),
                    rng.gen_range(-extent..extent),
                    rng.gen_range(-extent..extent),
                )
            })
            .collect()
    }

    #[test]
    fn empty_tree() {
        let mut tree = KdTree::default();
        tree.build(&[]);
        assert!(tree.is_empty());
        let mut out = Vec::new();
        tree.nearest(Coord3::ORIGIN, 3, &mut out);
        assert!(out.is_empty());
        let mut n = 0;
        tree.visit_sphere(Coord3::ORIGIN, 1e9, |_, _| n += 1);
        assert_eq!(n, 0);
    }

    #[test]
    fn slots_survive_reordering() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let points = random_points(&mut rng, 200, 100.0);
        let mut tree = KdTree::default();
        tree.build(&points);
        assert_eq!(tree.len(), 200);

        for (slot, p) in points.iter().enumerate() {
            let mut out = Vec::new();
            tree.nearest(*p, 1, &mut out);
            assert_eq!(out[0].slot, slot, "a point is its own nearest neighbor");
            assert_eq!(out[0].dist_sq, 0.0);
        }
    }

    #[test]
    fn matches_linear_scan() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let points = random_points(&mut rng, 1000, 500.0);
        let mut tree = KdTree::default();
        tree.build(&points);
        let mut flat = FlatVec::default();
        flat.build(&points);

        for _ in 0..50 {
            let q = random_points(&mut rng, 1, 600.0)[0];
            let k = rng.gen_range(1..40);

            let (mut a, mut b) = (Vec::new(), Vec::new());
            tree.nearest(q, k, &mut a);
            flat.nearest(q, k, &mut b);
            assert_eq!(a, b, "nearest mismatch for {q:?}, k = {k}");

            let r: f64 = rng.gen_range(0.0..150.0);
            let mut sa = Vec::new();
            tree.visit_sphere(q, r, |s, _| sa.push(s));
            let mut sb = Vec::new();
            flat.visit_sphere(q, r, |s, _| sb.push(s));
            sa.sort_unstable();
            sb.sort_unstable();
            assert_eq!(sa, sb, "sphere mismatch for {q:?}, r = {r}");

            let half: f64 = rng.gen_range(1.0..200.0);
            let aabb = Aabb3D::new(
                Coord3::new(q.x - half, q.y, q.z - half),
                Coord3::new(q.x, q.y + half, q.z + half),
            );
            let mut ba = Vec::new();
            tree.visit_box(aabb, |s| ba.push(s));
            let mut bb = Vec::new();
            flat.visit_box(aabb, |s| bb.push(s));
            ba.sort_unstable();
            bb.sort_unstable();
            assert_eq!(ba, bb, "box mismatch for {aabb:?}");
        }
    }

    #[test]
    fn duplicates_tie_break_by_slot() {
        let points = vec![Coord3::new(1.0, 1.0, 1.0); 40];
        let mut tree = KdTree::default();
        tree.build(&points);
        let mut out = Vec::new();
        tree.nearest(Coord3::ORIGIN, 5, &mut out);
        let slots: Vec<usize> = out.iter().map(|h| h.slot).collect();
        assert_eq!(slots, vec![0, 1, 2, 3, 4]);
    }
}
