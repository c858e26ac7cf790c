// Copyright 2026 the Starlane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend trait for spatial indexing implementations.

use alloc::vec::Vec;

use crate::types::{Aabb3D, Coord3};

/// A slot returned by a distance query, with its squared distance to the query center.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SlotHit {
    /// Dense slot index of the matched point.
    pub slot: usize,
    /// Squared Euclidean distance to the query center.
    pub dist_sq: f64,
}

/// Spatial backend abstraction used by [`SpatialIndex`][crate::SpatialIndex].
///
/// Backends are bulk-built once and then only queried. Slots are the positions of
/// the points in the slice passed to [`build`][Backend::build].
pub trait Backend {
    /// Replace the contents of the backend with `points`; point `i` gets slot `i`.
    fn build(&mut self, points: &[Coord3]);

    /// Clear all spatial structures.
    fn clear(&mut self);

    /// Number of indexed points.
    fn len(&self) -> usize;

    /// Whether the backend holds no points.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visit slots whose point lies inside the half-open box.
    fn visit_box<F: FnMut(usize)>(&self, aabb: Aabb3D, f: F);

    /// Visit slots whose point lies within `radius` (inclusive) of `center`.
    ///
    /// The callback receives the slot and its squared distance to `center`.
    fn visit_sphere<F: FnMut(usize, f64)>(&self, center: Coord3, radius: f64, f: F);

    /// Append the `k` slots closest to `center` to `out`.
    ///
    /// Results must be ascending by `(dist_sq, slot)`: equal distances resolve to the
    /// lower slot, whichever order the backend discovers them in.
    fn nearest(&self, center: Coord3, k: usize, out: &mut Vec<SlotHit>);
}
