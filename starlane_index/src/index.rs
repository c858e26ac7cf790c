// Copyright 2026 the Starlane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public `SpatialIndex` API and generic implementation over a pluggable backend.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::backend::{Backend, SlotHit};
use crate::types::{Aabb3D, Coord3};

/// A point returned by a distance query.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Hit<P> {
    /// The payload the point was indexed with.
    pub payload: P,
    /// The indexed position.
    pub position: Coord3,
    /// Squared Euclidean distance to the query center.
    pub dist_sq: f64,
}

/// An immutable point index parameterized by a spatial backend.
///
/// The index is built in one shot and then only queried; rebuild it to reflect a
/// changed point set. Entries are sorted by payload before slots are assigned, so
/// wherever a query has to choose between equidistant points it picks the smaller
/// payload, independent of backend and input order.
#[derive(Debug)]
pub struct SpatialIndex<P, B> {
    payloads: Vec<P>,
    positions: Vec<Coord3>,
    backend: B,
}

impl<P, B> SpatialIndex<P, B>
where
    P: Copy + Ord + Debug,
    B: Backend + Default,
{
    /// Build an index over `entries` using the backend's default constructor.
    pub fn build<I: IntoIterator<Item = (P, Coord3)>>(entries: I) -> Self {
        Self::build_with(B::default(), entries)
    }
}

impl<P, B> SpatialIndex<P, B>
where
    P: Copy + Ord + Debug,
    B: Backend,
{
    /// Build an index over `entries` using an explicit backend instance.
    ///
    /// This is useful when higher layers want to configure the backend (for example
    /// a grid cell size) before wiring it into the index.
    pub fn build_with<I: IntoIterator<Item = (P, Coord3)>>(mut backend: B, entries: I) -> Self {
        let mut entries: Vec<(P, Coord3)> = entries.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        let (payloads, positions): (Vec<P>, Vec<Coord3>) = entries.into_iter().unzip();
        backend.build(&positions);
        Self {
            payloads,
            positions,
            backend,
        }
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    /// Whether the index holds no points.
    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    /// Query for entries inside the half-open box, in payload order.
    pub fn query_box(&self, aabb: Aabb3D) -> impl Iterator<Item = (P, Coord3)> + '_ {
        let mut slots = Vec::new();
        self.backend.visit_box(aabb, |i| slots.push(i));
        slots.sort_unstable();
        slots
            .into_iter()
            .map(|i| (self.payloads[i], self.positions[i]))
    }

    /// Entries within `radius` (inclusive) of `center`, ascending by `(dist_sq, payload)`.
    pub fn query_radius(&self, center: Coord3, radius: f64) -> Vec<Hit<P>> {
        let mut found = Vec::new();
        self.backend
            .visit_sphere(center, radius, |slot, dist_sq| {
                found.push(SlotHit { slot, dist_sq });
            });
        found.sort_unstable_by(|a, b| a.dist_sq.total_cmp(&b.dist_sq).then(a.slot.cmp(&b.slot)));
        found.into_iter().map(|h| self.hit(h)).collect()
    }

    /// The `k` entries closest to `center`, ascending by `(dist_sq, payload)`.
    ///
    /// Returns every entry when the index holds fewer than `k`.
    pub fn nearest(&self, center: Coord3, k: usize) -> Vec<Hit<P>> {
        let mut found = Vec::with_capacity(k.min(self.len()));
        self.backend.nearest(center, k, &mut found);
        found.into_iter().map(|h| self.hit(h)).collect()
    }

    fn hit(&self, h: SlotHit) -> Hit<P> {
        Hit {
            payload: self.payloads[h.slot],
            position: self.positions[h.slot],
            dist_sq: h.dist_sq,
        }
    }
}

/// Default index using a KD-tree backend.
pub type Index<P> = SpatialIndex<P, crate::backends::KdTree>;

impl<P: Copy + Ord + Debug> Default for Index<P> {
    fn default() -> Self {
        Self::build(core::iter::empty())
    }
}

impl<P: Copy + Ord + Debug> Index<P> {
    /// Build a linear-scan index.
    pub fn with_flatvec<I: IntoIterator<Item = (P, Coord3)>>(
        entries: I,
    ) -> SpatialIndex<P, crate::backends::FlatVec> {
        SpatialIndex::build(entries)
    }

    /// Build a uniform-grid index with the given cell size.
    #[cfg(feature = "backend_grid")]
    pub fn with_grid<I: IntoIterator<Item = (P, Coord3)>>(
        cell_size: f64,
        entries: I,
    ) -> SpatialIndex<P, crate::backends::Grid> {
        SpatialIndex::build_with(crate::backends::Grid::new(cell_size), entries)
    }
}
