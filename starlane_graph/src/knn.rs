// Copyright 2026 the Starlane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! KNN finder: exact nearest and radius queries over a bounded pool of points.
//!
//! Both queries are pure: each call builds a fresh spatial index over the pool,
//! answers, and drops it. Nothing is cached between calls.

use starlane_index::backends::{FlatVec, Grid, KdTree};
use starlane_index::{Aabb3D, Coord3, Hit, SpatialIndex};

use crate::config::BackendKind;
use crate::types::Point;

/// A pool point together with its Euclidean distance to the query origin.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ranked<'a> {
    /// The matched point.
    pub point: &'a Point,
    /// Euclidean distance to the query origin.
    pub distance: f64,
}

/// Index payload: id first, so equal distances break ties by ascending id; the pool
/// position disambiguates duplicate ids.
type Key = (crate::PointId, usize);

/// A per-call index over a borrowed pool, with the backend picked at runtime.
pub(crate) struct PoolIndex<'a> {
    pool: Vec<&'a Point>,
    index: Backed,
}

enum Backed {
    KdTree(SpatialIndex<Key, KdTree>),
    Grid(SpatialIndex<Key, Grid>),
    Linear(SpatialIndex<Key, FlatVec>),
}

impl<'a> PoolIndex<'a> {
    pub(crate) fn build<I>(pool: I, backend: BackendKind) -> Self
    where
        I: IntoIterator<Item = &'a Point>,
    {
        let pool: Vec<&'a Point> = pool.into_iter().collect();
        let entries = pool.iter().enumerate().map(|(i, p)| ((p.id, i), p.position));
        let index = match backend {
            BackendKind::KdTree => Backed::KdTree(SpatialIndex::build(entries)),
            BackendKind::Grid { cell_size } => {
                Backed::Grid(SpatialIndex::build_with(Grid::new(cell_size), entries))
            }
            BackendKind::Linear => Backed::Linear(SpatialIndex::build(entries)),
        };
        Self { pool, index }
    }

    pub(crate) fn len(&self) -> usize {
        self.pool.len()
    }

    /// Pool points inside the half-open box, in id order.
    pub(crate) fn in_box(&self, aabb: Aabb3D) -> Vec<&'a Point> {
        let keys: Vec<Key> = match &self.index {
            Backed::KdTree(idx) => idx.query_box(aabb).map(|(k, _)| k).collect(),
            Backed::Grid(idx) => idx.query_box(aabb).map(|(k, _)| k).collect(),
            Backed::Linear(idx) => idx.query_box(aabb).map(|(k, _)| k).collect(),
        };
        keys.into_iter().map(|(_, i)| self.pool[i]).collect()
    }

    pub(crate) fn nearest(&self, origin: Coord3, m: usize) -> Vec<Ranked<'a>> {
        let hits = match &self.index {
            Backed::KdTree(idx) => idx.nearest(origin, m),
            Backed::Grid(idx) => idx.nearest(origin, m),
            Backed::Linear(idx) => idx.nearest(origin, m),
        };
        self.rank(hits)
    }

    pub(crate) fn within(&self, origin: Coord3, radius: f64) -> Vec<Ranked<'a>> {
        // The index compares squared distances; widen slightly, then cut on the reported
        // distance so a point exactly at `radius` is always kept.
        let widened = radius * (1.0 + 4.0 * f64::EPSILON);
        let hits = match &self.index {
            Backed::KdTree(idx) => idx.query_radius(origin, widened),
            Backed::Grid(idx) => idx.query_radius(origin, widened),
            Backed::Linear(idx) => idx.query_radius(origin, widened),
        };
        let mut ranked = self.rank(hits);
        ranked.retain(|r| r.distance <= radius);
        ranked
    }

    fn rank(&self, hits: Vec<Hit<Key>>) -> Vec<Ranked<'a>> {
        hits.into_iter()
            .map(|h| Ranked {
                point: self.pool[h.payload.1],
                distance: h.dist_sq.sqrt(),
            })
            .collect()
    }
}

/// Up to `m` pool points closest to `origin`, ascending by `(distance, id)`.
///
/// Returns the whole pool (sorted) when it holds fewer than `m` points. `backend`
/// should pass [`BackendKind::validate`].
pub fn nearest<'a, I>(origin: Coord3, pool: I, m: usize, backend: BackendKind) -> Vec<Ranked<'a>>
where
    I: IntoIterator<Item = &'a Point>,
{
    PoolIndex::build(pool, backend).nearest(origin, m)
}

/// Every pool point within `radius` (inclusive) of `origin`, ascending by `(distance, id)`.
pub fn radius<'a, I>(origin: Coord3, pool: I, radius: f64, backend: BackendKind) -> Vec<Ranked<'a>>
where
    I: IntoIterator<Item = &'a Point>,
{
    PoolIndex::build(pool, backend).within(origin, radius)
}
