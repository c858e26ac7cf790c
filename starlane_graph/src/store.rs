// Copyright 2026 the Starlane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The point store seam, plus a thread-safe in-memory implementation.

use std::sync::{Arc, RwLock};

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use starlane_index::Coord3;
use thiserror::Error;

use crate::types::{NeighborEdge, Point, PointId};

/// Persistence for points and their neighbor edges.
///
/// The graph never caches anything it reads from the store; every operation works on a
/// fresh snapshot. Implementations take `&self` so a single store can serve concurrent
/// operations on different point ids.
pub trait PointStore {
    /// The store's failure type, surfaced unchanged as
    /// [`GraphError::Storage`](crate::GraphError::Storage).
    type Error: std::error::Error + Send + Sync + 'static;

    /// Every point, optionally without `exclude`.
    fn all_points(&self, exclude: Option<PointId>) -> Result<Vec<Point>, Self::Error>;

    /// A single point, or `None` if the id is unknown.
    fn point(&self, id: PointId) -> Result<Option<Point>, Self::Error>;

    /// Add edges for `id`. An existing edge to the same neighbor is replaced.
    fn upsert_neighbor_edges(&self, id: PointId, edges: &[NeighborEdge])
    -> Result<(), Self::Error>;

    /// Remove every edge whose source is `id`. Removing nothing is not an error.
    fn delete_neighbor_edges(&self, id: PointId) -> Result<(), Self::Error>;

    /// The stored edges whose source is `id`, in the order they were written.
    fn neighbor_edges(&self, id: PointId) -> Result<Vec<NeighborEdge>, Self::Error>;
}

impl<S: PointStore + ?Sized> PointStore for &S {
    type Error = S::Error;

    fn all_points(&self, exclude: Option<PointId>) -> Result<Vec<Point>, Self::Error> {
        (**self).all_points(exclude)
    }

    fn point(&self, id: PointId) -> Result<Option<Point>, Self::Error> {
        (**self).point(id)
    }

    fn upsert_neighbor_edges(
        &self,
        id: PointId,
        edges: &[NeighborEdge],
    ) -> Result<(), Self::Error> {
        (**self).upsert_neighbor_edges(id, edges)
    }

    fn delete_neighbor_edges(&self, id: PointId) -> Result<(), Self::Error> {
        (**self).delete_neighbor_edges(id)
    }

    fn neighbor_edges(&self, id: PointId) -> Result<Vec<NeighborEdge>, Self::Error> {
        (**self).neighbor_edges(id)
    }
}

impl<S: PointStore + ?Sized> PointStore for Arc<S> {
    type Error = S::Error;

    fn all_points(&self, exclude: Option<PointId>) -> Result<Vec<Point>, Self::Error> {
        (**self).all_points(exclude)
    }

    fn point(&self, id: PointId) -> Result<Option<Point>, Self::Error> {
        (**self).point(id)
    }

    fn upsert_neighbor_edges(
        &self,
        id: PointId,
        edges: &[NeighborEdge],
    ) -> Result<(), Self::Error> {
        (**self).upsert_neighbor_edges(id, edges)
    }

    fn delete_neighbor_edges(&self, id: PointId) -> Result<(), Self::Error> {
        (**self).delete_neighbor_edges(id)
    }

    fn neighbor_edges(&self, id: PointId) -> Result<Vec<NeighborEdge>, Self::Error> {
        (**self).neighbor_edges(id)
    }
}

/// Failures of [`MemoryStore`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemoryStoreError {
    /// A writer panicked while holding one of the store's locks.
    #[error("memory store lock poisoned")]
    Poisoned,
    /// `insert_point` was called with an id that is already present.
    #[error("point {0} already exists")]
    DuplicateId(PointId),
    /// The point does not exist.
    #[error("point {0} does not exist")]
    UnknownPoint(PointId),
}

/// An in-memory [`PointStore`] guarded by read-write locks.
///
/// Points are returned in id order. Edges are kept per source in write order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    points: RwLock<HashMap<PointId, Point>>,
    edges: RwLock<HashMap<PointId, Vec<NeighborEdge>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `points`; later duplicates of an id replace earlier ones.
    pub fn with_points<I: IntoIterator<Item = Point>>(points: I) -> Self {
        let points = points.into_iter().map(|p| (p.id, p)).collect();
        Self {
            points: RwLock::new(points),
            edges: RwLock::default(),
        }
    }

    /// Add a new point.
    pub fn insert_point(&self, point: Point) -> Result<(), MemoryStoreError> {
        let mut points = self.points.write().map_err(|_| MemoryStoreError::Poisoned)?;
        match points.entry(point.id) {
            Entry::Occupied(_) => Err(MemoryStoreError::DuplicateId(point.id)),
            Entry::Vacant(slot) => {
                slot.insert(point);
                Ok(())
            }
        }
    }

    /// Change a point's position, returning the previous one.
    pub fn move_point(
        &self,
        id: PointId,
        position: impl Into<Coord3>,
    ) -> Result<Coord3, MemoryStoreError> {
        let mut points = self.points.write().map_err(|_| MemoryStoreError::Poisoned)?;
        let point = points
            .get_mut(&id)
            .ok_or(MemoryStoreError::UnknownPoint(id))?;
        Ok(core::mem::replace(&mut point.position, position.into()))
    }

    /// Remove a point and the edges it owns. Edges of other points that name it are left
    /// in place; [`NeighborGraph::forget`](crate::NeighborGraph::forget) repairs those.
    pub fn remove_point(&self, id: PointId) -> Result<Point, MemoryStoreError> {
        let removed = self
            .points
            .write()
            .map_err(|_| MemoryStoreError::Poisoned)?
            .remove(&id)
            .ok_or(MemoryStoreError::UnknownPoint(id))?;
        self.edges
            .write()
            .map_err(|_| MemoryStoreError::Poisoned)?
            .remove(&id);
        Ok(removed)
    }

    /// Number of stored points.
    pub fn point_count(&self) -> Result<usize, MemoryStoreError> {
        Ok(self
            .points
            .read()
            .map_err(|_| MemoryStoreError::Poisoned)?
            .len())
    }
}

impl PointStore for MemoryStore {
    type Error = MemoryStoreError;

    fn all_points(&self, exclude: Option<PointId>) -> Result<Vec<Point>, Self::Error> {
        let points = self.points.read().map_err(|_| MemoryStoreError::Poisoned)?;
        let mut out: Vec<Point> = points
            .values()
            .filter(|p| Some(p.id) != exclude)
            .cloned()
            .collect();
        out.sort_unstable_by_key(|p| p.id);
        Ok(out)
    }

    fn point(&self, id: PointId) -> Result<Option<Point>, Self::Error> {
        let points = self.points.read().map_err(|_| MemoryStoreError::Poisoned)?;
        Ok(points.get(&id).cloned())
    }

    fn upsert_neighbor_edges(
        &self,
        id: PointId,
        edges: &[NeighborEdge],
    ) -> Result<(), Self::Error> {
        let mut all = self.edges.write().map_err(|_| MemoryStoreError::Poisoned)?;
        let stored = all.entry(id).or_default();
        for edge in edges {
            debug_assert_eq!(edge.source, id, "edge written under the wrong source");
            match stored.iter_mut().find(|e| e.neighbor == edge.neighbor) {
                Some(existing) => *existing = *edge,
                None => stored.push(*edge),
            }
        }
        Ok(())
    }

    fn delete_neighbor_edges(&self, id: PointId) -> Result<(), Self::Error> {
        self.edges
            .write()
            .map_err(|_| MemoryStoreError::Poisoned)?
            .remove(&id);
        Ok(())
    }

    fn neighbor_edges(&self, id: PointId) -> Result<Vec<NeighborEdge>, Self::Error> {
        let all = self.edges.read().map_err(|_| MemoryStoreError::Poisoned)?;
        Ok(all.get(&id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(source: u64, neighbor: u64, distance: f64) -> NeighborEdge {
        NeighborEdge {
            source: PointId(source),
            neighbor: PointId(neighbor),
            distance,
        }
    }

    #[test]
    fn all_points_is_sorted_and_honors_exclude() {
        let store = MemoryStore::with_points([
            Point::new(3, [0.0; 3]),
            Point::new(1, [1.0, 0.0, 0.0]),
            Point::new(2, [2.0, 0.0, 0.0]),
        ]);
        let ids: Vec<u64> = store
            .all_points(None)
            .unwrap()
            .iter()
            .map(|p| p.id.0)
            .collect();
        assert_eq!(ids, [1, 2, 3]);
        let ids: Vec<u64> = store
            .all_points(Some(PointId(2)))
            .unwrap()
            .iter()
            .map(|p| p.id.0)
            .collect();
        assert_eq!(ids, [1, 3]);
    }

    #[test]
    fn point_crud() {
        let store = MemoryStore::new();
        store.insert_point(Point::new(1, [1.0, 2.0, 3.0])).unwrap();
        assert_eq!(
            store.insert_point(Point::new(1, [0.0; 3])),
            Err(MemoryStoreError::DuplicateId(PointId(1)))
        );
        let old = store.move_point(PointId(1), [4.0, 5.0, 6.0]).unwrap();
        assert_eq!(old, Coord3::new(1.0, 2.0, 3.0));
        assert_eq!(
            store.point(PointId(1)).unwrap().map(|p| p.position),
            Some(Coord3::new(4.0, 5.0, 6.0))
        );
        assert_eq!(
            store.move_point(PointId(9), [0.0; 3]),
            Err(MemoryStoreError::UnknownPoint(PointId(9)))
        );
        assert_eq!(store.point_count(), Ok(1));
        store.remove_point(PointId(1)).unwrap();
        assert_eq!(store.point_count(), Ok(0));
        assert_eq!(store.point(PointId(1)), Ok(None));
    }

    #[test]
    fn upsert_replaces_same_neighbor() {
        let store = MemoryStore::new();
        store
            .upsert_neighbor_edges(PointId(1), &[edge(1, 2, 3.0), edge(1, 3, 4.0)])
            .unwrap();
        store
            .upsert_neighbor_edges(PointId(1), &[edge(1, 2, 5.0)])
            .unwrap();
        let edges = store.neighbor_edges(PointId(1)).unwrap();
        assert_eq!(edges, [edge(1, 2, 5.0), edge(1, 3, 4.0)]);
    }

    #[test]
    fn delete_is_idempotent() {
        let store = MemoryStore::new();
        store
            .upsert_neighbor_edges(PointId(1), &[edge(1, 2, 3.0)])
            .unwrap();
        store.delete_neighbor_edges(PointId(1)).unwrap();
        store.delete_neighbor_edges(PointId(1)).unwrap();
        assert!(store.neighbor_edges(PointId(1)).unwrap().is_empty());
    }

    #[test]
    fn shared_handles_forward() {
        let store = Arc::new(MemoryStore::with_points([Point::new(1, [0.0; 3])]));
        let by_ref: &MemoryStore = &store;
        assert_eq!(by_ref.all_points(None).unwrap().len(), 1);
        assert_eq!(store.point(PointId(1)).unwrap().map(|p| p.id), Some(PointId(1)));
    }

    #[test]
    fn poisoned_locks_surface_as_errors() {
        use crate::{GraphError, NeighborGraph};

        let store = Arc::new(MemoryStore::with_points([
            Point::new(1, [0.0; 3]),
            Point::new(2, [1.0, 0.0, 0.0]),
        ]));
        let graph = NeighborGraph::new(Arc::clone(&store));
        graph.recompute(PointId(1)).unwrap();

        let writer = Arc::clone(&store);
        let joined = std::thread::spawn(move || {
            let _edges = writer.edges.write().unwrap();
            panic!("writer died holding the edge lock");
        })
        .join();
        assert!(joined.is_err());
        assert!(matches!(
            graph.recompute(PointId(1)),
            Err(GraphError::Storage(MemoryStoreError::Poisoned))
        ));
        assert_eq!(
            store.neighbor_edges(PointId(1)),
            Err(MemoryStoreError::Poisoned)
        );
        assert_eq!(store.point_count(), Ok(2), "the point lock is still healthy");

        let writer = Arc::clone(&store);
        let joined = std::thread::spawn(move || {
            let _points = writer.points.write().unwrap();
            panic!("writer died holding the point lock");
        })
        .join();
        assert!(joined.is_err());
        assert!(matches!(
            graph.recompute(PointId(2)),
            Err(GraphError::Storage(MemoryStoreError::Poisoned))
        ));
        assert_eq!(store.point_count(), Err(MemoryStoreError::Poisoned));
        assert_eq!(
            store.insert_point(Point::new(3, [0.0; 3])),
            Err(MemoryStoreError::Poisoned)
        );
    }
}
