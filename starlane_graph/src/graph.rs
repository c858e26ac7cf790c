// Copyright 2026 the Starlane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `NeighborGraph`: recomputes and maintains per-point neighbor edges in a [`PointStore`].

use starlane_index::Coord3;
use tracing::{debug, debug_span, warn};

use crate::config::NeighborConfig;
use crate::error::{ConfigError, GraphError};
use crate::octant::select_balanced;
use crate::store::PointStore;
use crate::types::{NeighborEdge, Point, PointId};

/// Result type for graph operations over store `S`.
pub type GraphResult<T, S> = Result<T, GraphError<<S as PointStore>::Error>>;

/// Keeps the octant-balanced neighbor relation of a point store up to date.
///
/// The graph holds no state besides its store handle and configuration. Every operation
/// takes a fresh snapshot of the store, builds the spatial indexes it needs, and drops
/// them before returning. Callers must not run two operations for the same point id at
/// the same time; operations on different ids may overlap.
#[derive(Debug)]
pub struct NeighborGraph<S> {
    store: S,
    config: NeighborConfig,
}

/// A point whose label matched a [`NeighborGraph::search_labels`] query.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelMatch {
    /// The matching point.
    pub point: Point,
    /// Euclidean distance from the query position.
    pub distance: f64,
}

impl<S: PointStore> NeighborGraph<S> {
    /// Create a graph over `store` with the default configuration.
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: NeighborConfig::default(),
        }
    }

    /// Create a graph over `store` with an explicit configuration.
    ///
    /// Fails if [`NeighborConfig::validate`] rejects `config`.
    pub fn with_config(store: S, config: NeighborConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The active configuration.
    pub fn config(&self) -> &NeighborConfig {
        &self.config
    }

    /// Consume the graph, returning its store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Replace the stored neighbor edges of `id` with a freshly selected set.
    ///
    /// Returns the new edges in selection order: octants from least to most populated,
    /// nearest first within each octant. An empty universe yields no edges. The old edges
    /// are deleted only once the new set has been computed; if the final write fails the
    /// point is left without edges and the call should be retried.
    pub fn recompute(&self, id: PointId) -> GraphResult<Vec<NeighborEdge>, S> {
        let _span = debug_span!("recompute", %id).entered();

        let point = self
            .store
            .point(id)
            .map_err(GraphError::Storage)?
            .ok_or(GraphError::NotFound(id))?;
        let universe = self
            .store
            .all_points(Some(id))
            .map_err(GraphError::Storage)?;

        let selection = select_balanced(point.position, &universe, self.config.k, &self.config);
        let edges: Vec<NeighborEdge> = selection
            .iter()
            .flat_map(|octant| &octant.picks)
            .map(|ranked| NeighborEdge {
                source: id,
                neighbor: ranked.point.id,
                distance: ranked.distance,
            })
            .collect();

        self.store
            .delete_neighbor_edges(id)
            .map_err(GraphError::Storage)?;
        if !edges.is_empty() {
            self.store
                .upsert_neighbor_edges(id, &edges)
                .map_err(GraphError::Storage)?;
        } else if self.config.k > 0 && !universe.is_empty() {
            warn!(
                point = %point.display_name(),
                universe = universe.len(),
                cap = self.config.shell.cap,
                "no neighbors within shell cap"
            );
        }

        debug!(
            point = %point.display_name(),
            universe = universe.len(),
            octants = selection.len(),
            edges = edges.len(),
            "neighbors recomputed"
        );
        Ok(edges)
    }

    /// The stored edges of `id`, ascending by distance (ties by neighbor id).
    pub fn neighbors(&self, id: PointId) -> GraphResult<Vec<NeighborEdge>, S> {
        if self
            .store
            .point(id)
            .map_err(GraphError::Storage)?
            .is_none()
        {
            return Err(GraphError::NotFound(id));
        }
        let mut edges = self
            .store
            .neighbor_edges(id)
            .map_err(GraphError::Storage)?;
        edges.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.neighbor.cmp(&b.neighbor))
        });
        Ok(edges)
    }

    /// Clean up after `id` was removed from the store.
    ///
    /// Deletes the edges `id` owned, then recomputes every remaining point that listed
    /// `id` as a neighbor. Returns those points' ids in ascending order. The store must no
    /// longer return `id` as a point, or it would be selected again.
    pub fn forget(&self, id: PointId) -> GraphResult<Vec<PointId>, S> {
        let _span = debug_span!("forget", %id).entered();

        if self
            .store
            .point(id)
            .map_err(GraphError::Storage)?
            .is_some()
        {
            warn!("forgetting a point the store still holds");
        }
        self.store
            .delete_neighbor_edges(id)
            .map_err(GraphError::Storage)?;

        let mut referrers = Vec::new();
        for p in self.store.all_points(Some(id)).map_err(GraphError::Storage)? {
            let edges = self
                .store
                .neighbor_edges(p.id)
                .map_err(GraphError::Storage)?;
            if edges.iter().any(|e| e.neighbor == id) {
                referrers.push(p.id);
            }
        }
        for &referrer in &referrers {
            self.recompute(referrer)?;
        }
        debug!(repaired = referrers.len(), "forgot point");
        Ok(referrers)
    }

    /// Points whose label contains `needle`, ascending by `(distance, id)` from `from`.
    ///
    /// Matching is a case-sensitive substring test. Distances are measured from the
    /// coordinate origin when `from` is `None`. Unlabeled points never match.
    pub fn search_labels(
        &self,
        needle: &str,
        from: Option<Coord3>,
    ) -> GraphResult<Vec<LabelMatch>, S> {
        let from = from.unwrap_or(Coord3::ORIGIN);
        let mut matches: Vec<LabelMatch> = self
            .store
            .all_points(None)
            .map_err(GraphError::Storage)?
            .into_iter()
            .filter(|p| p.label.as_deref().is_some_and(|l| l.contains(needle)))
            .map(|point| LabelMatch {
                distance: point.distance_to(from),
                point,
            })
            .collect();
        matches.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.point.id.cmp(&b.point.id))
        });
        Ok(matches)
    }
}
