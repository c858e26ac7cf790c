// Copyright 2026 the Starlane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Propagation controller: after a point's neighbors change, recompute the points around it.
//!
//! A point that moved (or appeared) may now belong in the neighbor sets of points within
//! its own neighbor radius. Propagation recomputes exactly those points, once each, nearest
//! first. With a depth above one, each recomputed point's new radius seeds the next level.

use hashbrown::HashSet;
use tracing::{debug, debug_span, trace};

use crate::error::GraphError;
use crate::graph::{GraphResult, NeighborGraph};
use crate::knn;
use crate::store::PointStore;
use crate::types::{NeighborEdge, Point, PointId, max_distance};

/// Outcome of [`NeighborGraph::recompute_and_propagate`].
#[derive(Clone, Debug, PartialEq)]
pub struct PropagationReport {
    /// The updated point's new edges, in selection order.
    pub edges: Vec<NeighborEdge>,
    /// The largest of those edge distances; `None` when the point has no edges, in which
    /// case nothing was propagated.
    pub radius: Option<f64>,
    /// Points recomputed by propagation, in visit order.
    pub recomputed: Vec<PointId>,
}

impl<S: PointStore> NeighborGraph<S> {
    /// Recompute `id`, then propagate the change to the points around it.
    ///
    /// This is the entry point for point creation and coordinate changes.
    pub fn recompute_and_propagate(&self, id: PointId) -> GraphResult<PropagationReport, S> {
        let edges = self.recompute(id)?;
        let radius = max_distance(&edges);
        let recomputed = match radius {
            Some(radius) => self.propagate(id, radius)?,
            None => Vec::new(),
        };
        Ok(PropagationReport {
            edges,
            radius,
            recomputed,
        })
    }

    /// Recompute every point within `radius` of `id`, ascending by `(distance, id)`.
    ///
    /// Runs [`NeighborConfig::propagation_depth`](crate::NeighborConfig::propagation_depth)
    /// levels, each point at most once; `id` itself is never recomputed. Returns the
    /// recomputed ids in visit order.
    pub fn propagate(&self, id: PointId, radius: f64) -> GraphResult<Vec<PointId>, S> {
        let _span = debug_span!("propagate", %id, radius).entered();

        let origin = self
            .store()
            .point(id)
            .map_err(GraphError::Storage)?
            .ok_or(GraphError::NotFound(id))?;

        let depth = self.config().propagation_depth;
        let backend = self.config().backend;

        let mut visited: HashSet<PointId> = HashSet::new();
        visited.insert(id);
        let mut frontier: Vec<(Point, f64)> = vec![(origin, radius)];
        let mut order = Vec::new();

        for level in 0..depth {
            if frontier.is_empty() {
                break;
            }
            let universe = self
                .store()
                .all_points(None)
                .map_err(GraphError::Storage)?;
            let mut next = Vec::new();
            for (center, reach) in &frontier {
                let pool = universe.iter().filter(|p| p.id != center.id);
                for hit in knn::radius(center.position, pool, *reach, backend) {
                    if !visited.insert(hit.point.id) {
                        continue;
                    }
                    trace!(level, neighbor = %hit.point.id, distance = hit.distance, "propagating");
                    let edges = self.recompute(hit.point.id)?;
                    order.push(hit.point.id);
                    if let Some(r) = max_distance(&edges) {
                        next.push((hit.point.clone(), r));
                    }
                }
            }
            debug!(level, fan_out = next.len(), "propagation level done");
            frontier = next;
        }

        debug!(recomputed = order.len(), "propagated");
        Ok(order)
    }
}
