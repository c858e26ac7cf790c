// Copyright 2026 the Starlane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the neighbor graph: point identifiers, points, and edges.

use core::fmt;

use starlane_index::Coord3;

/// Identifier for a point in the store.
///
/// Ordering on ids is the tie-break between equidistant candidates.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointId(pub u64);

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for PointId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A point (star) participating in the neighbor graph.
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    /// Unique identifier.
    pub id: PointId,
    /// Position in space.
    pub position: Coord3,
    /// Display name; used for diagnostics and label search, never for ranking.
    pub label: Option<String>,
}

impl Point {
    /// Create an unlabeled point.
    pub fn new(id: u64, position: impl Into<Coord3>) -> Self {
        Self {
            id: PointId(id),
            position: position.into(),
            label: None,
        }
    }

    /// Attach a label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Euclidean distance from this point to `other`.
    pub fn distance_to(&self, other: Coord3) -> f64 {
        self.position.distance_sq(other).sqrt()
    }

    /// Label if present, otherwise the id, for log output.
    pub(crate) fn display_name(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => self.id.to_string(),
        }
    }
}

/// A directed neighbor relation: `neighbor` is among `source`'s selected neighbors.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NeighborEdge {
    /// The point whose neighbor set this edge belongs to.
    pub source: PointId,
    /// The selected neighbor.
    pub neighbor: PointId,
    /// Euclidean distance between the two points (non-negative).
    pub distance: f64,
}

/// Largest edge distance, or `None` for an empty edge set.
pub fn max_distance(edges: &[NeighborEdge]) -> Option<f64> {
    edges.iter().map(|e| e.distance).reduce(f64::max)
}
