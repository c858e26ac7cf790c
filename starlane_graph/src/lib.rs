// Copyright 2026 the Starlane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Starlane Graph: a direction-balanced k-nearest neighbor graph over a dynamic 3D point set.
//!
//! Plain k-nearest neighbors cluster: a point at the edge of a dense region ends up with
//! every neighbor on one side. Starlane instead splits space around each point into eight
//! octants, finds candidates in each one with an expanding shell search, and spreads the
//! `k` neighbor slots fairly across the octants that found anything.
//!
//! - [`NeighborGraph`] recomputes a point's neighbor edges against a [`PointStore`] and
//!   propagates the change to nearby points.
//! - [`octant`] holds the partitioner and the fairness allocation.
//! - [`knn`] answers exact nearest and radius queries over a bounded pool.
//! - [`MemoryStore`] is a thread-safe in-memory store for tests, demos and embedding.
//!
//! The graph keeps no index between calls. Each operation snapshots the store, builds a
//! [`starlane_index`] index, answers, and drops it.
//!
//! # Example
//!
//! ```rust
//! use starlane_graph::{MemoryStore, NeighborGraph, Point, PointId};
//!
//! let store = MemoryStore::with_points([
//!     Point::new(1, [0.0, 0.0, 0.0]).with_label("Sol"),
//!     Point::new(2, [5.0, 0.0, 0.0]),
//!     Point::new(3, [-5.0, 0.0, 0.0]),
//! ]);
//! let graph = NeighborGraph::new(store);
//!
//! let report = graph.recompute_and_propagate(PointId(1)).unwrap();
//! assert_eq!(report.edges.len(), 2);
//! assert_eq!(report.radius, Some(5.0));
//! // Both neighbors were within that radius, so both were refreshed too.
//! assert_eq!(report.recomputed, [PointId(2), PointId(3)]);
//! ```
//!
//! ## Ordering
//!
//! Equidistant candidates are always ranked by ascending [`PointId`], so results do not
//! depend on store iteration order or on the configured spatial backend.
//!
//! ## Logging
//!
//! Operations emit [`tracing`] spans (`recompute`, `propagate`, `forget`) and `debug`
//! events with per-call summaries. Install a subscriber to see them.
//!
//! ## Features
//!
//! - `serde`: derive `Serialize`/`Deserialize` for configuration and edge types.

mod config;
mod error;
mod graph;
pub mod knn;
pub mod octant;
mod propagate;
mod store;
mod types;

pub use config::{BackendKind, NeighborConfig, ShellConfig};
pub use error::{ConfigError, GraphError};
pub use graph::{GraphResult, LabelMatch, NeighborGraph};
pub use octant::Octant;
pub use propagate::PropagationReport;
pub use store::{MemoryStore, MemoryStoreError, PointStore};
pub use types::{NeighborEdge, Point, PointId, max_distance};

pub use starlane_index::Coord3;
