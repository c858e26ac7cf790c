// Copyright 2026 the Starlane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Starlane Index: a 3D point index for box, radius and exact k-nearest queries.
//!
//! Starlane Index is the spatial building block under the Starlane neighbor graph.
//!
//! - Bulk-build an index over `(payload, position)` pairs.
//! - Query by half-open box, by inclusive radius, or for the `k` nearest entries.
//! - Equidistant candidates are ranked by ascending payload, so results are reproducible
//!   regardless of input order or backend.
//!
//! The index is immutable once built. It is meant to be built per operation from a
//! snapshot, queried, and dropped; there is no incremental update path.
//!
//! Backends are pluggable via a simple trait so you can swap the spatial strategy without API churn.
//! The default backend is a KD-tree. A uniform grid is available with the `backend_grid`
//! feature, and a flat vector (linear scan) serves as the reference implementation.
//!
//! ## Features
//!
//! - `backend_grid` *(default)*: enables a uniform grid backend backed by `hashbrown`. Disable
//!   this feature to avoid the `hashbrown` and `smallvec` dependencies and grid types.
//!
//! # Example
//!
//! ```rust
//! use starlane_index::{Coord3, Index};
//!
//! let idx: Index<u32> = Index::build([
//!     (1, Coord3::new(5.0, 0.0, 0.0)),
//!     (2, Coord3::new(-5.0, 0.0, 0.0)),
//!     (3, Coord3::new(0.0, 40.0, 0.0)),
//! ]);
//!
//! // Both 5-unit neighbors tie; the lower payload ranks first.
//! let nearest: Vec<u32> = idx.nearest(Coord3::ORIGIN, 2).iter().map(|h| h.payload).collect();
//! assert_eq!(nearest, [1, 2]);
//!
//! // Radius queries are inclusive.
//! assert_eq!(idx.query_radius(Coord3::ORIGIN, 5.0).len(), 2);
//! ```
//!
//! With the `backend_grid` feature enabled (default), you can also use a uniform grid backend:
//!
//! ```rust
//! # #[cfg(feature = "backend_grid")]
//! # {
//! use starlane_index::{Aabb3D, Coord3, Index};
//!
//! // A grid with 10-unit cells.
//! let idx = Index::with_grid(10.0, [(7_u64, Coord3::new(3.0, 3.0, 3.0))]);
//!
//! let b = Aabb3D::new(Coord3::ORIGIN, Coord3::new(10.0, 10.0, 10.0));
//! let hits: Vec<_> = idx.query_box(b).collect();
//! assert_eq!(hits.len(), 1);
//! # }
//! ```
//!
//! ## Choosing a backend
//!
//! - `KdTree` (default): good general-purpose choice for irregular distributions; queries
//!   prune whole subtrees.
//! - `Grid` *(feature `backend_grid`)*: uniform grid with configurable cell size. A good fit
//!   when density is roughly uniform and the cell size is close to typical query radii.
//! - `FlatVec`: linear scans. Smallest and simplest; fine for pools of a few dozen points.
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs for coordinates. Debug builds may assert.
//! Distances are compared squared; the crate never takes square roots.

#![no_std]

extern crate alloc;

mod backend;
pub mod backends;
mod index;
mod types;
pub(crate) mod util;

pub use backend::{Backend, SlotHit};
pub use index::{Hit, Index, SpatialIndex};
pub use types::{Aabb3D, Coord3};

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn build_and_query() {
        let idx: Index<u64> = Index::build([
            (3, Coord3::new(1.0, 1.0, 1.0)),
            (1, Coord3::new(2.0, 2.0, 2.0)),
            (2, Coord3::new(-1.0, -1.0, -1.0)),
        ]);
        assert_eq!(idx.len(), 3);

        let hits: Vec<u64> = idx
            .nearest(Coord3::ORIGIN, 3)
            .into_iter()
            .map(|h| h.payload)
            .collect();
        assert_eq!(hits, [2, 3, 1]);
    }

    #[test]
    fn rebuild_reflects_new_positions() {
        let before: Index<u64> = Index::build([(1, Coord3::new(1.0, 0.0, 0.0))]);
        let after: Index<u64> = Index::build([(1, Coord3::new(100.0, 0.0, 0.0))]);
        assert_eq!(before.query_radius(Coord3::ORIGIN, 2.0).len(), 1);
        assert!(after.query_radius(Coord3::ORIGIN, 2.0).is_empty());
    }
}
