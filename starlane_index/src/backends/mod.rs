// Copyright 2026 the Starlane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend implementations for different spatial strategies.
//!
//! - `kdtree`: median-split KD-tree with leaf buckets (the default).
//! - `grid` (feature `backend_grid`): uniform cubic grid with configurable cell size.
//! - `flatvec`: flat vector with linear scans (small, simple, the reference).
//!
//! Tie-break note
//! --------------
//! Every backend ranks nearest candidates by `(dist_sq, slot)` with a bounded max-heap,
//! and explores regions whose lower distance bound *equals* the current k-th best.
//! Two backends fed the same points therefore return the same slots in the same order,
//! even when several points are equidistant from the query.

pub(crate) mod flatvec;
#[cfg(feature = "backend_grid")]
pub(crate) mod grid;
pub(crate) mod kdtree;

pub use flatvec::FlatVec;
#[cfg(feature = "backend_grid")]
pub use grid::Grid;
pub use kdtree::KdTree;
