// Copyright 2026 the Starlane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for neighbor graph maintenance.

use thiserror::Error;

use crate::types::PointId;

/// Errors surfaced by [`NeighborGraph`](crate::NeighborGraph) operations.
///
/// An empty universe is not an error; it yields an empty edge list.
#[derive(Debug, Error)]
pub enum GraphError<E>
where
    E: std::error::Error + 'static,
{
    /// The point id is unknown to the store.
    #[error("point {0} not found")]
    NotFound(PointId),

    /// The store failed to read or persist; the store's error is passed through unchanged.
    #[error("point store failure")]
    Storage(#[source] E),
}

impl<E> GraphError<E>
where
    E: std::error::Error + 'static,
{
    /// The wrapped store error, if this is a storage failure.
    pub fn storage(&self) -> Option<&E> {
        match self {
            Self::Storage(e) => Some(e),
            Self::NotFound(_) => None,
        }
    }
}

/// A [`NeighborConfig`](crate::NeighborConfig) that cannot drive a graph.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The grid backend needs a finite, strictly positive cell size.
    #[error("grid cell size must be finite and positive, got {0}")]
    CellSize(f64),

    /// A shell radius bound is negative or not finite.
    #[error("shell {field} must be finite and non-negative, got {value}")]
    ShellBound {
        /// `"start"` or `"cap"`.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// The last shell would come before the first one.
    #[error("shell cap {cap} is below the first shell radius {start}")]
    CapBelowStart {
        /// First shell radius.
        start: f64,
        /// Largest shell radius.
        cap: f64,
    },

    /// The shell step must be finite and strictly positive.
    #[error("shell step must be finite and positive, got {0}")]
    ShellStep(f64),

    /// The step is so small that the search would visit too many shells.
    #[error("{shells} shells exceed the limit of {limit}")]
    TooManyShells {
        /// Shells the configuration asks for.
        shells: f64,
        /// [`ShellConfig::MAX_SHELLS`](crate::ShellConfig::MAX_SHELLS).
        limit: u32,
    },
}
