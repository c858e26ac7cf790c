// Copyright 2026 the Starlane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tuning knobs for neighbor selection and propagation.

use crate::error::ConfigError;

/// Expanding-shell search parameters for the octant partitioner.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShellConfig {
    /// Radius of the first shell.
    pub start: f64,
    /// Growth per shell.
    pub step: f64,
    /// Largest radius searched (inclusive).
    pub cap: f64,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            start: 10.0,
            step: 10.0,
            cap: 1000.0,
        }
    }
}

impl ShellConfig {
    /// Most shells a valid configuration may search per octant.
    pub const MAX_SHELLS: u32 = 100_000;

    /// Check that the shell sequence is finite, non-empty and bounded by
    /// [`MAX_SHELLS`](Self::MAX_SHELLS).
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("start", self.start), ("cap", self.cap)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::ShellBound { field, value });
            }
        }
        if self.cap < self.start {
            return Err(ConfigError::CapBelowStart {
                start: self.start,
                cap: self.cap,
            });
        }
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(ConfigError::ShellStep(self.step));
        }
        let shells = ((self.cap - self.start) / self.step).floor() + 1.0;
        if shells > f64::from(Self::MAX_SHELLS) {
            return Err(ConfigError::TooManyShells {
                shells,
                limit: Self::MAX_SHELLS,
            });
        }
        Ok(())
    }

    /// Shell radii in search order: `start, start + step, ...` up to and including `cap`.
    ///
    /// Radii are computed as `start + i * step` so they do not drift. A non-positive
    /// step yields the first shell only.
    pub fn radii(&self) -> impl Iterator<Item = f64> + '_ {
        let single = self.step <= 0.0 || self.step.is_nan();
        (0_u32..)
            .map(move |i| self.start + f64::from(i) * self.step)
            .take_while(move |&r| r <= self.cap)
            .take(if single { 1 } else { usize::MAX })
    }
}

/// Which spatial backend the KNN finder builds per call.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BackendKind {
    /// KD-tree; a good default for irregular point sets.
    #[default]
    KdTree,
    /// Uniform grid with the given cell edge length.
    Grid {
        /// Cell edge length; should be close to typical neighbor distances.
        cell_size: f64,
    },
    /// Linear scan; only sensible for small pools.
    Linear,
}

impl BackendKind {
    /// Check the backend parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::Grid { cell_size } if !cell_size.is_finite() || cell_size <= 0.0 => {
                Err(ConfigError::CellSize(cell_size))
            }
            _ => Ok(()),
        }
    }
}

/// Configuration for a [`NeighborGraph`](crate::NeighborGraph).
///
/// Fields are public; [`NeighborGraph::with_config`](crate::NeighborGraph::with_config)
/// runs [`validate`](Self::validate) before accepting one.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NeighborConfig {
    /// Target neighbor count per point.
    pub k: usize,
    /// Octant shell search parameters.
    pub shell: ShellConfig,
    /// Spatial backend used for every per-call index.
    pub backend: BackendKind,
    /// How many levels of neighbors to recompute after an update. `1` recomputes the
    /// points within the updated point's new neighbor radius; `0` disables propagation.
    pub propagation_depth: usize,
}

impl Default for NeighborConfig {
    fn default() -> Self {
        Self {
            k: 10,
            shell: ShellConfig::default(),
            backend: BackendKind::default(),
            propagation_depth: 1,
        }
    }
}

impl NeighborConfig {
    /// Set the target neighbor count.
    #[must_use]
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Set the shell search parameters.
    #[must_use]
    pub fn with_shell(mut self, shell: ShellConfig) -> Self {
        self.shell = shell;
        self
    }

    /// Set the spatial backend.
    #[must_use]
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Set the propagation depth.
    #[must_use]
    pub fn with_propagation_depth(mut self, depth: usize) -> Self {
        self.propagation_depth = depth;
        self
    }

    /// Check the shell and backend parameters. Any `k` and depth are accepted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shell.validate()?;
        self.backend.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_shells_cover_ten_to_a_thousand() {
        let radii: Vec<f64> = ShellConfig::default().radii().collect();
        assert_eq!(radii.len(), 100);
        assert_eq!(radii.first(), Some(&10.0));
        assert_eq!(radii.last(), Some(&1000.0));
    }

    #[test]
    fn degenerate_step_yields_one_shell() {
        let shell = ShellConfig {
            start: 5.0,
            step: 0.0,
            cap: 50.0,
        };
        assert_eq!(shell.radii().collect::<Vec<_>>(), [5.0]);

        let past_cap = ShellConfig {
            start: 60.0,
            step: 10.0,
            cap: 50.0,
        };
        assert_eq!(past_cap.radii().count(), 0);
    }

    #[test]
    fn builders_set_fields() {
        let cfg = NeighborConfig::default()
            .with_k(4)
            .with_backend(BackendKind::Linear)
            .with_propagation_depth(2);
        assert_eq!(cfg.k, 4);
        assert_eq!(cfg.backend, BackendKind::Linear);
        assert_eq!(cfg.propagation_depth, 2);
        assert_eq!(cfg.shell, ShellConfig::default());
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn grid_cell_size_must_be_positive_and_finite() {
        for cell_size in [0.0, -4.0, f64::NAN, f64::INFINITY] {
            let cfg = NeighborConfig::default().with_backend(BackendKind::Grid { cell_size });
            assert!(
                matches!(cfg.validate(), Err(ConfigError::CellSize(_))),
                "cell size {cell_size}"
            );
        }
        let cfg = NeighborConfig::default().with_backend(BackendKind::Grid { cell_size: 0.5 });
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn shell_bounds_must_be_finite_and_ordered() {
        let shell = |start, step, cap| ShellConfig { start, step, cap };
        assert_eq!(
            shell(-1.0, 10.0, 100.0).validate(),
            Err(ConfigError::ShellBound {
                field: "start",
                value: -1.0
            })
        );
        assert_eq!(
            shell(10.0, 10.0, f64::INFINITY).validate(),
            Err(ConfigError::ShellBound {
                field: "cap",
                value: f64::INFINITY
            })
        );
        assert_eq!(
            shell(50.0, 10.0, 20.0).validate(),
            Err(ConfigError::CapBelowStart {
                start: 50.0,
                cap: 20.0
            })
        );
        assert!(matches!(
            shell(f64::NAN, 10.0, 100.0).validate(),
            Err(ConfigError::ShellBound { field: "start", .. })
        ));
    }

    #[test]
    fn shell_step_must_be_positive() {
        for step in [0.0, -1.0, f64::NAN] {
            let shell = ShellConfig {
                step,
                ..ShellConfig::default()
            };
            assert!(
                matches!(shell.validate(), Err(ConfigError::ShellStep(_))),
                "step {step}"
            );
        }
    }

    #[test]
    fn tiny_steps_are_rejected() {
        let shell = ShellConfig {
            start: 0.0,
            step: 1e-9,
            cap: 1000.0,
        };
        assert!(matches!(
            shell.validate(),
            Err(ConfigError::TooManyShells { limit: 100_000, .. })
        ));

        // Exactly at the limit is fine.
        let at_limit = ShellConfig {
            start: 0.0,
            step: 1.0,
            cap: f64::from(ShellConfig::MAX_SHELLS - 1),
        };
        assert_eq!(at_limit.validate(), Ok(()));
        assert_eq!(at_limit.radii().count(), 100_000);
    }
}
