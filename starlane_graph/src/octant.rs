// Copyright 2026 the Starlane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Octant partitioner: per-direction candidate search and fairness allocation.
//!
//! Space around an origin is split into eight octants. Each octant grows a box outward
//! shell by shell until it contains at least one point, so a sparse direction still gets
//! candidates even when a dense direction would otherwise fill every slot. The neighbor
//! budget is then spread over the non-empty octants with [`select_balanced`].

use starlane_index::{Aabb3D, Coord3};
use tracing::{debug, trace};

use crate::config::{BackendKind, NeighborConfig, ShellConfig};
use crate::knn::{self, PoolIndex, Ranked};
use crate::types::Point;

bitflags::bitflags! {
    /// One of the eight sign combinations of an offset from the origin.
    ///
    /// A set bit means the positive side of that axis. An offset of exactly zero counts
    /// as positive, so every point belongs to exactly one octant.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct Octant: u8 {
        /// `dx >= 0`.
        const X_POS = 0b001;
        /// `dy >= 0`.
        const Y_POS = 0b010;
        /// `dz >= 0`.
        const Z_POS = 0b100;
    }
}

impl Octant {
    /// All eight octants in bit order.
    pub const ALL: [Self; 8] = [
        Self::from_bits_retain(0),
        Self::from_bits_retain(1),
        Self::from_bits_retain(2),
        Self::from_bits_retain(3),
        Self::from_bits_retain(4),
        Self::from_bits_retain(5),
        Self::from_bits_retain(6),
        Self::from_bits_retain(7),
    ];

    /// The octant `point` lies in, seen from `origin`.
    pub fn of(origin: Coord3, point: Coord3) -> Self {
        let mut o = Self::empty();
        o.set(Self::X_POS, point.x >= origin.x);
        o.set(Self::Y_POS, point.y >= origin.y);
        o.set(Self::Z_POS, point.z >= origin.z);
        o
    }

    /// The half-open box covering this octant out to `radius` along each axis.
    ///
    /// Per axis the positive side is `[o, o + radius)` and the negative side
    /// `[o - radius, o)`.
    pub fn shell_box(self, origin: Coord3, radius: f64) -> Aabb3D {
        let side = |pos: bool, o: f64| if pos { (o, o + radius) } else { (o - radius, o) };
        let (x0, x1) = side(self.contains(Self::X_POS), origin.x);
        let (y0, y1) = side(self.contains(Self::Y_POS), origin.y);
        let (z0, z1) = side(self.contains(Self::Z_POS), origin.z);
        Aabb3D::new(Coord3::new(x0, y0, z0), Coord3::new(x1, y1, z1))
    }
}

/// The points one octant found at the first shell radius that was not empty.
#[derive(Clone, Debug, PartialEq)]
pub struct OctantCandidates<'a> {
    /// Which octant.
    pub octant: Octant,
    /// Shell radius at which the octant stopped.
    pub radius: f64,
    /// Points inside the octant's shell box, in id order.
    pub points: Vec<&'a Point>,
}

/// Run the expanding-shell search in all eight octants around `origin`.
///
/// `universe` must not contain the origin point itself. Octants still empty after the
/// `cap` shell are left out; an empty result means no octant found anything.
/// Candidates are returned in octant bit order.
///
/// `shell` and `backend` are used as given; check them with [`ShellConfig::validate`]
/// and [`BackendKind::validate`] first when they come from outside.
pub fn partition<'a>(
    origin: Coord3,
    universe: &'a [Point],
    shell: &ShellConfig,
    backend: BackendKind,
) -> Vec<OctantCandidates<'a>> {
    if universe.is_empty() {
        return Vec::new();
    }
    let index = PoolIndex::build(universe, backend);

    let mut remaining = Octant::ALL.to_vec();
    let mut found = Vec::with_capacity(remaining.len());
    let mut shells = 0_usize;
    for radius in shell.radii() {
        if remaining.is_empty() {
            break;
        }
        shells += 1;
        remaining.retain(|&octant| {
            let points = index.in_box(octant.shell_box(origin, radius));
            if points.is_empty() {
                return true;
            }
            trace!(?octant, radius, population = points.len(), "octant filled");
            found.push(OctantCandidates {
                octant,
                radius,
                points,
            });
            false
        });
    }
    if !remaining.is_empty() {
        debug!(
            dropped = ?remaining,
            cap = shell.cap,
            "octants still empty at shell cap"
        );
    }
    found.sort_unstable_by_key(|c| c.octant);
    debug!(
        universe = index.len(),
        octants = found.len(),
        shells,
        "partitioned"
    );
    found
}

/// Neighbor budget assigned to one octant.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Share {
    /// Points the octant was allowed to contribute.
    pub(crate) limit: usize,
    /// Points it actually contributes: `min(limit, population)`.
    pub(crate) take: usize,
}

/// Spread `k` slots over octants with the given populations, in the given order.
///
/// Each octant gets `ceil(k / n)` plus whatever the previous octant could not use. Limits
/// are clamped so the total never exceeds `k` and, when `n <= k`, one slot stays reserved
/// for every octant not yet served.
pub(crate) fn fair_shares(populations: &[usize], k: usize) -> Vec<Share> {
    let n = populations.len();
    if n == 0 || k == 0 {
        return vec![Share { limit: 0, take: 0 }; n];
    }
    let quota = k.div_ceil(n);
    let mut taken = 0_usize;
    let mut deficit = 0_usize;
    populations
        .iter()
        .enumerate()
        .map(|(i, &population)| {
            let reserved = if n <= k { n - i - 1 } else { 0 };
            let room = k.saturating_sub(taken).saturating_sub(reserved);
            let limit = (quota + deficit).min(room);
            let take = limit.min(population);
            deficit = limit - take;
            taken += take;
            Share { limit, take }
        })
        .collect()
}

/// One octant's contribution to a balanced neighbor selection.
#[derive(Clone, Debug, PartialEq)]
pub struct OctantSelection<'a> {
    /// Which octant.
    pub octant: Octant,
    /// Shell radius at which the octant stopped.
    pub radius: f64,
    /// Candidates the octant found.
    pub population: usize,
    /// Slots the fairness allocation gave the octant.
    pub limit: usize,
    /// Chosen points, nearest first.
    pub picks: Vec<Ranked<'a>>,
}

/// Partition `universe` around `origin` and pick up to `k` points balanced across octants.
///
/// Octants are served in ascending order of population (ties by octant bits), so sparse
/// directions pass their unused quota on to denser ones.
pub fn select_balanced<'a>(
    origin: Coord3,
    universe: &'a [Point],
    k: usize,
    config: &NeighborConfig,
) -> Vec<OctantSelection<'a>> {
    let mut candidates = partition(origin, universe, &config.shell, config.backend);
    candidates.sort_by_key(|c| (c.points.len(), c.octant));

    let populations: Vec<usize> = candidates.iter().map(|c| c.points.len()).collect();
    let shares = fair_shares(&populations, k);

    candidates
        .into_iter()
        .zip(shares)
        .map(|(c, share)| {
            let picks = knn::nearest(origin, c.points.iter().copied(), share.limit, config.backend);
            debug_assert_eq!(picks.len(), share.take, "octant took an unexpected count");
            OctantSelection {
                octant: c.octant,
                radius: c.radius,
                population: c.points.len(),
                limit: share.limit,
                picks,
            }
        })
        .collect()
}
