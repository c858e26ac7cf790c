// Copyright 2026 the Starlane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build a neighbor graph over a random star field, then move and delete stars.
//!
//! This example shows how to:
//! - index every star of an in-memory store,
//! - react to a coordinate change with `recompute_and_propagate`,
//! - repair the graph after a deletion with `forget`,
//! - look stars up by label.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p starlane_demos --example galaxy_walk -- --stars 500`

use std::error::Error;

use clap::{Parser, ValueEnum};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use starlane_graph::{
    BackendKind, Coord3, GraphError, MemoryStore, MemoryStoreError, NeighborConfig, NeighborGraph,
    Point, PointId, PointStore,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliBackend {
    #[value(name = "kdtree")]
    KdTree,
    #[value(name = "grid")]
    Grid,
    #[value(name = "linear")]
    Linear,
}

impl From<CliBackend> for BackendKind {
    fn from(value: CliBackend) -> Self {
        match value {
            CliBackend::KdTree => Self::KdTree,
            CliBackend::Grid => Self::Grid { cell_size: 25.0 },
            CliBackend::Linear => Self::Linear,
        }
    }
}

fn parse_extent(s: &str) -> Result<f64, String> {
    let extent: f64 = s.parse().map_err(|e| format!("{s:?} is not a number: {e}"))?;
    if extent.is_finite() && extent > 0.0 {
        Ok(extent)
    } else {
        Err(format!("extent must be a positive number, got {s}"))
    }
}

/// Walk a random galaxy through creation, movement and deletion.
#[derive(Parser, Debug)]
#[command(name = "galaxy_walk", about)]
struct Cli {
    /// Number of stars to generate
    #[arg(long, default_value_t = 300)]
    stars: u64,

    /// Half-width of the cube the stars are scattered in
    #[arg(long, default_value_t = 150.0, value_parser = parse_extent)]
    extent: f64,

    /// Target neighbor count per star
    #[arg(long, default_value_t = 10)]
    k: usize,

    /// Propagation depth after a move
    #[arg(long, default_value_t = 1)]
    depth: usize,

    /// Spatial backend
    #[arg(long, value_enum, default_value_t = CliBackend::KdTree)]
    backend: CliBackend,

    /// Random seed
    #[arg(long, default_value_t = 7)]
    seed: u64,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let mut rng = ChaCha8Rng::seed_from_u64(cli.seed);
    let stars = (0..cli.stars).map(|id| {
        let mut coord = || rng.gen_range(-cli.extent..cli.extent);
        Point::new(id, [coord(), coord(), coord()]).with_label(format!("Star-{id:04}"))
    });
    let store = MemoryStore::with_points(stars.collect::<Vec<_>>());

    let config = NeighborConfig::default()
        .with_k(cli.k)
        .with_backend(cli.backend.into())
        .with_propagation_depth(cli.depth);
    let graph = NeighborGraph::with_config(store, config)?;

    let mut edges = 0;
    for id in 0..cli.stars {
        edges += graph.recompute(PointId(id))?.len();
    }
    println!("indexed {} stars with {edges} edges", cli.stars);

    if cli.stars < 2 {
        println!("nothing to move");
        return Ok(());
    }
    let first = PointId(0);
    print_neighbors(&graph, first)?;

    // Park the first star right next to the second one.
    let target = graph
        .store()
        .point(PointId(1))?
        .ok_or(GraphError::<MemoryStoreError>::NotFound(PointId(1)))?
        .position;
    graph
        .store()
        .move_point(first, Coord3::new(target.x + 1.0, target.y, target.z))?;
    let report = graph.recompute_and_propagate(first)?;
    println!(
        "moved {first}: {} edges, radius {:.2}, refreshed {} stars",
        report.edges.len(),
        report.radius.unwrap_or_default(),
        report.recomputed.len()
    );
    print_neighbors(&graph, first)?;

    graph.store().remove_point(PointId(1))?;
    let repaired = graph.forget(PointId(1))?;
    println!("removed #1; repaired {} stars", repaired.len());
    print_neighbors(&graph, first)?;

    let hits = graph.search_labels("Star-000", Some(target))?;
    println!("{} labels match \"Star-000\" near the old #1:", hits.len());
    for hit in hits.iter().take(3) {
        println!(
            "  {} at {:.2}",
            hit.point.label.as_deref().unwrap_or_default(),
            hit.distance
        );
    }
    Ok(())
}

fn print_neighbors(
    graph: &NeighborGraph<MemoryStore>,
    id: PointId,
) -> Result<(), GraphError<MemoryStoreError>> {
    let edges = graph.neighbors(id)?;
    let listed: Vec<String> = edges
        .iter()
        .map(|e| format!("{}@{:.1}", e.neighbor, e.distance))
        .collect();
    println!("  neighbors of {id}: [{}]", listed.join(", "));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_must_be_positive() {
        assert_eq!(parse_extent("12.5"), Ok(12.5));
        for bad in ["0", "-3", "inf", "NaN", "wide"] {
            assert!(parse_extent(bad).is_err(), "{bad}");
        }
    }
}
