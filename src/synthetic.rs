//! Synthetic trail network generator for stress testing and benchmarking.
//!
//! Generates grid-like networks of winding paths with known node positions,
//! plus random topologies positioned on them.
//!
//! Feature-gated behind `synthetic`, not included in production builds.
//!
//! # Example
//!
//! ```rust
//! use trailtopo::synthetic::NetworkScenario;
//!
//! let scenario = NetworkScenario {
//!     rows: 4,
//!     cols: 5,
//!     ..NetworkScenario::default()
//! };
//!
//! let dataset = scenario.generate();
//! // 4 rows of 4 horizontal edges, 5 columns of 3 vertical edges
//! assert_eq!(dataset.paths.len(), 4 * 4 + 5 * 3);
//! ```

use geo::{Coord, LineString};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::engine::{PathAttributes, TopologyEngine};
use crate::error::Result;
use crate::{PathId, TopologyConfig, TopologyId};

// ============================================================================
// Types
// ============================================================================

/// Scenario configuration for generating a synthetic network.
#[derive(Debug, Clone)]
pub struct NetworkScenario {
    /// South-west corner of the grid.
    pub origin: Coord<f64>,
    /// Number of node rows.
    pub rows: usize,
    /// Number of node columns.
    pub cols: usize,
    /// Distance between neighbouring nodes in meters.
    pub spacing: f64,
    /// Intermediate vertices per edge.
    pub vertices_per_edge: usize,
    /// Maximum sideways displacement of intermediate vertices in meters.
    pub jitter: f64,
    /// Number of random point topologies.
    pub point_topologies: usize,
    /// Number of random line topologies.
    pub line_topologies: usize,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

impl Default for NetworkScenario {
    fn default() -> Self {
        Self {
            origin: Coord { x: 700_000.0, y: 6_400_000.0 },
            rows: 5,
            cols: 5,
            spacing: 500.0,
            vertices_per_edge: 8,
            jitter: 20.0,
            point_topologies: 20,
            line_topologies: 10,
            seed: 42,
        }
    }
}

/// A complete synthetic dataset.
#[derive(Debug, Clone)]
pub struct SyntheticNetwork {
    /// Path geometries; edges never cross except at grid nodes.
    pub paths: Vec<LineString<f64>>,
    /// Point topologies as (path index, position, offset).
    pub points: Vec<(usize, f64, f64)>,
    /// Line topologies as (path index, start, end) ranges.
    pub lines: Vec<Vec<(usize, f64, f64)>>,
}

// ============================================================================
// Generation
// ============================================================================

fn node(scenario: &NetworkScenario, row: usize, col: usize) -> Coord<f64> {
    Coord {
        x: scenario.origin.x + col as f64 * scenario.spacing,
        y: scenario.origin.y + row as f64 * scenario.spacing,
    }
}

/// Winding edge between two grid nodes. Ends are exact.
fn generate_edge(scenario: &NetworkScenario, a: Coord<f64>, b: Coord<f64>, rng: &mut StdRng) -> LineString<f64> {
    let n = scenario.vertices_per_edge;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = dx.hypot(dy);
    // Unit normal of the edge
    let (nx, ny) = (-dy / len, dx / len);
    // Keep jitter well inside the grid cell so edges never cross
    let amplitude = scenario.jitter.min(scenario.spacing * 0.2);

    let mut coords = Vec::with_capacity(n + 2);
    coords.push(a);
    for i in 1..=n {
        let t = i as f64 / (n + 1) as f64;
        let side: f64 = if amplitude > 0.0 {
            rng.gen_range(-amplitude..amplitude)
        } else {
            0.0
        };
        coords.push(Coord {
            x: a.x + dx * t + nx * side,
            y: a.y + dy * t + ny * side,
        });
    }
    coords.push(b);
    LineString::new(coords)
}

impl NetworkScenario {
    /// Generate the dataset.
    pub fn generate(&self) -> SyntheticNetwork {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut paths = Vec::new();

        for row in 0..self.rows {
            for col in 0..self.cols.saturating_sub(1) {
                let edge = generate_edge(self, node(self, row, col), node(self, row, col + 1), &mut rng);
                paths.push(edge);
            }
        }
        for col in 0..self.cols {
            for row in 0..self.rows.saturating_sub(1) {
                let edge = generate_edge(self, node(self, row, col), node(self, row + 1, col), &mut rng);
                paths.push(edge);
            }
        }

        let mut points = Vec::with_capacity(self.point_topologies);
        let mut lines = Vec::with_capacity(self.line_topologies);
        if !paths.is_empty() {
            for _ in 0..self.point_topologies {
                let path = rng.gen_range(0..paths.len());
                let position: f64 = rng.gen_range(0.0..=1.0);
                let offset: f64 = rng.gen_range(-5.0..5.0);
                points.push((path, position, offset));
            }
            for _ in 0..self.line_topologies {
                let path = rng.gen_range(0..paths.len());
                let a: f64 = rng.gen_range(0.0..=1.0);
                let b: f64 = rng.gen_range(0.0..=1.0);
                lines.push(vec![(path, a, b)]);
            }
        }

        SyntheticNetwork { paths, points, lines }
    }
}

impl SyntheticNetwork {
    /// Load the dataset into a fresh engine.
    ///
    /// Returns the engine, the path ids in generation order, and the ids of
    /// the point then line topologies.
    pub fn load(&self, config: TopologyConfig) -> Result<(TopologyEngine, Vec<PathId>, Vec<TopologyId>)> {
        let mut engine = TopologyEngine::with_config(config);
        let mut path_ids = Vec::with_capacity(self.paths.len());
        for geom in &self.paths {
            path_ids.push(engine.add_path(geom.clone(), PathAttributes::default())?);
        }

        let mut topology_ids = Vec::with_capacity(self.points.len() + self.lines.len());
        for (path, position, offset) in &self.points {
            topology_ids.push(engine.add_point_topology(path_ids[*path], *position, *offset)?);
        }
        for ranges in &self.lines {
            let mapped: Vec<(PathId, f64, f64)> = ranges
                .iter()
                .map(|(path, s, e)| (path_ids[*path], *s, *e))
                .collect();
            topology_ids.push(engine.add_line_topology(&mapped, 0.0)?);
        }
        Ok((engine, path_ids, topology_ids))
    }
}
