//! # Trail Topology
//!
//! Dynamic segmentation engine for trail networks.
//!
//! Linear features (paths) form a network; every other entity (interventions,
//! signage, points of interest, treks) is located on that network by a
//! topology: a list of aggregations `(path, start_position, end_position)`
//! expressed as fractions of the path length. Topology geometries are derived
//! from the aggregations and recomputed whenever the underlying paths change.
//!
//! This library provides:
//! - Planar linear referencing (locate, interpolate, substring, offset)
//! - Path editing with snapping and intersection splitting
//! - Cascading topology updates on split, merge, reverse, edit and delete
//! - Overlap queries between topologies
//! - Shortest routes over the path network
//! - JSON exchange format for topology editing widgets
//!
//! ## Features
//!
//! - **`parallel`** - Recompute dirty geometries and scan overlaps with rayon
//! - **`synthetic`** - Seeded generator of synthetic trail networks
//! - **`cli`** - `trailtopo-cli` debug tool reading GPX tracks
//!
//! ## Quick Start
//!
//! ```rust
//! use geo::LineString;
//! use trailtopo::{PathAttributes, TopoGeometry, TopologyEngine};
//!
//! let mut engine = TopologyEngine::new();
//! let path = engine
//!     .add_path(
//!         LineString::from(vec![(0.0, 0.0), (100.0, 0.0)]),
//!         PathAttributes::default(),
//!     )
//!     .unwrap();
//!
//! // A signpost a quarter of the way along the path
//! let sign = engine.add_point_topology(path, 0.25, 0.0).unwrap();
//! match engine.geometry(sign).unwrap() {
//!     TopoGeometry::Point(p) => assert_eq!(p.x(), 25.0),
//!     TopoGeometry::Line(_) => unreachable!(),
//! }
//! ```

use geo::Coord;
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{OptionExt, Result, TopologyError};

// Linear referencing toolbox
pub mod linear;

// Topologies, aggregations and geometry derivation
pub mod topology;
pub use topology::{compute_geometry, Aggregation, TopoGeometry, Topology};

// Engine: path store, aggregation index, geometry store, spatial index, network
pub mod engine;
pub use engine::{
    AggregationIndex, GeometryStore, Path, PathAttributes, PathNetwork, PathStore, Route,
    SpatialIndex, TopologyEngine,
};

// Overlap queries (filter by trail, project paths)
pub mod overlap;
pub use overlap::{filter_overlapping, overlapping, paths_of_many, ranges_overlap};

// JSON exchange format
pub mod serialize;
pub use serialize::{
    load_topology, parse_topology, serialize_topology, LineStep, PointPosition, SerializedTopology,
};

// Synthetic network generator for tests and benchmarks
#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// Identifier of a path in the network.
pub type PathId = u64;

/// Identifier of a topology.
pub type TopologyId = u64;

/// Kind of a topology: a single position or a stretch of network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TopologyKind {
    Point,
    Line,
}

/// Bounding rectangle in projected coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Create bounds from coordinates.
    pub fn from_coords(coords: &[Coord<f64>]) -> Option<Self> {
        if coords.is_empty() {
            return None;
        }
        let mut b = Self {
            min_x: f64::MAX,
            min_y: f64::MAX,
            max_x: f64::MIN,
            max_y: f64::MIN,
        };
        for c in coords {
            b.min_x = b.min_x.min(c.x);
            b.min_y = b.min_y.min(c.y);
            b.max_x = b.max_x.max(c.x);
            b.max_y = b.max_y.max(c.y);
        }
        Some(b)
    }

    /// Get the center of the bounds.
    pub fn center(&self) -> Coord<f64> {
        Coord {
            x: (self.min_x + self.max_x) / 2.0,
            y: (self.min_y + self.max_y) / 2.0,
        }
    }

    /// Grow the bounds by `distance` on every side.
    pub fn expand(&self, distance: f64) -> Self {
        Self {
            min_x: self.min_x - distance,
            min_y: self.min_y - distance,
            max_x: self.max_x + distance,
            max_y: self.max_y + distance,
        }
    }

    /// Check whether two bounds share at least one point.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }
}

/// Configuration for path editing and topology derivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// Endpoints of a new path closer than this to an existing path are
    /// snapped onto it.
    /// Default: 1.0 meters
    pub snapping_distance: f64,

    /// Distance under which two path endpoints are the same network node.
    /// Default: 0.01 meters
    pub node_tolerance: f64,

    /// Positions closer than this are considered equal.
    /// Default: 1e-9
    pub position_epsilon: f64,

    /// Split paths at their intersections when adding or editing a path.
    /// Default: true
    pub split_on_intersection: bool,

    /// Tolerance for topology-preserving simplification of display geometries.
    /// Default: 1.0 meters
    pub simplify_tolerance: f64,

    /// Maximum mitre length, as a multiple of the offset, before bevelling
    /// the corners of offset lines.
    /// Default: 5.0
    pub mitre_limit: f64,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            snapping_distance: 1.0,
            node_tolerance: 0.01,
            position_epsilon: 1e-9,
            split_on_intersection: true,
            simplify_tolerance: 1.0,
            mitre_limit: 5.0,
        }
    }
}

impl TopologyConfig {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
