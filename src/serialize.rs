//! JSON exchange format of topologies.
//!
//! Map editing widgets send either a free point, resolved onto the closest
//! path:
//!
//! ```json
//! {"x": 12.5, "y": 3.0}
//! ```
//!
//! or a list of steps, each naming the paths it follows and the positions on
//! the paths where it does not cover the whole path:
//!
//! ```json
//! [{"offset": 0.0, "paths": [4, 7, 9], "positions": {"0": [0.3, 1.0], "2": [0.0, 0.5]}}]
//! ```
//!
//! Paths without positions are covered entirely, in the direction that
//! connects them to the previous path.

use std::collections::BTreeMap;

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::engine::TopologyEngine;
use crate::error::{OptionExt, Result, TopologyError};
use crate::linear::{coords_close, interpolate_point};
use crate::topology::TopoGeometry;
use crate::{PathId, TopologyId, TopologyKind};

/// A free point to be located on the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointPosition {
    pub x: f64,
    pub y: f64,
    /// Kind of the located object, e.g. `"SIGNAGE"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Overrides the offset computed from the distance to the path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<f64>,
}

/// One step of a line topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStep {
    #[serde(default)]
    pub offset: f64,
    pub paths: Vec<PathId>,
    /// Index in `paths`, as a JSON object key, -> `[start, end]`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub positions: BTreeMap<String, [f64; 2]>,
}

impl LineStep {
    /// Positions keyed by their index in `paths`.
    pub fn indexed_positions(&self) -> Result<BTreeMap<usize, [f64; 2]>> {
        self.positions
            .iter()
            .map(|(key, range)| match key.trim().parse::<usize>() {
                Ok(i) if i < self.paths.len() => Ok((i, *range)),
                _ => Err(TopologyError::invalid_geometry(format!(
                    "position index {:?} does not name one of {} paths",
                    key,
                    self.paths.len()
                ))),
            })
            .collect()
    }
}

/// Serialized topology as exchanged with editing widgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SerializedTopology {
    Point(PointPosition),
    Steps(Vec<LineStep>),
    Step(LineStep),
}

/// Parse the JSON form of a topology.
pub fn parse_topology(json: &str) -> Result<SerializedTopology> {
    Ok(serde_json::from_str(json)?)
}

/// Serialize a topology. Points give their computed coordinate, lines a
/// single step with every position explicit.
pub fn serialize_topology(engine: &mut TopologyEngine, id: TopologyId) -> Result<SerializedTopology> {
    let topo = engine.topology(id).ok_or_topology_not_found(id)?.clone();

    if topo.kind == TopologyKind::Point {
        let point = match engine.geometry(id)? {
            TopoGeometry::Point(p) => p,
            TopoGeometry::Line(line) => geo::Point(line.0[0]),
        };
        return Ok(SerializedTopology::Point(PointPosition {
            x: point.x(),
            y: point.y(),
            kind: Some("POINT".to_string()),
            offset: None,
        }));
    }

    let mut step = LineStep {
        offset: topo.offset,
        paths: Vec::with_capacity(topo.aggregations.len()),
        positions: BTreeMap::new(),
    };
    for (i, agg) in topo.aggregations.iter().enumerate() {
        step.paths.push(agg.path_id);
        step.positions
            .insert(i.to_string(), [agg.start_position, agg.end_position]);
    }
    Ok(SerializedTopology::Steps(vec![step]))
}

/// Turn line steps into `(path, start, end)` ranges.
pub fn resolve_steps(engine: &TopologyEngine, steps: &[LineStep]) -> Result<Vec<(PathId, f64, f64)>> {
    let tolerance = engine.config().node_tolerance;
    let mut flat: Vec<(PathId, Option<[f64; 2]>)> = Vec::new();
    for step in steps {
        let positions = step.indexed_positions()?;
        flat.extend(
            step.paths
                .iter()
                .enumerate()
                .map(|(i, path_id)| (*path_id, positions.get(&i).copied())),
        );
    }

    let mut ranges: Vec<(PathId, f64, f64)> = Vec::with_capacity(flat.len());
    for (i, (path_id, position)) in flat.iter().enumerate() {
        let path = engine.path(*path_id).ok_or_path_not_found(*path_id)?;
        if let Some([start, end]) = position {
            ranges.push((*path_id, *start, *end));
            continue;
        }

        let forward = if let Some((prev_id, _, prev_end)) = ranges.last() {
            let prev = engine.path(*prev_id).ok_or_path_not_found(*prev_id)?;
            let joint = interpolate_point(&prev.geom, *prev_end);
            coords_close(path.start(), joint, tolerance)
        } else if let Some((next_id, _)) = flat.get(i + 1) {
            let next = engine.path(*next_id).ok_or_path_not_found(*next_id)?;
            let touches = |c: Coord<f64>| {
                coords_close(c, next.start(), tolerance) || coords_close(c, next.end(), tolerance)
            };
            touches(path.end()) || !touches(path.start())
        } else {
            true
        };

        if forward {
            ranges.push((*path_id, 0.0, 1.0));
        } else {
            ranges.push((*path_id, 1.0, 0.0));
        }
    }
    Ok(ranges)
}

/// Create a topology from its serialized form.
pub fn load_topology(engine: &mut TopologyEngine, serialized: &SerializedTopology) -> Result<TopologyId> {
    let steps: &[LineStep] = match serialized {
        SerializedTopology::Point(point) => {
            let (path_id, located) = engine.locate(Coord { x: point.x, y: point.y })?;
            let offset = point.offset.unwrap_or_else(|| located.signed_distance());
            return engine.add_point_topology(path_id, located.fraction, offset);
        }
        SerializedTopology::Steps(steps) => steps,
        SerializedTopology::Step(step) => std::slice::from_ref(step),
    };

    if steps.iter().all(|s| s.paths.is_empty()) {
        return Err(TopologyError::invalid_geometry("topology references no path"));
    }
    let ranges = resolve_steps(engine, steps)?;
    let offset = steps.first().map_or(0.0, |s| s.offset);
    let id = engine.add_line_topology(&ranges, offset)?;
    let epsilon = engine.config().position_epsilon.max(1e-9);
    engine.topologies.fuse_contiguous(id, epsilon);
    engine.geometries.mark_dirty(id);
    engine.ensure_computed();
    Ok(id)
}

impl TopologyEngine {
    /// Create a topology from its serialized form.
    pub fn load(&mut self, serialized: &SerializedTopology) -> Result<TopologyId> {
        load_topology(self, serialized)
    }

    /// Create a topology from its JSON form.
    pub fn load_json(&mut self, json: &str) -> Result<TopologyId> {
        let serialized = parse_topology(json)?;
        load_topology(self, &serialized)
    }

    /// Serialize a topology to its JSON form.
    pub fn serialize_json(&mut self, id: TopologyId) -> Result<String> {
        let serialized = serialize_topology(self, id)?;
        Ok(serde_json::to_string(&serialized)?)
    }
}
