//! Topologies and their aggregations.
//!
//! A topology is never located by its own coordinates. It is a sequence of
//! aggregations, each covering a fraction range of one path, and its
//! geometry is derived from those ranges and the current path geometries.

use geo::{Coord, LineString, Point};
use serde::{Deserialize, Serialize};

use crate::engine::{Path, PathStore};
use crate::error::{OptionExt, Result, TopologyError};
use crate::linear::{
    bisect_directions, concat_lines, interpolate_point, line_substring, offset_curve, offset_point,
    travel_directions_at,
};
use crate::{Bounds, PathId, TopologyConfig, TopologyId, TopologyKind};

/// Link between a topology and one of the paths it covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub path_id: PathId,
    /// Fraction of the path length where the covered range starts (0.0-1.0)
    pub start_position: f64,
    /// Fraction where it ends. Smaller than `start_position` when the
    /// topology runs against the path direction.
    pub end_position: f64,
    /// Position of this aggregation in the topology's sequence
    pub order: u32,
}

impl Aggregation {
    pub fn new(path_id: PathId, start_position: f64, end_position: f64, order: u32) -> Self {
        Self {
            path_id,
            start_position,
            end_position,
            order,
        }
    }

    /// True when the aggregation covers a single position.
    pub fn is_point(&self) -> bool {
        self.start_position == self.end_position
    }

    /// True when the topology runs against the path direction here.
    pub fn is_reversed(&self) -> bool {
        self.start_position > self.end_position
    }

    /// Covered range as `(min, max)`.
    pub fn covered_range(&self) -> (f64, f64) {
        (
            self.start_position.min(self.end_position),
            self.start_position.max(self.end_position),
        )
    }

    /// Length covered on a path of the given length.
    pub fn length_on(&self, path_length: f64) -> f64 {
        (self.end_position - self.start_position).abs() * path_length
    }

    /// Same range expressed on the reversed path.
    pub fn reversed(&self) -> Self {
        Self {
            start_position: 1.0 - self.start_position,
            end_position: 1.0 - self.end_position,
            ..*self
        }
    }
}

/// A position reference on the path network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub id: TopologyId,
    pub kind: TopologyKind,
    /// Lateral offset in meters, left of the direction of travel is positive
    pub offset: f64,
    /// Soft-deletion flag, set when the topology lost every path
    pub deleted: bool,
    /// Aggregations sorted by `order`
    pub aggregations: Vec<Aggregation>,
}

impl Topology {
    /// Create an empty topology.
    pub fn new(id: TopologyId, kind: TopologyKind) -> Self {
        Self {
            id,
            kind,
            offset: 0.0,
            deleted: false,
            aggregations: Vec::new(),
        }
    }

    /// Append a path range with the next order.
    pub fn add_path(&mut self, path_id: PathId, start: f64, end: f64) {
        let order = self.aggregations.len() as u32;
        self.aggregations
            .push(Aggregation::new(path_id, start, end, order));
    }

    /// Distinct paths in order of first appearance.
    pub fn paths(&self) -> Vec<PathId> {
        let mut out: Vec<PathId> = Vec::new();
        for agg in &self.aggregations {
            if !out.contains(&agg.path_id) {
                out.push(agg.path_id);
            }
        }
        out
    }

    /// Check whether the topology references a path.
    pub fn uses_path(&self, path_id: PathId) -> bool {
        self.aggregations.iter().any(|a| a.path_id == path_id)
    }

    /// Replace the location of this topology with a copy of another's.
    pub fn mutate(&mut self, other: &Topology) {
        self.kind = other.kind;
        self.offset = other.offset;
        self.aggregations = other.aggregations.clone();
        self.deleted = false;
        self.renumber();
    }

    /// Restore `order = 0..n` following the vector order.
    pub fn renumber(&mut self) {
        for (i, agg) in self.aggregations.iter_mut().enumerate() {
            agg.order = i as u32;
        }
    }

    /// Sort aggregations by their order field.
    pub fn sort(&mut self) {
        self.aggregations.sort_by_key(|a| a.order);
    }

    /// Kind implied by a set of aggregations.
    pub fn infer_kind(aggregations: &[Aggregation]) -> TopologyKind {
        let single_path = aggregations
            .first()
            .map_or(false, |first| aggregations.iter().all(|a| a.path_id == first.path_id));
        if single_path && aggregations.iter().all(Aggregation::is_point) {
            TopologyKind::Point
        } else {
            TopologyKind::Line
        }
    }
}

/// Derived geometry of a topology.
#[derive(Debug, Clone, PartialEq)]
pub enum TopoGeometry {
    Point(Point<f64>),
    Line(LineString<f64>),
}

impl TopoGeometry {
    pub fn as_point(&self) -> Option<Point<f64>> {
        match self {
            TopoGeometry::Point(p) => Some(*p),
            TopoGeometry::Line(_) => None,
        }
    }

    pub fn as_line(&self) -> Option<&LineString<f64>> {
        match self {
            TopoGeometry::Point(_) => None,
            TopoGeometry::Line(l) => Some(l),
        }
    }

    pub fn coords(&self) -> Vec<Coord<f64>> {
        match self {
            TopoGeometry::Point(p) => vec![p.0],
            TopoGeometry::Line(l) => l.0.clone(),
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_coords(&self.coords())
    }
}

/// Derive the geometry of a topology from its aggregations and the current
/// path geometries.
pub fn compute_geometry(
    topology: &Topology,
    paths: &PathStore,
    config: &TopologyConfig,
) -> Result<TopoGeometry> {
    let first = topology
        .aggregations
        .first()
        .ok_or(TopologyError::EmptyTopology(topology.id))?;

    if topology.kind == TopologyKind::Point {
        let path = paths.get(first.path_id).ok_or_path_not_found(first.path_id)?;
        let mut coord = interpolate_point(&path.geom, first.start_position);
        if topology.offset != 0.0 {
            let dir = point_direction(path, first.start_position, paths, config);
            coord = offset_point(coord, dir, topology.offset);
        }
        return Ok(TopoGeometry::Point(Point(coord)));
    }

    let mut parts: Vec<LineString<f64>> = Vec::with_capacity(topology.aggregations.len());
    for agg in &topology.aggregations {
        let path = paths.get(agg.path_id).ok_or_path_not_found(agg.path_id)?;
        // Point aggregations inside a line are waypoints and add no length
        if agg.is_point() && topology.aggregations.len() > 1 {
            continue;
        }
        parts.push(line_substring(&path.geom, agg.start_position, agg.end_position));
    }
    if parts.is_empty() {
        let path = paths.get(first.path_id).ok_or_path_not_found(first.path_id)?;
        parts.push(line_substring(&path.geom, first.start_position, first.end_position));
    }

    let line = concat_lines(&parts);
    if topology.offset != 0.0 {
        return Ok(TopoGeometry::Line(offset_curve(
            &line,
            topology.offset,
            config.mitre_limit,
        )));
    }
    Ok(TopoGeometry::Line(line))
}

/// Direction a point offset is measured from.
///
/// A point on a vertex bisects the segments meeting there. At a path end
/// shared with exactly one other path, the other path plays the part of the
/// missing segment, so the point does not move when its path is split,
/// reversed or merged at that node.
fn point_direction(
    path: &Path,
    position: f64,
    paths: &PathStore,
    config: &TopologyConfig,
) -> Coord<f64> {
    let (mut incoming, mut outgoing) = travel_directions_at(&path.geom, position);
    let epsilon = config.position_epsilon.max(1e-12);

    if position <= epsilon && incoming.is_none() {
        incoming = continuing_path(path, true, paths, config.node_tolerance)
            .and_then(|(neighbour, at_start)| arriving_along(neighbour, at_start));
    }
    if position >= 1.0 - epsilon && outgoing.is_none() {
        outgoing = continuing_path(path, false, paths, config.node_tolerance)
            .and_then(|(neighbour, at_start)| leaving_along(neighbour, at_start));
    }
    bisect_directions(incoming, outgoing)
}

/// The only other path end at one end of `path`, if the node has degree 2.
fn continuing_path<'a>(
    path: &Path,
    at_start: bool,
    paths: &'a PathStore,
    tolerance: f64,
) -> Option<(&'a Path, bool)> {
    let node = if at_start { path.start() } else { path.end() };
    let others: Vec<(PathId, bool)> = paths
        .endpoints_near(node, tolerance)
        .into_iter()
        .filter(|end| *end != (path.id, at_start))
        .collect();
    match others.as_slice() {
        [(id, start)] => paths.get(*id).map(|p| (p, *start)),
        _ => None,
    }
}

/// Direction of travel arriving at the node along `path`.
fn arriving_along(path: &Path, node_at_start: bool) -> Option<Coord<f64>> {
    if node_at_start {
        travel_directions_at(&path.geom, 0.0).1.map(|d| -d)
    } else {
        travel_directions_at(&path.geom, 1.0).0
    }
}

/// Direction of travel leaving the node along `path`.
fn leaving_along(path: &Path, node_at_start: bool) -> Option<Coord<f64>> {
    if node_at_start {
        travel_directions_at(&path.geom, 0.0).1
    } else {
        travel_directions_at(&path.geom, 1.0).0.map(|d| -d)
    }
}
