//! # Topology Engine
//!
//! Maintains the path network and every topology positioned on it, and
//! cascades path edits into aggregation rewrites and geometry updates.
//!
//! ## Architecture
//!
//! The engine is composed of focused modules:
//! - `PathStore` - Path CRUD and validation
//! - `AggregationIndex` - Topologies and the path -> topologies reverse index
//! - `GeometryStore` - Lazy topology geometry derivation with dirty tracking
//! - `SpatialIndex` - R-tree of path segments for snapping and lookups
//! - `PathNetwork` - Node/edge graph for merge checks and routing

pub mod aggregation_index;
pub mod geometry_store;
pub mod network;
pub mod path_store;
pub mod spatial_index;

pub use aggregation_index::AggregationIndex;
pub use geometry_store::GeometryStore;
pub use network::{Edge, Node, NodeId, PathNetwork, Route};
pub use path_store::{validate_geometry, Path, PathAttributes, PathStore};
pub use spatial_index::{PathSegment, SpatialIndex};

use geo::{Coord, LineString};
use log::{debug, info, warn};
use serde::Serialize;

use crate::error::{OptionExt, Result, TopologyError};
use crate::linear::{
    closest_point, concat_lines, coords_close, distance, line_intersections, line_length, reverse_line,
    simplify_preserve_topology, split_line, LocatedPoint,
};
use crate::topology::{Aggregation, TopoGeometry, Topology};
use crate::{Bounds, PathId, TopologyConfig, TopologyId, TopologyKind};

/// Counters describing the engine state.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub path_count: usize,
    pub topology_count: usize,
    pub deleted_topology_count: usize,
    pub dirty_geometry_count: usize,
    pub indexed_segment_count: usize,
}

/// Topology engine owning the network and its topologies.
pub struct TopologyEngine {
    // Core components
    pub paths: PathStore,
    pub topologies: AggregationIndex,
    pub geometries: GeometryStore,
    pub spatial: SpatialIndex,

    // Configuration
    config: TopologyConfig,
}

impl Default for TopologyEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TopologyEngine {
    /// Create a new engine with default configuration.
    pub fn new() -> Self {
        Self::with_config(TopologyConfig::default())
    }

    /// Create a new engine with custom configuration.
    pub fn with_config(config: TopologyConfig) -> Self {
        Self {
            paths: PathStore::new(),
            topologies: AggregationIndex::new(),
            geometries: GeometryStore::new(),
            spatial: SpatialIndex::new(),
            config,
        }
    }

    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }

    /// Engine counters.
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            path_count: self.paths.len(),
            topology_count: self.topologies.len(),
            deleted_topology_count: self.topologies.values().filter(|t| t.deleted).count(),
            dirty_geometry_count: self.geometries.dirty_count(),
            indexed_segment_count: self.spatial.len(),
        }
    }

    fn refresh(&mut self, affected: impl IntoIterator<Item = TopologyId>) {
        for id in affected {
            match self.topologies.get(id) {
                Some(topo) if !topo.deleted => self.geometries.mark_dirty(id),
                _ => self.geometries.remove(id),
            }
        }
        self.geometries
            .ensure_computed(&self.topologies, &self.paths, &self.config);
    }

    /// Recompute point topologies at the ends of paths meeting at `nodes`.
    ///
    /// The offset direction of a point on a path end depends on the other
    /// paths at that node, so it changes when paths are added or removed there.
    fn refresh_nodes(&mut self, nodes: &[Coord<f64>]) {
        let tolerance = self.config.node_tolerance;
        self.spatial.ensure_built(&self.paths);

        let mut affected: Vec<TopologyId> = Vec::new();
        for node in nodes {
            for path_id in self.spatial.paths_within(*node, tolerance, false) {
                let Some(path) = self.paths.get(path_id) else {
                    continue;
                };
                if !coords_close(path.start(), *node, tolerance)
                    && !coords_close(path.end(), *node, tolerance)
                {
                    continue;
                }
                affected.extend(
                    self.topologies
                        .topologies_on_path(path_id)
                        .into_iter()
                        .filter(|id| {
                            self.topologies
                                .get(*id)
                                .map_or(false, |t| t.kind == TopologyKind::Point)
                        }),
                );
            }
        }
        affected.sort_unstable();
        affected.dedup();
        self.refresh(affected);
    }

    /// End nodes of the given paths.
    fn end_nodes(&self, ids: &[PathId]) -> Vec<Coord<f64>> {
        ids.iter()
            .filter_map(|id| self.paths.get(*id))
            .flat_map(|p| [p.start(), p.end()])
            .collect()
    }

    fn check_position(&self, path_id: PathId, position: f64) -> Result<()> {
        if !self.paths.contains(path_id) {
            return Err(TopologyError::PathNotFound(path_id));
        }
        if !position.is_finite() || !(0.0..=1.0).contains(&position) {
            return Err(TopologyError::InvalidPosition { path_id, position });
        }
        Ok(())
    }

    // ========================================================================
    // Path Editing
    // ========================================================================

    pub fn path(&self, id: PathId) -> Option<&Path> {
        self.paths.get(id)
    }

    /// Add a path, snapping its ends and splitting at intersections.
    ///
    /// Returns the id of the first piece of the new path.
    pub fn add_path(&mut self, geom: LineString<f64>, attributes: PathAttributes) -> Result<PathId> {
        let pieces = self.add_path_pieces(geom, attributes)?;
        pieces
            .first()
            .copied()
            .ok_or_else(|| TopologyError::invalid_geometry("path produced no pieces"))
    }

    /// Add a path and return the ids of all its pieces, in order along the
    /// input geometry.
    pub fn add_path_pieces(
        &mut self,
        geom: LineString<f64>,
        attributes: PathAttributes,
    ) -> Result<Vec<PathId>> {
        validate_geometry(&geom)?;
        let draft = attributes.draft;
        let geom = if draft { geom } else { self.snap_endpoints(geom)? };

        let id = self.paths.insert(geom, attributes)?;
        self.spatial.mark_dirty();

        let pieces = if self.config.split_on_intersection && !draft {
            self.split_intersections(id)?
        } else {
            vec![id]
        };
        let nodes = self.end_nodes(&pieces);
        self.refresh_nodes(&nodes);

        info!(
            "[Engine] added path {} ({} pieces, {} paths in network)",
            id,
            pieces.len(),
            self.paths.len()
        );
        Ok(pieces)
    }

    /// Move the ends of a new geometry onto nearby nodes or paths.
    ///
    /// An end within snapping distance of a node lands on it; otherwise an end
    /// within snapping distance of a path lands on its closest point and that
    /// path is split there.
    fn snap_endpoints(&mut self, mut geom: LineString<f64>) -> Result<LineString<f64>> {
        let snapping = self.config.snapping_distance;
        if snapping <= 0.0 || self.paths.is_empty() {
            return Ok(geom);
        }

        let last = geom.0.len() - 1;
        for vertex in [0, last] {
            self.spatial.ensure_built(&self.paths);
            let coord = geom.0[vertex];

            let mut node: Option<(Coord<f64>, f64)> = None;
            for path_id in self.spatial.paths_within(coord, snapping, true) {
                let Some(path) = self.paths.get(path_id) else {
                    continue;
                };
                for end in [path.start(), path.end()] {
                    let d = distance(end, coord);
                    if d <= snapping && node.map_or(true, |(_, best)| d < best) {
                        node = Some((end, d));
                    }
                }
            }
            if let Some((end, _)) = node {
                geom.0[vertex] = end;
                continue;
            }

            let Some((path_id, d)) = self.spatial.nearest_path(coord, true) else {
                continue;
            };
            if d > snapping {
                continue;
            }
            let path = self.paths.get(path_id).ok_or_path_not_found(path_id)?;
            let located = closest_point(&path.geom, coord);
            geom.0[vertex] = located.coord;
            let along = located.fraction * path.length();
            if along > self.config.node_tolerance
                && path.length() - along > self.config.node_tolerance
            {
                debug!(
                    "[Snap] end {} snapped onto path {} at {:.6}",
                    vertex, path_id, located.fraction
                );
                self.split_path(path_id, located.fraction)?;
            }
        }

        validate_geometry(&geom)?;
        Ok(geom)
    }

    /// Split a path and every non-draft path it crosses at their
    /// intersections. Returns the pieces of `id` in order along its geometry.
    fn split_intersections(&mut self, id: PathId) -> Result<Vec<PathId>> {
        self.spatial.ensure_built(&self.paths);
        let path = self.paths.get(id).ok_or_path_not_found(id)?;
        let geom = path.geom.clone();
        let own_length = path.length();
        let Some(bounds) = path.bounds() else {
            return Ok(vec![id]);
        };

        let tolerance = self.config.node_tolerance;
        let mut own_cuts: Vec<f64> = Vec::new();

        for other_id in self.spatial.query_viewport(&bounds.expand(tolerance)) {
            if other_id == id {
                continue;
            }
            let Some(other) = self.paths.get(other_id) else {
                continue;
            };
            if other.is_draft() {
                continue;
            }
            let other_length = other.length();
            let hits = line_intersections(&geom, &other.geom);

            let mut other_cuts: Vec<f64> = Vec::new();
            for hit in hits {
                let along_a = hit.fraction_a * own_length;
                if along_a > tolerance && own_length - along_a > tolerance {
                    own_cuts.push(hit.fraction_a);
                }
                let along_b = hit.fraction_b * other_length;
                if along_b > tolerance && other_length - along_b > tolerance {
                    other_cuts.push(hit.fraction_b);
                }
            }

            self.split_at_fractions(other_id, other_cuts)?;
        }

        let mut pieces = self.split_at_fractions(id, own_cuts)?;
        pieces.insert(0, id);
        Ok(pieces)
    }

    /// Split a path at several fractions of its current geometry.
    ///
    /// Returns the created pieces in order along the geometry.
    fn split_at_fractions(&mut self, id: PathId, mut fractions: Vec<f64>) -> Result<Vec<PathId>> {
        if fractions.is_empty() {
            return Ok(Vec::new());
        }
        let length = self.paths.get(id).ok_or_path_not_found(id)?.length();
        let min_gap = if length > 0.0 {
            self.config.node_tolerance / length
        } else {
            0.0
        };

        fractions.sort_by(|a, b| b.total_cmp(a));
        fractions.dedup_by(|a, b| (*a - *b).abs() <= min_gap);

        let mut created = Vec::with_capacity(fractions.len());
        let mut head_end = 1.0;
        for f in fractions {
            created.push(self.split_path(id, f / head_end)?);
            head_end = f;
        }
        created.reverse();
        Ok(created)
    }

    /// Split a path at a fraction. The path keeps its head and the tail
    /// becomes a new path; topologies are redistributed onto both.
    pub fn split_path(&mut self, id: PathId, fraction: f64) -> Result<PathId> {
        let path = self.paths.get(id).ok_or_path_not_found(id)?;
        let length = path.length();
        let along = fraction * length;
        if !fraction.is_finite()
            || along <= self.config.node_tolerance
            || length - along <= self.config.node_tolerance
        {
            return Err(TopologyError::InvalidPosition {
                path_id: id,
                position: fraction,
            });
        }

        let (head, tail) = split_line(&path.geom, fraction);
        let attributes = path.attributes.clone();
        self.paths.set_geometry(id, head)?;
        let new_id = self.paths.insert(tail, attributes)?;

        let affected =
            self.topologies
                .split_path(id, new_id, fraction, self.config.position_epsilon);
        self.spatial.mark_dirty();
        self.refresh(affected);

        debug!("[Split] path {} split at {:.6} into {} and {}", id, fraction, id, new_id);
        Ok(new_id)
    }

    /// Replace the geometry of a path.
    ///
    /// Aggregation positions are kept, so every topology on the path follows
    /// the new geometry. Intersections are split again; the returned ids are
    /// the pieces of the edited path.
    pub fn update_path_geometry(&mut self, id: PathId, geom: LineString<f64>) -> Result<Vec<PathId>> {
        let old_nodes = self.end_nodes(&[id]);
        self.paths.set_geometry(id, geom)?;
        self.spatial.mark_dirty();
        let affected = self.topologies.topologies_on_path(id);
        self.refresh(affected);

        let draft = self.paths.get(id).map_or(false, Path::is_draft);
        let pieces = if self.config.split_on_intersection && !draft {
            self.split_intersections(id)?
        } else {
            vec![id]
        };
        let mut nodes = old_nodes;
        nodes.extend(self.end_nodes(&pieces));
        self.refresh_nodes(&nodes);
        info!("[Engine] updated path {} ({} pieces)", id, pieces.len());
        Ok(pieces)
    }

    /// Replace the attributes of a path.
    pub fn update_path_attributes(&mut self, id: PathId, attributes: PathAttributes) -> Result<()> {
        let path = self.paths.get_mut(id).ok_or_path_not_found(id)?;
        let draft_changed = path.attributes.draft != attributes.draft;
        path.attributes = attributes;
        self.spatial.mark_dirty();
        if draft_changed {
            let nodes = self.end_nodes(&[id]);
            self.refresh_nodes(&nodes);
        }
        Ok(())
    }

    /// Reverse the direction of a path. Topology geometries are unchanged.
    pub fn reverse_path(&mut self, id: PathId) -> Result<()> {
        let path = self.paths.get(id).ok_or_path_not_found(id)?;
        let reversed = reverse_line(&path.geom);
        self.paths.set_geometry(id, reversed)?;
        let affected = self.topologies.remap_path(id, id, |p| 1.0 - p, true);
        self.spatial.mark_dirty();
        self.refresh(affected);
        Ok(())
    }

    /// Merge path `b` into path `a` through their shared end node.
    ///
    /// Refused when the paths do not touch, when another path also ends at
    /// the shared node, or when only one of them is a draft.
    pub fn merge_paths(&mut self, a: PathId, b: PathId) -> Result<PathId> {
        let refuse = |reason: &str| TopologyError::MergeRefused {
            a,
            b,
            reason: reason.to_string(),
        };
        if a == b {
            return Err(refuse("a path cannot be merged with itself"));
        }
        let path_a = self.paths.get(a).ok_or_path_not_found(a)?;
        let path_b = self.paths.get(b).ok_or_path_not_found(b)?;
        if path_a.is_draft() != path_b.is_draft() {
            return Err(refuse("draft and non-draft paths cannot be merged"));
        }

        let tolerance = self.config.node_tolerance;
        // (reverse a, reverse b, shared coordinate)
        let junction = [
            (false, false, path_a.end(), path_b.start()),
            (false, true, path_a.end(), path_b.end()),
            (true, false, path_a.start(), path_b.start()),
            (true, true, path_a.start(), path_b.end()),
        ]
        .into_iter()
        .find(|(_, _, ca, cb)| coords_close(*ca, *cb, tolerance));
        let Some((reverse_a, reverse_b, shared, _)) = junction else {
            return Err(refuse("paths do not share an end node"));
        };

        let others = self
            .paths
            .values()
            .filter(|p| p.id != a && p.id != b && !p.is_draft())
            .any(|p| coords_close(p.start(), shared, tolerance) || coords_close(p.end(), shared, tolerance));
        if others {
            return Err(refuse("other paths are connected at the shared node"));
        }

        let geom_a = if reverse_a { reverse_line(&path_a.geom) } else { path_a.geom.clone() };
        let mut geom_b = if reverse_b { reverse_line(&path_b.geom) } else { path_b.geom.clone() };
        // Ends matched within node_tolerance become one vertex
        geom_b.0[0] = geom_a.0[geom_a.0.len() - 1];
        let length_a = line_length(&geom_a);
        let length_b = line_length(&geom_b);
        let ratio = length_a / (length_a + length_b);
        let merged = concat_lines(&[geom_a, geom_b]);

        self.paths.set_geometry(a, merged)?;
        self.paths.remove(b);

        let mut affected = self.topologies.remap_path(
            a,
            a,
            |p| if reverse_a { (1.0 - p) * ratio } else { p * ratio },
            reverse_a,
        );
        affected.extend(self.topologies.remap_path(
            b,
            a,
            |p| {
                let q = if reverse_b { 1.0 - p } else { p };
                ratio + q * (1.0 - ratio)
            },
            reverse_b,
        ));
        affected.sort_unstable();
        affected.dedup();
        for id in &affected {
            self.topologies
                .fuse_contiguous(*id, self.config.position_epsilon.max(1e-9));
        }

        self.spatial.mark_dirty();
        self.refresh(affected.iter().copied());
        info!("[Merge] path {} merged into {} ({} topologies updated)", b, a, affected.len());
        Ok(a)
    }

    /// Delete a path. Topologies left without any path are soft-deleted.
    pub fn remove_path(&mut self, id: PathId) -> Result<()> {
        let nodes = self.end_nodes(&[id]);
        self.paths.remove(id).ok_or_path_not_found(id)?;
        let affected = self.topologies.remove_path(id);
        let deleted = affected
            .iter()
            .filter(|t| self.topologies.get(**t).map_or(false, |topo| topo.deleted))
            .count();
        self.spatial.mark_dirty();
        self.refresh(affected);
        self.refresh_nodes(&nodes);
        info!("[Engine] removed path {} ({} topologies deleted)", id, deleted);
        Ok(())
    }

    /// Paths whose segments intersect a bounding box.
    pub fn paths_in_viewport(&mut self, bounds: &Bounds) -> Vec<PathId> {
        self.spatial.ensure_built(&self.paths);
        self.spatial.query_viewport(bounds)
    }

    /// Graph of the current non-draft paths.
    pub fn network(&self) -> PathNetwork {
        PathNetwork::build(&self.paths, self.config.node_tolerance)
    }

    // ========================================================================
    // Topology Management
    // ========================================================================

    /// Create a topology at a single position of a path.
    pub fn add_point_topology(&mut self, path_id: PathId, position: f64, offset: f64) -> Result<TopologyId> {
        self.check_position(path_id, position)?;
        let id = self.topologies.insert(
            TopologyKind::Point,
            offset,
            vec![Aggregation::new(path_id, position, position, 0)],
        );
        self.refresh([id]);
        Ok(id)
    }

    /// Create a topology covering a sequence of path ranges.
    pub fn add_line_topology(&mut self, ranges: &[(PathId, f64, f64)], offset: f64) -> Result<TopologyId> {
        if ranges.is_empty() {
            return Err(TopologyError::invalid_geometry("a line topology needs at least one range"));
        }
        let mut aggregations = Vec::with_capacity(ranges.len());
        for (order, (path_id, start, end)) in ranges.iter().enumerate() {
            self.check_position(*path_id, *start)?;
            self.check_position(*path_id, *end)?;
            aggregations.push(Aggregation::new(*path_id, *start, *end, order as u32));
        }
        let kind = Topology::infer_kind(&aggregations);
        let id = self.topologies.insert(kind, offset, aggregations);
        self.refresh([id]);
        Ok(id)
    }

    /// Closest non-draft path to a coordinate and the projection onto it.
    pub fn locate(&mut self, coord: Coord<f64>) -> Result<(PathId, LocatedPoint)> {
        self.spatial.ensure_built(&self.paths);
        let (path_id, _) = self
            .spatial
            .nearest_path(coord, true)
            .ok_or(TopologyError::NoPathNearby { x: coord.x, y: coord.y })?;
        let path = self.paths.get(path_id).ok_or_path_not_found(path_id)?;
        Ok((path_id, closest_point(&path.geom, coord)))
    }

    /// Create a point topology from a free coordinate: the closest path
    /// position, offset by the signed distance to it.
    pub fn add_topology_from_point(&mut self, coord: Coord<f64>) -> Result<TopologyId> {
        let (path_id, located) = self.locate(coord)?;
        self.add_point_topology(path_id, located.fraction, located.signed_distance())
    }

    /// Shortest route on the network between two positions.
    pub fn route(&self, from: (PathId, f64), to: (PathId, f64)) -> Result<Route> {
        self.check_position(from.0, from.1)?;
        self.check_position(to.0, to.1)?;
        self.network().shortest_route(from, to)
    }

    /// Create a line topology following the shortest route from `from` to
    /// `to` through the `via` positions.
    pub fn add_routed_topology(
        &mut self,
        from: (PathId, f64),
        to: (PathId, f64),
        via: &[(PathId, f64)],
    ) -> Result<TopologyId> {
        let network = self.network();
        let mut waypoints = Vec::with_capacity(via.len() + 2);
        waypoints.push(from);
        waypoints.extend_from_slice(via);
        waypoints.push(to);
        for (path_id, position) in &waypoints {
            self.check_position(*path_id, *position)?;
        }

        let mut steps: Vec<(PathId, f64, f64)> = Vec::new();
        for pair in waypoints.windows(2) {
            let route = network.shortest_route(pair[0], pair[1])?;
            steps.extend(route.steps);
        }

        let moving: Vec<(PathId, f64, f64)> = steps
            .iter()
            .copied()
            .filter(|(_, s, e)| (s - e).abs() > self.config.position_epsilon)
            .collect();
        let ranges = if moving.is_empty() {
            steps.into_iter().take(1).collect::<Vec<_>>()
        } else {
            moving
        };

        let id = self.add_line_topology(&ranges, 0.0)?;
        self.topologies
            .fuse_contiguous(id, self.config.position_epsilon.max(1e-9));
        self.refresh([id]);
        Ok(id)
    }

    /// Replace the location of `target` with a copy of `source`'s.
    pub fn mutate_topology(&mut self, target: TopologyId, source: TopologyId) -> Result<()> {
        let source_topo = self
            .topologies
            .get(source)
            .ok_or_topology_not_found(source)?
            .clone();
        self.topologies
            .update(target, |topo| topo.mutate(&source_topo))
            .ok_or_topology_not_found(target)?;
        self.refresh([target]);
        Ok(())
    }

    /// Soft-delete a topology.
    pub fn delete_topology(&mut self, id: TopologyId) -> Result<()> {
        self.topologies
            .update(id, |topo| topo.deleted = true)
            .ok_or_topology_not_found(id)?;
        self.geometries.remove(id);
        Ok(())
    }

    /// Undo a soft deletion. Fails for topologies that lost all their paths.
    pub fn restore_topology(&mut self, id: TopologyId) -> Result<()> {
        let topo = self.topologies.get(id).ok_or_topology_not_found(id)?;
        if topo.aggregations.is_empty() {
            return Err(TopologyError::EmptyTopology(id));
        }
        self.topologies.update(id, |topo| topo.deleted = false);
        self.refresh([id]);
        Ok(())
    }

    pub fn topology(&self, id: TopologyId) -> Option<&Topology> {
        self.topologies.get(id)
    }

    /// Derived geometry of a topology, recomputed if stale.
    pub fn geometry(&mut self, id: TopologyId) -> Result<TopoGeometry> {
        let topo = self.topologies.get(id).ok_or_topology_not_found(id)?;
        if topo.deleted || topo.aggregations.is_empty() {
            return Err(TopologyError::EmptyTopology(id));
        }
        if let Some(geom) = self.geometries.get(id) {
            return Ok(geom.clone());
        }
        self.geometries
            .compute(id, &self.topologies, &self.paths, &self.config)
    }

    /// Geometry coordinates as a JSON array of `[x, y]` pairs.
    pub fn geometry_json(&mut self, id: TopologyId) -> String {
        let coords: Vec<[f64; 2]> = match self.geometry(id) {
            Ok(geom) => geom.coords().iter().map(|c| [c.x, c.y]).collect(),
            Err(e) => {
                warn!("Failed to compute geometry for topology {}: {}", id, e);
                return "[]".to_string();
            }
        };
        serde_json::to_string(&coords).unwrap_or_else(|e| {
            warn!("Failed to serialize geometry for topology {}: {}", id, e);
            "[]".to_string()
        })
    }

    /// Simplified geometry for display.
    pub fn simplified_geometry(&mut self, id: TopologyId, tolerance: f64) -> Result<TopoGeometry> {
        Ok(match self.geometry(id)? {
            TopoGeometry::Line(line) => {
                TopoGeometry::Line(simplify_preserve_topology(&line, tolerance))
            }
            point => point,
        })
    }

    /// Length of the network covered by a topology.
    pub fn topology_length(&self, id: TopologyId) -> Result<f64> {
        let topo = self.topologies.get(id).ok_or_topology_not_found(id)?;
        Ok(topo
            .aggregations
            .iter()
            .map(|a| a.length_on(self.paths.length_of(a.path_id)))
            .sum())
    }

    /// Distinct paths of a topology in traversal order.
    pub fn topology_paths(&self, id: TopologyId) -> Result<Vec<PathId>> {
        Ok(self.topologies.get(id).ok_or_topology_not_found(id)?.paths())
    }

    /// Live topologies with an aggregation on a path.
    pub fn topologies_on_path(&self, path_id: PathId) -> Vec<TopologyId> {
        self.topologies
            .topologies_on_path(path_id)
            .into_iter()
            .filter(|id| self.topologies.get(*id).map_or(false, |t| !t.deleted))
            .collect()
    }

    /// Recompute every stale geometry.
    pub fn ensure_computed(&mut self) {
        self.geometries
            .ensure_computed(&self.topologies, &self.paths, &self.config);
    }
}
