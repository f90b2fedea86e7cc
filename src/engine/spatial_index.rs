//! Spatial indexing of path segments.
//!
//! Uses an R-tree of individual segments so that snapping, closest-path
//! lookups and viewport queries do not scan whole geometries.

use std::collections::BTreeSet;

use geo::Coord;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::{Bounds, PathId};

use super::path_store::PathStore;

/// One segment of a path, as stored in the R-tree.
#[derive(Debug, Clone, Copy)]
pub struct PathSegment {
    pub path_id: PathId,
    /// Index of the segment's first vertex in the path geometry
    pub index: usize,
    pub start: [f64; 2],
    pub end: [f64; 2],
    pub draft: bool,
}

impl RTreeObject for PathSegment {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.start, self.end)
    }
}

impl PointDistance for PathSegment {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.end[0] - self.start[0];
        let dy = self.end[1] - self.start[1];
        let len_sq = dx * dx + dy * dy;
        let t = if len_sq > 0.0 {
            (((point[0] - self.start[0]) * dx + (point[1] - self.start[1]) * dy) / len_sq)
                .clamp(0.0, 1.0)
        } else {
            0.0
        };
        let px = self.start[0] + dx * t - point[0];
        let py = self.start[1] + dy * t - point[1];
        px * px + py * py
    }
}

/// Spatial index over the segments of every path.
///
/// Maintains an R-tree with dirty tracking for rebuilds after edits.
#[derive(Debug)]
pub struct SpatialIndex {
    tree: RTree<PathSegment>,
    dirty: bool,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialIndex {
    /// Create a new empty spatial index.
    pub fn new() -> Self {
        Self {
            tree: RTree::new(),
            dirty: false,
        }
    }

    /// Mark the index as needing rebuild.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Check if the index needs rebuild.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Rebuild the index from the path store.
    pub fn rebuild(&mut self, store: &PathStore) {
        let segments: Vec<PathSegment> = store
            .values()
            .flat_map(|path| {
                let draft = path.is_draft();
                path.geom
                    .lines()
                    .enumerate()
                    .map(move |(index, line)| PathSegment {
                        path_id: path.id,
                        index,
                        start: [line.start.x, line.start.y],
                        end: [line.end.x, line.end.y],
                        draft,
                    })
            })
            .collect();

        self.tree = RTree::bulk_load(segments);
        self.dirty = false;
    }

    /// Ensure the index is up to date.
    pub fn ensure_built(&mut self, store: &PathStore) {
        if self.dirty {
            self.rebuild(store);
        }
    }

    /// Clear the index.
    pub fn clear(&mut self) {
        self.tree = RTree::new();
        self.dirty = false;
    }

    /// Closest path to a coordinate, with the distance to it.
    pub fn nearest_path(&self, coord: Coord<f64>, exclude_draft: bool) -> Option<(PathId, f64)> {
        self.tree
            .nearest_neighbor_iter(&[coord.x, coord.y])
            .find(|seg| !(exclude_draft && seg.draft))
            .map(|seg| (seg.path_id, seg.distance_2(&[coord.x, coord.y]).sqrt()))
    }

    /// Paths passing within `distance` of a coordinate, ascending by id.
    pub fn paths_within(&self, coord: Coord<f64>, distance: f64, exclude_draft: bool) -> Vec<PathId> {
        let found: BTreeSet<PathId> = self
            .tree
            .locate_within_distance([coord.x, coord.y], distance * distance)
            .filter(|seg| !(exclude_draft && seg.draft))
            .map(|seg| seg.path_id)
            .collect();
        found.into_iter().collect()
    }

    /// Paths whose segments intersect a bounding box, ascending by id.
    pub fn query_viewport(&self, bounds: &Bounds) -> Vec<PathId> {
        let search = AABB::from_corners([bounds.min_x, bounds.min_y], [bounds.max_x, bounds.max_y]);
        let found: BTreeSet<PathId> = self
            .tree
            .locate_in_envelope_intersecting(&search)
            .map(|seg| seg.path_id)
            .collect();
        found.into_iter().collect()
    }

    /// Get the number of indexed segments.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
