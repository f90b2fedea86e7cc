//! Path storage.
//!
//! Manages the linear features of the network:
//! - CRUD operations with monotonically allocated ids
//! - Geometry validation
//! - Length and bounds computation

use std::collections::BTreeMap;

use geo::{Coord, LineString};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TopologyError};
use crate::linear::{coords_close, line_length};
use crate::{Bounds, PathId};

/// Non-geometric attributes of a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathAttributes {
    pub name: Option<String>,
    pub comments: Option<String>,
    /// Validated by a supervisor
    pub valid: bool,
    /// Draft paths are not part of the routable network
    pub draft: bool,
    pub visible: bool,
}

impl Default for PathAttributes {
    fn default() -> Self {
        Self {
            name: None,
            comments: None,
            valid: true,
            draft: false,
            visible: true,
        }
    }
}

impl PathAttributes {
    /// Attributes for a named path.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Attributes for a draft path.
    pub fn draft() -> Self {
        Self {
            draft: true,
            ..Self::default()
        }
    }
}

/// A linear feature of the network.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub id: PathId,
    pub geom: LineString<f64>,
    pub attributes: PathAttributes,
}

impl Path {
    /// Planar length in meters.
    pub fn length(&self) -> f64 {
        line_length(&self.geom)
    }

    /// Length ignoring altitude. Equal to `length()` for planar geometries.
    pub fn length_2d(&self) -> f64 {
        self.length()
    }

    pub fn start(&self) -> Coord<f64> {
        self.geom.0[0]
    }

    pub fn end(&self) -> Coord<f64> {
        self.geom.0[self.geom.0.len() - 1]
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_coords(&self.geom.0)
    }

    pub fn is_draft(&self) -> bool {
        self.attributes.draft
    }
}

/// Reject geometries a path cannot carry.
pub fn validate_geometry(geom: &LineString<f64>) -> Result<()> {
    if geom.0.len() < 2 {
        return Err(TopologyError::invalid_geometry(format!(
            "path needs at least 2 coordinates, got {}",
            geom.0.len()
        )));
    }
    if geom.0.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(TopologyError::invalid_geometry("non-finite coordinate"));
    }
    if line_length(geom) <= 0.0 {
        return Err(TopologyError::invalid_geometry("path has zero length"));
    }
    Ok(())
}

/// Storage for the paths of the network, ordered by id.
#[derive(Debug, Default)]
pub struct PathStore {
    paths: BTreeMap<PathId, Path>,
    next_id: PathId,
}

impl PathStore {
    /// Create a new empty path store. Ids start at 1.
    pub fn new() -> Self {
        Self {
            paths: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Validate and insert a path, returning its new id.
    pub fn insert(&mut self, geom: LineString<f64>, attributes: PathAttributes) -> Result<PathId> {
        validate_geometry(&geom)?;
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        self.paths.insert(id, Path { id, geom, attributes });
        Ok(id)
    }

    /// Insert a path with a caller-chosen id, replacing any existing one.
    pub fn insert_with_id(
        &mut self,
        id: PathId,
        geom: LineString<f64>,
        attributes: PathAttributes,
    ) -> Result<()> {
        validate_geometry(&geom)?;
        self.next_id = self.next_id.max(id + 1);
        self.paths.insert(id, Path { id, geom, attributes });
        Ok(())
    }

    /// Replace the geometry of a path.
    pub fn set_geometry(&mut self, id: PathId, geom: LineString<f64>) -> Result<()> {
        validate_geometry(&geom)?;
        let path = self
            .paths
            .get_mut(&id)
            .ok_or(TopologyError::PathNotFound(id))?;
        path.geom = geom;
        Ok(())
    }

    pub fn get(&self, id: PathId) -> Option<&Path> {
        self.paths.get(&id)
    }

    pub fn get_mut(&mut self, id: PathId) -> Option<&mut Path> {
        self.paths.get_mut(&id)
    }

    pub fn remove(&mut self, id: PathId) -> Option<Path> {
        self.paths.remove(&id)
    }

    pub fn contains(&self, id: PathId) -> bool {
        self.paths.contains_key(&id)
    }

    /// All path ids in ascending order.
    pub fn ids(&self) -> Vec<PathId> {
        self.paths.keys().copied().collect()
    }

    pub fn values(&self) -> impl Iterator<Item = &Path> {
        self.paths.values()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Id the next inserted path will receive.
    pub fn next_id(&self) -> PathId {
        self.next_id.max(1)
    }

    /// Non-draft path ends within `tolerance` of a coordinate, as
    /// `(path, is_start)` pairs.
    pub fn endpoints_near(&self, coord: Coord<f64>, tolerance: f64) -> Vec<(PathId, bool)> {
        let mut found = Vec::new();
        for path in self.paths.values().filter(|p| !p.is_draft()) {
            if coords_close(path.start(), coord, tolerance) {
                found.push((path.id, true));
            }
            if coords_close(path.end(), coord, tolerance) {
                found.push((path.id, false));
            }
        }
        found
    }

    /// Path length, or 0 for an unknown path.
    pub fn length_of(&self, id: PathId) -> f64 {
        self.paths.get(&id).map_or(0.0, Path::length)
    }
}
