//! Unified error handling for the topology engine.

use thiserror::Error;

use crate::{PathId, TopologyId};

/// Errors raised by path editing, topology construction and serialization.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    #[error("path {0} not found")]
    PathNotFound(PathId),

    #[error("topology {0} not found")]
    TopologyNotFound(TopologyId),

    #[error("invalid position {position} on path {path_id}")]
    InvalidPosition { path_id: PathId, position: f64 },

    #[error("topology {0} has no aggregations")]
    EmptyTopology(TopologyId),

    #[error("no route between path {from} and path {to}")]
    NotConnected { from: PathId, to: PathId },

    #[error("cannot merge paths {a} and {b}: {reason}")]
    MergeRefused { a: PathId, b: PathId, reason: String },

    #[error("no path near ({x}, {y})")]
    NoPathNearby { x: f64, y: f64 },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TopologyError {
    pub(crate) fn invalid_geometry(reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TopologyError>;

/// Conversions from `Option` lookups into engine errors.
pub trait OptionExt<T> {
    fn ok_or_path_not_found(self, id: PathId) -> Result<T>;
    fn ok_or_topology_not_found(self, id: TopologyId) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_path_not_found(self, id: PathId) -> Result<T> {
        self.ok_or(TopologyError::PathNotFound(id))
    }

    fn ok_or_topology_not_found(self, id: TopologyId) -> Result<T> {
        self.ok_or(TopologyError::TopologyNotFound(id))
    }
}
