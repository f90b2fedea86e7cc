//! Derived topology geometries with dirty tracking.
//!
//! This is NOT an authoritative store - it's a computation tracker that:
//! - Computes geometries on demand from aggregations and path geometries
//! - Tracks which geometries need recomputation after a network edit
//! - Drops geometries of deleted topologies

use std::collections::{HashMap, HashSet};

use log::warn;

use crate::engine::{AggregationIndex, PathStore};
use crate::error::{OptionExt, Result};
use crate::topology::{compute_geometry, TopoGeometry};
use crate::{TopologyConfig, TopologyId};

/// Store for lazily derived topology geometries.
#[derive(Debug, Default)]
pub struct GeometryStore {
    geometries: HashMap<TopologyId, TopoGeometry>,
    dirty: HashSet<TopologyId>,
}

impl GeometryStore {
    /// Create a new empty geometry store.
    pub fn new() -> Self {
        Self {
            geometries: HashMap::new(),
            dirty: HashSet::new(),
        }
    }

    /// Mark a topology's geometry as needing recomputation.
    pub fn mark_dirty(&mut self, id: TopologyId) {
        self.dirty.insert(id);
    }

    /// Mark multiple topologies as needing recomputation.
    pub fn mark_many_dirty(&mut self, ids: impl IntoIterator<Item = TopologyId>) {
        self.dirty.extend(ids);
    }

    /// Forget a topology's geometry.
    pub fn remove(&mut self, id: TopologyId) {
        self.geometries.remove(&id);
        self.dirty.remove(&id);
    }

    /// Clear all geometries.
    pub fn clear(&mut self) {
        self.geometries.clear();
        self.dirty.clear();
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    pub fn is_dirty(&self, id: TopologyId) -> bool {
        self.dirty.contains(&id)
    }

    /// Cached geometry, if computed and clean.
    pub fn get(&self, id: TopologyId) -> Option<&TopoGeometry> {
        if self.dirty.contains(&id) {
            return None;
        }
        self.geometries.get(&id)
    }

    /// Number of cached geometries.
    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    /// Compute one geometry now and cache it.
    pub fn compute(
        &mut self,
        id: TopologyId,
        index: &AggregationIndex,
        paths: &PathStore,
        config: &TopologyConfig,
    ) -> Result<TopoGeometry> {
        let topology = index.get(id).ok_or_topology_not_found(id)?;
        let geom = compute_geometry(topology, paths, config)?;
        self.geometries.insert(id, geom.clone());
        self.dirty.remove(&id);
        Ok(geom)
    }

    /// Ensure all dirty geometries are computed.
    ///
    /// Deleted or empty topologies lose their geometry. Failures are logged
    /// and the topology stays dirty.
    pub fn ensure_computed(
        &mut self,
        index: &AggregationIndex,
        paths: &PathStore,
        config: &TopologyConfig,
    ) {
        if self.dirty.is_empty() {
            return;
        }

        let dirty_ids: Vec<TopologyId> = self.dirty.drain().collect();
        let results = compute_many(&dirty_ids, index, paths, config);

        for (id, result) in results {
            match result {
                Some(Ok(geom)) => {
                    self.geometries.insert(id, geom);
                }
                Some(Err(e)) => {
                    warn!("[Geometry] topology {} not recomputed: {}", id, e);
                    self.geometries.remove(&id);
                    self.dirty.insert(id);
                }
                None => {
                    self.geometries.remove(&id);
                }
            }
        }
    }
}

type Computed = (TopologyId, Option<Result<TopoGeometry>>);

fn compute_one(
    id: TopologyId,
    index: &AggregationIndex,
    paths: &PathStore,
    config: &TopologyConfig,
) -> Computed {
    match index.get(id) {
        Some(topo) if !topo.deleted && !topo.aggregations.is_empty() => {
            (id, Some(compute_geometry(topo, paths, config)))
        }
        _ => (id, None),
    }
}

#[cfg(feature = "parallel")]
fn compute_many(
    ids: &[TopologyId],
    index: &AggregationIndex,
    paths: &PathStore,
    config: &TopologyConfig,
) -> Vec<Computed> {
    use rayon::prelude::*;

    ids.par_iter()
        .map(|id| compute_one(*id, index, paths, config))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn compute_many(
    ids: &[TopologyId],
    index: &AggregationIndex,
    paths: &PathStore,
    config: &TopologyConfig,
) -> Vec<Computed> {
    ids.iter()
        .map(|id| compute_one(*id, index, paths, config))
        .collect()
}
