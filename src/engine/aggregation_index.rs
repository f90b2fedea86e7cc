//! Topology storage with a path -> topologies reverse index.
//!
//! Every edit of the network (split, merge, reverse, delete) is expressed
//! here as a rewrite of aggregation ranges. The index keeps:
//! - Topologies by id
//! - For each path, the set of topologies having an aggregation on it

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::debug;

use crate::topology::{Aggregation, Topology};
use crate::{PathId, TopologyId, TopologyKind};

/// Storage of topologies and their aggregations.
#[derive(Debug, Default)]
pub struct AggregationIndex {
    topologies: BTreeMap<TopologyId, Topology>,
    by_path: HashMap<PathId, BTreeSet<TopologyId>>,
    next_id: TopologyId,
}

#[inline]
fn clamp_position(p: f64) -> f64 {
    p.clamp(0.0, 1.0)
}

impl AggregationIndex {
    /// Create a new empty index. Ids start at 1.
    pub fn new() -> Self {
        Self {
            topologies: BTreeMap::new(),
            by_path: HashMap::new(),
            next_id: 1,
        }
    }

    /// Store a new topology and return its id.
    pub fn insert(
        &mut self,
        kind: TopologyKind,
        offset: f64,
        aggregations: Vec<Aggregation>,
    ) -> TopologyId {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        let mut topology = Topology::new(id, kind);
        topology.offset = offset;
        topology.aggregations = aggregations;
        topology.renumber();
        self.index(&topology);
        self.topologies.insert(id, topology);
        id
    }

    fn index(&mut self, topology: &Topology) {
        for path_id in topology.paths() {
            self.by_path.entry(path_id).or_default().insert(topology.id);
        }
    }

    fn unindex(&mut self, topology: &Topology) {
        for path_id in topology.paths() {
            if let Some(set) = self.by_path.get_mut(&path_id) {
                set.remove(&topology.id);
                if set.is_empty() {
                    self.by_path.remove(&path_id);
                }
            }
        }
    }

    pub fn get(&self, id: TopologyId) -> Option<&Topology> {
        self.topologies.get(&id)
    }

    pub fn contains(&self, id: TopologyId) -> bool {
        self.topologies.contains_key(&id)
    }

    /// Apply a change to a topology, keeping the reverse index in sync.
    ///
    /// Returns `None` if the topology does not exist.
    pub fn update<R>(&mut self, id: TopologyId, f: impl FnOnce(&mut Topology) -> R) -> Option<R> {
        let mut topology = self.topologies.remove(&id)?;
        self.unindex(&topology);
        let out = f(&mut topology);
        topology.renumber();
        self.index(&topology);
        self.topologies.insert(id, topology);
        Some(out)
    }

    /// Remove a topology entirely.
    pub fn remove(&mut self, id: TopologyId) -> Option<Topology> {
        let topology = self.topologies.remove(&id)?;
        self.unindex(&topology);
        Some(topology)
    }

    /// Topologies with at least one aggregation on a path, ascending.
    pub fn topologies_on_path(&self, path_id: PathId) -> Vec<TopologyId> {
        self.by_path
            .get(&path_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn ids(&self) -> Vec<TopologyId> {
        self.topologies.keys().copied().collect()
    }

    pub fn values(&self) -> impl Iterator<Item = &Topology> {
        self.topologies.values()
    }

    pub fn len(&self) -> usize {
        self.topologies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topologies.is_empty()
    }

    /// Drop every aggregation on a path.
    ///
    /// Topologies left without aggregations are soft-deleted. Returns the
    /// affected topology ids.
    pub fn remove_path(&mut self, path_id: PathId) -> Vec<TopologyId> {
        let affected = self.topologies_on_path(path_id);
        for id in &affected {
            self.update(*id, |topo| {
                topo.aggregations.retain(|a| a.path_id != path_id);
                if topo.aggregations.is_empty() {
                    topo.deleted = true;
                }
            });
        }
        affected
    }

    /// Redistribute aggregations after `path_id` was cut at `fraction`,
    /// its tail becoming `new_path`.
    ///
    /// Ranges fully before the cut are rescaled on `path_id`, ranges fully
    /// after it move to `new_path`, and ranges straddling it are split in two
    /// in traversal order. A point exactly on the cut stays on `path_id` at 1.0.
    pub fn split_path(
        &mut self,
        path_id: PathId,
        new_path: PathId,
        fraction: f64,
        epsilon: f64,
    ) -> Vec<TopologyId> {
        let head = |p: f64| clamp_position(p / fraction);
        let tail = |p: f64| clamp_position((p - fraction) / (1.0 - fraction));

        let affected = self.topologies_on_path(path_id);
        for id in &affected {
            self.update(*id, |topo| {
                let mut rewritten = Vec::with_capacity(topo.aggregations.len() + 1);
                for agg in topo.aggregations.drain(..) {
                    if agg.path_id != path_id {
                        rewritten.push(agg);
                        continue;
                    }
                    let (lo, hi) = agg.covered_range();
                    let s = agg.start_position;
                    let e = agg.end_position;

                    if agg.is_point() {
                        if s <= fraction + epsilon {
                            let p = if (s - fraction).abs() <= epsilon { 1.0 } else { head(s) };
                            rewritten.push(Aggregation::new(path_id, p, p, 0));
                        } else {
                            let p = tail(s);
                            rewritten.push(Aggregation::new(new_path, p, p, 0));
                        }
                    } else if hi <= fraction + epsilon {
                        rewritten.push(Aggregation::new(path_id, head(s), head(e), 0));
                    } else if lo >= fraction - epsilon {
                        rewritten.push(Aggregation::new(new_path, tail(s), tail(e), 0));
                    } else if s < e {
                        rewritten.push(Aggregation::new(path_id, head(s), 1.0, 0));
                        rewritten.push(Aggregation::new(new_path, 0.0, tail(e), 0));
                    } else {
                        rewritten.push(Aggregation::new(new_path, tail(s), 0.0, 0));
                        rewritten.push(Aggregation::new(path_id, 1.0, head(e), 0));
                    }
                }
                topo.aggregations = rewritten;
            });
        }
        debug!(
            "[Split] path {} at {:.6}: {} topologies rewritten onto {}",
            path_id,
            fraction,
            affected.len(),
            new_path
        );
        affected
    }

    /// Move every aggregation on `old` to `new`, mapping positions through
    /// `mapping`.
    ///
    /// When `flip_points` is set, point topologies on `old` negate their
    /// offset so they stay on the same side after a reversal.
    pub fn remap_path(
        &mut self,
        old: PathId,
        new: PathId,
        mapping: impl Fn(f64) -> f64,
        flip_points: bool,
    ) -> Vec<TopologyId> {
        let affected = self.topologies_on_path(old);
        for id in &affected {
            self.update(*id, |topo| {
                for agg in topo.aggregations.iter_mut().filter(|a| a.path_id == old) {
                    agg.path_id = new;
                    agg.start_position = clamp_position(mapping(agg.start_position));
                    agg.end_position = clamp_position(mapping(agg.end_position));
                }
                if flip_points && topo.kind == TopologyKind::Point {
                    topo.offset = -topo.offset;
                }
            });
        }
        affected
    }

    /// Fuse consecutive aggregations of a topology that continue each other
    /// on the same path in the same direction.
    pub fn fuse_contiguous(&mut self, id: TopologyId, epsilon: f64) {
        self.update(id, |topo| {
            let mut fused: Vec<Aggregation> = Vec::with_capacity(topo.aggregations.len());
            for agg in topo.aggregations.drain(..) {
                if let Some(prev) = fused.last_mut() {
                    let same_direction = !prev.is_point()
                        && !agg.is_point()
                        && prev.is_reversed() == agg.is_reversed();
                    if prev.path_id == agg.path_id
                        && same_direction
                        && (prev.end_position - agg.start_position).abs() <= epsilon
                    {
                        prev.end_position = agg.end_position;
                        continue;
                    }
                }
                fused.push(agg);
            }
            topo.aggregations = fused;
        });
    }
}
