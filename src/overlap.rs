//! Overlap queries between topologies.
//!
//! Two topologies overlap when they have aggregations on the same path whose
//! covered ranges intersect. Ranges are closed, so a signpost sitting exactly
//! at the end of a trail overlaps it.
//!
//! This is what "filter by trail" and project reports run on: find every
//! intervention, signage or other topology lying on a set of edges.

use std::collections::BTreeSet;

use crate::engine::{AggregationIndex, TopologyEngine};
use crate::topology::Aggregation;
use crate::{PathId, TopologyId};

/// Check whether two closed `(min, max)` ranges intersect.
#[inline]
pub fn ranges_overlap(a: (f64, f64), b: (f64, f64)) -> bool {
    a.0 <= b.1 && b.0 <= a.1
}

/// Live topologies overlapping one aggregation.
fn overlapping_aggregation(index: &AggregationIndex, edge: &Aggregation) -> Vec<TopologyId> {
    let range = edge.covered_range();
    index
        .topologies_on_path(edge.path_id)
        .into_iter()
        .filter(|id| {
            index.get(*id).map_or(false, |topo| {
                !topo.deleted
                    && topo
                        .aggregations
                        .iter()
                        .filter(|a| a.path_id == edge.path_id)
                        .any(|a| ranges_overlap(a.covered_range(), range))
            })
        })
        .collect()
}

fn edge_aggregations(index: &AggregationIndex, edges: &[TopologyId]) -> Vec<Aggregation> {
    edges
        .iter()
        .filter_map(|id| index.get(*id))
        .filter(|topo| !topo.deleted)
        .flat_map(|topo| topo.aggregations.iter().copied())
        .collect()
}

#[cfg(feature = "parallel")]
fn collect_overlapping(index: &AggregationIndex, aggregations: &[Aggregation]) -> BTreeSet<TopologyId> {
    use rayon::prelude::*;

    aggregations
        .par_iter()
        .map(|agg| overlapping_aggregation(index, agg))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn collect_overlapping(index: &AggregationIndex, aggregations: &[Aggregation]) -> BTreeSet<TopologyId> {
    aggregations
        .iter()
        .flat_map(|agg| overlapping_aggregation(index, agg))
        .collect()
}

/// Live topologies overlapping any of `edges`, ascending by id.
///
/// The edges themselves are part of the result when live, since every
/// topology overlaps itself.
pub fn overlapping(engine: &TopologyEngine, edges: &[TopologyId]) -> Vec<TopologyId> {
    let aggregations = edge_aggregations(&engine.topologies, edges);
    collect_overlapping(&engine.topologies, &aggregations)
        .into_iter()
        .collect()
}

/// Keep the candidates overlapping any of `edges`, in the order given.
pub fn filter_overlapping(
    engine: &TopologyEngine,
    candidates: &[TopologyId],
    edges: &[TopologyId],
) -> Vec<TopologyId> {
    let hits: BTreeSet<TopologyId> = overlapping(engine, edges).into_iter().collect();
    candidates
        .iter()
        .copied()
        .filter(|id| hits.contains(id))
        .collect()
}

/// Distinct paths used by a set of topologies, ascending.
pub fn paths_of_many(engine: &TopologyEngine, ids: &[TopologyId]) -> Vec<PathId> {
    let paths: BTreeSet<PathId> = ids
        .iter()
        .filter_map(|id| engine.topologies.get(*id))
        .filter(|topo| !topo.deleted)
        .flat_map(|topo| topo.aggregations.iter().map(|a| a.path_id))
        .collect();
    paths.into_iter().collect()
}
