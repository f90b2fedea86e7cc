//! Tests for AggregationIndex rewrites

use trailtopo::{Aggregation, AggregationIndex, TopologyKind};

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

fn ranges(index: &AggregationIndex, id: u64) -> Vec<(u64, f64, f64)> {
    index
        .get(id)
        .unwrap()
        .aggregations
        .iter()
        .map(|a| (a.path_id, a.start_position, a.end_position))
        .collect()
}

fn assert_ranges(actual: &[(u64, f64, f64)], expected: &[(u64, f64, f64)]) {
    assert_eq!(actual.len(), expected.len(), "{:?} vs {:?}", actual, expected);
    for (a, e) in actual.iter().zip(expected) {
        assert_eq!(a.0, e.0, "{:?} vs {:?}", actual, expected);
        assert!(approx_eq(a.1, e.1, 1e-9), "{:?} vs {:?}", actual, expected);
        assert!(approx_eq(a.2, e.2, 1e-9), "{:?} vs {:?}", actual, expected);
    }
}

fn line(index: &mut AggregationIndex, aggs: &[(u64, f64, f64)]) -> u64 {
    let aggregations = aggs
        .iter()
        .map(|(p, s, e)| Aggregation::new(*p, *s, *e, 0))
        .collect();
    index.insert(TopologyKind::Line, 0.0, aggregations)
}

fn point(index: &mut AggregationIndex, path: u64, position: f64, offset: f64) -> u64 {
    index.insert(
        TopologyKind::Point,
        offset,
        vec![Aggregation::new(path, position, position, 0)],
    )
}

#[test]
fn test_insert_and_reverse_index() {
    let mut index = AggregationIndex::new();
    let t1 = line(&mut index, &[(1, 0.0, 1.0), (2, 0.0, 0.5)]);
    let t2 = point(&mut index, 2, 0.3, 0.0);

    assert_eq!(index.len(), 2);
    assert_eq!(index.topologies_on_path(1), vec![t1]);
    assert_eq!(index.topologies_on_path(2), vec![t1, t2]);
    assert!(index.topologies_on_path(3).is_empty());

    let orders: Vec<u32> = index.get(t1).unwrap().aggregations.iter().map(|a| a.order).collect();
    assert_eq!(orders, vec![0, 1]);
}

#[test]
fn test_update_reindexes() {
    let mut index = AggregationIndex::new();
    let t = line(&mut index, &[(1, 0.0, 1.0)]);
    index.update(t, |topo| topo.aggregations[0].path_id = 5).unwrap();

    assert!(index.topologies_on_path(1).is_empty());
    assert_eq!(index.topologies_on_path(5), vec![t]);
    assert!(index.update(99, |_| ()).is_none());
}

#[test]
fn test_split_forward_range() {
    let mut index = AggregationIndex::new();
    let t = line(&mut index, &[(1, 0.2, 0.8)]);
    let affected = index.split_path(1, 2, 0.5, 1e-9);

    assert_eq!(affected, vec![t]);
    assert_ranges(&ranges(&index, t), &[(1, 0.4, 1.0), (2, 0.0, 0.6)]);
    assert_eq!(index.topologies_on_path(2), vec![t]);
}

#[test]
fn test_split_reversed_range_keeps_traversal_order() {
    let mut index = AggregationIndex::new();
    let t = line(&mut index, &[(1, 0.8, 0.2)]);
    index.split_path(1, 2, 0.5, 1e-9);

    assert_ranges(&ranges(&index, t), &[(2, 0.6, 0.0), (1, 1.0, 0.4)]);
}

#[test]
fn test_split_ranges_on_one_side() {
    let mut index = AggregationIndex::new();
    let head = line(&mut index, &[(1, 0.0, 0.25)]);
    let tail = line(&mut index, &[(1, 0.75, 1.0)]);
    index.split_path(1, 2, 0.5, 1e-9);

    assert_ranges(&ranges(&index, head), &[(1, 0.0, 0.5)]);
    assert_ranges(&ranges(&index, tail), &[(2, 0.5, 1.0)]);
    assert_eq!(index.topologies_on_path(1), vec![head]);
}

#[test]
fn test_split_points() {
    let mut index = AggregationIndex::new();
    let before = point(&mut index, 1, 0.25, 0.0);
    let on_cut = point(&mut index, 1, 0.5, 0.0);
    let after = point(&mut index, 1, 0.75, 0.0);
    index.split_path(1, 2, 0.5, 1e-9);

    assert_ranges(&ranges(&index, before), &[(1, 0.5, 0.5)]);
    assert_ranges(&ranges(&index, on_cut), &[(1, 1.0, 1.0)]);
    assert_ranges(&ranges(&index, after), &[(2, 0.5, 0.5)]);
}

#[test]
fn test_remap_reverse_flips_point_offset() {
    let mut index = AggregationIndex::new();
    let p = point(&mut index, 1, 0.25, 3.0);
    let l = line(&mut index, &[(1, 0.1, 0.4)]);
    let affected = index.remap_path(1, 1, |x| 1.0 - x, true);

    assert_eq!(affected, vec![p, l]);
    assert_ranges(&ranges(&index, p), &[(1, 0.75, 0.75)]);
    assert_eq!(index.get(p).unwrap().offset, -3.0);
    assert_ranges(&ranges(&index, l), &[(1, 0.9, 0.6)]);
    assert_eq!(index.get(l).unwrap().offset, 0.0);
}

#[test]
fn test_remove_path_soft_deletes_empty() {
    let mut index = AggregationIndex::new();
    let only = line(&mut index, &[(1, 0.0, 1.0)]);
    let shared = line(&mut index, &[(1, 0.0, 1.0), (2, 0.0, 1.0)]);
    let affected = index.remove_path(1);

    assert_eq!(affected, vec![only, shared]);
    assert!(index.get(only).unwrap().deleted);
    assert!(index.get(only).unwrap().aggregations.is_empty());
    assert!(!index.get(shared).unwrap().deleted);
    assert_ranges(&ranges(&index, shared), &[(2, 0.0, 1.0)]);
    assert!(index.topologies_on_path(1).is_empty());
}

#[test]
fn test_fuse_contiguous() {
    let mut index = AggregationIndex::new();
    let t = line(&mut index, &[(1, 0.0, 0.4), (1, 0.4, 0.9), (2, 0.0, 1.0)]);
    index.fuse_contiguous(t, 1e-9);
    assert_ranges(&ranges(&index, t), &[(1, 0.0, 0.9), (2, 0.0, 1.0)]);

    // Opposite directions are not fused
    let u = line(&mut index, &[(1, 0.0, 0.5), (1, 0.5, 0.2)]);
    index.fuse_contiguous(u, 1e-9);
    assert_eq!(ranges(&index, u).len(), 2);
}
