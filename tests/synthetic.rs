//! Tests on generated trail networks.
//!
//! Run with: `cargo test --features synthetic --test synthetic`

use geo::Coord;
use trailtopo::linear::line_length;
use trailtopo::synthetic::NetworkScenario;
use trailtopo::{overlapping, TopoGeometry, TopologyConfig};

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

fn coord_eq(a: Coord<f64>, b: Coord<f64>) -> bool {
    approx_eq(a.x, b.x, 1e-6) && approx_eq(a.y, b.y, 1e-6)
}

#[test]
fn test_generation_is_deterministic() {
    let scenario = NetworkScenario::default();
    let a = scenario.generate();
    let b = scenario.generate();
    assert_eq!(a.paths, b.paths);
    assert_eq!(a.points, b.points);
    assert_eq!(a.paths.len(), 5 * 4 + 5 * 4);
    assert_eq!(a.points.len(), 20);
    assert_eq!(a.lines.len(), 10);
}

#[test]
fn test_load_builds_connected_grid() {
    let dataset = NetworkScenario::default().generate();
    let (mut engine, path_ids, topology_ids) = dataset.load(TopologyConfig::default()).unwrap();

    // Edges only meet at grid nodes, so nothing was split
    assert_eq!(engine.paths.len(), dataset.paths.len());
    assert_eq!(path_ids.len(), dataset.paths.len());
    assert_eq!(topology_ids.len(), 30);

    let network = engine.network();
    assert_eq!(network.node_count(), 25);
    assert_eq!(network.connected_components().len(), 1);

    engine.ensure_computed();
    assert_eq!(engine.stats().dirty_geometry_count, 0);
}

#[test]
fn test_split_preserves_every_geometry() {
    let dataset = NetworkScenario::default().generate();
    let (mut engine, path_ids, topology_ids) = dataset.load(TopologyConfig::default()).unwrap();

    let before: Vec<TopoGeometry> = topology_ids
        .iter()
        .map(|id| engine.geometry(*id).unwrap())
        .collect();

    for path_id in path_ids.iter().step_by(3) {
        engine.split_path(*path_id, 0.37).unwrap();
    }

    for (id, old) in topology_ids.iter().zip(&before) {
        let new = engine.geometry(*id).unwrap();
        match (old, &new) {
            (TopoGeometry::Point(a), TopoGeometry::Point(b)) => {
                assert!(coord_eq(a.0, b.0), "topology {} moved", id);
            }
            (TopoGeometry::Line(a), TopoGeometry::Line(b)) => {
                assert!(coord_eq(a.0[0], b.0[0]), "topology {} start moved", id);
                assert!(
                    coord_eq(a.0[a.0.len() - 1], b.0[b.0.len() - 1]),
                    "topology {} end moved",
                    id
                );
                assert!(approx_eq(line_length(a), line_length(b), 1e-6));
            }
            _ => panic!("topology {} changed kind", id),
        }
    }
}

#[test]
fn test_every_topology_overlaps_itself() {
    let dataset = NetworkScenario {
        rows: 3,
        cols: 3,
        ..NetworkScenario::default()
    }
    .generate();
    let (engine, _, topology_ids) = dataset.load(TopologyConfig::default()).unwrap();

    for id in &topology_ids {
        assert!(overlapping(&engine, &[*id]).contains(id));
    }
}
