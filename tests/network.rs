//! Tests for the path network graph and routing

use geo::{Coord, LineString};
use trailtopo::{PathAttributes, PathNetwork, PathStore, TopologyError};

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Square loop 1-2-3-4 plus a detached path 5 and a draft 6.
///
/// ```text
///  (0,100) --3-- (100,100)
///     |              |
///     4              2
///     |              |
///   (0,0) ---1--- (100,0)
/// ```
fn square_store() -> PathStore {
    let mut store = PathStore::new();
    for coords in [
        vec![(0.0, 0.0), (100.0, 0.0)],
        vec![(100.0, 0.0), (100.0, 100.0)],
        vec![(100.0, 100.0), (0.0, 100.0)],
        vec![(0.0, 100.0), (0.0, 0.0)],
        vec![(500.0, 500.0), (600.0, 500.0)],
    ] {
        store
            .insert(LineString::from(coords), PathAttributes::default())
            .unwrap();
    }
    store
        .insert(
            LineString::from(vec![(0.0, 0.0), (100.0, 100.0)]),
            PathAttributes::draft(),
        )
        .unwrap();
    store
}

#[test]
fn test_build_clusters_nodes() {
    let network = PathNetwork::build(&square_store(), 0.01);
    // 4 corners + 2 ends of the detached path; the draft adds nothing
    assert_eq!(network.node_count(), 6);
    assert_eq!(network.edge_count(), 5);
    assert!(network.edge(6).is_none());

    let corner = network.node_of(Coord { x: 0.0, y: 0.0 }).unwrap();
    assert_eq!(network.degree(corner), 2);
    let mut at_corner = network.paths_at(corner);
    at_corner.sort_unstable();
    assert_eq!(at_corner, vec![1, 4]);
    assert!(network.node_of(Coord { x: 50.0, y: 50.0 }).is_none());
}

#[test]
fn test_node_tolerance() {
    let mut store = PathStore::new();
    store
        .insert(LineString::from(vec![(0.0, 0.0), (10.0, 0.0)]), PathAttributes::default())
        .unwrap();
    store
        .insert(LineString::from(vec![(10.005, 0.0), (20.0, 0.0)]), PathAttributes::default())
        .unwrap();

    assert_eq!(PathNetwork::build(&store, 0.01).node_count(), 3);
    assert_eq!(PathNetwork::build(&store, 0.001).node_count(), 4);
}

#[test]
fn test_connected_components() {
    let network = PathNetwork::build(&square_store(), 0.01);
    let components = network.connected_components();
    assert_eq!(components, vec![vec![1, 2, 3, 4], vec![5]]);
}

#[test]
fn test_shortest_route_picks_short_side() {
    let network = PathNetwork::build(&square_store(), 0.01);
    // From the middle of the bottom edge to the middle of the right edge
    let route = network.shortest_route((1, 0.5), (2, 0.5)).unwrap();
    assert!(approx_eq(route.length, 100.0, 1e-9));
    assert_eq!(route.steps, vec![(1, 0.5, 1.0), (2, 0.0, 0.5)]);
}

#[test]
fn test_shortest_route_against_path_direction() {
    let network = PathNetwork::build(&square_store(), 0.01);
    // Bottom edge near its start, to the left edge near its end (the origin)
    let route = network.shortest_route((1, 0.2), (4, 0.9)).unwrap();
    assert!(approx_eq(route.length, 30.0, 1e-9));
    assert_eq!(route.steps, vec![(1, 0.2, 0.0), (4, 1.0, 0.9)]);
}

#[test]
fn test_shortest_route_crosses_whole_paths() {
    let network = PathNetwork::build(&square_store(), 0.01);
    // Bottom edge to top edge: one whole side in between
    let route = network.shortest_route((1, 0.9), (3, 0.1)).unwrap();
    assert!(approx_eq(route.length, 120.0, 1e-9));
    assert_eq!(route.steps.len(), 3);
    assert_eq!(route.steps[1], (2, 0.0, 1.0));
}

#[test]
fn test_shortest_route_same_path() {
    let network = PathNetwork::build(&square_store(), 0.01);
    let route = network.shortest_route((1, 0.2), (1, 0.7)).unwrap();
    assert!(approx_eq(route.length, 50.0, 1e-9));
    assert_eq!(route.steps, vec![(1, 0.2, 0.7)]);
}

#[test]
fn test_not_connected() {
    let network = PathNetwork::build(&square_store(), 0.01);
    assert!(matches!(
        network.shortest_route((1, 0.5), (5, 0.5)),
        Err(TopologyError::NotConnected { from: 1, to: 5 })
    ));
    assert!(matches!(
        network.shortest_route((1, 0.5), (6, 0.5)),
        Err(TopologyError::PathNotFound(6))
    ));
}
