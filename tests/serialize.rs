//! Tests for the JSON exchange format

use geo::LineString;
use trailtopo::{
    parse_topology, PathAttributes, SerializedTopology, TopologyEngine, TopologyError,
    TopologyKind,
};

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Path 1 runs east to (100, 0), path 2 north from there to (100, 100).
fn setup() -> TopologyEngine {
    let mut engine = TopologyEngine::new();
    engine
        .add_path(
            LineString::from(vec![(0.0, 0.0), (100.0, 0.0)]),
            PathAttributes::default(),
        )
        .unwrap();
    engine
        .add_path(
            LineString::from(vec![(100.0, 0.0), (100.0, 100.0)]),
            PathAttributes::default(),
        )
        .unwrap();
    engine
}

fn ranges(engine: &TopologyEngine, id: u64) -> Vec<(u64, f64, f64)> {
    engine
        .topology(id)
        .unwrap()
        .aggregations
        .iter()
        .map(|a| (a.path_id, a.start_position, a.end_position))
        .collect()
}

#[test]
fn test_parse_shapes() {
    assert!(matches!(
        parse_topology(r#"{"x": 1.0, "y": 2.0}"#).unwrap(),
        SerializedTopology::Point(_)
    ));
    assert!(matches!(
        parse_topology(r#"[{"paths": [1, 2]}]"#).unwrap(),
        SerializedTopology::Steps(_)
    ));
    assert!(matches!(
        parse_topology(r#"{"offset": 2.0, "paths": [1]}"#).unwrap(),
        SerializedTopology::Step(_)
    ));
    assert!(matches!(
        parse_topology("[1, 2"),
        Err(TopologyError::Serialization(_))
    ));
}

#[test]
fn test_load_point() {
    let mut engine = setup();
    let id = engine
        .load_json(r#"{"x": 25.0, "y": 2.0, "kind": "SIGNAGE"}"#)
        .unwrap();

    let topo = engine.topology(id).unwrap();
    assert_eq!(topo.kind, TopologyKind::Point);
    assert_eq!(topo.aggregations[0].path_id, 1);
    assert!(approx_eq(topo.aggregations[0].start_position, 0.25, 1e-9));
    assert!(approx_eq(topo.offset, 2.0, 1e-9));

    let json: serde_json::Value = serde_json::from_str(&engine.serialize_json(id).unwrap()).unwrap();
    assert_eq!(json["kind"], "POINT");
    assert!(approx_eq(json["x"].as_f64().unwrap(), 25.0, 1e-9));
    assert!(approx_eq(json["y"].as_f64().unwrap(), 2.0, 1e-9));
}

#[test]
fn test_load_point_with_explicit_offset() {
    let mut engine = setup();
    let id = engine
        .load_json(r#"{"x": 25.0, "y": 2.0, "offset": 0.0}"#)
        .unwrap();
    assert_eq!(engine.topology(id).unwrap().offset, 0.0);
}

#[test]
fn test_load_steps_infers_direction() {
    let mut engine = setup();
    let id = engine
        .load_json(r#"[{"offset": 0.0, "paths": [1, 2], "positions": {"0": [0.5, 1.0]}}]"#)
        .unwrap();
    assert_eq!(ranges(&engine, id), vec![(1, 0.5, 1.0), (2, 0.0, 1.0)]);
    assert!(approx_eq(engine.topology_length(id).unwrap(), 150.0, 1e-9));
}

#[test]
fn test_load_steps_backwards() {
    let mut engine = setup();
    let id = engine
        .load_json(r#"[{"paths": [2, 1], "positions": {"1": [1.0, 0.5]}}]"#)
        .unwrap();
    assert_eq!(ranges(&engine, id), vec![(2, 1.0, 0.0), (1, 1.0, 0.5)]);

    let geom = engine.geometry(id).unwrap();
    let line = geom.as_line().unwrap();
    assert!(approx_eq(line.0[0].y, 100.0, 1e-9));
    assert!(approx_eq(line.0[line.0.len() - 1].x, 50.0, 1e-9));
}

#[test]
fn test_load_single_step_with_offset() {
    let mut engine = setup();
    let id = engine
        .load_json(r#"{"offset": 3.0, "paths": [1], "positions": {"0": [0.0, 0.5]}}"#)
        .unwrap();
    assert_eq!(engine.topology(id).unwrap().offset, 3.0);
    let geom = engine.geometry(id).unwrap();
    assert!(approx_eq(geom.as_line().unwrap().0[0].y, 3.0, 1e-9));
}

#[test]
fn test_load_steps_with_disconnected_path() {
    let mut engine = setup();
    let apart = engine
        .add_path(
            LineString::from(vec![(0.0, 50.0), (50.0, 50.0)]),
            PathAttributes::default(),
        )
        .unwrap();
    assert_eq!(apart, 3);

    // Neither end of path 3 touches the end of path 1, so it runs backwards
    let id = engine.load_json(r#"[{"paths": [1, 3]}]"#).unwrap();
    assert_eq!(ranges(&engine, id), vec![(1, 0.0, 1.0), (3, 1.0, 0.0)]);
}

#[test]
fn test_bad_position_index() {
    let mut engine = setup();
    assert!(matches!(
        engine.load_json(r#"[{"paths": [1, 2], "positions": {"5": [0.0, 1.0]}}]"#),
        Err(TopologyError::InvalidGeometry { .. })
    ));
    assert!(matches!(
        engine.load_json(r#"[{"paths": [1], "positions": {"first": [0.0, 1.0]}}]"#),
        Err(TopologyError::InvalidGeometry { .. })
    ));
}

#[test]
fn test_load_errors() {
    let mut engine = setup();
    assert!(matches!(
        engine.load_json(r#"[{"paths": []}]"#),
        Err(TopologyError::InvalidGeometry { .. })
    ));
    assert!(matches!(
        engine.load_json(r#"[{"paths": [42]}]"#),
        Err(TopologyError::PathNotFound(42))
    ));
    assert!(matches!(
        TopologyEngine::new().load_json(r#"{"x": 0.0, "y": 0.0}"#),
        Err(TopologyError::NoPathNearby { .. })
    ));
}

#[test]
fn test_line_serializes_every_position() {
    let mut engine = setup();
    let id = engine
        .add_line_topology(&[(1, 0.5, 1.0), (2, 0.0, 0.5)], 1.5)
        .unwrap();

    let json = engine.serialize_json(id).unwrap();
    match parse_topology(&json).unwrap() {
        SerializedTopology::Steps(steps) => {
            assert_eq!(steps.len(), 1);
            assert_eq!(steps[0].paths, vec![1, 2]);
            assert_eq!(steps[0].offset, 1.5);
            assert_eq!(steps[0].positions.get("0"), Some(&[0.5, 1.0]));
            assert_eq!(steps[0].positions.get("1"), Some(&[0.0, 0.5]));
        }
        other => panic!("expected steps, got {:?}", other),
    }

    // Loading the serialized form gives the same location
    let copy = engine.load_json(&json).unwrap();
    assert_eq!(ranges(&engine, copy), ranges(&engine, id));
}
