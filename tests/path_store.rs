//! Tests for PathStore

use geo::{Coord, LineString};
use trailtopo::{PathAttributes, PathStore, TopologyError};

fn line(coords: Vec<(f64, f64)>) -> LineString<f64> {
    LineString::from(coords)
}

#[test]
fn test_insert_allocates_ids() {
    let mut store = PathStore::new();
    let a = store
        .insert(line(vec![(0.0, 0.0), (10.0, 0.0)]), PathAttributes::default())
        .unwrap();
    let b = store
        .insert(line(vec![(0.0, 0.0), (0.0, 10.0)]), PathAttributes::named("North"))
        .unwrap();

    assert_eq!((a, b), (1, 2));
    assert_eq!(store.len(), 2);
    assert_eq!(store.ids(), vec![1, 2]);
    assert_eq!(store.get(b).unwrap().attributes.name.as_deref(), Some("North"));
    assert_eq!(store.length_of(a), 10.0);
    assert_eq!(store.length_of(99), 0.0);
}

#[test]
fn test_insert_with_id_moves_counter() {
    let mut store = PathStore::new();
    store
        .insert_with_id(10, line(vec![(0.0, 0.0), (1.0, 0.0)]), PathAttributes::default())
        .unwrap();
    assert_eq!(store.next_id(), 11);
    let next = store
        .insert(line(vec![(0.0, 0.0), (2.0, 0.0)]), PathAttributes::default())
        .unwrap();
    assert_eq!(next, 11);
}

#[test]
fn test_rejects_invalid_geometry() {
    let mut store = PathStore::new();
    let single = store.insert(line(vec![(0.0, 0.0)]), PathAttributes::default());
    assert!(matches!(single, Err(TopologyError::InvalidGeometry { .. })));

    let zero = store.insert(line(vec![(3.0, 3.0), (3.0, 3.0)]), PathAttributes::default());
    assert!(matches!(zero, Err(TopologyError::InvalidGeometry { .. })));

    let nan = store.insert(line(vec![(0.0, 0.0), (f64::NAN, 1.0)]), PathAttributes::default());
    assert!(matches!(nan, Err(TopologyError::InvalidGeometry { .. })));

    assert!(store.is_empty());
}

#[test]
fn test_set_geometry() {
    let mut store = PathStore::new();
    let id = store
        .insert(line(vec![(0.0, 0.0), (10.0, 0.0)]), PathAttributes::default())
        .unwrap();
    store
        .set_geometry(id, line(vec![(0.0, 0.0), (0.0, 5.0), (5.0, 5.0)]))
        .unwrap();

    let path = store.get(id).unwrap();
    assert_eq!(path.length(), 10.0);
    assert_eq!(path.end(), Coord { x: 5.0, y: 5.0 });

    let missing = store.set_geometry(42, line(vec![(0.0, 0.0), (1.0, 0.0)]));
    assert!(matches!(missing, Err(TopologyError::PathNotFound(42))));
}

#[test]
fn test_attributes_defaults() {
    let attrs = PathAttributes::default();
    assert!(attrs.valid);
    assert!(attrs.visible);
    assert!(!attrs.draft);
    assert!(PathAttributes::draft().draft);

    let parsed: PathAttributes = serde_json::from_str(r#"{"name": "Ridge"}"#).unwrap();
    assert_eq!(parsed.name.as_deref(), Some("Ridge"));
    assert!(parsed.visible);
}
