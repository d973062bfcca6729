use super::*;

use crate::signal::runtime::Runtime;

#[test]
fn new_graph_has_only_the_root_group() {
    let g = SceneGraph::new();
    assert_eq!(g.len(), 1);
    assert_eq!(g.name_of(g.root()).unwrap(), "root");
    assert_eq!(g.kind_of(g.root()).unwrap(), NodeKind::Group);
    assert!(g.children_of(g.root()).unwrap().is_empty());
}

#[test]
fn add_node_and_bind_reject_unknown_nodes() {
    let mut g = SceneGraph::new();
    let missing = NodeId(42);
    assert!(matches!(
        g.add_node(missing, "x", NodeKind::Rect).unwrap_err(),
        StrobeError::Validation(_)
    ));
    assert!(g.bind(missing, "x", 1.0).is_err());

    let id = g.add_node(g.root(), "box", NodeKind::Rect).unwrap();
    g.bind(id, "width", 10.0).unwrap();
    g.bind(id, "width", 20.0).unwrap();
    assert_eq!(g.props_of(id).unwrap(), vec!["width"]);
    assert_eq!(g.find("box"), Some(id));
    assert_eq!(g.find("nope"), None);
}

#[test]
fn bindings_evaluate_constants_and_signals() {
    let rt = Runtime::new();
    let s = rt.source("s", 2.0_f64);
    let b = s.clone().into_binding();
    assert_eq!(b.eval().unwrap(), PropValue::Number(2.0));
    s.write(3.0).unwrap();
    assert_eq!(b.eval().unwrap(), PropValue::Number(3.0));

    let c = "hello".into_binding();
    assert_eq!(c.eval().unwrap(), PropValue::Text("hello".to_owned()));

    let s2 = s.clone();
    let f = Binding::from_fn(move || Ok(Vec2::new(s2.read()?, 0.0)));
    assert_eq!(f.eval().unwrap(), PropValue::Vec2(Vec2::new(3.0, 0.0)));
}

#[test]
fn prop_values_serialize_with_type_tags() {
    let v = serde_json::to_value(PropValue::Number(1.5)).unwrap();
    assert_eq!(v, serde_json::json!({"type": "number", "value": 1.5}));
    assert_eq!(PropValue::Bool(true).type_name(), "bool");
    assert_eq!(PropValue::from(Point::new(1.0, 2.0)), PropValue::Vec2(Vec2::new(1.0, 2.0)));
}
