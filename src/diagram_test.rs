use super::test_helpers::{chain, connection, node_at};
use super::*;

// =============================================================
// StepType presentation
// =============================================================

#[test]
fn palette_matches_node_types() {
    assert_eq!(StepType::Start.color(), "#10b981");
    assert_eq!(StepType::End.color(), "#ef4444");
    assert_eq!(StepType::Process.color(), "#3b82f6");
    assert_eq!(StepType::Decision.color(), "#f59e0b");
    assert_eq!(StepType::Data.color(), "#8b5cf6");
    assert_eq!(StepType::Connector.color(), "#6b7280");
}

#[test]
fn shapes_match_node_types() {
    assert_eq!(StepType::Start.shape(), NodeShape::Ellipse);
    assert_eq!(StepType::End.shape(), NodeShape::Ellipse);
    assert_eq!(StepType::Decision.shape(), NodeShape::Diamond);
    assert_eq!(StepType::Data.shape(), NodeShape::Parallelogram);
    assert_eq!(StepType::Connector.shape(), NodeShape::Circle);
    assert_eq!(StepType::Process.shape(), NodeShape::Rectangle);
}

#[test]
fn step_type_display_is_wire_name() {
    for t in StepType::ALL {
        assert_eq!(t.to_string(), t.as_str());
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, format!("\"{}\"", t.as_str()));
    }
}

#[test]
fn effective_color_prefers_override() {
    let mut node = node_at("a", StepType::Decision, 0.0, 0.0);
    assert_eq!(node.effective_color(), "#f59e0b");
    node.color = Some("#123456".into());
    assert_eq!(node.effective_color(), "#123456");
}

// =============================================================
// Serde shape
// =============================================================

#[test]
fn diagram_serializes_with_wire_names() {
    let d = chain(2);
    let json = serde_json::to_value(&d).unwrap();
    assert_eq!(json["createdAt"], 0);
    assert_eq!(json["nodes"][0]["type"], "process");
    assert_eq!(json["nodes"][0]["position"]["x"], 200.0);
    assert_eq!(json["connections"][0]["sourceId"], "n1");
    assert_eq!(json["connections"][0]["targetId"], "n2");
    assert_eq!(json["connections"][0]["type"], "flow");
}

#[test]
fn diagram_json_round_trips() {
    let d = chain(3);
    let json = serde_json::to_string(&d).unwrap();
    assert_eq!(Diagram::from_json(&json).unwrap(), d);
}

#[test]
fn from_json_fills_optional_fields() {
    let json = r#"{
        "id": "d",
        "prompt": "p",
        "createdAt": 5,
        "nodes": [{"id": "a", "type": "start", "label": "A", "position": {"x": 1, "y": 2}}],
        "connections": [{"id": "c", "sourceId": "a", "targetId": "a"}]
    }"#;
    let d = Diagram::from_json(json).unwrap();
    assert_eq!(d.nodes[0].description, "");
    assert_eq!(d.nodes[0].color, None);
    assert_eq!(d.connections[0].kind, ConnectionKind::Flow);
    assert_eq!(d.connections[0].label, None);
}

#[test]
fn from_json_keeps_incomplete_nodes_for_validation() {
    let json = r#"{
        "id": "d",
        "nodes": [{"id": "a", "type": "start"}, {"id": "b", "type": "end", "label": null}],
        "connections": [{"id": "c1", "sourceId": "a", "targetId": "zzz"}]
    }"#;
    let d = Diagram::from_json(json).unwrap();
    assert_eq!(d.nodes.len(), 2);
    assert_eq!(
        validate_diagram(&d),
        vec![
            "Node 0 is missing label",
            "Node 0 is missing position",
            "Node 1 is missing label",
            "Node 1 is missing position",
            "Connection 0 references non-existent target node",
        ]
    );
}

#[test]
fn from_json_reports_missing_ids_and_endpoints() {
    let json = r#"{"nodes": [{"type": "process", "label": "A", "position": {"x": 0, "y": 0}}],
        "connections": [{"sourceId": null}]}"#;
    let errors = validate_diagram(&Diagram::from_json(json).unwrap());
    assert_eq!(
        errors,
        vec![
            "Node 0 is missing id",
            "Connection 0 is missing id",
            "Connection 0 is missing sourceId",
            "Connection 0 is missing targetId",
            "Connection 0 references non-existent source node",
            "Connection 0 references non-existent target node",
        ]
    );
}

#[test]
fn from_json_of_empty_object_has_no_nodes() {
    let d = Diagram::from_json("{}").unwrap();
    assert_eq!(validate_diagram(&d), vec!["Diagram must have at least one node"]);
}

#[test]
fn from_json_rejects_unknown_type() {
    let json = r#"{"id":"d","prompt":"p","createdAt":0,"connections":[],
        "nodes":[{"id":"a","type":"subroutine","label":"A","position":{"x":0,"y":0}}]}"#;
    assert!(Diagram::from_json(json).is_err());
}

#[test]
fn partial_node_omits_absent_fields() {
    let partial = PartialNode { label: Some("X".into()), ..Default::default() };
    let json = serde_json::to_value(&partial).unwrap();
    assert_eq!(json, serde_json::json!({"label": "X"}));
}

// =============================================================
// PartialNode
// =============================================================

#[test]
fn partial_apply_touches_only_present_fields() {
    let mut node = node_at("a", StepType::Process, 10.0, 20.0);
    let partial = PartialNode {
        node_type: Some(StepType::Data),
        position: Some(Position::new(1.0, 2.0)),
        ..Default::default()
    };
    partial.apply_to(&mut node);
    assert_eq!(node.id, "a");
    assert_eq!(node.node_type, StepType::Data);
    assert_eq!(node.position, Position::new(1.0, 2.0));
    assert_eq!(node.label, "Label a");
    assert_eq!(node.description, "Description of a");
}

#[test]
fn empty_partial_changes_nothing() {
    let mut node = node_at("a", StepType::Process, 10.0, 20.0);
    let before = node.clone();
    let partial = PartialNode::default();
    assert!(partial.is_empty());
    partial.apply_to(&mut node);
    assert_eq!(node, before);
}

// =============================================================
// Validation
// =============================================================

#[test]
fn valid_chain_has_no_errors() {
    assert!(validate_diagram(&chain(4)).is_empty());
    assert!(chain(4).validate().is_ok());
}

#[test]
fn empty_diagram_is_rejected() {
    let d = chain(0);
    assert_eq!(validate_diagram(&d), vec!["Diagram must have at least one node"]);
}

#[test]
fn node_field_errors_are_indexed() {
    let mut d = chain(2);
    d.nodes[1].id = String::new();
    d.nodes[1].label = "   ".into();
    d.nodes[1].position = Position::new(f64::NAN, 0.0);
    d.connections.clear();
    assert_eq!(
        validate_diagram(&d),
        vec!["Node 1 is missing id", "Node 1 is missing label", "Node 1 is missing position"]
    );
}

#[test]
fn duplicate_node_id_is_reported() {
    let mut d = chain(2);
    d.nodes[1].id = "n1".into();
    d.connections.clear();
    assert_eq!(validate_diagram(&d), vec!["Node 1 has duplicate id n1"]);
}

#[test]
fn dangling_connection_is_reported() {
    let mut d = chain(2);
    d.nodes.remove(1);
    assert_eq!(validate_diagram(&d), vec!["Connection 0 references non-existent target node"]);
}

#[test]
fn connection_missing_fields_are_reported() {
    let mut d = chain(1);
    d.connections.push(connection("", "", "n1"));
    assert_eq!(
        validate_diagram(&d),
        vec![
            "Connection 0 is missing id",
            "Connection 0 is missing sourceId",
            "Connection 0 references non-existent source node",
        ]
    );
}

#[test]
fn validate_collects_every_violation() {
    let mut d = chain(3);
    d.nodes[0].label = String::new();
    d.connections.push(connection("c9", "ghost", "n2"));
    let err = d.validate().unwrap_err();
    assert_eq!(err.messages().len(), 2);
    assert_eq!(
        err.to_string(),
        "Node 0 is missing label, Connection 2 references non-existent source node"
    );
}

#[test]
fn incident_connections_cover_both_directions() {
    let d = chain(3);
    let ids: Vec<&str> = d.incident_connections("n2").map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2"]);
    assert_eq!(d.incident_connections("n9").count(), 0);
}
