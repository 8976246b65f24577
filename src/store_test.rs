use super::*;
use crate::diagram::test_helpers::{chain, connection, node_at};
use crate::diagram::{StepType, validate_diagram};
use crate::layout::{Footprint, check_collision};

fn node_ids(diagram: &Diagram) -> Vec<&str> {
    diagram.nodes.iter().map(|n| n.id.as_str()).collect()
}

fn connection_ids(diagram: &Diagram) -> Vec<&str> {
    diagram.connections.iter().map(|c| c.id.as_str()).collect()
}

/// n1 -> n2 -> n3 -> n4 plus a shortcut n1 -> n3.
fn branched() -> Diagram {
    let mut d = chain(4);
    d.connections.push(connection("c-short", "n1", "n3"));
    d
}

fn ready_store() -> DiagramStore {
    let mut store = DiagramStore::new();
    store.set_diagram(chain(3));
    store
}

// =============================================================
// update_node
// =============================================================

#[test]
fn update_merges_present_fields_only() {
    let d = chain(2);
    let partial = PartialNode { label: Some("Renamed".into()), node_type: Some(StepType::Decision), ..Default::default() };
    let next = update_node(&d, "n1", &partial);
    let node = next.node("n1").unwrap();
    assert_eq!(node.label, "Renamed");
    assert_eq!(node.node_type, StepType::Decision);
    assert_eq!(node.description, d.nodes[0].description);
    assert_eq!(node.position, d.nodes[0].position);
    assert_eq!(next.nodes[1], d.nodes[1]);
}

#[test]
fn update_leaves_input_untouched() {
    let d = chain(2);
    let before = d.clone();
    let _next = update_node(&d, "n1", &PartialNode { label: Some("X".into()), ..Default::default() });
    assert_eq!(d, before);
}

#[test]
fn update_unknown_node_is_noop() {
    let d = chain(2);
    let next = update_node(&d, "missing", &PartialNode { label: Some("X".into()), ..Default::default() });
    assert_eq!(next, d);
}

#[test]
fn update_sets_color() {
    let d = chain(1);
    let next = update_node(&d, "n1", &PartialNode { color: Some("#000000".into()), ..Default::default() });
    assert_eq!(next.nodes[0].effective_color(), "#000000");
}

// =============================================================
// move_node
// =============================================================

#[test]
fn move_changes_only_position() {
    let d = chain(2);
    let next = move_node(&d, "n2", Position::new(10.0, 20.0));
    assert_eq!(next.nodes[1].position, Position::new(10.0, 20.0));
    assert_eq!(next.nodes[1].label, d.nodes[1].label);
    assert_eq!(next.nodes[0], d.nodes[0]);
    assert_eq!(next.connections, d.connections);
}

#[test]
fn move_unknown_node_is_noop() {
    let d = chain(2);
    assert_eq!(move_node(&d, "nope", Position::new(1.0, 1.0)), d);
}

// =============================================================
// delete_node / bulk_delete
// =============================================================

#[test]
fn delete_cascades_to_incident_connections() {
    let d = branched();
    let next = delete_node(&d, "n3");
    assert_eq!(node_ids(&next), vec!["n1", "n2", "n4"]);
    assert_eq!(connection_ids(&next), vec!["c1"]);
    assert!(next.connections.iter().all(|c| !c.touches("n3")));
    assert!(validate_diagram(&next).is_empty());
}

#[test]
fn delete_every_node_never_leaves_dangling_connections() {
    let d = branched();
    for node in &d.nodes {
        let next = delete_node(&d, &node.id);
        assert!(next.incident_connections(&node.id).next().is_none());
        for c in &next.connections {
            assert!(next.contains_node(&c.source_id));
            assert!(next.contains_node(&c.target_id));
        }
    }
}

#[test]
fn delete_unknown_node_is_noop() {
    let d = branched();
    assert_eq!(delete_node(&d, "ghost"), d);
}

#[test]
fn bulk_delete_matches_repeated_single_deletes() {
    let d = branched();
    let ids: Vec<&str> = d.nodes.iter().map(|n| n.id.as_str()).collect();
    for a in &ids {
        for b in &ids {
            let bulk = bulk_delete(&d, &[*a, *b]);
            let forward = delete_node(&delete_node(&d, a), b);
            let backward = delete_node(&delete_node(&d, b), a);
            assert_eq!(bulk, forward, "{a},{b}");
            assert_eq!(bulk, backward, "{a},{b}");
        }
    }
}

#[test]
fn bulk_delete_with_unknown_ids_only_removes_known() {
    let d = chain(3);
    let next = bulk_delete(&d, &["n2", "ghost"]);
    assert_eq!(node_ids(&next), vec!["n1", "n3"]);
    assert!(next.connections.is_empty());
}

#[test]
fn bulk_delete_empty_set_is_noop() {
    let d = chain(3);
    let none: [&str; 0] = [];
    assert_eq!(bulk_delete(&d, &none), d);
}

#[test]
fn bulk_delete_accepts_owned_ids() {
    let d = chain(3);
    let ids = vec!["n1".to_string(), "n3".to_string()];
    assert_eq!(node_ids(&bulk_delete(&d, &ids)), vec!["n2"]);
}

// =============================================================
// DiagramStore state machine
// =============================================================

#[test]
fn new_store_is_empty() {
    let store = DiagramStore::new();
    assert_eq!(store.state(), &SessionState::Empty);
    assert!(store.snapshot().is_none());
    assert!(store.error().is_none());
}

#[test]
fn set_diagram_makes_store_ready() {
    let store = ready_store();
    assert_eq!(store.state(), &SessionState::Ready);
    assert_eq!(store.snapshot().unwrap().nodes.len(), 3);
    assert_eq!(store.last_prompt(), Some("test"));
}

#[test]
fn clear_returns_to_empty() {
    let mut store = ready_store();
    store.clear();
    assert_eq!(store.state(), &SessionState::Empty);
    assert!(store.snapshot().is_none());
}

#[test]
fn generation_commits_latest_result() {
    let mut store = DiagramStore::new();
    let ticket = store.begin_generation("test");
    assert_eq!(store.state(), &SessionState::Generating);
    let outcome = store.complete_generation::<String>(ticket, Ok(chain(2)));
    assert!(matches!(outcome, Completion::Committed(ref d) if d.nodes.len() == 2));
    assert_eq!(store.state(), &SessionState::Ready);
}

#[test]
fn generation_failure_enters_error_state() {
    let mut store = DiagramStore::new();
    let ticket = store.begin_generation("test");
    let outcome = store.complete_generation::<&str>(ticket, Err("service unavailable"));
    assert_eq!(outcome, Completion::Failed);
    assert_eq!(store.error(), Some("service unavailable"));
    assert!(store.snapshot().is_none());
}

#[test]
fn error_recovers_by_retry_or_clear() {
    let mut store = DiagramStore::new();
    let ticket = store.begin_generation("p");
    store.complete_generation::<&str>(ticket, Err("boom"));

    let retry = store.begin_generation("p");
    assert_eq!(store.state(), &SessionState::Generating);
    store.complete_generation::<&str>(retry, Ok(chain(1)));
    assert_eq!(store.state(), &SessionState::Ready);

    let ticket = store.begin_generation("p");
    store.complete_generation::<&str>(ticket, Err("boom"));
    store.clear();
    assert_eq!(store.state(), &SessionState::Empty);
}

#[test]
fn newer_request_supersedes_older() {
    let mut store = DiagramStore::new();
    let first = store.begin_generation("first");
    let second = store.begin_generation("second");
    assert!(!store.is_current(first));
    assert!(store.is_current(second));

    assert_eq!(store.complete_generation::<&str>(first, Ok(chain(5))), Completion::Superseded);
    assert_eq!(store.state(), &SessionState::Generating);
    assert!(store.snapshot().is_none());

    store.complete_generation::<&str>(second, Ok(chain(2)));
    assert_eq!(store.snapshot().unwrap().nodes.len(), 2);
    assert_eq!(store.last_prompt(), Some("test"));
}

#[test]
fn clear_invalidates_in_flight_request() {
    let mut store = DiagramStore::new();
    let ticket = store.begin_generation("p");
    store.clear();
    assert_eq!(store.complete_generation::<&str>(ticket, Ok(chain(2))), Completion::Superseded);
    assert_eq!(store.state(), &SessionState::Empty);
}

#[test]
fn ticket_sequence_increases() {
    let mut store = DiagramStore::new();
    let a = store.begin_generation("a");
    let b = store.begin_generation("b");
    assert!(b > a);
    assert_eq!(b.sequence(), a.sequence() + 1);
}

// =============================================================
// DiagramStore mutations
// =============================================================

#[test]
fn mutations_without_diagram_return_none() {
    let mut store = DiagramStore::new();
    assert!(store.update_node("d1", "n1", &PartialNode::default()).is_none());
    assert!(store.move_node("n1", Position::new(0.0, 0.0)).is_none());
    assert!(store.drag_node("n1", Position::new(0.0, 0.0)).is_none());
    assert!(store.delete_node("n1").is_none());
    assert!(store.bulk_delete(&["n1"]).is_none());
}

#[test]
fn store_update_applies_to_matching_diagram() {
    let mut store = ready_store();
    let d = store
        .update_node("d1", "n2", &PartialNode { label: Some("New".into()), ..Default::default() })
        .unwrap();
    assert_eq!(d.node("n2").unwrap().label, "New");
}

#[test]
fn store_update_for_stale_diagram_is_ignored() {
    let mut store = ready_store();
    let before = store.snapshot().unwrap();
    let after = store
        .update_node("other", "n2", &PartialNode { label: Some("New".into()), ..Default::default() })
        .unwrap();
    assert_eq!(*after, *before);
}

#[test]
fn snapshots_are_not_affected_by_later_mutations() {
    let mut store = ready_store();
    let held = store.snapshot().unwrap();
    store.delete_node("n2");
    assert_eq!(held.nodes.len(), 3);
    assert_eq!(store.snapshot().unwrap().nodes.len(), 2);
}

#[test]
fn store_delete_and_bulk_delete_cascade() {
    let mut store = DiagramStore::new();
    store.set_diagram(branched());
    let d = store.delete_node("n1").unwrap();
    assert!(d.connections.iter().all(|c| !c.touches("n1")));
    let d = store.bulk_delete(&["n2", "n4"]).unwrap();
    assert_eq!(node_ids(&d), vec!["n3"]);
    assert!(d.connections.is_empty());
}

#[test]
fn store_move_sets_exact_position() {
    let mut store = ready_store();
    let d = store.move_node("n1", Position::new(-5.0, 3.0)).unwrap();
    assert_eq!(d.node("n1").unwrap().position, Position::new(-5.0, 3.0));
}

#[test]
fn drag_snaps_clamps_and_avoids_neighbours() {
    let mut store = DiagramStore::new();
    let mut d = chain(2);
    d.nodes[0] = node_at("n1", StepType::Start, 200.0, 200.0);
    d.nodes[1] = node_at("n2", StepType::End, 600.0, 400.0);
    store.set_diagram(d);

    let d = store.drag_node("n1", Position::new(-30.0, 9.0)).unwrap();
    assert_eq!(d.node("n1").unwrap().position, Position::new(80.0, 50.0));

    let d = store.drag_node("n1", Position::new(603.0, 398.0)).unwrap();
    let settled = d.node("n1").unwrap().position;
    assert!(!check_collision(settled, &d.nodes, Some("n1"), Footprint::default()));
}

#[test]
fn drag_to_non_finite_point_is_noop() {
    let mut store = ready_store();
    let before = store.snapshot().unwrap();
    for raw in [
        Position::new(f64::NAN, 100.0),
        Position::new(100.0, f64::INFINITY),
        Position::new(f64::NEG_INFINITY, f64::NAN),
    ] {
        let after = store.drag_node("n1", raw).unwrap();
        assert_eq!(*after, *before);
        assert!(after.validate().is_ok());
    }
}

#[test]
fn drag_unknown_node_is_noop() {
    let mut store = ready_store();
    let before = store.snapshot().unwrap();
    let after = store.drag_node("ghost", Position::new(500.0, 500.0)).unwrap();
    assert_eq!(*after, *before);
}
