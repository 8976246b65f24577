//! Diagram store: the live diagram of an editing session.
//!
//! DESIGN
//! ======
//! Mutations are pure functions from one `Diagram` value to the next; the
//! store swaps the current `Arc<Diagram>` wholesale after each one, so a
//! snapshot handed to a renderer or exporter is never changed underneath it.
//!
//! Node deletion removes incident connections in the same step, so no
//! snapshot ever contains a dangling connection. Operations naming an
//! unknown node are silent no-ops: stale UI callbacks must not fail.
//!
//! Generation requests are numbered. Only the result of the most recent
//! request is committed; older results are reported as superseded.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::diagram::{Diagram, PartialNode, Position};
use crate::layout::{self, LayoutOptions};

// =============================================================================
// PURE OPERATIONS
// =============================================================================

/// Merge `partial` into the node `node_id`. Unchanged when the node is absent.
#[must_use]
pub fn update_node(diagram: &Diagram, node_id: &str, partial: &PartialNode) -> Diagram {
    let mut next = diagram.clone();
    if let Some(node) = next.nodes.iter_mut().find(|n| n.id == node_id) {
        partial.apply_to(node);
    }
    next
}

/// Replace only the position of `node_id`.
///
/// The caller snaps, clamps, and resolves collisions beforehand.
#[must_use]
pub fn move_node(diagram: &Diagram, node_id: &str, position: Position) -> Diagram {
    update_node(diagram, node_id, &PartialNode { position: Some(position), ..PartialNode::default() })
}

/// Remove `node_id` and every connection that touches it.
#[must_use]
pub fn delete_node(diagram: &Diagram, node_id: &str) -> Diagram {
    bulk_delete(diagram, &[node_id])
}

/// Remove every node in `node_ids` and every connection touching one of them.
///
/// Equivalent to deleting the nodes one at a time, in any order.
#[must_use]
pub fn bulk_delete<S: AsRef<str>>(diagram: &Diagram, node_ids: &[S]) -> Diagram {
    let doomed: HashSet<&str> = node_ids.iter().map(AsRef::as_ref).collect();
    Diagram {
        nodes: diagram
            .nodes
            .iter()
            .filter(|n| !doomed.contains(n.id.as_str()))
            .cloned()
            .collect(),
        connections: diagram
            .connections
            .iter()
            .filter(|c| !doomed.contains(c.source_id.as_str()) && !doomed.contains(c.target_id.as_str()))
            .cloned()
            .collect(),
        ..diagram.clone()
    }
}

// =============================================================================
// SESSION STATE
// =============================================================================

/// Where the editing session is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No diagram.
    Empty,
    /// A generation request is in flight.
    Generating,
    /// A diagram is loaded and editable.
    Ready,
    /// The last generation failed; the message is shown to the user.
    Error(String),
}

/// Identifies one generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenerationTicket(u64);

impl GenerationTicket {
    #[must_use]
    pub fn sequence(self) -> u64 {
        self.0
    }
}

/// Outcome of handing a generation result back to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The diagram is now current.
    Committed(Arc<Diagram>),
    /// The failure is now the session error.
    Failed,
    /// A newer request was started; nothing changed.
    Superseded,
}

// =============================================================================
// STORE
// =============================================================================

/// Owner of the live diagram for one editing session.
#[derive(Debug, Clone)]
pub struct DiagramStore {
    diagram: Option<Arc<Diagram>>,
    state: SessionState,
    latest: u64,
    last_prompt: Option<String>,
    layout: LayoutOptions,
}

impl Default for DiagramStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagramStore {
    /// Create an empty store with default layout options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_layout(LayoutOptions::default())
    }

    /// Create an empty store that settles drags with `layout`.
    #[must_use]
    pub fn with_layout(layout: LayoutOptions) -> Self {
        Self { diagram: None, state: SessionState::Empty, latest: 0, last_prompt: None, layout }
    }

    // --- Queries ---

    /// The current diagram, shared read-only.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<Diagram>> {
        self.diagram.clone()
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Message of the last failed generation, if the session is in error.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            SessionState::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Prompt of the most recent generation request.
    #[must_use]
    pub fn last_prompt(&self) -> Option<&str> {
        self.last_prompt.as_deref()
    }

    #[must_use]
    pub fn layout(&self) -> LayoutOptions {
        self.layout
    }

    // --- Whole-diagram transitions ---

    /// Replace the current diagram wholesale.
    pub fn set_diagram(&mut self, diagram: Diagram) -> Arc<Diagram> {
        let diagram = Arc::new(diagram);
        self.last_prompt = Some(diagram.prompt.clone());
        self.diagram = Some(Arc::clone(&diagram));
        self.state = SessionState::Ready;
        diagram
    }

    /// Drop the diagram and any error. Outstanding tickets become stale.
    pub fn clear(&mut self) {
        self.diagram = None;
        self.state = SessionState::Empty;
        self.latest += 1;
    }

    /// Start a generation request, superseding any in flight.
    pub fn begin_generation(&mut self, prompt: &str) -> GenerationTicket {
        self.latest += 1;
        self.last_prompt = Some(prompt.to_owned());
        self.state = SessionState::Generating;
        debug!(ticket = self.latest, "store: generation started");
        GenerationTicket(self.latest)
    }

    /// Whether `ticket` is still the most recent request.
    #[must_use]
    pub fn is_current(&self, ticket: GenerationTicket) -> bool {
        ticket.0 == self.latest && self.state == SessionState::Generating
    }

    /// Commit the result of `ticket` if it is still the latest request.
    pub fn complete_generation<E: std::fmt::Display>(
        &mut self,
        ticket: GenerationTicket,
        result: Result<Diagram, E>,
    ) -> Completion {
        if !self.is_current(ticket) {
            debug!(ticket = ticket.0, latest = self.latest, "store: stale generation result dropped");
            return Completion::Superseded;
        }
        match result {
            Ok(diagram) => Completion::Committed(self.set_diagram(diagram)),
            Err(e) => {
                self.state = SessionState::Error(e.to_string());
                Completion::Failed
            }
        }
    }

    // --- Mutations ---

    /// Merge `partial` into a node of the diagram `diagram_id`.
    ///
    /// Ignored when no diagram is loaded, the diagram id is stale, or the node
    /// does not exist.
    pub fn update_node(&mut self, diagram_id: &str, node_id: &str, partial: &PartialNode) -> Option<Arc<Diagram>> {
        let current = self.diagram.as_ref()?;
        if current.id != diagram_id {
            debug!(diagram_id, current = %current.id, "store: update for stale diagram ignored");
            return Some(Arc::clone(current));
        }
        let next = update_node(current, node_id, partial);
        Some(self.replace(next))
    }

    /// Set a node's position as given.
    pub fn move_node(&mut self, node_id: &str, position: Position) -> Option<Arc<Diagram>> {
        let next = move_node(self.diagram.as_ref()?, node_id, position);
        Some(self.replace(next))
    }

    /// Drop a dragged node at `raw`: snap, clamp, and step off neighbours
    /// before moving it.
    ///
    /// A non-finite drop point leaves the diagram unchanged.
    pub fn drag_node(&mut self, node_id: &str, raw: Position) -> Option<Arc<Diagram>> {
        let current = self.diagram.as_ref()?;
        if !raw.is_finite() {
            debug!(node_id, x = raw.x, y = raw.y, "store: non-finite drop ignored");
            return Some(Arc::clone(current));
        }
        if !current.contains_node(node_id) {
            return Some(Arc::clone(current));
        }
        let settled = layout::settle_position(raw, &current.nodes, Some(node_id), self.layout);
        self.move_node(node_id, settled)
    }

    /// Delete a node and its connections.
    pub fn delete_node(&mut self, node_id: &str) -> Option<Arc<Diagram>> {
        let next = delete_node(self.diagram.as_ref()?, node_id);
        Some(self.replace(next))
    }

    /// Delete several nodes and their connections.
    pub fn bulk_delete<S: AsRef<str>>(&mut self, node_ids: &[S]) -> Option<Arc<Diagram>> {
        let next = bulk_delete(self.diagram.as_ref()?, node_ids);
        Some(self.replace(next))
    }

    fn replace(&mut self, next: Diagram) -> Arc<Diagram> {
        debug!(nodes = next.nodes.len(), connections = next.connections.len(), "store: diagram replaced");
        let next = Arc::new(next);
        self.diagram = Some(Arc::clone(&next));
        next
    }
}
