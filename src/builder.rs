//! Diagram builder: prompt → steps → chained, laid-out diagram.
//!
//! DESIGN
//! ======
//! One node per extracted step, placed by [`layout::grid_position`], and one
//! flow connection between each consecutive pair. The builder never branches
//! or loops, so a fresh diagram always has `nodes - 1` connections.
//!
//! Step types pass through a refinement pass that only touches `process`
//! steps: the first is forced to start, the last to end, and data keywords in
//! the description promote a step to `data`.

#[cfg(test)]
#[path = "builder_test.rs"]
mod builder_test;

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::diagram::{Connection, ConnectionKind, Diagram, Node, StepType};
use crate::ids::{IdKind, IdSource, UuidIds};
use crate::layout::{self, CanvasSize};
use crate::steps::{self, Step};

/// Builds diagrams from prompts with ids drawn from `I`.
#[derive(Debug, Clone, Default)]
pub struct DiagramBuilder<I> {
    ids: I,
    canvas: CanvasSize,
}

impl<I: IdSource> DiagramBuilder<I> {
    #[must_use]
    pub fn new(ids: I) -> Self {
        Self { ids, canvas: CanvasSize::default() }
    }

    /// Lay nodes out on `canvas` instead of the default 1200×800.
    #[must_use]
    pub fn with_canvas(mut self, canvas: CanvasSize) -> Self {
        self.canvas = canvas;
        self
    }

    /// Build a diagram stamped with the current time.
    pub fn build(&mut self, prompt: &str) -> Diagram {
        self.build_at(prompt, now_ms())
    }

    /// Build a diagram stamped with `created_at` (ms since the Unix epoch).
    pub fn build_at(&mut self, prompt: &str, created_at: i64) -> Diagram {
        let steps = steps::extract_steps(prompt);
        let total = steps.len();

        let mut nodes: Vec<Node> = Vec::with_capacity(total);
        let mut connections: Vec<Connection> = Vec::with_capacity(total.saturating_sub(1));

        for (index, step) in steps.iter().enumerate() {
            let node_type = refine_type(step, index, total);
            let node = Node {
                id: self.ids.next_id(IdKind::Node),
                node_type,
                label: step.label.clone(),
                description: step.description.clone(),
                position: layout::grid_position(index, total, self.canvas),
                color: Some(node_type.color().to_owned()),
            };

            if let Some(previous) = nodes.last() {
                connections.push(Connection {
                    id: self.ids.next_id(IdKind::Connection),
                    source_id: previous.id.clone(),
                    target_id: node.id.clone(),
                    label: step.condition.clone(),
                    kind: ConnectionKind::Flow,
                });
            }
            nodes.push(node);
        }

        let diagram = Diagram {
            id: self.ids.next_id(IdKind::Diagram),
            prompt: prompt.to_owned(),
            nodes,
            connections,
            created_at,
        };
        debug!(
            diagram_id = %diagram.id,
            nodes = diagram.nodes.len(),
            connections = diagram.connections.len(),
            "builder: diagram built"
        );
        diagram
    }
}

/// Build a diagram with globally unique ids and the default canvas.
#[must_use]
pub fn build_diagram(prompt: &str) -> Diagram {
    DiagramBuilder::new(UuidIds).build(prompt)
}

/// Second-pass type for `step` at `index` of `total`.
///
/// Only `process` steps are reconsidered; every other classification stands.
#[must_use]
pub fn refine_type(step: &Step, index: usize, total: usize) -> StepType {
    if step.step_type != StepType::Process {
        return step.step_type;
    }
    if index == 0 {
        StepType::Start
    } else if index + 1 == total {
        StepType::End
    } else if steps::mentions_data(&step.description) {
        StepType::Data
    } else {
        StepType::Process
    }
}

/// Milliseconds since the Unix epoch, or 0 if the clock is before it.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}
