//! Diagram model: nodes, connections, the diagram aggregate, and validation.
//!
//! This module defines what a flowchart is made of (`Node`, `Connection`,
//! `Diagram`), a sparse-update type for property edits (`PartialNode`), the
//! per-type presentation config (`StepType::shape`, `StepType::color`), and
//! the structural validator applied to every generated diagram before it is
//! committed to the store.
//!
//! Positions are always the nested `position: {x, y}` of a node's centre.

#[cfg(test)]
#[path = "diagram_test.rs"]
mod diagram_test;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a node within a diagram.
pub type NodeId = String;

/// Semantic type of a step and of the node built from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    /// Entry point of the flow.
    Start,
    /// Terminal step of the flow.
    End,
    /// Branching point; usually carries a condition.
    Decision,
    /// Ordinary work step.
    Process,
    /// Step that reads or writes stored data.
    Data,
    /// Off-page or junction connector.
    Connector,
}

/// Shape used to draw a node of a given type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
    Ellipse,
    Rectangle,
    Diamond,
    Parallelogram,
    Circle,
}

impl StepType {
    /// All step types in declaration order.
    pub const ALL: [StepType; 6] = [
        StepType::Start,
        StepType::End,
        StepType::Decision,
        StepType::Process,
        StepType::Data,
        StepType::Connector,
    ];

    /// Lowercase wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Decision => "decision",
            Self::Process => "process",
            Self::Data => "data",
            Self::Connector => "connector",
        }
    }

    /// Canonical palette colour for nodes of this type.
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::Start => "#10b981",
            Self::End => "#ef4444",
            Self::Process => "#3b82f6",
            Self::Decision => "#f59e0b",
            Self::Data => "#8b5cf6",
            Self::Connector => "#6b7280",
        }
    }

    /// Shape used when drawing this type.
    #[must_use]
    pub fn shape(self) -> NodeShape {
        match self {
            Self::Start | Self::End => NodeShape::Ellipse,
            Self::Process => NodeShape::Rectangle,
            Self::Decision => NodeShape::Diamond,
            Self::Data => NodeShape::Parallelogram,
            Self::Connector => NodeShape::Circle,
        }
    }

    /// Human-readable name shown in the properties panel type picker.
    #[must_use]
    pub fn display_label(self) -> &'static str {
        match self {
            Self::Start | Self::End => "Start/End",
            Self::Process => "Process",
            Self::Decision => "Decision",
            Self::Data => "Data",
            Self::Connector => "Connector",
        }
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point on the canvas in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates are finite numbers.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Placeholder for a position absent from the wire form. Fails
    /// validation.
    #[must_use]
    pub fn unset() -> Self {
        Self { x: f64::NAN, y: f64::NAN }
    }
}

// Absent and `null` fields parse to a value the validator reports, so one
// pass over a payload can list every violation.

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn position_or_unset<'de, D>(deserializer: D) -> Result<Position, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Position>::deserialize(deserializer)?.unwrap_or_else(Position::unset))
}

/// A vertex of the flowchart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique within the owning diagram.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: StepType,
    /// Short text drawn inside the node.
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    /// Full sentence the node was built from.
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Centre of the node.
    #[serde(default = "Position::unset", deserialize_with = "position_or_unset")]
    pub position: Position,
    /// Border colour override; the type palette applies when absent.
    #[serde(default)]
    pub color: Option<String>,
}

impl Node {
    /// Colour to draw with: the override when set, the type palette otherwise.
    #[must_use]
    pub fn effective_color(&self) -> &str {
        self.color.as_deref().unwrap_or(self.node_type.color())
    }
}

/// Kind of a connection. Only sequential flow exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    #[default]
    Flow,
}

/// A directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source_id: NodeId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub target_id: NodeId,
    /// Condition text shown on the edge, if any.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: ConnectionKind,
}

impl Connection {
    /// Whether either endpoint is `node_id`.
    #[must_use]
    pub fn touches(&self, node_id: &str) -> bool {
        self.source_id == node_id || self.target_id == node_id
    }
}

/// The aggregate root: one generated flowchart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    #[serde(default)]
    pub id: String,
    /// Text the diagram was generated from.
    #[serde(default)]
    pub prompt: String,
    /// Nodes in creation order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: Vec<Node>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub connections: Vec<Connection>,
    /// Creation time in milliseconds since the Unix epoch.
    #[serde(default)]
    pub created_at: i64,
}

impl Diagram {
    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Whether a node with `id` exists.
    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    /// Connections leaving or entering `node_id`.
    pub fn incident_connections<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.iter().filter(move |c| c.touches(node_id))
    }

    /// Parse a diagram from its JSON wire form.
    ///
    /// Missing or `null` ids, labels, positions and endpoints parse to empty
    /// values that [`validate_diagram`] reports; only malformed JSON, a
    /// mistyped field, or an unknown node type fails here.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error for malformed or mistyped input.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Run [`validate_diagram`] and fold the findings into a `Result`.
    ///
    /// # Errors
    ///
    /// Returns every violation found, in discovery order.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let errors = validate_diagram(self);
        if errors.is_empty() { Ok(()) } else { Err(ValidationErrors(errors)) }
    }
}

/// Sparse update for a node. Only present fields are applied; the id is not
/// part of the update and can never change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialNode {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<StepType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl PartialNode {
    /// Merge the present fields into `node`.
    pub fn apply_to(&self, node: &mut Node) {
        if let Some(t) = self.node_type {
            node.node_type = t;
        }
        if let Some(ref label) = self.label {
            node.label.clone_from(label);
        }
        if let Some(ref description) = self.description {
            node.description.clone_from(description);
        }
        if let Some(position) = self.position {
            node.position = position;
        }
        if let Some(ref color) = self.color {
            node.color = Some(color.clone());
        }
    }

    /// True when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node_type.is_none()
            && self.label.is_none()
            && self.description.is_none()
            && self.position.is_none()
            && self.color.is_none()
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Every structural violation found in a diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<String>);

impl ValidationErrors {
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Check a diagram's structure and return every violation found.
///
/// Nodes need a non-empty id and label, a finite position, and an id not
/// used by an earlier node. Connections need an id, both endpoints, and
/// endpoints that resolve to nodes of this diagram. An empty list means the
/// diagram is valid.
#[must_use]
pub fn validate_diagram(diagram: &Diagram) -> Vec<String> {
    let mut errors = Vec::new();

    if diagram.nodes.is_empty() {
        errors.push("Diagram must have at least one node".to_owned());
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for (index, node) in diagram.nodes.iter().enumerate() {
        if node.id.trim().is_empty() {
            errors.push(format!("Node {index} is missing id"));
        } else if !seen.insert(node.id.as_str()) {
            errors.push(format!("Node {index} has duplicate id {}", node.id));
        }
        if node.label.trim().is_empty() {
            errors.push(format!("Node {index} is missing label"));
        }
        if !node.position.is_finite() {
            errors.push(format!("Node {index} is missing position"));
        }
    }

    for (index, connection) in diagram.connections.iter().enumerate() {
        if connection.id.trim().is_empty() {
            errors.push(format!("Connection {index} is missing id"));
        }
        if connection.source_id.is_empty() {
            errors.push(format!("Connection {index} is missing sourceId"));
        }
        if connection.target_id.is_empty() {
            errors.push(format!("Connection {index} is missing targetId"));
        }
        if !diagram.contains_node(&connection.source_id) {
            errors.push(format!("Connection {index} references non-existent source node"));
        }
        if !diagram.contains_node(&connection.target_id) {
            errors.push(format!("Connection {index} references non-existent target node"));
        }
    }

    errors
}
