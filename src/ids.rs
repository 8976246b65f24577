//! Id generation for diagrams, nodes, and connections.
//!
//! Ids are drawn from an injected [`IdSource`] rather than ambient
//! randomness so tests can assert exact ids. [`SequentialIds`] yields
//! `node-1`, `node-2`, ... per kind; [`UuidIds`] yields globally unique
//! `node-<uuid>` tokens for long-lived sessions.

#[cfg(test)]
#[path = "ids_test.rs"]
mod ids_test;

use uuid::Uuid;

/// What an id is being minted for. Determines the prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Diagram,
    Node,
    Connection,
}

impl IdKind {
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Diagram => "diagram",
            Self::Node => "node",
            Self::Connection => "connection",
        }
    }
}

/// Source of fresh ids.
pub trait IdSource {
    /// Mint the next id for `kind`.
    fn next_id(&mut self, kind: IdKind) -> String;
}

/// Per-kind counters starting at 1.
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    diagrams: u64,
    nodes: u64,
    connections: u64,
}

impl SequentialIds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self, kind: IdKind) -> String {
        let counter = match kind {
            IdKind::Diagram => &mut self.diagrams,
            IdKind::Node => &mut self.nodes,
            IdKind::Connection => &mut self.connections,
        };
        *counter += 1;
        format!("{}-{counter}", kind.prefix())
    }
}

/// Random v4 UUID ids, unique across diagrams.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdSource for UuidIds {
    fn next_id(&mut self, kind: IdKind) -> String {
        format!("{}-{}", kind.prefix(), Uuid::new_v4().simple())
    }
}
