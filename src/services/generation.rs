//! Generation service — prompt → diagram.
//!
//! DESIGN
//! ======
//! `DiagramGenerator` is the seam where a remote model would plug in. The
//! only implementation today is `HeuristicGenerator`, which runs the local
//! builder and can imitate a network service: a fixed latency before
//! answering and a random failure rate, both off by default.
//!
//! Generators return raw diagrams. Validation and layout are applied by the
//! editor session so every generator is held to the same rules.

#[cfg(test)]
#[path = "generation_test.rs"]
mod generation_test;

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use super::ErrorCode;
use crate::builder::DiagramBuilder;
use crate::config::EditorConfig;
use crate::diagram::{Diagram, ValidationErrors};
use crate::ids::{IdSource, UuidIds};
use crate::layout::CanvasSize;

/// Message shown when the (simulated) service cannot be reached.
pub const SERVICE_UNAVAILABLE_MESSAGE: &str = "Failed to connect to AI service. Please try again.";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("prompt must not be empty")]
    InvalidPrompt,
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("generation timed out after {secs}s")]
    TimedOut { secs: u64 },
    #[error("Invalid diagram: {0}")]
    InvalidDiagram(ValidationErrors),
    #[error("superseded by a newer request")]
    Superseded,
}

impl ErrorCode for GenerationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidPrompt => "E_INVALID_PROMPT",
            Self::ServiceUnavailable(_) => "E_SERVICE_UNAVAILABLE",
            Self::TimedOut { .. } => "E_GENERATION_TIMEOUT",
            Self::InvalidDiagram(_) => "E_INVALID_DIAGRAM",
            Self::Superseded => "E_SUPERSEDED",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_) | Self::TimedOut { .. } | Self::InvalidDiagram(_))
    }
}

/// Produces a diagram for a prompt.
#[async_trait]
pub trait DiagramGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Diagram, GenerationError>;
}

// =============================================================================
// HEURISTIC GENERATOR
// =============================================================================

/// Local rule-based generator with optional simulated latency and failures.
pub struct HeuristicGenerator<I> {
    builder: Mutex<DiagramBuilder<I>>,
    latency: Duration,
    failure_rate: f64,
}

impl<I: IdSource + Send> HeuristicGenerator<I> {
    #[must_use]
    pub fn new(ids: I) -> Self {
        Self { builder: Mutex::new(DiagramBuilder::new(ids)), latency: Duration::ZERO, failure_rate: 0.0 }
    }

    #[must_use]
    pub fn with_canvas(self, canvas: CanvasSize) -> Self {
        let builder = self.builder.into_inner().unwrap_or_else(PoisonError::into_inner);
        Self { builder: Mutex::new(builder.with_canvas(canvas)), ..self }
    }

    /// Wait `latency` before answering.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fail with [`GenerationError::ServiceUnavailable`] with probability
    /// `rate`, clamped to `[0, 1]`.
    #[must_use]
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        self
    }
}

impl HeuristicGenerator<UuidIds> {
    /// Generator with unique ids and the simulation knobs from `config`.
    #[must_use]
    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(UuidIds)
            .with_canvas(config.canvas)
            .with_latency(config.simulated_latency)
            .with_failure_rate(config.simulated_failure_rate)
    }
}

#[async_trait]
impl<I: IdSource + Send> DiagramGenerator for HeuristicGenerator<I> {
    async fn generate(&self, prompt: &str) -> Result<Diagram, GenerationError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.failure_rate > 0.0 && rand::random::<f64>() < self.failure_rate {
            warn!("generation: simulated service failure");
            return Err(GenerationError::ServiceUnavailable(SERVICE_UNAVAILABLE_MESSAGE.into()));
        }

        let diagram = self.builder.lock().unwrap_or_else(PoisonError::into_inner).build(prompt);
        info!(diagram_id = %diagram.id, nodes = diagram.nodes.len(), "generation: diagram generated");
        Ok(diagram)
    }
}
