//! Editor session — one store, one generator, last request wins.
//!
//! DESIGN
//! ======
//! The store sits behind `Arc<RwLock<..>>` so a renderer can read snapshots
//! while a generation is in flight. The write lock is taken twice per
//! request (to open a ticket and to commit the result) and is never held
//! across the generator await.
//!
//! A request runs generate → validate → arrange. The arrange pass re-grids
//! whatever the generator returned so a remote model cannot leave nodes
//! stacked on top of each other.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{info, warn};

use super::generation::{DiagramGenerator, GenerationError};
use crate::config::{DEFAULT_GENERATION_TIMEOUT_SECS, EditorConfig};
use crate::diagram::Diagram;
use crate::layout::{self, CanvasSize};
use crate::store::{Completion, DiagramStore, SessionState};

pub struct EditorSession {
    store: Arc<RwLock<DiagramStore>>,
    generator: Arc<dyn DiagramGenerator>,
    timeout: Duration,
    canvas: CanvasSize,
}

impl EditorSession {
    #[must_use]
    pub fn new(generator: Arc<dyn DiagramGenerator>) -> Self {
        Self {
            store: Arc::new(RwLock::new(DiagramStore::new())),
            generator,
            timeout: Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
            canvas: CanvasSize::default(),
        }
    }

    /// Session sized and timed by `config`.
    #[must_use]
    pub fn from_config(config: &EditorConfig, generator: Arc<dyn DiagramGenerator>) -> Self {
        Self {
            store: Arc::new(RwLock::new(DiagramStore::with_layout(config.layout_options()))),
            generator,
            timeout: config.generation_timeout,
            canvas: config.canvas,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Shared handle for UI code that edits the diagram directly.
    #[must_use]
    pub fn store(&self) -> Arc<RwLock<DiagramStore>> {
        Arc::clone(&self.store)
    }

    pub async fn snapshot(&self) -> Option<Arc<Diagram>> {
        self.store.read().await.snapshot()
    }

    pub async fn state(&self) -> SessionState {
        self.store.read().await.state().clone()
    }

    /// Drop the diagram and any error; in-flight requests are discarded.
    pub async fn clear(&self) {
        self.store.write().await.clear();
        info!("session: cleared");
    }

    /// Generate a diagram for `prompt` and make it current.
    ///
    /// # Errors
    ///
    /// - [`GenerationError::InvalidPrompt`] for an empty or blank prompt;
    ///   nothing else happens.
    /// - The generator's error, [`GenerationError::TimedOut`], or
    ///   [`GenerationError::InvalidDiagram`]; the session enters the error
    ///   state with the same message.
    /// - [`GenerationError::Superseded`] when a newer request or a clear
    ///   arrived first; the session is left as the newer request set it.
    pub async fn generate(&self, prompt: &str) -> Result<Arc<Diagram>, GenerationError> {
        if prompt.trim().is_empty() {
            return Err(GenerationError::InvalidPrompt);
        }

        let ticket = self.store.write().await.begin_generation(prompt);
        info!(ticket = ticket.sequence(), prompt_len = prompt.len(), "session: generation requested");

        let result = self.run(prompt).await;

        let mut store = self.store.write().await;
        match result {
            Ok(diagram) => match store.complete_generation::<GenerationError>(ticket, Ok(diagram)) {
                Completion::Committed(diagram) => {
                    info!(
                        ticket = ticket.sequence(),
                        diagram_id = %diagram.id,
                        nodes = diagram.nodes.len(),
                        connections = diagram.connections.len(),
                        "session: diagram committed"
                    );
                    Ok(diagram)
                }
                Completion::Failed | Completion::Superseded => {
                    info!(ticket = ticket.sequence(), "session: result superseded");
                    Err(GenerationError::Superseded)
                }
            },
            Err(e) => match store.complete_generation(ticket, Err::<Diagram, _>(&e)) {
                Completion::Superseded => {
                    info!(ticket = ticket.sequence(), error = %e, "session: failure superseded");
                    Err(GenerationError::Superseded)
                }
                Completion::Failed | Completion::Committed(_) => {
                    warn!(ticket = ticket.sequence(), error = %e, "session: generation failed");
                    Err(e)
                }
            },
        }
    }

    /// Re-run the most recent prompt.
    ///
    /// # Errors
    ///
    /// [`GenerationError::InvalidPrompt`] when nothing has been generated
    /// yet; otherwise as [`EditorSession::generate`].
    pub async fn retry(&self) -> Result<Arc<Diagram>, GenerationError> {
        let prompt = self.store.read().await.last_prompt().map(str::to_owned);
        match prompt {
            Some(prompt) => self.generate(&prompt).await,
            None => Err(GenerationError::InvalidPrompt),
        }
    }

    async fn run(&self, prompt: &str) -> Result<Diagram, GenerationError> {
        let Ok(generated) = tokio::time::timeout(self.timeout, self.generator.generate(prompt)).await else {
            return Err(GenerationError::TimedOut { secs: self.timeout.as_secs() });
        };
        let diagram = generated?;
        diagram.validate().map_err(GenerationError::InvalidDiagram)?;
        Ok(layout::arrange(&diagram, self.canvas))
    }
}
