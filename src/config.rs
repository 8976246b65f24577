//! Editor configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use crate::consts::{CANVAS_HEIGHT, CANVAS_WIDTH, SNAP_GRID_SIZE};
use crate::layout::{CanvasSize, LayoutOptions};

pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SIMULATED_LATENCY_MS: u64 = 0;
pub const DEFAULT_SIMULATED_FAILURE_RATE: f64 = 0.0;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorConfig {
    pub canvas: CanvasSize,
    pub grid_size: f64,
    pub generation_timeout: Duration,
    /// Artificial delay before the heuristic generator answers.
    pub simulated_latency: Duration,
    /// Probability in `[0, 1]` that the heuristic generator reports the
    /// service as unavailable.
    pub simulated_failure_rate: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasSize { width: CANVAS_WIDTH, height: CANVAS_HEIGHT },
            grid_size: SNAP_GRID_SIZE,
            generation_timeout: Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
            simulated_latency: Duration::from_millis(DEFAULT_SIMULATED_LATENCY_MS),
            simulated_failure_rate: DEFAULT_SIMULATED_FAILURE_RATE,
        }
    }
}

impl EditorConfig {
    /// Build typed editor config from environment variables.
    ///
    /// Optional:
    /// - `FLOWDRAFT_CANVAS_WIDTH`: default 1200
    /// - `FLOWDRAFT_CANVAS_HEIGHT`: default 800
    /// - `FLOWDRAFT_GRID_SIZE`: default 20
    /// - `FLOWDRAFT_GENERATION_TIMEOUT_SECS`: default 30
    /// - `FLOWDRAFT_SIMULATED_LATENCY_MS`: default 0
    /// - `FLOWDRAFT_SIMULATED_FAILURE_RATE`: default 0.0
    ///
    /// Unparsable values fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the failure rate lies outside
    /// `[0, 1]` or a canvas dimension is not positive.
    pub fn from_env() -> Result<Self, ConfigError> {
        let canvas = CanvasSize {
            width: env_parse("FLOWDRAFT_CANVAS_WIDTH", CANVAS_WIDTH),
            height: env_parse("FLOWDRAFT_CANVAS_HEIGHT", CANVAS_HEIGHT),
        };
        if !(canvas.width > 0.0 && canvas.height > 0.0) {
            return Err(ConfigError::Parse(format!(
                "canvas must be positive, got {}x{}",
                canvas.width, canvas.height
            )));
        }

        let simulated_failure_rate = env_parse("FLOWDRAFT_SIMULATED_FAILURE_RATE", DEFAULT_SIMULATED_FAILURE_RATE);
        if !(0.0..=1.0).contains(&simulated_failure_rate) {
            return Err(ConfigError::Parse(format!(
                "FLOWDRAFT_SIMULATED_FAILURE_RATE must be within [0, 1], got {simulated_failure_rate}"
            )));
        }

        Ok(Self {
            canvas,
            grid_size: env_parse("FLOWDRAFT_GRID_SIZE", SNAP_GRID_SIZE),
            generation_timeout: Duration::from_secs(env_parse(
                "FLOWDRAFT_GENERATION_TIMEOUT_SECS",
                DEFAULT_GENERATION_TIMEOUT_SECS,
            )),
            simulated_latency: Duration::from_millis(env_parse(
                "FLOWDRAFT_SIMULATED_LATENCY_MS",
                DEFAULT_SIMULATED_LATENCY_MS,
            )),
            simulated_failure_rate,
        })
    }

    /// Layout options for drag settling on this canvas and grid.
    #[must_use]
    pub fn layout_options(&self) -> LayoutOptions {
        LayoutOptions { canvas: self.canvas, grid_size: self.grid_size, ..LayoutOptions::default() }
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
