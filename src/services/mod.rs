//! Async services around the synchronous core.
//!
//! [`generation`] turns a prompt into a diagram behind a trait so the
//! heuristic builder can be swapped for a remote model; [`session`] owns the
//! store for one editor and sequences generation requests against it.

pub mod generation;
pub mod session;

/// Stable machine-readable code attached to user-facing errors.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}
