//! Crate-wide error type
//!
//! Invariant violations and configuration problems surface as typed values
//! the caller can inspect; nothing in the library aborts the process.

use thiserror::Error;

use crate::simulation::states::ShapeKind;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid engine parameter or scene description.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// An operation that needs a scene was called before `set_scene`.
    #[error("no scene has been set")]
    NoScene,

    /// The coordinator thread is already running.
    #[error("simulation is already running")]
    AlreadyRunning,

    /// `finish` was called without a running engine to tear down.
    #[error("simulation has not been started")]
    NotRunning,

    /// Per-body buffers no longer match the scene size.
    #[error("state buffers sized for {expected} bodies but scene has {actual}")]
    StateSizeMismatch { expected: usize, actual: usize },

    /// The event queue still held entries at phase entry; a prior phase did
    /// not drain fully before the barrier.
    #[error("event queue holds {remaining} stale entries at phase entry")]
    QueueNotDrained { remaining: usize },

    /// Collision detection for this shape pair is not implemented.
    /// Distinct from "no collision" so callers and tests can tell the
    /// documented gap apart from a genuine miss.
    #[error("collision test for {0}-{1} pairs is not supported")]
    UnsupportedPair(ShapeKind, ShapeKind),

    /// Propagated I/O errors (thread spawning, scenario files).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_pair_names_both_shapes() {
        let e = Error::UnsupportedPair(ShapeKind::Cube, ShapeKind::Cube);
        let msg = format!("{e}");
        assert!(msg.contains("cube-cube"));
    }
}
