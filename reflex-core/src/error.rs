//! Error types for the reactive runtime.
//!
//! Most of the runtime cannot fail: wrapping a non-composite value is a
//! pass-through and tracking is infallible. Errors only surface at the
//! edges, when converting dynamic values into concrete Rust types, when
//! snapshotting state to JSON, or when a caller asks for a panicking effect
//! body to be reported instead of unwound.

use thiserror::Error;

use crate::reactive::EffectId;

/// Errors returned by the reactive runtime.
#[derive(Error, Debug)]
pub enum ReactiveError {
    /// A `Value` did not hold the variant a conversion asked for.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Name of the requested variant.
        expected: &'static str,
        /// Name of the variant actually held.
        found: &'static str,
    },

    /// An effect body panicked while running under `EffectRunner::try_run`.
    #[error("effect {effect:?} panicked: {message}")]
    EffectPanicked {
        /// The effect whose body panicked.
        effect: EffectId,
        /// The panic payload, if it was a string.
        message: String,
    },

    /// JSON conversion failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for reactive runtime operations.
pub type Result<T> = std::result::Result<T, ReactiveError>;
