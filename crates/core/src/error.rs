//! Core Error Types
//!
//! Defines the foundational error types used across the Pilot workspace.
//! These error types are dependency-free (only thiserror + serde_json) to
//! keep the core crate lightweight.
//!
//! The engine crate maps model-capability failures into these variants at
//! the orchestration boundary; the llm crate carries its own wire-level
//! error taxonomy.

use thiserror::Error;

/// Core error type for the Pilot workspace.
///
/// This is the minimal error set shared by the engine and its callers.
/// Model transport errors stay in the llm crate and are absorbed by the
/// planner and subtask generator before they can reach this type.
#[derive(Error, Debug)]
pub enum PilotError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Plan acquisition or regeneration failed beyond recovery
    #[error("Planning error: {0}")]
    Planning(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for core errors
pub type PilotResult<T> = Result<T, PilotError>;

impl PilotError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a planning error
    pub fn planning(msg: impl Into<String>) -> Self {
        Self::Planning(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Convert PilotError to a string
impl From<PilotError> for String {
    fn from(err: PilotError) -> String {
        err.to_string()
    }
}
