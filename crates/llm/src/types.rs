//! Chat Model Types
//!
//! Request, response, configuration, and error types shared by all chat
//! model implementations.

use serde::{Deserialize, Serialize};

/// Configuration for a chat model endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// API key (not needed for local endpoints)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL override (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Model name to use
    pub model: String,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Temperature (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: "gpt-4o-mini".to_string(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// A single completion request: one prompt, optional system framing.
///
/// The engine's call sites are all single-turn, so the request type carries
/// no conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Optional system prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// The user prompt
    pub prompt: String,
}

impl ChatRequest {
    /// Create a request with just a user prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
        }
    }

    /// Attach a system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageStats {
    /// Tokens in the input/prompt
    pub input_tokens: u32,
    /// Tokens in the output/completion
    pub output_tokens: u32,
}

/// A complete (non-streamed) model response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletion {
    /// Response text content
    pub content: String,
    /// The model that generated the response
    pub model: String,
    /// Token usage statistics
    #[serde(default)]
    pub usage: UsageStats,
}

/// Error types for chat model operations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelError {
    /// Authentication failed (invalid API key)
    AuthenticationFailed { message: String },
    /// Rate limit exceeded
    RateLimited {
        message: String,
        retry_after: Option<u32>,
    },
    /// Model not found or not available
    ModelNotFound { model: String },
    /// Invalid request (bad parameters)
    InvalidRequest { message: String },
    /// Server error from the provider
    ServerError {
        message: String,
        status: Option<u16>,
    },
    /// Network/connection error
    NetworkError { message: String },
    /// Response parsing error
    ParseError { message: String },
    /// Other error
    Other { message: String },
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::AuthenticationFailed { message } => {
                write!(f, "Authentication failed: {}", message)
            }
            ModelError::RateLimited { message, .. } => {
                write!(f, "Rate limited: {}", message)
            }
            ModelError::ModelNotFound { model } => {
                write!(f, "Model not found: {}", model)
            }
            ModelError::InvalidRequest { message } => {
                write!(f, "Invalid request: {}", message)
            }
            ModelError::ServerError { message, status } => {
                if let Some(s) = status {
                    write!(f, "Server error ({}): {}", s, message)
                } else {
                    write!(f, "Server error: {}", message)
                }
            }
            ModelError::NetworkError { message } => {
                write!(f, "Network error: {}", message)
            }
            ModelError::ParseError { message } => {
                write!(f, "Parse error: {}", message)
            }
            ModelError::Other { message } => {
                write!(f, "Error: {}", message)
            }
        }
    }
}

impl std::error::Error for ModelError {}

/// Result type for chat model operations
pub type ModelResult<T> = Result<T, ModelError>;
