//! Chat Model Trait
//!
//! Defines the common interface for all chat model implementations.

use async_trait::async_trait;
use serde_json::Value;

use super::schema::SchemaDescriptor;
use super::types::{ChatCompletion, ChatRequest, ModelConfig, ModelError, ModelResult};

/// Trait that all chat models must implement.
///
/// Provides a unified interface for:
/// - Free-text completions (invoke)
/// - Schema-constrained completions returning parsed JSON (invoke_structured)
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Returns the provider name for identification.
    fn name(&self) -> &'static str;

    /// Returns the current model being used.
    fn model(&self) -> &str;

    /// Send a request and get a complete free-text response.
    async fn invoke(&self, request: ChatRequest) -> ModelResult<ChatCompletion>;

    /// Send a request constrained to the given schema and return the parsed
    /// JSON payload.
    ///
    /// Implementations surface schema violations and unparseable content as
    /// `ModelError::ParseError` so callers can decide whether to fall back
    /// to free-text extraction.
    async fn invoke_structured(
        &self,
        schema: &SchemaDescriptor,
        request: ChatRequest,
    ) -> ModelResult<Value>;

    /// Get the configuration for this model.
    fn config(&self) -> &ModelConfig;
}

/// Helper function to create an error for missing API key
pub fn missing_api_key_error(provider: &str) -> ModelError {
    ModelError::AuthenticationFailed {
        message: format!("API key not configured for {}", provider),
    }
}

/// Helper function to parse HTTP error status codes
pub fn parse_http_error(status: u16, body: &str, provider: &str) -> ModelError {
    match status {
        401 => ModelError::AuthenticationFailed {
            message: format!("{}: Invalid API key", provider),
        },
        403 => ModelError::AuthenticationFailed {
            message: format!("{}: Access denied", provider),
        },
        404 => ModelError::ModelNotFound {
            model: body.to_string(),
        },
        429 => ModelError::RateLimited {
            message: body.to_string(),
            retry_after: None,
        },
        400 => ModelError::InvalidRequest {
            message: body.to_string(),
        },
        500..=599 => ModelError::ServerError {
            message: body.to_string(),
            status: Some(status),
        },
        _ => ModelError::Other {
            message: format!("HTTP {}: {}", status, body),
        },
    }
}
