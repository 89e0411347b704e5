//! Pilot LLM
//!
//! Chat-model capability layer for the Pilot workspace:
//! - `ChatModel` trait with free-text and schema-constrained invocation
//! - OpenAI-compatible provider implementation
//! - JSON schema descriptors for structured output
//! - JSON extraction from free-form model text

pub mod extract;
pub mod openai;
pub mod provider;
pub mod schema;
pub mod types;

// Re-export main types
pub use extract::{extract_structured, ExtractError};
pub use openai::OpenAIChatModel;
pub use provider::{missing_api_key_error, parse_http_error, ChatModel};
pub use schema::SchemaDescriptor;
pub use types::*;
