//! Structured Output Schemas
//!
//! A `SchemaDescriptor` names a JSON schema and carries it as a plain
//! `serde_json::Value` so providers can embed it in whatever wire shape
//! their endpoint expects (e.g., an OpenAI `json_schema` response format).

use schemars::JsonSchema;
use serde_json::Value;

/// A named JSON schema handed to schema-constrained generation.
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    /// Schema name reported to the endpoint
    pub name: String,
    /// The JSON schema itself
    pub schema: Value,
}

impl SchemaDescriptor {
    /// Create a descriptor from a prebuilt schema value.
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    /// Derive a descriptor from a type's `JsonSchema` implementation.
    pub fn for_type<T: JsonSchema>(name: impl Into<String>) -> Self {
        let schema = schemars::schema_for!(T);
        Self {
            name: name.into(),
            schema: schema.to_value(),
        }
    }
}
