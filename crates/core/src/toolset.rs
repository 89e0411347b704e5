//! Toolset Catalog Types
//!
//! Describes the tool inventory a session has access to. The engine never
//! invokes tools itself; it only renders the catalog into planning prompts
//! and filters it by the tool categories a stage declares.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single tool inside a toolset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsetTool {
    /// Tool name (e.g., "web_search")
    pub name: String,
    /// Short description of what the tool does
    #[serde(default)]
    pub description: Option<String>,
}

/// Definition payload of a toolset: localized descriptions plus its tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsetDefinition {
    /// Stable toolset key (e.g., "web-search")
    #[serde(default)]
    pub key: Option<String>,
    /// Locale code -> description
    #[serde(default)]
    pub description_dict: HashMap<String, String>,
    /// Tools exposed by this toolset
    #[serde(default)]
    pub tools: Vec<ToolsetTool>,
}

/// A toolset instance attached to a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericToolset {
    /// Toolset instance identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Definition payload, when the catalog provides one
    #[serde(default)]
    pub toolset: Option<ToolsetDefinition>,
}

impl GenericToolset {
    /// Case-insensitive containment match against a stage's tool category.
    ///
    /// A toolset matches when the category appears in its display name,
    /// its key, or any of its tool names. An empty category never matches.
    pub fn matches_category(&self, category: &str) -> bool {
        let needle = category.trim().to_lowercase();
        if needle.is_empty() {
            return false;
        }
        if self.name.to_lowercase().contains(&needle) {
            return true;
        }
        let Some(definition) = &self.toolset else {
            return false;
        };
        if let Some(key) = &definition.key {
            if key.to_lowercase().contains(&needle) {
                return true;
            }
        }
        definition
            .tools
            .iter()
            .any(|tool| tool.name.to_lowercase().contains(&needle))
    }

    /// Description for the given locale, falling back to English and then
    /// to any available entry.
    pub fn description_for_locale(&self, locale: &str) -> Option<&str> {
        let dict = &self.toolset.as_ref()?.description_dict;
        dict.get(locale)
            .or_else(|| dict.get("en"))
            .or_else(|| dict.values().next())
            .map(String::as_str)
    }

    /// Tool names exposed by this toolset.
    pub fn tool_names(&self) -> Vec<&str> {
        self.toolset
            .as_ref()
            .map(|definition| {
                definition
                    .tools
                    .iter()
                    .map(|tool| tool.name.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }
}
