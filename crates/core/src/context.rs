//! Session Context Records
//!
//! Read-only snapshots of the surrounding product's state that the engine
//! consumes on every tick: the pilot session itself, the steps it dispatched
//! in earlier epochs, the results those steps produced, and the canvas
//! content available as context for new work.
//!
//! The engine never writes these records back. It reads them, folds them
//! into the progress plan, and returns the updated plan to the caller.

use serde::{Deserialize, Serialize};

// ============================================================================
// Status Vocabularies
// ============================================================================

/// Lifecycle status of a pilot session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Waiting,
    Executing,
    Finish,
    Failed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Waiting => write!(f, "waiting"),
            SessionStatus::Executing => write!(f, "executing"),
            SessionStatus::Finish => write!(f, "finish"),
            SessionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Execution status reported for a dispatched step.
///
/// This vocabulary belongs to the executor, not the engine. Values outside
/// the known set deserialize to `Unknown` rather than failing the whole
/// record batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStepStatus {
    Waiting,
    Executing,
    Finish,
    Failed,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for ActionStepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionStepStatus::Waiting => write!(f, "waiting"),
            ActionStepStatus::Executing => write!(f, "executing"),
            ActionStepStatus::Finish => write!(f, "finish"),
            ActionStepStatus::Failed => write!(f, "failed"),
            ActionStepStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// How a dispatched step was executed.
///
/// Only `Subtask` steps feed back into the progress plan; `Direct` steps
/// are ad-hoc actions the engine ignores during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepExecutionMode {
    Subtask,
    Direct,
}

// ============================================================================
// Session & Step Records
// ============================================================================

/// A pilot session as stored by the surrounding product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Unique session identifier
    pub session_id: String,
    /// Short human-readable title, if one was generated
    #[serde(default)]
    pub title: Option<String>,
    /// The original user request this session is working on
    pub input: String,
    /// Current epoch (0-based); indexes into the plan's stage list
    #[serde(default)]
    pub current_epoch: usize,
    /// Total number of epochs the session is allowed to run
    #[serde(default = "default_max_epoch")]
    pub max_epoch: usize,
    /// Serialized progress plan from the previous tick, if any
    #[serde(default)]
    pub progress: Option<String>,
    /// Session lifecycle status
    pub status: SessionStatus,
}

fn default_max_epoch() -> usize {
    3
}

impl SessionRecord {
    /// Create a new session record at epoch zero with no stored plan.
    pub fn new(session_id: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            title: None,
            input: input.into(),
            current_epoch: 0,
            max_epoch: default_max_epoch(),
            progress: None,
            status: SessionStatus::Executing,
        }
    }
}

/// A step the engine dispatched in some earlier epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionStepRecord {
    /// Step identifier assigned at dispatch time
    pub step_id: String,
    /// Step name as emitted by the engine
    pub name: String,
    /// Epoch in which the step was dispatched
    #[serde(default)]
    pub epoch: usize,
    /// Identifier of the action result entity produced by executing this step
    #[serde(default)]
    pub entity_id: Option<String>,
    /// How the step was executed
    pub execution_mode: StepExecutionMode,
    /// Execution status as reported by the executor
    pub status: ActionStepStatus,
}

/// The result entity produced by executing a step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResultRecord {
    /// Result entity identifier (matches `ActionStepRecord::entity_id`)
    pub result_id: String,
    /// Result output text, if the execution produced any
    #[serde(default)]
    pub output: Option<String>,
    /// Error messages, if the execution failed
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ActionResultRecord {
    /// First error message, when the result carries any.
    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }
}

// ============================================================================
// Canvas Content
// ============================================================================

/// Kind of content item present on the session's canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentItemType {
    Document,
    Resource,
    SkillResponse,
    CodeArtifact,
    #[serde(other)]
    Other,
}

impl std::fmt::Display for ContentItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentItemType::Document => write!(f, "document"),
            ContentItemType::Resource => write!(f, "resource"),
            ContentItemType::SkillResponse => write!(f, "skillResponse"),
            ContentItemType::CodeArtifact => write!(f, "codeArtifact"),
            ContentItemType::Other => write!(f, "other"),
        }
    }
}

/// A content item on the canvas, available as context for new steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasContentItem {
    /// Content item identifier
    pub id: String,
    /// Item kind
    #[serde(rename = "type")]
    pub item_type: ContentItemType,
    /// Item title
    #[serde(default)]
    pub title: Option<String>,
    /// Full content, when loaded
    #[serde(default)]
    pub content: Option<String>,
    /// Truncated preview of the content
    #[serde(default)]
    pub content_preview: Option<String>,
}

impl CanvasContentItem {
    /// Best available text for prompt rendering: the preview when present,
    /// otherwise the full content.
    pub fn preview_text(&self) -> Option<&str> {
        self.content_preview
            .as_deref()
            .or(self.content.as_deref())
    }
}
