//! Progress Plan Types
//!
//! Data structures for the multi-stage progress plan: stages, subtasks,
//! their status vocabularies, and the step descriptors the engine emits
//! for dispatch. The plan serializes to camelCase JSON and must round-trip
//! through its string form without loss, since callers persist it between
//! epochs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pilot_core::{ActionStepStatus, PilotResult};

// ============================================================================
// Status & Classification Types
// ============================================================================

/// Coarse workflow phase a step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    Research,
    Analysis,
    Synthesis,
    Creation,
}

impl WorkflowStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStage::Research => "research",
            WorkflowStage::Analysis => "analysis",
            WorkflowStage::Synthesis => "synthesis",
            WorkflowStage::Creation => "creation",
        }
    }

    /// Parse a phase tag, tolerating case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "research" => Some(WorkflowStage::Research),
            "analysis" => Some(WorkflowStage::Analysis),
            "synthesis" => Some(WorkflowStage::Synthesis),
            "creation" => Some(WorkflowStage::Creation),
            _ => None,
        }
    }
}

impl std::fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Execution status of a single subtask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtaskStatus {
    Pending,
    Executing,
    Completed,
    Failed,
}

impl SubtaskStatus {
    /// Forward-only ordering rank. Transitions are applied only when the
    /// new status has a strictly greater rank, so terminal states never
    /// regress and re-applying the same records is a no-op.
    pub fn rank(&self) -> u8 {
        match self {
            SubtaskStatus::Pending => 0,
            SubtaskStatus::Executing => 1,
            SubtaskStatus::Completed => 2,
            SubtaskStatus::Failed => 2,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SubtaskStatus::Completed | SubtaskStatus::Failed)
    }

    /// Map the executor's step status vocabulary into plan statuses.
    /// Unrecognized statuses map to `Pending`.
    pub fn from_step_status(status: ActionStepStatus) -> Self {
        match status {
            ActionStepStatus::Waiting => SubtaskStatus::Pending,
            ActionStepStatus::Executing => SubtaskStatus::Executing,
            ActionStepStatus::Finish => SubtaskStatus::Completed,
            ActionStepStatus::Failed => SubtaskStatus::Failed,
            ActionStepStatus::Unknown => SubtaskStatus::Pending,
        }
    }
}

impl std::fmt::Display for SubtaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubtaskStatus::Pending => write!(f, "pending"),
            SubtaskStatus::Executing => write!(f, "executing"),
            SubtaskStatus::Completed => write!(f, "completed"),
            SubtaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Lifecycle status of a plan stage.
///
/// `Completed` is the single terminal state; a stage whose subtasks ended
/// with failures still completes, and `PilotStage::has_failures` exposes
/// the distinction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    InProgress,
    Completed,
}

impl StageStatus {
    pub fn rank(&self) -> u8 {
        match self {
            StageStatus::Pending => 0,
            StageStatus::InProgress => 1,
            StageStatus::Completed => 2,
        }
    }
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageStatus::Pending => write!(f, "pending"),
            StageStatus::InProgress => write!(f, "in_progress"),
            StageStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Coarse complexity classification of the overall task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskComplexity {
    Simple,
    Medium,
    Complex,
}

impl Default for TaskComplexity {
    fn default() -> Self {
        TaskComplexity::Medium
    }
}

impl std::fmt::Display for TaskComplexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskComplexity::Simple => write!(f, "simple"),
            TaskComplexity::Medium => write!(f, "medium"),
            TaskComplexity::Complex => write!(f, "complex"),
        }
    }
}

// ============================================================================
// Subtask
// ============================================================================

/// A single unit of dispatchable work inside a stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PilotSubtask {
    /// Unique subtask identifier; assigned once and never regenerated
    pub id: String,
    /// Short action-oriented name
    pub name: String,
    /// Full query text handed to the executor
    pub query: String,
    /// Optional context hint for the executor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Optional scope boundary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Optional description of the expected output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_requirements: Option<String>,
    /// Execution status
    pub status: SubtaskStatus,
    /// Result entity this subtask's execution produced, once known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_id: Option<String>,
    /// Result output text, copied from the result record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Error message, copied from the result record on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Timestamp of the first transition into a terminal status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl PilotSubtask {
    /// Create a pending subtask with a fresh identifier.
    pub fn new(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self::with_id(format!("subtask-{}", Uuid::new_v4()), name, query)
    }

    /// Create a pending subtask with an explicit identifier.
    pub fn with_id(
        id: impl Into<String>,
        name: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            query: query.into(),
            context: None,
            scope: None,
            output_requirements: None,
            status: SubtaskStatus::Pending,
            result_id: None,
            output: None,
            error_message: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Apply a status transition if it moves strictly forward.
    ///
    /// Returns true when the status changed. Stamps `completed_at` on the
    /// first transition into a terminal status.
    pub fn apply_status(&mut self, next: SubtaskStatus) -> bool {
        if next.rank() <= self.status.rank() {
            return false;
        }
        self.status = next;
        if next.is_terminal() && self.completed_at.is_none() {
            self.completed_at = Some(Utc::now());
        }
        true
    }
}

// ============================================================================
// Stage
// ============================================================================

/// One stage of the progress plan, holding its subtasks by composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PilotStage {
    /// Unique stage identifier
    pub id: String,
    /// Stage name
    pub name: String,
    /// What this stage is meant to accomplish
    #[serde(default)]
    pub description: String,
    /// Concrete objectives for the stage
    #[serde(default)]
    pub objectives: Vec<String>,
    /// Lifecycle status
    pub status: StageStatus,
    /// Tool categories relevant to this stage (used to filter the catalog)
    #[serde(default)]
    pub tool_categories: Vec<String>,
    /// Priority (1 = highest)
    #[serde(default = "default_priority")]
    pub priority: u32,
    /// Derived completion percentage (0-100)
    #[serde(default)]
    pub stage_progress: u8,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Timestamp of the first transition into `in_progress`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Timestamp of the transition into `completed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Subtasks belonging to this stage
    #[serde(default)]
    pub subtasks: Vec<PilotSubtask>,
}

fn default_priority() -> u32 {
    1
}

impl PilotStage {
    /// Create a pending stage with a fresh identifier.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: format!("stage-{}", Uuid::new_v4()),
            name: name.into(),
            description: description.into(),
            objectives: Vec::new(),
            status: StageStatus::Pending,
            tool_categories: Vec::new(),
            priority: default_priority(),
            stage_progress: 0,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            subtasks: Vec::new(),
        }
    }

    /// Apply a status transition if it moves strictly forward, stamping
    /// `started_at` / `completed_at` on first entry.
    pub fn advance_status(&mut self, next: StageStatus) -> bool {
        if next.rank() <= self.status.rank() {
            return false;
        }
        self.status = next;
        match next {
            StageStatus::InProgress => {
                if self.started_at.is_none() {
                    self.started_at = Some(Utc::now());
                }
            }
            StageStatus::Completed => {
                if self.started_at.is_none() {
                    self.started_at = Some(Utc::now());
                }
                if self.completed_at.is_none() {
                    self.completed_at = Some(Utc::now());
                }
            }
            StageStatus::Pending => {}
        }
        true
    }

    /// Whether any subtask ended in failure.
    pub fn has_failures(&self) -> bool {
        self.subtasks
            .iter()
            .any(|subtask| subtask.status == SubtaskStatus::Failed)
    }

    /// Subtasks still awaiting dispatch.
    pub fn pending_subtasks(&self) -> impl Iterator<Item = &PilotSubtask> {
        self.subtasks
            .iter()
            .filter(|subtask| subtask.status == SubtaskStatus::Pending)
    }

    /// Number of subtasks that are pending or currently executing.
    pub fn open_subtask_count(&self) -> usize {
        self.subtasks
            .iter()
            .filter(|subtask| {
                matches!(
                    subtask.status,
                    SubtaskStatus::Pending | SubtaskStatus::Executing
                )
            })
            .count()
    }
}

// ============================================================================
// Progress Plan
// ============================================================================

/// The whole multi-stage progress plan for one pilot session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPlan {
    /// Ordered stages; the session epoch indexes into this list
    #[serde(default)]
    pub stages: Vec<PilotStage>,
    /// Weighted overall completion percentage (0-100)
    #[serde(default)]
    pub overall_progress: u8,
    /// Timestamp of the last engine tick that touched this plan
    pub last_updated: DateTime<Utc>,
    /// The model's reasoning for this decomposition
    #[serde(default)]
    pub planning_logic: String,
    /// Restated user intent the plan is serving
    #[serde(default)]
    pub user_intent: String,
    /// Estimated number of epochs the whole plan needs
    #[serde(default = "default_estimated_epochs")]
    pub estimated_total_epochs: usize,
    /// Coarse complexity classification
    #[serde(default)]
    pub task_complexity: TaskComplexity,
}

fn default_estimated_epochs() -> usize {
    3
}

impl ProgressPlan {
    /// Create an empty plan shell for the given intent.
    pub fn new(user_intent: impl Into<String>) -> Self {
        Self {
            stages: Vec::new(),
            overall_progress: 0,
            last_updated: Utc::now(),
            planning_logic: String::new(),
            user_intent: user_intent.into(),
            estimated_total_epochs: default_estimated_epochs(),
            task_complexity: TaskComplexity::default(),
        }
    }

    /// Serialize to the string form callers persist between epochs.
    pub fn to_json_string(&self) -> PilotResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from the persisted string form.
    pub fn from_json_str(raw: &str) -> PilotResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Index of the first `in_progress` stage, if any.
    ///
    /// Diagnostic only: epoch indexing is authoritative for stage
    /// selection, and the engine logs when the two disagree.
    pub fn current_stage_index(&self) -> Option<usize> {
        self.stages
            .iter()
            .position(|stage| stage.status == StageStatus::InProgress)
    }

    /// Stage addressed by the given epoch, if the epoch is in range.
    pub fn stage_for_epoch(&self, epoch: usize) -> Option<&PilotStage> {
        self.stages.get(epoch)
    }

    /// Mutable variant of [`stage_for_epoch`](Self::stage_for_epoch).
    pub fn stage_for_epoch_mut(&mut self, epoch: usize) -> Option<&mut PilotStage> {
        self.stages.get_mut(epoch)
    }
}

// ============================================================================
// Step Descriptor
// ============================================================================

/// A dispatchable step emitted by the engine for the current epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDescriptor {
    /// Step name (mirrors the subtask name)
    pub name: String,
    /// Query text for the executor
    pub query: String,
    /// Canvas items to preload as context; currently always empty, the
    /// executor resolves context itself
    #[serde(default)]
    pub context_item_ids: Vec<String>,
    /// Workflow phase tag for the current epoch
    pub workflow_stage: WorkflowStage,
}

impl StepDescriptor {
    /// Build a descriptor from a subtask, tagging it with the phase the
    /// epoch heuristic recommends.
    pub fn from_subtask(subtask: &PilotSubtask, workflow_stage: WorkflowStage) -> Self {
        Self {
            name: subtask.name.clone(),
            query: subtask.query.clone(),
            context_item_ids: Vec::new(),
            workflow_stage,
        }
    }
}
