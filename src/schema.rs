//! Plan & Step Proposal Schemas
//!
//! The shapes the model is asked to produce, in two forms: `JsonSchema`
//! derives feeding schema-constrained generation, and manual validators
//! for payloads extracted from free text. Both paths accept the same
//! inputs; the manual path additionally applies field defaulting so a
//! sloppy but salvageable payload still yields a usable proposal.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use pilot_core::{PilotError, PilotResult};
use pilot_llm::SchemaDescriptor;

use crate::types::{TaskComplexity, WorkflowStage};

/// Fallback name for a stage proposal missing one.
pub const UNNAMED_STAGE: &str = "Unnamed Stage";

/// Fallback name for a subtask proposal missing one.
pub const UNNAMED_SUBTASK: &str = "Unnamed Subtask";

// ============================================================================
// Proposal Types
// ============================================================================

/// A single step the model proposes for dispatch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepProposal {
    /// Short action-oriented step name
    pub name: String,
    /// Full query text for the executor
    pub query: String,
    /// Canvas item ids to preload as context
    #[serde(default)]
    pub context_item_ids: Vec<String>,
    /// Workflow phase this step serves
    #[serde(default)]
    pub workflow_stage: Option<WorkflowStage>,
}

/// A batch of step proposals from the subtask generator.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepBatchProposal {
    /// Proposed steps, at most the requested count
    #[serde(default)]
    pub steps: Vec<StepProposal>,
}

/// A stage the model proposes for the progress plan.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageProposal {
    /// Stage name
    pub name: String,
    /// What the stage accomplishes
    #[serde(default)]
    pub description: String,
    /// Concrete objectives
    #[serde(default)]
    pub objectives: Vec<String>,
    /// Tool categories relevant to the stage
    #[serde(default)]
    pub tool_categories: Vec<String>,
    /// Subtasks for the stage (only expected on the active stage)
    #[serde(default)]
    pub subtasks: Vec<StepProposal>,
}

/// The model's full plan output.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanProposal {
    /// Ordered stage proposals
    #[serde(default)]
    pub stages: Vec<StageProposal>,
    /// The model's reasoning for this decomposition
    #[serde(default)]
    pub planning_logic: String,
    /// Restated user intent
    #[serde(default)]
    pub user_intent: String,
    /// Estimated number of epochs for the whole plan
    #[serde(default)]
    pub estimated_total_epochs: Option<usize>,
    /// Coarse complexity classification
    #[serde(default)]
    pub task_complexity: Option<TaskComplexity>,
}

// ============================================================================
// Schema Descriptors
// ============================================================================

/// Schema for full plan generation.
pub fn plan_schema() -> SchemaDescriptor {
    SchemaDescriptor::for_type::<PlanProposal>("pilot_plan")
}

/// Schema for step batch generation.
pub fn step_batch_schema() -> SchemaDescriptor {
    SchemaDescriptor::for_type::<StepBatchProposal>("pilot_steps")
}

// ============================================================================
// Free-Text Validators
// ============================================================================

/// Validate one step payload from an extracted value.
///
/// Empty `name`/`query` and unrecognized `workflowStage` values are
/// rejected with errors naming the offending field; a missing
/// `workflowStage` is allowed and left unset.
pub fn validate_step_value(value: &Value) -> PilotResult<StepProposal> {
    let obj = value
        .as_object()
        .ok_or_else(|| PilotError::validation("step must be a JSON object"))?;

    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if name.is_empty() {
        return Err(PilotError::validation("step field 'name' must not be empty"));
    }

    let query = obj
        .get("query")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if query.is_empty() {
        return Err(PilotError::validation(
            "step field 'query' must not be empty",
        ));
    }

    let workflow_stage = match obj.get("workflowStage").and_then(Value::as_str) {
        Some(tag) => Some(WorkflowStage::parse(tag).ok_or_else(|| {
            PilotError::validation(format!(
                "step field 'workflowStage' has unknown value {:?}",
                tag
            ))
        })?),
        None => None,
    };

    let context_item_ids = obj
        .get("contextItemIds")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(StepProposal {
        name: name.to_string(),
        query: query.to_string(),
        context_item_ids,
        workflow_stage,
    })
}

/// Parse a step batch from an extracted value.
///
/// Accepts either `{"steps": [...]}` or a bare array. Individually invalid
/// steps are dropped with a warning; the batch fails only when the payload
/// has neither shape.
pub fn parse_step_batch(value: &Value) -> PilotResult<Vec<StepProposal>> {
    let entries = if let Some(array) = value.as_array() {
        array
    } else if let Some(array) = value.get("steps").and_then(Value::as_array) {
        array
    } else {
        return Err(PilotError::validation(
            "step batch must be an array or an object with a 'steps' array",
        ));
    };

    let mut steps = Vec::new();
    for entry in entries {
        match validate_step_value(entry) {
            Ok(step) => steps.push(step),
            Err(err) => {
                tracing::warn!(error = %err, "dropping invalid step proposal");
            }
        }
    }
    Ok(steps)
}

/// Parse a plan proposal from an extracted value, defaulting malformed
/// fields instead of failing.
///
/// A stage without a usable name becomes [`UNNAMED_STAGE`]; a subtask
/// without a name becomes [`UNNAMED_SUBTASK`], and a subtask without a
/// query reuses its name. Only a payload that is not a JSON object at all
/// is rejected; whether an empty stage list is acceptable is the caller's
/// decision.
pub fn parse_plan_value(value: &Value) -> PilotResult<PlanProposal> {
    let obj = value
        .as_object()
        .ok_or_else(|| PilotError::validation("plan payload must be a JSON object"))?;

    let stages = obj
        .get("stages")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().map(parse_stage_entry).collect())
        .unwrap_or_default();

    Ok(PlanProposal {
        stages,
        planning_logic: string_field(obj, "planningLogic"),
        user_intent: string_field(obj, "userIntent"),
        estimated_total_epochs: obj
            .get("estimatedTotalEpochs")
            .and_then(Value::as_u64)
            .map(|n| n as usize),
        task_complexity: obj
            .get("taskComplexity")
            .and_then(Value::as_str)
            .and_then(parse_complexity),
    })
}

fn parse_stage_entry(value: &Value) -> StageProposal {
    let Some(obj) = value.as_object() else {
        return StageProposal {
            name: UNNAMED_STAGE.to_string(),
            description: String::new(),
            objectives: Vec::new(),
            tool_categories: Vec::new(),
            subtasks: Vec::new(),
        };
    };

    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNNAMED_STAGE)
        .to_string();

    let subtasks = obj
        .get("subtasks")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().map(parse_subtask_entry).collect())
        .unwrap_or_default();

    StageProposal {
        name,
        description: string_field(obj, "description"),
        objectives: string_array_field(obj, "objectives"),
        tool_categories: string_array_field(obj, "toolCategories"),
        subtasks,
    }
}

fn parse_subtask_entry(value: &Value) -> StepProposal {
    let Some(obj) = value.as_object() else {
        return StepProposal {
            name: UNNAMED_SUBTASK.to_string(),
            query: UNNAMED_SUBTASK.to_string(),
            context_item_ids: Vec::new(),
            workflow_stage: None,
        };
    };

    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNNAMED_SUBTASK)
        .to_string();

    let query = obj
        .get("query")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| name.clone());

    let workflow_stage = obj
        .get("workflowStage")
        .and_then(Value::as_str)
        .and_then(WorkflowStage::parse);

    StepProposal {
        name,
        query,
        context_item_ids: string_array_field(obj, "contextItemIds"),
        workflow_stage,
    }
}

fn parse_complexity(value: &str) -> Option<TaskComplexity> {
    match value.trim().to_lowercase().as_str() {
        "simple" => Some(TaskComplexity::Simple),
        "medium" => Some(TaskComplexity::Medium),
        "complex" => Some(TaskComplexity::Complex),
        _ => None,
    }
}

fn string_field(obj: &serde_json::Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

fn string_array_field(obj: &serde_json::Map<String, Value>, key: &str) -> Vec<String> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
