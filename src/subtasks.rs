//! Subtask Generation
//!
//! Breaks the active stage of a progress plan into at most `max_count`
//! dispatchable subtasks. Mirrors the planner's degradation ladder:
//! structured output first, one free-text fallback, and an empty list when
//! both fail (callers treat that as a valid no-op for the tick).

use std::sync::Arc;

use tracing::warn;

use pilot_core::{CanvasContentItem, GenericToolset};
use pilot_llm::{extract_structured, ChatModel, ChatRequest};

use crate::prompts::{build_subtask_system_prompt, build_subtask_user_prompt};
use crate::schema::{parse_step_batch, step_batch_schema, StepProposal};
use crate::types::{PilotStage, PilotSubtask};

/// Inputs for a subtask generation run.
#[derive(Debug, Clone, Copy)]
pub struct SubtaskRequest<'a> {
    /// The stage to generate subtasks for.
    pub stage: &'a PilotStage,
    /// Full toolset catalog; filtered to the stage's tool categories.
    pub toolsets: &'a [GenericToolset],
    /// Canvas content rendered into the prompt.
    pub canvas: &'a [CanvasContentItem],
    /// Upper bound on generated subtasks.
    pub max_count: usize,
    /// Zero-based epoch the session is currently in.
    pub current_epoch: usize,
    /// Total epoch budget for the session.
    pub total_epochs: usize,
    /// Output locale, when the session has one.
    pub locale: Option<&'a str>,
}

/// Generate fresh pending subtasks for a stage.
pub async fn generate_subtasks(
    model: Arc<dyn ChatModel>,
    request: &SubtaskRequest<'_>,
) -> Vec<PilotSubtask> {
    if request.max_count == 0 {
        return Vec::new();
    }

    let proposals = match propose_steps(model, request).await {
        Ok(proposals) => proposals,
        Err(reason) => {
            warn!(
                stage = %request.stage.name,
                reason = %reason,
                "subtask generation failed, continuing without new subtasks"
            );
            return Vec::new();
        }
    };

    proposals
        .into_iter()
        .take(request.max_count)
        .map(|step| PilotSubtask::new(step.name, step.query))
        .collect()
}

/// Run the model and parse the step batch. Structured output first, then
/// one free-text attempt.
async fn propose_steps(
    model: Arc<dyn ChatModel>,
    request: &SubtaskRequest<'_>,
) -> Result<Vec<StepProposal>, String> {
    let relevant = relevant_toolsets(request.stage, request.toolsets);
    let system = build_subtask_system_prompt(request.max_count, request.locale);
    let user = build_subtask_user_prompt(
        &request.stage.name,
        &request.stage.description,
        &request.stage.objectives,
        &relevant,
        request.canvas,
        request.current_epoch,
        request.total_epochs,
        request.locale,
    );
    let chat = ChatRequest::new(user).with_system(system);

    match model.invoke_structured(&step_batch_schema(), chat.clone()).await {
        Ok(value) => match parse_step_batch(&value) {
            Ok(steps) => return Ok(steps),
            Err(error) => {
                warn!(error = %error, "structured step batch failed validation, retrying as text")
            }
        },
        Err(error) => warn!(error = %error, "structured step generation failed, retrying as text"),
    }

    let completion = model
        .invoke(chat)
        .await
        .map_err(|e| format!("step generation request failed: {e}"))?;
    let value = extract_structured(&completion.content)
        .map_err(|e| format!("step response contained no JSON: {e}"))?;
    parse_step_batch(&value).map_err(String::from)
}

/// Toolsets matching the stage's tool categories. A stage without
/// categories gets the whole catalog.
fn relevant_toolsets(stage: &PilotStage, toolsets: &[GenericToolset]) -> Vec<GenericToolset> {
    if stage.tool_categories.is_empty() {
        return toolsets.to_vec();
    }
    toolsets
        .iter()
        .filter(|toolset| {
            stage
                .tool_categories
                .iter()
                .any(|category| toolset.matches_category(category))
        })
        .cloned()
        .collect()
}
