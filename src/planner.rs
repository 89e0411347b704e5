//! Plan Generation
//!
//! Turns a user request into a [`ProgressPlan`], either from scratch or by
//! revising an existing plan around its completed stages. Planning never
//! fails: the structured output path is tried first, then one free-text
//! fallback, and when both yield nothing usable a deterministic
//! single-stage plan is built from the raw question.

use std::sync::Arc;

use tracing::warn;

use pilot_core::{CanvasContentItem, GenericToolset};
use pilot_llm::{extract_structured, ChatModel, ChatRequest};

use crate::prompts::{build_plan_system_prompt, build_plan_user_prompt, build_replan_user_prompt};
use crate::reconcile::recompute_overall_progress;
use crate::schema::{parse_plan_value, plan_schema, PlanProposal, StageProposal};
use crate::types::{PilotStage, PilotSubtask, ProgressPlan, StageStatus};

/// Inputs for a planning run.
#[derive(Debug, Clone, Copy)]
pub struct PlanRequest<'a> {
    /// The user's request for the session.
    pub question: &'a str,
    /// Existing plan to revise; `None` selects initial planning.
    pub existing_plan: Option<&'a ProgressPlan>,
    /// Toolset catalog rendered into the prompt.
    pub toolsets: &'a [GenericToolset],
    /// Canvas content rendered into the prompt.
    pub canvas: &'a [CanvasContentItem],
    /// Zero-based epoch the session is currently in.
    pub current_epoch: usize,
    /// Total epoch budget for the session.
    pub total_epochs: usize,
    /// Output locale, when the session has one.
    pub locale: Option<&'a str>,
}

/// Analyze the user's intent and produce a progress plan.
///
/// In re-plan mode (`existing_plan` set) completed stages are carried over
/// unchanged, ids included, and only the remaining stages are replaced by
/// the model's revision.
pub async fn analyze_intent_and_plan(
    model: Arc<dyn ChatModel>,
    request: &PlanRequest<'_>,
) -> ProgressPlan {
    match propose_plan(model, request).await {
        Ok(proposal) => build_plan(proposal, request),
        Err(reason) => {
            warn!(reason = %reason, "plan generation failed, using fallback plan");
            fallback_plan(request.question)
        }
    }
}

/// Run the model and parse its proposal. Structured output first, then one
/// free-text attempt.
async fn propose_plan(
    model: Arc<dyn ChatModel>,
    request: &PlanRequest<'_>,
) -> Result<PlanProposal, String> {
    let system = build_plan_system_prompt(request.locale);
    let user = match request.existing_plan {
        Some(plan) => build_replan_user_prompt(
            request.question,
            plan,
            request.toolsets,
            request.canvas,
            request.current_epoch,
            request.total_epochs,
            request.locale,
        ),
        None => build_plan_user_prompt(
            request.question,
            request.toolsets,
            request.canvas,
            request.current_epoch,
            request.total_epochs,
            request.locale,
        ),
    };
    let chat = ChatRequest::new(user).with_system(system);

    match model.invoke_structured(&plan_schema(), chat.clone()).await {
        Ok(value) => match parse_plan_value(&value) {
            Ok(proposal) if !proposal.stages.is_empty() => return Ok(proposal),
            Ok(_) => warn!("structured plan proposal has no stages, retrying as text"),
            Err(error) => {
                warn!(error = %error, "structured plan proposal failed validation, retrying as text")
            }
        },
        Err(error) => warn!(error = %error, "structured plan generation failed, retrying as text"),
    }

    let completion = model
        .invoke(chat)
        .await
        .map_err(|e| format!("plan generation request failed: {e}"))?;
    let value = extract_structured(&completion.content)
        .map_err(|e| format!("plan response contained no JSON: {e}"))?;
    let proposal = parse_plan_value(&value).map_err(String::from)?;
    if proposal.stages.is_empty() {
        return Err("plan proposal has no stages".to_string());
    }
    Ok(proposal)
}

/// Materialize a proposal into a plan, carrying over completed stages in
/// re-plan mode.
fn build_plan(proposal: PlanProposal, request: &PlanRequest<'_>) -> ProgressPlan {
    let user_intent = if proposal.user_intent.trim().is_empty() {
        request.question.to_string()
    } else {
        proposal.user_intent.clone()
    };
    let mut plan = ProgressPlan::new(user_intent);
    plan.planning_logic = proposal.planning_logic.clone();
    if let Some(epochs) = proposal.estimated_total_epochs {
        plan.estimated_total_epochs = epochs.max(1);
    }
    if let Some(complexity) = proposal.task_complexity {
        plan.task_complexity = complexity;
    }

    if let Some(existing) = request.existing_plan {
        plan.stages.extend(
            existing
                .stages
                .iter()
                .filter(|stage| stage.status == StageStatus::Completed)
                .cloned(),
        );
    }
    let carried = plan.stages.len();

    for (index, stage_proposal) in proposal.stages.into_iter().enumerate() {
        let mut stage = materialize_stage(stage_proposal);
        stage.priority = (carried + index + 1) as u32;
        if index == 0 {
            stage.advance_status(StageStatus::InProgress);
        }
        plan.stages.push(stage);
    }

    recompute_overall_progress(&mut plan);
    plan
}

/// Convert one stage proposal into a pending stage with pending subtasks.
fn materialize_stage(proposal: StageProposal) -> PilotStage {
    let mut stage = PilotStage::new(proposal.name, proposal.description);
    stage.objectives = proposal.objectives;
    stage.tool_categories = proposal.tool_categories;
    stage.subtasks = proposal
        .subtasks
        .into_iter()
        .map(|step| PilotSubtask::new(step.name, step.query))
        .collect();
    stage
}

/// Single-stage plan used when the model yields nothing usable.
fn fallback_plan(question: &str) -> ProgressPlan {
    let mut stage = PilotStage::new("Research", "Investigate the request and gather material");
    stage.objectives = vec![format!("Answer: {}", question)];
    stage.advance_status(StageStatus::InProgress);
    stage.subtasks.push(PilotSubtask::new("Initial research", question));

    let mut plan = ProgressPlan::new(question);
    plan.planning_logic =
        "Plan generation was unavailable; starting with a single research stage.".to_string();
    plan.estimated_total_epochs = 1;
    plan.stages.push(stage);
    plan
}
