//! Epoch Orchestration
//!
//! One engine tick per session epoch: acquire the plan, fold in the
//! results of previously dispatched steps, recompute progress, and decide
//! which steps to dispatch next. The engine owns no storage; it takes the
//! session's records as values and hands the mutated plan back to the
//! caller for persistence.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use pilot_core::{
    ActionResultRecord, ActionStepRecord, CanvasContentItem, GenericToolset, PilotError,
    PilotResult, SessionRecord,
};
use pilot_llm::ChatModel;

use crate::phase::recommended_stage_for_epoch;
use crate::planner::{analyze_intent_and_plan, PlanRequest};
use crate::reconcile::{apply_step_results, recompute_overall_progress, recompute_stage_progress};
use crate::subtasks::{generate_subtasks, SubtaskRequest};
use crate::types::{ProgressPlan, StepDescriptor};

// ============================================================================
// Configuration
// ============================================================================

/// Engine tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochConfig {
    /// Upper bound on steps dispatched per epoch
    #[serde(default = "default_max_steps_per_epoch")]
    pub max_steps_per_epoch: usize,
    /// Output locale for generated plan and subtask text
    #[serde(default)]
    pub locale: Option<String>,
}

fn default_max_steps_per_epoch() -> usize {
    3
}

impl Default for EpochConfig {
    fn default() -> Self {
        Self {
            max_steps_per_epoch: default_max_steps_per_epoch(),
            locale: None,
        }
    }
}

impl EpochConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> PilotResult<()> {
        if self.max_steps_per_epoch == 0 {
            return Err(PilotError::config("maxStepsPerEpoch must be at least 1"));
        }
        Ok(())
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// What one engine tick produced.
#[derive(Debug, Clone)]
pub struct EpochOutcome {
    /// The mutated plan, for the caller to serialize and persist.
    pub plan: ProgressPlan,
    /// Step descriptors to dispatch for this epoch.
    pub steps: Vec<StepDescriptor>,
}

// ============================================================================
// Engine Tick
// ============================================================================

/// Run one engine tick for a session.
///
/// The session's `current_epoch` indexes the stage list and is the
/// authoritative current stage. An epoch past the plan horizon is a
/// graceful no-op. The only surfaced failure is a plan whose stage list is
/// empty; everything downstream of plan acquisition degrades instead of
/// erroring.
pub async fn run_epoch(
    model: Arc<dyn ChatModel>,
    session: &SessionRecord,
    steps: &[ActionStepRecord],
    results: &[ActionResultRecord],
    toolsets: &[GenericToolset],
    canvas: &[CanvasContentItem],
    config: &EpochConfig,
) -> PilotResult<EpochOutcome> {
    config.validate()?;

    let mut plan = acquire_plan(Arc::clone(&model), session, toolsets, canvas, config).await;
    if plan.stages.is_empty() {
        return Err(PilotError::planning(
            "plan has no stages, refusing to emit steps",
        ));
    }

    let epoch = session.current_epoch;
    if plan.stage_for_epoch(epoch).is_none() {
        info!(
            session_id = %session.session_id,
            epoch,
            stages = plan.stages.len(),
            "epoch is past the plan horizon, nothing to dispatch"
        );
        return Ok(EpochOutcome { plan, steps: Vec::new() });
    }
    if let Some(scanned) = plan.current_stage_index() {
        if scanned != epoch {
            warn!(
                epoch,
                first_in_progress = scanned,
                "epoch index disagrees with the first in-progress stage"
            );
        }
    }

    if let Some(stage) = plan.stage_for_epoch_mut(epoch) {
        apply_step_results(stage, epoch, steps, results);
        recompute_stage_progress(stage);
    }
    recompute_overall_progress(&mut plan);

    let descriptors = decide_steps(model, &mut plan, session, toolsets, canvas, config).await;

    plan.last_updated = Utc::now();
    Ok(EpochOutcome {
        plan,
        steps: descriptors,
    })
}

/// Deserialize the stored plan, or plan from scratch when there is none or
/// it is unreadable.
async fn acquire_plan(
    model: Arc<dyn ChatModel>,
    session: &SessionRecord,
    toolsets: &[GenericToolset],
    canvas: &[CanvasContentItem],
    config: &EpochConfig,
) -> ProgressPlan {
    if let Some(raw) = session.progress.as_deref() {
        if !raw.trim().is_empty() {
            match ProgressPlan::from_json_str(raw) {
                Ok(plan) => return plan,
                Err(error) => warn!(
                    session_id = %session.session_id,
                    error = %error,
                    "stored plan failed to deserialize, planning from scratch"
                ),
            }
        }
    }

    let request = PlanRequest {
        question: &session.input,
        existing_plan: None,
        toolsets,
        canvas,
        current_epoch: session.current_epoch,
        total_epochs: session.max_epoch,
        locale: config.locale.as_deref(),
    };
    analyze_intent_and_plan(model, &request).await
}

/// Pick the steps to dispatch: reuse queued pending subtasks when the
/// stage already has enough open work, otherwise ask the model for new
/// ones and append them to the stage.
async fn decide_steps(
    model: Arc<dyn ChatModel>,
    plan: &mut ProgressPlan,
    session: &SessionRecord,
    toolsets: &[GenericToolset],
    canvas: &[CanvasContentItem],
    config: &EpochConfig,
) -> Vec<StepDescriptor> {
    let epoch = session.current_epoch;
    let workflow_stage = recommended_stage_for_epoch(epoch, session.max_epoch);

    let new_subtasks = {
        let Some(stage) = plan.stage_for_epoch(epoch) else {
            return Vec::new();
        };
        let open = stage.open_subtask_count();
        if open >= config.max_steps_per_epoch {
            debug!(
                stage = %stage.name,
                open,
                "stage has enough open subtasks, reusing pending ones"
            );
            return stage
                .pending_subtasks()
                .take(config.max_steps_per_epoch)
                .map(|subtask| StepDescriptor::from_subtask(subtask, workflow_stage))
                .collect();
        }

        let request = SubtaskRequest {
            stage,
            toolsets,
            canvas,
            max_count: config.max_steps_per_epoch,
            current_epoch: epoch,
            total_epochs: session.max_epoch,
            locale: config.locale.as_deref(),
        };
        generate_subtasks(model, &request).await
    };

    let descriptors: Vec<StepDescriptor> = new_subtasks
        .iter()
        .map(|subtask| StepDescriptor::from_subtask(subtask, workflow_stage))
        .collect();
    if let Some(stage) = plan.stage_for_epoch_mut(epoch) {
        stage.subtasks.extend(new_subtasks);
    }
    descriptors
}
