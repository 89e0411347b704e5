//! Result Reconciliation and Progress Recomputation
//!
//! Pure functions that fold executed step records back into the plan and
//! rederive the progress percentages. Reconciliation is idempotent:
//! replaying the same step and result batch leaves the plan unchanged, and
//! subtask statuses only ever move forward.

use pilot_core::{ActionResultRecord, ActionStepRecord, StepExecutionMode};
use tracing::debug;

use crate::types::{PilotStage, PilotSubtask, ProgressPlan, StageStatus, SubtaskStatus};

// ============================================================================
// Reconciliation
// ============================================================================

/// Fold executed step records for one epoch into the stage's subtasks.
///
/// A step only counts when it was dispatched in `epoch`, ran in subtask
/// mode, and its result record is present; anything else leaves the plan
/// untouched. Matching is by subtask id against the step id first, then by
/// the subtask's recorded result id against the step's entity id. Steps
/// matching neither are appended as new subtasks so externally injected
/// work still shows up in the plan.
pub fn apply_step_results(
    stage: &mut PilotStage,
    epoch: usize,
    steps: &[ActionStepRecord],
    results: &[ActionResultRecord],
) {
    for step in steps {
        if step.epoch != epoch || step.execution_mode != StepExecutionMode::Subtask {
            continue;
        }
        let Some(entity_id) = step.entity_id.as_deref() else {
            continue;
        };
        let Some(result) = results.iter().find(|r| r.result_id == entity_id) else {
            debug!(step_id = %step.step_id, "no result record for step, leaving subtask untouched");
            continue;
        };
        let status = SubtaskStatus::from_step_status(step.status);

        let position = stage
            .subtasks
            .iter()
            .position(|subtask| subtask.id == step.step_id)
            .or_else(|| {
                stage
                    .subtasks
                    .iter()
                    .position(|subtask| subtask.result_id.as_deref() == Some(entity_id))
            });

        match position {
            Some(index) => {
                let subtask = &mut stage.subtasks[index];
                let advanced = subtask.apply_status(status);
                if advanced || subtask.status == status {
                    apply_result_payload(subtask, status, result, entity_id);
                }
            }
            None => {
                let mut subtask = PilotSubtask::with_id(&step.step_id, &step.name, &step.name);
                subtask.apply_status(status);
                apply_result_payload(&mut subtask, status, result, entity_id);
                stage.subtasks.push(subtask);
            }
        }
    }
}

/// Copy the result payload onto a subtask that reached `status`.
fn apply_result_payload(
    subtask: &mut PilotSubtask,
    status: SubtaskStatus,
    result: &ActionResultRecord,
    entity_id: &str,
) {
    subtask.result_id = Some(entity_id.to_string());
    match status {
        SubtaskStatus::Completed => {
            if result.output.is_some() {
                subtask.output = result.output.clone();
            }
        }
        SubtaskStatus::Failed => {
            if let Some(error) = result.first_error() {
                subtask.error_message = Some(error.to_string());
            }
        }
        SubtaskStatus::Pending | SubtaskStatus::Executing => {}
    }
}

// ============================================================================
// Progress Recomputation
// ============================================================================

/// Rederive a stage's progress percentage from its subtasks.
///
/// Progress counts settled subtasks (completed and failed alike) over the
/// total; a stage with no subtasks sits at zero. Reaching 100 advances the
/// stage to completed, anything strictly between 0 and 100 advances a
/// pending stage to in-progress.
pub fn recompute_stage_progress(stage: &mut PilotStage) {
    let total = stage.subtasks.len();
    if total == 0 {
        stage.stage_progress = 0;
        return;
    }
    let settled = stage
        .subtasks
        .iter()
        .filter(|subtask| subtask.status.is_terminal())
        .count();
    stage.stage_progress = ((settled as f64 / total as f64) * 100.0).round() as u8;

    if stage.stage_progress >= 100 {
        stage.advance_status(StageStatus::Completed);
    } else if stage.stage_progress > 0 {
        stage.advance_status(StageStatus::InProgress);
    }
}

/// Rederive overall plan progress from stage statuses.
///
/// Completed stages contribute 100, in-progress stages contribute their own
/// percentage, pending stages contribute nothing. A plan with no stages
/// sits at zero.
pub fn recompute_overall_progress(plan: &mut ProgressPlan) {
    let total = plan.stages.len();
    if total == 0 {
        plan.overall_progress = 0;
        return;
    }
    let sum: f64 = plan
        .stages
        .iter()
        .map(|stage| match stage.status {
            StageStatus::Completed => 100.0,
            StageStatus::InProgress => f64::from(stage.stage_progress),
            StageStatus::Pending => 0.0,
        })
        .sum();
    plan.overall_progress = (sum / total as f64).round() as u8;
}
