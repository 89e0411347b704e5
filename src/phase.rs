//! Workflow Phase Heuristic
//!
//! Maps a session's position in its epoch budget to the workflow phase its
//! steps should serve: early epochs gather, middle epochs analyze and
//! combine, late epochs produce deliverables. The thresholds are policy,
//! shared between this function and the planner's phase guidance text.

use crate::types::WorkflowStage;

/// Progress fraction below which epochs stay in research.
pub const RESEARCH_CEILING: f64 = 0.4;

/// Progress fraction below which epochs run analysis.
pub const ANALYSIS_CEILING: f64 = 0.7;

/// Progress fraction below which epochs run synthesis; everything at or
/// beyond it is creation.
pub const SYNTHESIS_CEILING: f64 = 0.85;

/// Recommend a workflow phase for the given epoch.
///
/// `total_epochs` is normalized to at least 1, so a zero budget degrades
/// to single-epoch behavior instead of dividing by zero. Epochs past the
/// budget land in `Creation`.
pub fn recommended_stage_for_epoch(current_epoch: usize, total_epochs: usize) -> WorkflowStage {
    let total = total_epochs.max(1);
    let progress = current_epoch as f64 / total as f64;

    if progress < RESEARCH_CEILING {
        WorkflowStage::Research
    } else if progress < ANALYSIS_CEILING {
        WorkflowStage::Analysis
    } else if progress < SYNTHESIS_CEILING {
        WorkflowStage::Synthesis
    } else {
        WorkflowStage::Creation
    }
}
