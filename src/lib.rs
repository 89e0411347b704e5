//! Pilot Engine - Progress Plan Orchestration
//!
//! This library drives multi-stage pilot sessions. A session runs for a
//! bounded number of epochs; each epoch ticks the engine once:
//! - (Re)acquire the progress plan, planning from scratch when needed
//! - Fold externally executed step results back into the current stage
//! - Rederive stage and overall progress percentages
//! - Decide the next batch of steps and emit them for the caller to dispatch
//!
//! The engine owns no storage and spawns nothing; callers persist the
//! returned plan and schedule the emitted steps themselves.

pub mod engine;
pub mod phase;
pub mod planner;
pub mod prompts;
pub mod reconcile;
pub mod schema;
pub mod subtasks;
pub mod types;

// Re-export the engine surface
pub use engine::{run_epoch, EpochConfig, EpochOutcome};
// Re-export generation entry points
pub use planner::{analyze_intent_and_plan, PlanRequest};
pub use subtasks::{generate_subtasks, SubtaskRequest};
// Re-export the plan data model
pub use types::{
    PilotStage, PilotSubtask, ProgressPlan, StageStatus, StepDescriptor, SubtaskStatus,
    TaskComplexity, WorkflowStage,
};
pub use phase::recommended_stage_for_epoch;
pub use reconcile::{apply_step_results, recompute_overall_progress, recompute_stage_progress};
// Re-export session record types so callers need only this crate
pub use pilot_core::{
    ActionResultRecord, ActionStepRecord, ActionStepStatus, CanvasContentItem, ContentItemType,
    GenericToolset, PilotError, PilotResult, SessionRecord, SessionStatus, StepExecutionMode,
    ToolsetDefinition, ToolsetTool,
};
// Re-export the model abstraction the engine is driven by
pub use pilot_llm::{
    ChatCompletion, ChatModel, ChatRequest, ModelConfig, ModelError, ModelResult, OpenAIChatModel,
    SchemaDescriptor, UsageStats,
};
