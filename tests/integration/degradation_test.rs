//! Degradation Ladder Integration Tests
//!
//! The engine is supposed to keep producing usable output as the model
//! gets less cooperative: structured output first, a free-text parse
//! second, and deterministic fallbacks when both are gone. These tests
//! walk that ladder through the public `run_epoch` surface.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pilot_engine::{
    run_epoch, ChatCompletion, ChatModel, ChatRequest, EpochConfig, ModelConfig, ModelError,
    ModelResult, PilotStage, ProgressPlan, SchemaDescriptor, SessionRecord, SessionStatus,
    StageStatus, UsageStats,
};
use serde_json::{json, Value};

fn session(progress: Option<String>) -> SessionRecord {
    SessionRecord {
        session_id: "session-degradation".to_string(),
        title: None,
        input: "summarize recent battery research".to_string(),
        current_epoch: 0,
        max_epoch: 3,
        progress,
        status: SessionStatus::Executing,
    }
}

fn server_error() -> ModelError {
    ModelError::ServerError {
        message: "model offline".to_string(),
        status: Some(503),
    }
}

// ============================================================================
// Structured Output Unavailable, Free Text Works
// ============================================================================

/// Model without structured output support that answers free-text prompts
/// with fenced JSON, routed by the prompt's leading instruction.
struct TextOnlyModel {
    config: ModelConfig,
}

#[async_trait]
impl ChatModel for TextOnlyModel {
    fn name(&self) -> &'static str {
        "text-only"
    }

    fn model(&self) -> &str {
        "text-only-model"
    }

    async fn invoke(&self, request: ChatRequest) -> ModelResult<ChatCompletion> {
        let content = if request.prompt.starts_with("Decompose the following request") {
            format!(
                "Sure, here is the plan:\n```json\n{}\n```",
                json!({
                    "userIntent": "summarize battery research",
                    "stages": [
                        {
                            "name": "Collect papers",
                            "description": "gather recent publications",
                            "subtasks": [
                                {"name": "Search arXiv", "query": "recent battery papers on arXiv"}
                            ]
                        },
                        {"name": "Summarize", "description": "write the summary"}
                    ]
                })
            )
        } else if request.prompt.starts_with("Generate steps for the active stage") {
            format!(
                "Steps:\n```json\n{}\n```",
                json!({
                    "steps": [
                        {"name": "Search journals", "query": "recent battery papers in journals"}
                    ]
                })
            )
        } else {
            return Err(server_error());
        };
        Ok(ChatCompletion {
            content,
            model: "text-only-model".to_string(),
            usage: UsageStats::default(),
        })
    }

    async fn invoke_structured(
        &self,
        _schema: &SchemaDescriptor,
        _request: ChatRequest,
    ) -> ModelResult<Value> {
        Err(ModelError::InvalidRequest {
            message: "response_format is not supported".to_string(),
        })
    }

    fn config(&self) -> &ModelConfig {
        &self.config
    }
}

#[tokio::test]
async fn test_free_text_fallback_produces_a_full_tick() {
    let model = Arc::new(TextOnlyModel {
        config: ModelConfig::default(),
    });
    let outcome = run_epoch(
        model,
        &session(None),
        &[],
        &[],
        &[],
        &[],
        &EpochConfig::default(),
    )
    .await
    .unwrap();

    // the same tick shape a structured-capable model would have produced
    assert_eq!(outcome.plan.stages.len(), 2);
    assert_eq!(outcome.plan.user_intent, "summarize battery research");
    assert_eq!(outcome.plan.stages[0].name, "Collect papers");
    assert_eq!(outcome.plan.stages[0].status, StageStatus::InProgress);
    assert_eq!(outcome.plan.stages[0].subtasks.len(), 2);
    assert_eq!(outcome.steps.len(), 1);
    assert_eq!(outcome.steps[0].name, "Search journals");
}

// ============================================================================
// Everything Fails
// ============================================================================

struct AlwaysFailingModel {
    config: ModelConfig,
}

#[async_trait]
impl ChatModel for AlwaysFailingModel {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn model(&self) -> &str {
        "failing-model"
    }

    async fn invoke(&self, _request: ChatRequest) -> ModelResult<ChatCompletion> {
        Err(server_error())
    }

    async fn invoke_structured(
        &self,
        _schema: &SchemaDescriptor,
        _request: ChatRequest,
    ) -> ModelResult<Value> {
        Err(server_error())
    }

    fn config(&self) -> &ModelConfig {
        &self.config
    }
}

#[tokio::test]
async fn test_unreachable_model_still_yields_a_plan() {
    let model = Arc::new(AlwaysFailingModel {
        config: ModelConfig::default(),
    });
    let outcome = run_epoch(
        model,
        &session(None),
        &[],
        &[],
        &[],
        &[],
        &EpochConfig::default(),
    )
    .await
    .unwrap();

    // deterministic single-stage fallback plan
    assert_eq!(outcome.plan.stages.len(), 1);
    assert_eq!(outcome.plan.stages[0].name, "Research");
    assert_eq!(outcome.plan.stages[0].status, StageStatus::InProgress);
    assert_eq!(outcome.plan.stages[0].subtasks.len(), 1);
    assert_eq!(
        outcome.plan.stages[0].subtasks[0].query,
        "summarize recent battery research"
    );
    assert_eq!(outcome.plan.user_intent, "summarize recent battery research");
    // subtask generation failed too, so nothing is dispatched this tick
    assert!(outcome.steps.is_empty());
}

// ============================================================================
// Structured Output Returns Garbage
// ============================================================================

struct GarbageModel {
    config: ModelConfig,
}

#[async_trait]
impl ChatModel for GarbageModel {
    fn name(&self) -> &'static str {
        "garbage"
    }

    fn model(&self) -> &str {
        "garbage-model"
    }

    async fn invoke(&self, _request: ChatRequest) -> ModelResult<ChatCompletion> {
        Err(server_error())
    }

    async fn invoke_structured(
        &self,
        _schema: &SchemaDescriptor,
        _request: ChatRequest,
    ) -> ModelResult<Value> {
        Ok(json!("this is not an object"))
    }

    fn config(&self) -> &ModelConfig {
        &self.config
    }
}

#[tokio::test]
async fn test_malformed_structured_output_degrades_to_fallback_plan() {
    let model = Arc::new(GarbageModel {
        config: ModelConfig::default(),
    });
    let outcome = run_epoch(
        model,
        &session(None),
        &[],
        &[],
        &[],
        &[],
        &EpochConfig::default(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.plan.stages.len(), 1);
    assert_eq!(outcome.plan.stages[0].name, "Research");
}

// ============================================================================
// Partially Invalid Step Batches
// ============================================================================

/// Structured calls fail; the free-text reply mixes one invalid step (empty
/// name) with one valid step.
struct MixedBatchModel {
    config: ModelConfig,
}

#[async_trait]
impl ChatModel for MixedBatchModel {
    fn name(&self) -> &'static str {
        "mixed"
    }

    fn model(&self) -> &str {
        "mixed-model"
    }

    async fn invoke(&self, _request: ChatRequest) -> ModelResult<ChatCompletion> {
        Ok(ChatCompletion {
            content: r#"```json
{"steps": [
  {"name": "", "query": "query without a name"},
  {"name": "Scan reviews", "query": "scan review articles"}
]}
```"#
                .to_string(),
            model: "mixed-model".to_string(),
            usage: UsageStats::default(),
        })
    }

    async fn invoke_structured(
        &self,
        _schema: &SchemaDescriptor,
        _request: ChatRequest,
    ) -> ModelResult<Value> {
        Err(server_error())
    }

    fn config(&self) -> &ModelConfig {
        &self.config
    }
}

#[tokio::test]
async fn test_invalid_steps_are_dropped_not_fatal() {
    let mut plan = ProgressPlan::new("summarize research");
    let mut stage = PilotStage::new("Collect", "gather material");
    stage.advance_status(StageStatus::InProgress);
    plan.stages.push(stage);
    let stored = plan.to_json_string().unwrap();

    let model = Arc::new(MixedBatchModel {
        config: ModelConfig::default(),
    });
    let outcome = run_epoch(
        model,
        &session(Some(stored)),
        &[],
        &[],
        &[],
        &[],
        &EpochConfig::default(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.steps.len(), 1);
    assert_eq!(outcome.steps[0].name, "Scan reviews");
    assert_eq!(outcome.plan.stages[0].subtasks.len(), 1);
}

// ============================================================================
// Locale Plumbing
// ============================================================================

/// Records every request it sees, then fails, driving the engine down to
/// its deterministic fallbacks.
struct CapturingModel {
    seen: Mutex<Vec<ChatRequest>>,
    config: ModelConfig,
}

#[async_trait]
impl ChatModel for CapturingModel {
    fn name(&self) -> &'static str {
        "capturing"
    }

    fn model(&self) -> &str {
        "capturing-model"
    }

    async fn invoke(&self, request: ChatRequest) -> ModelResult<ChatCompletion> {
        self.seen.lock().unwrap().push(request);
        Err(server_error())
    }

    async fn invoke_structured(
        &self,
        _schema: &SchemaDescriptor,
        request: ChatRequest,
    ) -> ModelResult<Value> {
        self.seen.lock().unwrap().push(request);
        Err(server_error())
    }

    fn config(&self) -> &ModelConfig {
        &self.config
    }
}

#[tokio::test]
async fn test_locale_reaches_the_prompts() {
    let model = Arc::new(CapturingModel {
        seen: Mutex::new(Vec::new()),
        config: ModelConfig::default(),
    });
    let config = EpochConfig {
        locale: Some("fr-FR".to_string()),
        ..EpochConfig::default()
    };
    let _ = run_epoch(
        Arc::clone(&model) as Arc<dyn ChatModel>,
        &session(None),
        &[],
        &[],
        &[],
        &[],
        &config,
    )
    .await
    .unwrap();

    let seen = model.seen.lock().unwrap();
    assert!(!seen.is_empty());
    for request in seen.iter() {
        let system = request.system.as_deref().unwrap_or("");
        assert!(system.contains("## Output Language"));
        assert!(system.contains("fr-FR"));
    }
}
