//! Session Lifecycle Integration Tests
//!
//! Walks one session through its whole epoch budget: initial planning,
//! step dispatch, external execution, reconciliation on the next tick,
//! epoch advancement by the caller, and the graceful no-op once the
//! epoch runs past the plan horizon. The caller side (persisting the
//! plan, assigning step ids, advancing the epoch) is played by the test.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pilot_engine::{
    run_epoch, ActionResultRecord, ActionStepRecord, ActionStepStatus, ChatCompletion, ChatModel,
    ChatRequest, EpochConfig, ModelConfig, ModelError, ModelResult, SchemaDescriptor,
    SessionRecord, SessionStatus, StageStatus, StepExecutionMode, SubtaskStatus, WorkflowStage,
};
use serde_json::{json, Value};

/// Model that replays a queue of structured responses, one per call.
struct QueueModel {
    responses: Mutex<VecDeque<Value>>,
    config: ModelConfig,
}

impl QueueModel {
    fn new(responses: Vec<Value>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            config: ModelConfig::default(),
        }
    }
}

#[async_trait]
impl ChatModel for QueueModel {
    fn name(&self) -> &'static str {
        "queue"
    }

    fn model(&self) -> &str {
        "queue-model"
    }

    async fn invoke(&self, _request: ChatRequest) -> ModelResult<ChatCompletion> {
        Err(ModelError::ServerError {
            message: "free-text path not scripted".to_string(),
            status: Some(500),
        })
    }

    async fn invoke_structured(
        &self,
        _schema: &SchemaDescriptor,
        _request: ChatRequest,
    ) -> ModelResult<Value> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(ModelError::ServerError {
                message: "response queue exhausted".to_string(),
                status: Some(500),
            })
    }

    fn config(&self) -> &ModelConfig {
        &self.config
    }
}

fn session(progress: Option<String>, current_epoch: usize) -> SessionRecord {
    SessionRecord {
        session_id: "session-walkthrough".to_string(),
        title: None,
        input: "compare the three best-selling electric vehicles".to_string(),
        current_epoch,
        max_epoch: 2,
        progress,
        status: SessionStatus::Executing,
    }
}

fn initial_proposal() -> Value {
    json!({
        "userIntent": "compare the three best-selling EVs",
        "planningLogic": "gather data first, then write the comparison",
        "taskComplexity": "medium",
        "estimatedTotalEpochs": 2,
        "stages": [
            {
                "name": "Research",
                "description": "gather vehicle data",
                "objectives": ["collect specs and prices"],
                "toolCategories": ["search"],
                "subtasks": [
                    {"name": "Find specs", "query": "find EV specs", "workflowStage": "research"},
                    {"name": "Find prices", "query": "find EV prices", "workflowStage": "research"}
                ]
            },
            {
                "name": "Write",
                "description": "produce the comparison",
                "objectives": ["write the final report"]
            }
        ]
    })
}

#[tokio::test]
async fn test_full_session_walkthrough() {
    let config = EpochConfig::default();

    // ---- Epoch 0, tick 1: initial planning and first dispatch ----
    let model = Arc::new(QueueModel::new(vec![
        initial_proposal(),
        json!({"steps": [{"name": "Check recalls", "query": "find recall notices"}]}),
    ]));
    let outcome = run_epoch(model, &session(None, 0), &[], &[], &[], &[], &config)
        .await
        .unwrap();

    assert_eq!(outcome.plan.stages.len(), 2);
    assert_eq!(outcome.plan.stages[0].status, StageStatus::InProgress);
    assert_eq!(outcome.plan.stages[0].subtasks.len(), 3);
    // only the newly generated step is dispatched this tick
    assert_eq!(outcome.steps.len(), 1);
    assert_eq!(outcome.steps[0].name, "Check recalls");
    assert_eq!(outcome.steps[0].workflow_stage, WorkflowStage::Research);
    assert_eq!(outcome.plan.overall_progress, 0);

    // The caller persists the plan and dispatches all queued work,
    // keying step records by the subtask ids it reads from the plan.
    let stored = outcome.plan.to_json_string().unwrap();
    let ids: Vec<String> = outcome.plan.stages[0]
        .subtasks
        .iter()
        .map(|s| s.id.clone())
        .collect();
    let steps: Vec<ActionStepRecord> = ids
        .iter()
        .enumerate()
        .map(|(index, id)| ActionStepRecord {
            step_id: id.clone(),
            name: format!("step {index}"),
            epoch: 0,
            entity_id: Some(format!("r{index}")),
            execution_mode: StepExecutionMode::Subtask,
            status: if index == 2 {
                ActionStepStatus::Failed
            } else {
                ActionStepStatus::Finish
            },
        })
        .collect();
    let results = vec![
        ActionResultRecord {
            result_id: "r0".to_string(),
            output: Some("range table".to_string()),
            errors: vec![],
        },
        ActionResultRecord {
            result_id: "r1".to_string(),
            output: Some("price table".to_string()),
            errors: vec![],
        },
        ActionResultRecord {
            result_id: "r2".to_string(),
            output: None,
            errors: vec!["source blocked".to_string()],
        },
    ];

    // ---- Epoch 0, tick 2: reconciliation completes the stage ----
    let model = Arc::new(QueueModel::new(vec![]));
    let outcome = run_epoch(
        model,
        &session(Some(stored), 0),
        &steps,
        &results,
        &[],
        &[],
        &config,
    )
    .await
    .unwrap();

    let research = &outcome.plan.stages[0];
    assert_eq!(research.status, StageStatus::Completed);
    assert!(research.completed_at.is_some());
    assert_eq!(research.stage_progress, 100);
    assert!(research.has_failures());
    assert_eq!(
        research.subtasks.iter().filter(|s| s.status == SubtaskStatus::Completed).count(),
        2
    );
    // completed stage counts flat, the write stage has not started
    assert_eq!(outcome.plan.overall_progress, 50);
    // generation was not scripted, so nothing new is dispatched
    assert!(outcome.steps.is_empty());

    // ---- Epoch 1, tick 3: the caller advanced the epoch ----
    let stored = outcome.plan.to_json_string().unwrap();
    let model = Arc::new(QueueModel::new(vec![json!({
        "steps": [
            {"name": "Draft outline", "query": "outline the comparison"},
            {"name": "Write report", "query": "write the full comparison"}
        ]
    })]));
    let outcome = run_epoch(
        model,
        &session(Some(stored), 1),
        &[],
        &[],
        &[],
        &[],
        &config,
    )
    .await
    .unwrap();

    assert_eq!(outcome.steps.len(), 2);
    // halfway through a two-epoch session
    assert_eq!(outcome.steps[0].workflow_stage, WorkflowStage::Analysis);
    assert_eq!(outcome.plan.stages[1].subtasks.len(), 2);
    assert_eq!(outcome.plan.stages[0].status, StageStatus::Completed);
    assert_eq!(outcome.plan.overall_progress, 50);

    // ---- Epoch 2, tick 4: past the plan horizon ----
    let stored = outcome.plan.to_json_string().unwrap();
    let model = Arc::new(QueueModel::new(vec![]));
    let outcome = run_epoch(
        model,
        &session(Some(stored), 2),
        &[],
        &[],
        &[],
        &[],
        &config,
    )
    .await
    .unwrap();

    assert!(outcome.steps.is_empty());
    assert_eq!(outcome.plan.stages.len(), 2);
    assert_eq!(outcome.plan.stages[1].subtasks.len(), 2);
}

#[tokio::test]
async fn test_second_tick_reuses_queued_work_without_model_calls() {
    // First tick: plan whose first stage is already saturated with subtasks
    let proposal = json!({
        "userIntent": "survey battery chemistries",
        "stages": [{
            "name": "Research",
            "description": "gather papers",
            "subtasks": [
                {"name": "LFP papers", "query": "find LFP papers"},
                {"name": "NMC papers", "query": "find NMC papers"},
                {"name": "Solid state papers", "query": "find solid state papers"}
            ]
        }]
    });
    let model = Arc::new(QueueModel::new(vec![proposal]));
    let config = EpochConfig::default();
    let outcome = run_epoch(model, &session(None, 0), &[], &[], &[], &[], &config)
        .await
        .unwrap();

    // three pending subtasks meet the per-epoch bound, so they are reused
    assert_eq!(outcome.steps.len(), 3);
    assert_eq!(outcome.steps[0].name, "LFP papers");
    assert_eq!(outcome.plan.stages[0].subtasks.len(), 3);

    // Second tick with an empty queue: reuse still works without a model
    let stored = outcome.plan.to_json_string().unwrap();
    let model = Arc::new(QueueModel::new(vec![]));
    let outcome = run_epoch(
        model,
        &session(Some(stored), 0),
        &[],
        &[],
        &[],
        &[],
        &config,
    )
    .await
    .unwrap();

    assert_eq!(outcome.steps.len(), 3);
}
