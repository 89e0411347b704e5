//! Prompt Builders
//!
//! Prompt assembly for the planner and the subtask generator: system
//! prompts with embedded JSON contracts, user prompts rendering the
//! session question, the toolset catalog, canvas content, and (for
//! re-planning) a compact digest of execution history.

use pilot_core::{CanvasContentItem, GenericToolset};

use crate::phase::recommended_stage_for_epoch;
use crate::types::{ProgressPlan, StageStatus, SubtaskStatus};

/// Maximum characters of canvas content rendered per item.
const MAX_CANVAS_PREVIEW_CHARS: usize = 200;

/// Maximum canvas items rendered into a prompt.
const MAX_CANVAS_ITEMS: usize = 10;

/// Maximum characters of subtask output rendered into the re-plan digest.
const MAX_DIGEST_OUTPUT_CHARS: usize = 300;

// ============================================================================
// Plan Generation
// ============================================================================

/// System prompt for plan generation (initial and re-plan modes share it).
pub fn build_plan_system_prompt(locale: Option<&str>) -> String {
    let mut prompt = r#"You are a research pilot planner. Your job is to analyze a user's request and decompose it into a multi-stage progress plan that an autonomous agent will execute over several epochs.

Respond with a JSON object with the following fields:
- "userIntent": A one-sentence restatement of what the user wants
- "planningLogic": Your reasoning for this decomposition
- "taskComplexity": One of "simple", "medium", or "complex"
- "estimatedTotalEpochs": Number of epochs the plan needs (1-5)
- "stages": An array of stage objects, each with:
  - "name": A short stage name
  - "description": What the stage accomplishes
  - "objectives": An array of concrete objectives
  - "toolCategories": An array of tool category keywords relevant to the stage
  - "subtasks": An array of step objects with "name", "query", and "workflowStage" (one of "research", "analysis", "synthesis", "creation")

Rules:
1. Generate between 1 and 5 stages depending on task complexity: simple tasks get 1-2 stages, complex tasks get up to 5.
2. Order stages so each builds on the previous one. Split on explicit numbering in the request, on sequential dependencies, and on shifts between gathering, analyzing, and producing.
3. If the request depends on current information (news, prices, weather, anything "latest"), the first stage must obtain the current date and fresh sources before anything else uses them.
4. Provide "subtasks" ONLY for the first stage. Later stages get subtasks when they become active.
5. Subtask queries must be self-contained: an executor sees only the query text, not this conversation.
6. When a toolset catalog is provided, "toolCategories" must use keywords that match it.

Respond with ONLY the JSON object. No markdown fences, no explanatory text."#
        .to_string();

    if let Some(instruction) = language_instruction(locale) {
        prompt.push_str("\n\n## Output Language\n");
        prompt.push_str(&instruction);
    }
    prompt
}

/// User prompt for initial plan generation.
pub fn build_plan_user_prompt(
    question: &str,
    toolsets: &[GenericToolset],
    canvas: &[CanvasContentItem],
    current_epoch: usize,
    total_epochs: usize,
    locale: Option<&str>,
) -> String {
    let mut prompt = format!("Decompose the following request into a progress plan:\n\n{}", question);

    prompt.push_str(&render_phase_guidance(current_epoch, total_epochs));

    if let Some(catalog) = render_toolsets(toolsets, locale) {
        prompt.push_str("\n\n## Available Toolsets\n");
        prompt.push_str(&catalog);
    }

    if let Some(context) = render_canvas(canvas) {
        prompt.push_str("\n\n## Canvas Content\n");
        prompt.push_str(&context);
    }

    prompt
}

/// User prompt for re-planning with execution history.
///
/// Completed stages are fixed; the model is asked to revise only the
/// remaining stages, seeded with a digest of what already happened.
pub fn build_replan_user_prompt(
    question: &str,
    plan: &ProgressPlan,
    toolsets: &[GenericToolset],
    canvas: &[CanvasContentItem],
    current_epoch: usize,
    total_epochs: usize,
    locale: Option<&str>,
) -> String {
    let mut prompt = format!(
        "Revise the progress plan for the following request:\n\n{}",
        question
    );

    prompt.push_str("\n\n## Execution History\n");
    prompt.push_str(&render_stage_digest(plan));

    prompt.push_str(&render_phase_guidance(current_epoch, total_epochs));

    if let Some(catalog) = render_toolsets(toolsets, locale) {
        prompt.push_str("\n\n## Available Toolsets\n");
        prompt.push_str(&catalog);
    }

    if let Some(context) = render_canvas(canvas) {
        prompt.push_str("\n\n## Canvas Content\n");
        prompt.push_str(&context);
    }

    prompt.push_str(
        "\n\n## Revision Instructions\n\
         Completed stages are fixed and will be kept as they are. Propose ONLY the revised \
         remaining stages, starting with the current one, in the same JSON shape as a full plan. \
         Provide \"subtasks\" only for the first stage you propose.",
    );

    prompt
}

// ============================================================================
// Subtask Generation
// ============================================================================

/// System prompt for subtask generation.
pub fn build_subtask_system_prompt(max_count: usize, locale: Option<&str>) -> String {
    let mut prompt = format!(
        r#"You are a research pilot step generator. Your job is to break the active stage of a progress plan into dispatchable steps.

Respond with a JSON object with a single field:
- "steps": An array of at most {max_count} step objects, each with:
  - "name": A short action-oriented step name
  - "query": A self-contained query for the executor
  - "workflowStage": One of "research", "analysis", "synthesis", "creation"

Rules:
1. Generate at most {max_count} steps. Fewer is better when the stage objectives are narrow.
2. Steps must be mutually independent so they can run in parallel.
3. Phrase each query as an objective and its expected outcome, not as a vague topic.
4. Stay inside the stage's objectives; later stages handle the rest.

Respond with ONLY the JSON object. No markdown fences, no explanatory text."#
    );

    if let Some(instruction) = language_instruction(locale) {
        prompt.push_str("\n\n## Output Language\n");
        prompt.push_str(&instruction);
    }
    prompt
}

/// User prompt for subtask generation.
pub fn build_subtask_user_prompt(
    stage_name: &str,
    stage_description: &str,
    objectives: &[String],
    toolsets: &[GenericToolset],
    canvas: &[CanvasContentItem],
    current_epoch: usize,
    total_epochs: usize,
    locale: Option<&str>,
) -> String {
    let mut prompt = format!(
        "Generate steps for the active stage of the plan.\n\n## Active Stage\nName: {}\nDescription: {}",
        stage_name, stage_description
    );

    if !objectives.is_empty() {
        prompt.push_str("\nObjectives:\n");
        for objective in objectives {
            prompt.push_str(&format!("- {}\n", objective));
        }
    }

    prompt.push_str(&render_phase_guidance(current_epoch, total_epochs));

    if let Some(catalog) = render_toolsets(toolsets, locale) {
        prompt.push_str("\n\n## Relevant Toolsets\n");
        prompt.push_str(&catalog);
    }

    if let Some(context) = render_canvas(canvas) {
        prompt.push_str("\n\n## Canvas Content\n");
        prompt.push_str(&context);
    }

    prompt
}

// ============================================================================
// Rendering Helpers
// ============================================================================

/// Output-language instruction for a locale, when one is set.
fn language_instruction(locale: Option<&str>) -> Option<String> {
    let locale = locale?.trim();
    if locale.is_empty() {
        return None;
    }
    Some(format!(
        "Write all output (stage names, step names, queries, reasoning) in the language of locale \"{}\".",
        locale
    ))
}

/// Phase guidance block shared by all user prompts.
fn render_phase_guidance(current_epoch: usize, total_epochs: usize) -> String {
    let phase = recommended_stage_for_epoch(current_epoch, total_epochs);
    format!(
        "\n\n## Current Phase\nEpoch {} of {}. Recommended workflow phase: {}. \
         Early epochs gather material, middle epochs analyze and combine it, \
         late epochs produce the final deliverable.",
        current_epoch, total_epochs, phase
    )
}

/// Render the toolset catalog, one line per toolset.
fn render_toolsets(toolsets: &[GenericToolset], locale: Option<&str>) -> Option<String> {
    if toolsets.is_empty() {
        return None;
    }
    let mut lines = Vec::new();
    for toolset in toolsets {
        let tools = toolset.tool_names().join(", ");
        let description = locale
            .and_then(|l| toolset.description_for_locale(l))
            .or_else(|| toolset.description_for_locale("en"));
        let mut line = format!("- {}", toolset.name);
        if !tools.is_empty() {
            line.push_str(&format!(" (tools: {})", tools));
        }
        if let Some(description) = description {
            line.push_str(&format!(": {}", description));
        }
        lines.push(line);
    }
    Some(lines.join("\n"))
}

/// Render canvas content items, bounded in count and per-item length.
fn render_canvas(canvas: &[CanvasContentItem]) -> Option<String> {
    if canvas.is_empty() {
        return None;
    }
    let lines: Vec<String> = canvas
        .iter()
        .take(MAX_CANVAS_ITEMS)
        .map(|item| {
            let title = item.title.as_deref().unwrap_or("(untitled)");
            match item.preview_text() {
                Some(text) => format!(
                    "- [{}] {}: {}",
                    item.item_type,
                    title,
                    truncate_chars(text, MAX_CANVAS_PREVIEW_CHARS)
                ),
                None => format!("- [{}] {}", item.item_type, title),
            }
        })
        .collect();
    Some(lines.join("\n"))
}

/// Render the execution-history digest for re-planning.
fn render_stage_digest(plan: &ProgressPlan) -> String {
    let mut digest = String::new();

    for (index, stage) in plan.stages.iter().enumerate() {
        let marker = match stage.status {
            StageStatus::Completed => "completed",
            StageStatus::InProgress => "in progress",
            StageStatus::Pending => "pending",
        };
        digest.push_str(&format!(
            "### Stage {} ({}): {}\n{}\n",
            index + 1,
            marker,
            stage.name,
            stage.description
        ));

        if stage.status == StageStatus::Pending {
            continue;
        }

        for subtask in &stage.subtasks {
            digest.push_str(&format!("- [{}] {}", subtask.status, subtask.name));
            if subtask.status == SubtaskStatus::Completed {
                if let Some(output) = &subtask.output {
                    digest.push_str(&format!(
                        ": {}",
                        truncate_chars(output, MAX_DIGEST_OUTPUT_CHARS)
                    ));
                }
            } else if subtask.status == SubtaskStatus::Failed {
                if let Some(error) = &subtask.error_message {
                    digest.push_str(&format!(" (error: {})", truncate_chars(error, 120)));
                }
            }
            digest.push('\n');
        }
    }

    digest
}

/// Truncate to a maximum number of characters, appending an ellipsis when
/// anything was cut.
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max).collect();
    format!("{}...", truncated)
}
