//! Pilot Core
//!
//! Foundational error types and data records for the Pilot workspace. This
//! crate has zero dependencies on engine-level code (LLM providers, prompt
//! building, orchestration).
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`PilotError`, `PilotResult`)
//! - `context` - Read-only session context records (`SessionRecord`, `ActionStepRecord`, `ActionResultRecord`, `CanvasContentItem`)
//! - `toolset` - Toolset catalog types and category matching (`GenericToolset`)
//!
//! ## Design Principles
//!
//! 1. **Zero external dependencies beyond serde/thiserror** - keeps build times minimal
//! 2. **Records are snapshots** - the engine reads them, never writes them back
//! 3. **Unidirectional dependency** - this crate depends on nothing else in the workspace

pub mod error;
pub mod context;
pub mod toolset;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{PilotError, PilotResult};

// ── Session Context Records ────────────────────────────────────────────
pub use context::{
    ActionResultRecord, ActionStepRecord, ActionStepStatus, CanvasContentItem, ContentItemType,
    SessionRecord, SessionStatus, StepExecutionMode,
};

// ── Toolset Catalog ────────────────────────────────────────────────────
pub use toolset::{GenericToolset, ToolsetDefinition, ToolsetTool};
