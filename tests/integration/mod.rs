//! Integration Tests Module
//!
//! End-to-end tests for the pilot engine: single epoch ticks against
//! scripted chat models, a full multi-epoch session walkthrough, and the
//! degradation ladder when models misbehave.


// Multi-epoch session lifecycle tests
mod session_test;

// Planner and generator degradation tests
mod degradation_test;
