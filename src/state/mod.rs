/// State management module
///
/// This module handles all application state, including:
/// - Shared data structures (data.rs)
/// - The upload/generate/result state machine (flow.rs)

pub mod data;
pub mod flow;
