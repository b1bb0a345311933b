/// Reusable widgets
pub mod action;
