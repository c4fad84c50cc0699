//! CLI command implementations

pub mod directives;
pub mod models;
pub mod verify;
