//! CLI error types

use tally_fixtures::DirectiveError;
use tally_verify::{ConfigError, VerifyError};
use thiserror::Error;

/// CLI error types
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file or bounds
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Fixture could not be read or parsed
    #[error("Fixture error: {0}")]
    Fixture(#[from] DirectiveError),

    /// A model rejected by the verifier
    #[error("Verification error: {0}")]
    Verify(#[from] VerifyError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
