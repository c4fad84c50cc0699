use tally_types::{ErrorKind, Reason};
use thiserror::Error;

/// Errors that stop a verification run.
///
/// Verification failures are not errors: they are reported as diagnostics
/// in the [`VerificationResult`](crate::VerificationResult).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("malformed model {contract}.{function}: {message}")]
    MalformedModel {
        contract: String,
        function: String,
        message: String,
    },

    #[error("invalid bounds: {0}")]
    InvalidBounds(String),
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0}")]
    Invalid(String),
}

/// A verification failure raised while running a contract function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: ErrorKind,
    pub reason: Reason,
    pub label: Option<String>,
    pub node: String,
}

/// Why a contract function stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Abort {
    /// The transaction reverted; its effects are discarded and nothing is
    /// reported.
    Revert(String),

    /// A verification failure.
    Failure(Failure),

    /// The model itself is wrong (e.g. reads an argument of the wrong type).
    Malformed(String),
}

impl Abort {
    pub fn revert(reason: impl Into<String>) -> Self {
        Abort::Revert(reason.into())
    }

    pub fn is_revert(&self) -> bool {
        matches!(self, Abort::Revert(_))
    }
}

impl std::fmt::Display for Abort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Abort::Revert(reason) => write!(f, "reverted: {}", reason),
            Abort::Failure(failure) => {
                write!(f, "{}:{} at {}", failure.kind, failure.reason, failure.node)
            }
            Abort::Malformed(message) => write!(f, "malformed model: {}", message),
        }
    }
}
