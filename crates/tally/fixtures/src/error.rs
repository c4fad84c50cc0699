use std::path::PathBuf;

use tally_types::TypesError;
use thiserror::Error;

/// Errors reading a fixture.
#[derive(Debug, Error)]
pub enum DirectiveError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: malformed directive: {message}")]
    Malformed { line: usize, message: String },

    #[error("line {line}: {source}")]
    UnknownOutput {
        line: usize,
        #[source]
        source: TypesError,
    },

    #[error("line {line}: label {label} is not defined")]
    UndefinedLabel { line: usize, label: String },

    #[error("line {line}: label {label} is defined twice")]
    DuplicateLabel { line: usize, label: String },

    #[error("line {line}: malformed resource declaration: {message}")]
    MalformedResource { line: usize, message: String },
}

impl DirectiveError {
    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        DirectiveError::Malformed {
            line,
            message: message.into(),
        }
    }

    /// One-based source line the error points at, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            DirectiveError::Io { .. } => None,
            DirectiveError::Malformed { line, .. }
            | DirectiveError::UnknownOutput { line, .. }
            | DirectiveError::UndefinedLabel { line, .. }
            | DirectiveError::DuplicateLabel { line, .. }
            | DirectiveError::MalformedResource { line, .. } => Some(*line),
        }
    }
}

pub type Result<T> = std::result::Result<T, DirectiveError>;
