use thiserror::Error;

/// Errors raised while reading the diagnostic vocabulary from text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("unknown error kind: {0}")]
    UnknownErrorKind(String),

    #[error("unknown reason: {0}")]
    UnknownReason(String),

    #[error("malformed output id '{0}': expected <kind>:<reason>")]
    MalformedOutputId(String),
}
