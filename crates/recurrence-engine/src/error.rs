//! Error types for recurrence-engine operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecurrenceError {
    /// A numeric field or a computed date lies outside its valid domain.
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// A selector value is malformed independent of the rule's frequency.
    #[error("Invalid argument: {0}")]
    InvalidArg(String),

    /// The selector is not supported by the rule's current frequency.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// The rule is well-formed but can never produce an occurrence for its anchor.
    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    /// The operation needs a recurring entry and the target is not one.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Not found: {0}")]
    ObjNotFound(String),

    #[error("Already exists: {0}")]
    ObjAlreadyExist(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Fieldless mirror of [`RecurrenceError`] for matching on the taxonomy alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    OutOfRange,
    InvalidArg,
    TypeMismatch,
    InvalidCondition,
    InvalidState,
    ObjNotFound,
    ObjAlreadyExist,
    Serialization,
}

impl RecurrenceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecurrenceError::OutOfRange(_) => ErrorKind::OutOfRange,
            RecurrenceError::InvalidArg(_) => ErrorKind::InvalidArg,
            RecurrenceError::TypeMismatch(_) => ErrorKind::TypeMismatch,
            RecurrenceError::InvalidCondition(_) => ErrorKind::InvalidCondition,
            RecurrenceError::InvalidState(_) => ErrorKind::InvalidState,
            RecurrenceError::ObjNotFound(_) => ErrorKind::ObjNotFound,
            RecurrenceError::ObjAlreadyExist(_) => ErrorKind::ObjAlreadyExist,
            RecurrenceError::Serialization(_) => ErrorKind::Serialization,
        }
    }
}

pub type Result<T> = std::result::Result<T, RecurrenceError>;
