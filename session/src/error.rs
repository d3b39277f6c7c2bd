//! Session error types.

use relstore_core::LocalId;
use relstore_mutation::MutationError;
use thiserror::Error;

/// Session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Mutation error.
    #[error("mutation error: {0}")]
    MutationError(#[from] MutationError),

    #[error("unknown model: {name}")]
    UnknownModel { name: String },

    #[error("unknown field: {field} on model {model}")]
    UnknownField { model: String, field: String },

    /// The record never existed or was deleted before the call.
    #[error("record not found: {0}")]
    RecordNotFound(LocalId),

    /// The record was deleted while asynchronous work was pending.
    #[error("record deleted: {0}")]
    RecordDeleted(LocalId),
}

impl SessionError {
    pub fn unknown_model(name: impl Into<String>) -> Self {
        Self::UnknownModel { name: name.into() }
    }

    pub fn unknown_field(model: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            model: model.into(),
            field: field.into(),
        }
    }

    /// Whether the failure is due to a record that no longer exists.
    pub fn is_record_deleted(&self) -> bool {
        match self {
            SessionError::RecordDeleted(_) => true,
            SessionError::MutationError(err) => err.is_record_deleted(),
            _ => false,
        }
    }
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
