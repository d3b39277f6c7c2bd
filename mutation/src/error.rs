//! Mutation error types.

use relstore_compute::ComputeError;
use relstore_core::LocalId;
use relstore_graph::GraphError;
use thiserror::Error;

/// Result type for mutation operations.
pub type MutationResult<T> = Result<T, MutationError>;

/// Errors that can occur during mutation execution.
///
/// Failures are not rolled back: an update that fails midway leaves the
/// changes applied before the failure in place.
#[derive(Debug, Error)]
pub enum MutationError {
    #[error("Unknown model: {name}")]
    UnknownModel { name: String },

    #[error("Unknown field: {field} on model {model}")]
    UnknownField { model: String, field: String },

    #[error("Invalid relational value for {model}/{field}: {message}")]
    InvalidRelationalValue {
        model: String,
        field: String,
        message: String,
    },

    #[error("Relational field {model}/{field} only accepts field commands")]
    UnsupportedDirectAssignment { model: String, field: String },

    #[error("Command {command} is not valid on attribute {model}/{field}")]
    InvalidCommand {
        model: String,
        field: String,
        command: String,
    },

    #[error("Identifying field {field} of {record} cannot change once set")]
    IdentityChange { record: LocalId, field: String },

    #[error("Record deleted: {0}")]
    RecordDeleted(LocalId),

    #[error("Record already exists: {0}")]
    DuplicateRecord(LocalId),

    #[error("Compute cycle on {target}: {chain}")]
    ComputeCycle { target: String, chain: String },

    #[error("Maximum compute steps exceeded: {limit}")]
    ComputeLimitExceeded { limit: usize },
}

impl MutationError {
    pub fn unknown_model(name: impl Into<String>) -> Self {
        Self::UnknownModel { name: name.into() }
    }

    pub fn unknown_field(model: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            model: model.into(),
            field: field.into(),
        }
    }

    pub fn invalid_relational_value(
        model: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidRelationalValue {
            model: model.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unsupported_direct_assignment(
        model: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self::UnsupportedDirectAssignment {
            model: model.into(),
            field: field.into(),
        }
    }

    pub fn invalid_command(
        model: impl Into<String>,
        field: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self::InvalidCommand {
            model: model.into(),
            field: field.into(),
            command: command.into(),
        }
    }

    /// Whether this error only reports that the record is gone.
    pub fn is_record_deleted(&self) -> bool {
        matches!(self, Self::RecordDeleted(_))
    }
}

impl From<GraphError> for MutationError {
    fn from(e: GraphError) -> Self {
        match e {
            GraphError::RecordNotFound(id) => Self::RecordDeleted(id),
            GraphError::DuplicateRecord(id) => Self::DuplicateRecord(id),
            GraphError::FieldNotFound { record, field } => {
                Self::unknown_field(record.model_name(), field.to_string())
            }
        }
    }
}

impl From<ComputeError> for MutationError {
    fn from(e: ComputeError) -> Self {
        match e {
            ComputeError::Cycle {
                record,
                field,
                chain,
            } => Self::ComputeCycle {
                target: format!("{}.{}", record, field),
                chain,
            },
            ComputeError::StepLimitExceeded { limit } => Self::ComputeLimitExceeded { limit },
        }
    }
}
