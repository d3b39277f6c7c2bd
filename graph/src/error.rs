//! Record store error types.

use relstore_core::{FieldId, LocalId};
use thiserror::Error;

/// Result type for record store operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors raised by the record store.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Record already exists: {0}")]
    DuplicateRecord(LocalId),

    #[error("Record not found: {0}")]
    RecordNotFound(LocalId),

    #[error("Field {field} not found on record {record}")]
    FieldNotFound { record: LocalId, field: FieldId },
}
