//! Compute scheduling error types.

use relstore_core::{FieldId, LocalId};
use thiserror::Error;

/// Result type for compute scheduling.
pub type ComputeResult<T> = Result<T, ComputeError>;

/// Errors raised while scheduling computes.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Compute cycle: field {field} of {record} is recomputed by its own chain ({chain})")]
    Cycle {
        record: LocalId,
        field: FieldId,
        chain: String,
    },

    #[error("Maximum compute steps exceeded: {limit}")]
    StepLimitExceeded { limit: usize },
}

impl ComputeError {
    pub fn cycle(record: LocalId, field: FieldId, chain: String) -> Self {
        Self::Cycle {
            record,
            field,
            chain,
        }
    }

    pub fn step_limit_exceeded(limit: usize) -> Self {
        Self::StepLimitExceeded { limit }
    }
}
