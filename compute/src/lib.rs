//! relstore Compute
//!
//! Schedule recomputation of computed and related fields.
//!
//! Responsibilities:
//! - Expand a field change into the derived fields it affects
//! - Queue each affected (record, field) once per pass
//! - Detect compute chains that feed back into themselves
//! - Bound the number of computes per pass

mod dependents;
mod error;
mod scheduler;

pub use dependents::{affected_fields, direct_dependencies};
pub use error::{ComputeError, ComputeResult};
pub use scheduler::{FieldRef, PendingCompute, Scheduler};

/// Default maximum number of computes run in one flush.
pub const MAX_COMPUTE_STEPS: usize = 10_000;
