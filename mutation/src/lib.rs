//! relstore Mutation
//!
//! Execute writes on records: field commands, create, insert, update, delete.
//!
//! Responsibilities:
//! - Interpret field commands on attribute and relational fields
//! - Keep both sides of every relation consistent
//! - Delete records reached through causal fields
//! - Schedule and run derived-field recomputes at the end of each update
//!
//! # Module Structure
//!
//! - `executor` - Main MutationExecutor that owns the store and coordinates operations
//! - `ops/` - Individual operation implementations (set, link, unlink, replace, create, delete, compute)
//! - `event` - Journal of applied changes
//! - `error` - Error types for mutation failures

mod error;
mod event;
mod executor;
mod ops;

pub use error::{MutationError, MutationResult};
pub use event::MutationEvent;
pub use executor::MutationExecutor;
pub use ops::InverseMode;

pub use relstore_compute::MAX_COMPUTE_STEPS;
