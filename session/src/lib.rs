//! relstore Session
//!
//! The store as seen by its collaborators.
//!
//! Responsibilities:
//! - Own the registry and the mutation engine
//! - Resolve model and field names at the boundary
//! - Group updates into batches (one recompute pass per batch)
//! - Force pending computes on read
//! - Guard continuations of asynchronous work against deleted records

mod config;
mod error;
mod session;
mod suspend;

pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use session::{FieldKey, Session};
pub use suspend::{Resumed, Suspended};

pub use relstore_core::{
    clear, create, data, insert, insert_and_replace, link, replace, unlink, unlink_all, Data,
    FieldCommand, FieldInput, FieldValue, LocalId, RecordView, Value,
};
pub use relstore_graph::Record;
pub use relstore_mutation::{MutationError, MutationEvent};
pub use relstore_registry::{FieldDef, Registry, RegistryBuilder};
