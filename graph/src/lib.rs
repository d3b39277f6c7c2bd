//! relstore Graph
//!
//! The record arena: every live record, owned by id.
//!
//! Responsibilities:
//! - Store records and their field slots
//! - Keep relations as ordered sets of record ids
//! - Index records by model
//! - Allocate record keys

mod error;
mod index;
mod record;
mod store;

pub use error::{GraphError, GraphResult};
pub use index::ModelIndex;
pub use record::{Record, RecordField, RecordSet};
pub use store::{RecordStore, StoreReader};
