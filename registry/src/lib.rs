//! relstore Registry
//!
//! Model and field schema for the record store.
//!
//! Responsibilities:
//! - Declare models and their attribute and relational fields
//! - Validate relations, inverses, causal flags and related paths
//! - Generate missing inverse fields
//! - Index which derived fields depend on which fields

mod builder;
mod error;
mod registry;
mod types;

pub use builder::{ModelBuilder, RegistryBuilder};
pub use error::{RegistryError, RegistryResult};
pub use registry::Registry;
pub use types::*;
