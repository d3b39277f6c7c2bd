//! relstore Core Types
//!
//! This crate provides the foundational types shared by every relstore crate:
//! - Identity types (LocalId, ModelId, FieldId)
//! - Attribute values (the Value enum) and JSON payload conversion
//! - The field command language (FieldCommand, FieldInput, Data)
//! - Read-side views (FieldValue, RecordRead, RecordView)

mod command;
mod id;
mod read;
mod value;

pub use command::*;
pub use id::*;
pub use read::*;
pub use value::*;
