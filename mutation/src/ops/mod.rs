//! Mutation operation implementations.
//!
//! Each operation is implemented in its own module. Relational operations
//! take an `InverseMode` telling them whether the write is requested by a
//! caller or is itself the inverse side of another write.

mod compute;
mod create;
mod delete;
mod link;
mod replace;
mod set;
mod unlink;

pub(crate) use compute::compute;
pub(crate) use create::{create_record, identify, insert_record};
pub(crate) use delete::delete;
pub(crate) use set::{apply_data, set};

use relstore_core::{FieldId, LocalId, ModelId};
use relstore_registry::RelationType;

use crate::error::{MutationError, MutationResult};
use crate::executor::MutationExecutor;

/// How a relational write treats the inverse side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InverseMode {
    /// Mirror every change onto the inverse field of the targets.
    Update,
    /// This write mirrors a change made on `origin`: never write back to it.
    Mirror { origin: LocalId },
}

impl InverseMode {
    pub fn mirror(origin: &LocalId) -> Self {
        InverseMode::Mirror {
            origin: origin.clone(),
        }
    }

    /// Whether inverse updates and causal deletion apply to `target`.
    pub fn reaches(&self, target: &LocalId) -> bool {
        match self {
            InverseMode::Update => true,
            InverseMode::Mirror { origin } => origin != target,
        }
    }

    pub fn is_mirror(&self) -> bool {
        matches!(self, InverseMode::Mirror { .. })
    }
}

/// Resolved schema of a relational field of a record.
#[derive(Debug, Clone)]
pub(crate) struct Relation {
    pub field: FieldId,
    pub model_name: String,
    pub field_name: String,
    pub relation: RelationType,
    pub rel_model: ModelId,
    pub rel_model_name: String,
    pub inverse: FieldId,
    pub is_causal: bool,
}

impl Relation {
    pub fn invalid(&self, message: impl Into<String>) -> MutationError {
        MutationError::invalid_relational_value(&self.model_name, &self.field_name, message)
    }
}

/// Resolve `field` of `record` as a relation.
pub(crate) fn relation(
    exec: &MutationExecutor,
    record: &LocalId,
    field: FieldId,
) -> MutationResult<Relation> {
    let model = exec.model_of(record)?;
    let model_def = exec.model_def(model)?;
    let def = model_def
        .field(field)
        .ok_or_else(|| MutationError::unknown_field(&model_def.name, field.to_string()))?;
    let relation = def.relation_type().ok_or_else(|| {
        MutationError::invalid_command(&model_def.name, &def.name, "relational command")
    })?;
    let (rel_model, inverse) = exec.registry.inverse_of(model, field).ok_or_else(|| {
        MutationError::unknown_field(
            def.rel_model.clone().unwrap_or_default(),
            def.inverse.clone().unwrap_or_default(),
        )
    })?;
    Ok(Relation {
        field,
        model_name: model_def.name.clone(),
        field_name: def.name.clone(),
        relation,
        rel_model,
        rel_model_name: def.rel_model.clone().unwrap_or_default(),
        inverse: inverse.id,
        is_causal: def.is_causal,
    })
}

/// Every target must exist, belong to the related model and not be on its
/// way out.
pub(crate) fn verify_targets(
    exec: &MutationExecutor,
    rel: &Relation,
    targets: &[LocalId],
) -> MutationResult<()> {
    for target in targets {
        let Some(record) = exec.store.get(target) else {
            return Err(rel.invalid(format!("record {} does not exist", target)));
        };
        if record.model != rel.rel_model {
            return Err(rel.invalid(format!(
                "record {} is not a {}",
                target, rel.rel_model_name
            )));
        }
        if exec.deleting.contains(target) {
            return Err(rel.invalid(format!("record {} is being deleted", target)));
        }
    }
    Ok(())
}

/// Current targets of a relational field.
pub(crate) fn linked(
    exec: &MutationExecutor,
    record: &LocalId,
    field: FieldId,
) -> MutationResult<Vec<LocalId>> {
    Ok(exec.store.field(record, field)?.linked())
}
