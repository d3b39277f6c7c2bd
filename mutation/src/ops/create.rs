//! CREATE and INSERT operations - add records to the store.

use std::sync::Arc;

use log::debug;
use relstore_compute::FieldRef;
use relstore_core::{Data, FieldInput, LocalId, ModelId};
use relstore_graph::Record;
use relstore_registry::ModelDef;

use super::set::{apply_data, set};
use super::InverseMode;
use crate::error::{MutationError, MutationResult};
use crate::event::MutationEvent;
use crate::executor::MutationExecutor;

/// The id `data` identifies on `model`.
///
/// None if the model has no identifying fields or `data` lacks a value for
/// one of them.
pub(crate) fn identify(model: &ModelDef, data: &Data) -> Option<LocalId> {
    if model.identifying.is_empty() {
        return None;
    }
    let mut fragments = Vec::with_capacity(model.identifying.len());
    for field in &model.identifying {
        let name = &model.field(*field)?.name;
        fragments.push(data.value(name)?.key_fragment()?);
    }
    Some(LocalId::identified(&model.name, &fragments))
}

/// Create a new record of `model`.
///
/// Relational defaults are applied first, then `data`. Every derived field
/// is scheduled for its first computation.
pub(crate) fn create_record(
    exec: &mut MutationExecutor,
    model: ModelId,
    data: &Data,
) -> MutationResult<LocalId> {
    let registry = Arc::clone(&exec.registry);
    let model_def = registry
        .get_model(model)
        .ok_or_else(|| MutationError::unknown_model(model.to_string()))?;

    let id = match identify(model_def, data) {
        Some(id) => id,
        None => exec.store.next_local_id(model_def),
    };
    if exec.store.contains(&id) {
        return Err(MutationError::DuplicateRecord(id));
    }
    exec.store.insert(Record::blank(id.clone(), model_def))?;
    debug!(
        "event=create module=mutation model={} record={}",
        model_def.name, id
    );
    exec.record_event(MutationEvent::Created { record: id.clone() });

    for field in model_def.relational_fields() {
        if field.default_commands.is_empty() {
            continue;
        }
        let input = FieldInput::Commands(field.default_commands.clone());
        set(exec, &id, field.id, &input, &InverseMode::Update)?;
    }
    apply_data(exec, &id, data)?;

    if exec.store.contains(&id) {
        for field in model_def.derived_fields() {
            exec.scheduler
                .enqueue_fresh(FieldRef::new(id.clone(), field.id));
        }
    }
    Ok(id)
}

/// Update the record `data` identifies, or create it.
pub(crate) fn insert_record(
    exec: &mut MutationExecutor,
    model: ModelId,
    data: &Data,
) -> MutationResult<LocalId> {
    let existing = exec
        .registry
        .get_model(model)
        .and_then(|model_def| identify(model_def, data))
        .filter(|id| exec.store.contains(id));
    match existing {
        Some(id) => {
            apply_data(exec, &id, data)?;
            Ok(id)
        }
        None => create_record(exec, model, data),
    }
}
