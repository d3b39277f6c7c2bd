//! SET operation - applies field inputs to a record.

use std::sync::Arc;

use log::trace;
use relstore_core::{Data, FieldCommand, FieldId, FieldInput, LocalId, Value};
use relstore_graph::RecordField;

use super::create::{create_record, insert_record};
use super::link::link;
use super::replace::replace;
use super::unlink::{unlink, unlink_all};
use super::{relation, InverseMode};
use crate::error::{MutationError, MutationResult};
use crate::event::MutationEvent;
use crate::executor::MutationExecutor;

/// Apply every entry of `data` to `record`, in order.
pub(crate) fn apply_data(
    exec: &mut MutationExecutor,
    record: &LocalId,
    data: &Data,
) -> MutationResult<bool> {
    let registry = Arc::clone(&exec.registry);
    let model = exec.model_of(record)?;
    let model_def = registry
        .get_model(model)
        .ok_or_else(|| MutationError::unknown_model(model.to_string()))?;

    let mut changed = false;
    for (name, input) in data.iter() {
        let field = model_def
            .field_id(name)
            .ok_or_else(|| MutationError::unknown_field(&model_def.name, name))?;
        changed |= set(exec, record, field, input, &InverseMode::Update)?;
    }
    Ok(changed)
}

/// Apply one input to one field. Returns whether anything changed.
pub(crate) fn set(
    exec: &mut MutationExecutor,
    record: &LocalId,
    field: FieldId,
    input: &FieldInput,
    mode: &InverseMode,
) -> MutationResult<bool> {
    match input {
        FieldInput::Value(value) => {
            let registry = Arc::clone(&exec.registry);
            let model = exec.model_of(record)?;
            let def = registry
                .get_field(model, field)
                .ok_or_else(|| MutationError::unknown_field(model.to_string(), field.to_string()))?;
            if def.is_relation() {
                return Err(MutationError::unsupported_direct_assignment(
                    exec.model_def(model)?.name.clone(),
                    &def.name,
                ));
            }
            set_attribute(exec, record, field, value.clone())
        }
        FieldInput::Command(command) => apply(exec, record, field, command, mode),
        FieldInput::Commands(commands) => {
            let mut changed = false;
            for command in commands {
                changed |= apply(exec, record, field, command, mode)?;
            }
            Ok(changed)
        }
    }
}

fn apply(
    exec: &mut MutationExecutor,
    record: &LocalId,
    field: FieldId,
    command: &FieldCommand,
    mode: &InverseMode,
) -> MutationResult<bool> {
    let registry = Arc::clone(&exec.registry);
    let model = exec.model_of(record)?;
    let model_def = registry
        .get_model(model)
        .ok_or_else(|| MutationError::unknown_model(model.to_string()))?;
    let def = model_def
        .field(field)
        .ok_or_else(|| MutationError::unknown_field(&model_def.name, field.to_string()))?;

    trace!(
        "event=command module=mutation record={} field={} command={}",
        record,
        def.name,
        command.verb()
    );

    if !def.is_relation() {
        return match command {
            FieldCommand::Clear => set_attribute(exec, record, field, def.default.clone()),
            other => Err(MutationError::invalid_command(
                &model_def.name,
                &def.name,
                other.verb(),
            )),
        };
    }

    match command {
        FieldCommand::Link(targets) => link(exec, record, field, targets, mode),
        FieldCommand::Unlink(targets) => unlink(exec, record, field, targets, mode),
        FieldCommand::UnlinkAll => unlink_all(exec, record, field, mode),
        FieldCommand::Clear => {
            let mut changed = unlink_all(exec, record, field, mode)?;
            if !def.default_commands.is_empty() && exec.store.contains(record) {
                let defaults = FieldInput::Commands(def.default_commands.clone());
                changed |= set(exec, record, field, &defaults, mode)?;
            }
            Ok(changed)
        }
        FieldCommand::Replace(targets) => replace(exec, record, field, targets, mode),
        FieldCommand::Create(items) => {
            let rel = relation(exec, record, field)?;
            let mut created = Vec::with_capacity(items.len());
            for item in items {
                created.push(create_record(exec, rel.rel_model, item)?);
            }
            link(exec, record, field, &created, mode)
        }
        FieldCommand::Insert(items) => {
            let rel = relation(exec, record, field)?;
            let mut inserted = Vec::with_capacity(items.len());
            for item in items {
                inserted.push(insert_record(exec, rel.rel_model, item)?);
            }
            link(exec, record, field, &inserted, mode)
        }
        FieldCommand::InsertAndReplace(items) => {
            let rel = relation(exec, record, field)?;
            let mut inserted = Vec::with_capacity(items.len());
            for item in items {
                inserted.push(insert_record(exec, rel.rel_model, item)?);
            }
            replace(exec, record, field, &inserted, mode)
        }
    }
}

/// Store a plain value. Equal values are a no-op.
fn set_attribute(
    exec: &mut MutationExecutor,
    record: &LocalId,
    field: FieldId,
    value: Value,
) -> MutationResult<bool> {
    let model = exec.model_of(record)?;
    let identifying = exec.model_def(model)?.identifying.contains(&field);
    let name = exec.field_name(model, field);
    let slot = exec.store.field_mut(record, field)?;
    match slot {
        RecordField::Attribute(current) if *current == value => return Ok(false),
        // The record key is derived once, at creation.
        RecordField::Attribute(current) if identifying && !current.is_null() => {
            return Err(MutationError::IdentityChange {
                record: record.clone(),
                field: name,
            });
        }
        RecordField::Attribute(current) => *current = value,
        _ => return Ok(false),
    }

    trace!(
        "event=set module=mutation record={} field={}",
        record,
        name
    );
    exec.record_event(MutationEvent::Set {
        record: record.clone(),
        field: name,
    });
    exec.mark_updated(record, field)?;
    Ok(true)
}
