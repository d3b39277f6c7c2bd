//! COMPUTE operation - evaluates computed and related fields.

use std::sync::Arc;

use log::trace;
use relstore_core::{FieldCommand, FieldId, FieldInput, FieldValue, LocalId, RecordView, Value};
use relstore_graph::StoreReader;
use relstore_registry::{FieldDef, Registry};

use super::set::set;
use super::InverseMode;
use crate::error::{MutationError, MutationResult};
use crate::event::MutationEvent;
use crate::executor::MutationExecutor;

/// Evaluate the derived `field` of `record` and store the result.
///
/// Fields that are neither computed nor related are left untouched.
pub(crate) fn compute(
    exec: &mut MutationExecutor,
    record: &LocalId,
    field: FieldId,
) -> MutationResult<bool> {
    let registry = Arc::clone(&exec.registry);
    let model = exec.model_of(record)?;
    let model_def = registry
        .get_model(model)
        .ok_or_else(|| MutationError::unknown_model(model.to_string()))?;
    let def = model_def
        .field(field)
        .ok_or_else(|| MutationError::unknown_field(&model_def.name, field.to_string()))?;

    let input = if def.related.is_some() {
        related_input(exec, &registry, record, def)?
    } else if let Some(compute) = &def.compute {
        let reader = StoreReader::new(&registry, &exec.store);
        (compute.func)(&RecordView::new(record, &reader))
    } else {
        return Ok(false);
    };

    trace!(
        "event=compute module=mutation record={} field={}",
        record,
        def.name
    );
    let changed = set(exec, record, field, &input, &InverseMode::Update)?;
    exec.record_event(MutationEvent::Computed {
        record: record.clone(),
        field: def.name.clone(),
    });
    Ok(changed)
}

/// Follow `relation.field` from `record` and turn the reached value into an
/// input for `def`.
///
/// Through an x2one hop the value is copied; an empty hop restores the
/// default or empties the relation. Through an x2many hop relational values
/// are gathered into one replace and attribute values into a list.
fn related_input(
    exec: &MutationExecutor,
    registry: &Registry,
    record: &LocalId,
    def: &FieldDef,
) -> MutationResult<FieldInput> {
    let model = exec.model_of(record)?;
    let model_def = exec.model_def(model)?;
    let Some((relation_name, field_name)) = def.related_path() else {
        return Ok(FieldInput::Command(FieldCommand::Clear));
    };
    let hop = model_def
        .field_by_name(relation_name)
        .ok_or_else(|| MutationError::unknown_field(&model_def.name, relation_name))?;
    let target_model = registry
        .rel_model_of(hop)
        .ok_or_else(|| MutationError::unknown_field(&model_def.name, relation_name))?;
    let target_field = target_model
        .field_id(field_name)
        .ok_or_else(|| MutationError::unknown_field(&target_model.name, field_name))?;

    let reached: Vec<FieldValue> = exec
        .store
        .read(record, hop.id)?
        .into_ids()
        .iter()
        .filter_map(|target| exec.store.read(target, target_field).ok())
        .collect();

    if hop.is_x2one() {
        return Ok(match reached.into_iter().next() {
            None if def.is_relation() => FieldInput::Command(FieldCommand::UnlinkAll),
            None => FieldInput::Command(FieldCommand::Clear),
            Some(FieldValue::Attr(value)) => FieldInput::Value(value),
            Some(other) => FieldInput::Command(FieldCommand::Replace(other.into_ids())),
        });
    }

    if def.is_relation() {
        let targets = reached.into_iter().flat_map(FieldValue::into_ids).collect();
        return Ok(FieldInput::Command(FieldCommand::Replace(targets)));
    }
    let mut values = Vec::new();
    for value in reached {
        match value {
            FieldValue::Attr(Value::Null) => {}
            FieldValue::Attr(Value::List(items)) => values.extend(items),
            FieldValue::Attr(value) => values.push(value),
            other => values.extend(
                other
                    .into_ids()
                    .into_iter()
                    .map(|id| Value::String(id.to_string())),
            ),
        }
    }
    Ok(FieldInput::Value(Value::List(values)))
}
