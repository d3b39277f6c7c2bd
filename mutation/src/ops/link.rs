//! LINK operation - adds targets to a relational field.

use std::slice;

use log::trace;
use relstore_core::{FieldId, LocalId};
use relstore_graph::RecordField;

use super::unlink::unlink_x2one;
use super::{relation, verify_targets, InverseMode, Relation};
use crate::error::{MutationError, MutationResult};
use crate::event::MutationEvent;
use crate::executor::MutationExecutor;

/// Link `targets` through `field` of `record`. Returns whether the field changed.
pub(crate) fn link(
    exec: &mut MutationExecutor,
    record: &LocalId,
    field: FieldId,
    targets: &[LocalId],
    mode: &InverseMode,
) -> MutationResult<bool> {
    let rel = relation(exec, record, field)?;
    verify_targets(exec, &rel, targets)?;
    if rel.relation.is_x2one() {
        link_x2one(exec, record, &rel, targets, mode)
    } else {
        link_x2many(exec, record, &rel, targets, mode)
    }
}

/// Set the single target, unlinking the previous one first.
fn link_x2one(
    exec: &mut MutationExecutor,
    record: &LocalId,
    rel: &Relation,
    targets: &[LocalId],
    mode: &InverseMode,
) -> MutationResult<bool> {
    let [target] = targets else {
        return Err(rel.invalid(format!(
            "expected exactly one record, got {}",
            targets.len()
        )));
    };

    let current = match exec.store.field(record, rel.field)? {
        RecordField::X2One(current) => current.clone(),
        _ => None,
    };
    if current.as_ref() == Some(target) {
        return Ok(false);
    }
    if current.is_some() {
        unlink_x2one(exec, record, rel, mode)?;
    }
    if !exec.store.contains(record) {
        return Err(MutationError::RecordDeleted(record.clone()));
    }
    if !exec.store.contains(target) {
        return Err(rel.invalid(format!("record {} was deleted while linking", target)));
    }

    *exec.store.field_mut(record, rel.field)? = RecordField::X2One(Some(target.clone()));
    on_linked(exec, record, rel, target, mode);
    exec.mark_updated(record, rel.field)?;

    if mode.reaches(target) {
        link(
            exec,
            target,
            rel.inverse,
            slice::from_ref(record),
            &InverseMode::mirror(record),
        )?;
    }
    Ok(true)
}

/// Append every target not already present, in call order.
pub(crate) fn link_x2many(
    exec: &mut MutationExecutor,
    record: &LocalId,
    rel: &Relation,
    targets: &[LocalId],
    mode: &InverseMode,
) -> MutationResult<bool> {
    let mut changed = false;
    for target in targets {
        let added = match exec.store.field_mut(record, rel.field)? {
            RecordField::X2Many(set) => set.insert(target.clone()),
            _ => false,
        };
        if !added {
            continue;
        }
        changed = true;
        on_linked(exec, record, rel, target, mode);

        if mode.reaches(target) && exec.store.contains(target) {
            link(
                exec,
                target,
                rel.inverse,
                slice::from_ref(record),
                &InverseMode::mirror(record),
            )?;
        }
    }
    if changed {
        exec.mark_updated(record, rel.field)?;
    }
    Ok(changed)
}

fn on_linked(
    exec: &mut MutationExecutor,
    record: &LocalId,
    rel: &Relation,
    target: &LocalId,
    mode: &InverseMode,
) {
    trace!(
        "event=link module=mutation record={} field={} target={} mirrored={}",
        record,
        rel.field_name,
        target,
        mode.is_mirror()
    );
    exec.record_event(MutationEvent::Linked {
        record: record.clone(),
        field: rel.field_name.clone(),
        target: target.clone(),
        mirrored: mode.is_mirror(),
    });
}
