//! UNLINK operation - removes targets from a relational field.

use std::slice;

use log::trace;
use relstore_core::{FieldId, LocalId};
use relstore_graph::RecordField;

use super::delete::delete;
use super::{linked, relation, InverseMode, Relation};
use crate::error::MutationResult;
use crate::event::MutationEvent;
use crate::executor::MutationExecutor;

/// Unlink `targets` from `field` of `record`. Returns whether the field changed.
///
/// On x2one fields the current target is unlinked whatever `targets` holds.
pub(crate) fn unlink(
    exec: &mut MutationExecutor,
    record: &LocalId,
    field: FieldId,
    targets: &[LocalId],
    mode: &InverseMode,
) -> MutationResult<bool> {
    let rel = relation(exec, record, field)?;
    if rel.relation.is_x2one() {
        unlink_x2one(exec, record, &rel, mode)
    } else {
        unlink_x2many(exec, record, &rel, targets, mode)
    }
}

/// Unlink every current target of `field`.
pub(crate) fn unlink_all(
    exec: &mut MutationExecutor,
    record: &LocalId,
    field: FieldId,
    mode: &InverseMode,
) -> MutationResult<bool> {
    let rel = relation(exec, record, field)?;
    if rel.relation.is_x2one() {
        unlink_x2one(exec, record, &rel, mode)
    } else {
        let current = linked(exec, record, field)?;
        unlink_x2many(exec, record, &rel, &current, mode)
    }
}

pub(crate) fn unlink_x2one(
    exec: &mut MutationExecutor,
    record: &LocalId,
    rel: &Relation,
    mode: &InverseMode,
) -> MutationResult<bool> {
    let previous = match exec.store.field_mut(record, rel.field)? {
        RecordField::X2One(slot) => slot.take(),
        _ => None,
    };
    let Some(previous) = previous else {
        return Ok(false);
    };
    on_unlinked(exec, record, rel, &previous, mode);
    exec.mark_updated(record, rel.field)?;

    if mode.reaches(&previous) && exec.store.contains(&previous) {
        unlink(
            exec,
            &previous,
            rel.inverse,
            slice::from_ref(record),
            &InverseMode::mirror(record),
        )?;
        if rel.is_causal {
            trace!(
                "event=causal_delete module=mutation record={} field={} target={}",
                record,
                rel.field_name,
                previous
            );
            delete(exec, &previous)?;
        }
    }
    Ok(true)
}

pub(crate) fn unlink_x2many(
    exec: &mut MutationExecutor,
    record: &LocalId,
    rel: &Relation,
    targets: &[LocalId],
    mode: &InverseMode,
) -> MutationResult<bool> {
    let mut changed = false;
    for target in targets {
        // A causal cascade may have removed the record itself.
        if !exec.store.contains(record) {
            break;
        }
        let removed = match exec.store.field_mut(record, rel.field)? {
            RecordField::X2Many(set) => set.remove(target),
            _ => false,
        };
        if !removed {
            continue;
        }
        changed = true;
        on_unlinked(exec, record, rel, target, mode);

        if mode.reaches(target) && exec.store.contains(target) {
            unlink(
                exec,
                target,
                rel.inverse,
                slice::from_ref(record),
                &InverseMode::mirror(record),
            )?;
            if rel.is_causal {
                trace!(
                    "event=causal_delete module=mutation record={} field={} target={}",
                    record,
                    rel.field_name,
                    target
                );
                delete(exec, target)?;
            }
        }
    }
    if changed {
        exec.mark_updated(record, rel.field)?;
    }
    Ok(changed)
}

fn on_unlinked(
    exec: &mut MutationExecutor,
    record: &LocalId,
    rel: &Relation,
    target: &LocalId,
    mode: &InverseMode,
) {
    trace!(
        "event=unlink module=mutation record={} field={} target={} mirrored={}",
        record,
        rel.field_name,
        target,
        mode.is_mirror()
    );
    exec.record_event(MutationEvent::Unlinked {
        record: record.clone(),
        field: rel.field_name.clone(),
        target: target.clone(),
        mirrored: mode.is_mirror(),
    });
}
