//! REPLACE operation - makes a relation hold exactly the given targets.

use std::collections::HashSet;

use relstore_core::{FieldId, LocalId};
use relstore_graph::RecordField;

use super::link::{link, link_x2many};
use super::unlink::{unlink_x2many, unlink_x2one};
use super::{linked, relation, verify_targets, InverseMode};
use crate::error::MutationResult;
use crate::event::MutationEvent;
use crate::executor::MutationExecutor;

/// Replace the targets of `field` with `targets`.
///
/// Only the difference is linked and unlinked, so targets kept in place see
/// no inverse update. If only the order differs, the relation is reordered
/// without any link or unlink. Duplicate targets keep their first position.
pub(crate) fn replace(
    exec: &mut MutationExecutor,
    record: &LocalId,
    field: FieldId,
    targets: &[LocalId],
    mode: &InverseMode,
) -> MutationResult<bool> {
    let rel = relation(exec, record, field)?;
    if rel.relation.is_x2one() {
        if targets.is_empty() {
            return unlink_x2one(exec, record, &rel, mode);
        }
        return link(exec, record, field, targets, mode);
    }
    verify_targets(exec, &rel, targets)?;

    let mut wanted: HashSet<&LocalId> = HashSet::new();
    let mut desired: Vec<LocalId> = Vec::with_capacity(targets.len());
    for target in targets {
        if wanted.insert(target) {
            desired.push(target.clone());
        }
    }

    let current = linked(exec, record, field)?;
    let present: HashSet<&LocalId> = current.iter().collect();
    let to_link: Vec<LocalId> = desired
        .iter()
        .filter(|target| !present.contains(target))
        .cloned()
        .collect();
    let to_unlink: Vec<LocalId> = current
        .iter()
        .filter(|target| !wanted.contains(target))
        .cloned()
        .collect();

    let mut changed = link_x2many(exec, record, &rel, &to_link, mode)?;
    changed |= unlink_x2many(exec, record, &rel, &to_unlink, mode)?;
    if !exec.store.contains(record) {
        return Ok(changed);
    }

    let reordered = match exec.store.field_mut(record, rel.field)? {
        RecordField::X2Many(set) => {
            let before = set.to_vec();
            set.reorder(&desired);
            set.as_slice() != before.as_slice()
        }
        _ => false,
    };
    if reordered {
        exec.record_event(MutationEvent::Reordered {
            record: record.clone(),
            field: rel.field_name.clone(),
        });
        exec.mark_updated(record, rel.field)?;
        changed = true;
    }
    Ok(changed)
}
