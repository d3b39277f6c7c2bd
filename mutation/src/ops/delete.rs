//! DELETE operation - removes a record and detaches it from its relations.

use std::sync::Arc;

use log::debug;
use relstore_core::LocalId;

use super::unlink::unlink_all;
use super::InverseMode;
use crate::error::MutationResult;
use crate::event::MutationEvent;
use crate::executor::MutationExecutor;

/// Delete `record`. Returns false if it does not exist or is already being
/// deleted.
///
/// Every relation is unlinked first with inverse updates, so causal targets
/// are deleted along the way.
pub(crate) fn delete(exec: &mut MutationExecutor, record: &LocalId) -> MutationResult<bool> {
    if !exec.store.contains(record) || exec.deleting.contains(record) {
        return Ok(false);
    }
    exec.deleting.insert(record.clone());
    let result = detach(exec, record);
    exec.deleting.remove(record);
    result?;

    if exec.store.contains(record) {
        exec.store.remove(record)?;
    }
    exec.scheduler.purge_record(record);
    debug!("event=delete module=mutation record={}", record);
    exec.record_event(MutationEvent::Deleted {
        record: record.clone(),
    });
    Ok(true)
}

fn detach(exec: &mut MutationExecutor, record: &LocalId) -> MutationResult<()> {
    let registry = Arc::clone(&exec.registry);
    let model = exec.model_of(record)?;
    let Some(model_def) = registry.get_model(model) else {
        return Ok(());
    };
    for field in model_def.relational_fields() {
        if !exec.store.contains(record) {
            break;
        }
        unlink_all(exec, record, field.id, &InverseMode::Update)?;
    }
    Ok(())
}
