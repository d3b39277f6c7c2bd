//! Expansion of field changes into affected derived fields.

use relstore_core::{FieldId, LocalId};
use relstore_graph::RecordStore;
use relstore_registry::{DependencyRef, Registry};

use crate::FieldRef;

/// Derived fields to recompute after `field` changed on `record`.
///
/// Dependents on the record itself are returned as is; dependents reached
/// through a relation are resolved by reading the inverse of that relation
/// on the changed record.
pub fn affected_fields(
    registry: &Registry,
    store: &RecordStore,
    record: &LocalId,
    field: FieldId,
) -> Vec<FieldRef> {
    let Some(rec) = store.get(record) else {
        return Vec::new();
    };
    let mut affected = Vec::new();
    for dependent in registry.dependents(rec.model, field) {
        match dependent.via {
            None => affected.push(FieldRef::new(record.clone(), dependent.field)),
            Some(via) => {
                if let Some(slot) = rec.field(via) {
                    affected.extend(
                        slot.linked()
                            .into_iter()
                            .map(|target| FieldRef::new(target, dependent.field)),
                    );
                }
            }
        }
    }
    affected
}

/// The fields a derived field of `record` directly reads.
pub fn direct_dependencies(
    registry: &Registry,
    store: &RecordStore,
    record: &LocalId,
    field: FieldId,
) -> Vec<FieldRef> {
    let Some(rec) = store.get(record) else {
        return Vec::new();
    };
    let mut deps = Vec::new();
    for dependency in registry.dependencies(rec.model, field) {
        match *dependency {
            DependencyRef::Local(source) => deps.push(FieldRef::new(record.clone(), source)),
            DependencyRef::Through {
                relation,
                field: source,
            } => {
                if let Some(slot) = rec.field(relation) {
                    deps.extend(
                        slot.linked()
                            .into_iter()
                            .map(|target| FieldRef::new(target, source)),
                    );
                }
            }
        }
    }
    deps
}
