//! Records and their field slots.

use relstore_core::{FieldId, FieldValue, LocalId, ModelId, Value};
use relstore_registry::{FieldKind, ModelDef};
use std::collections::HashSet;

/// Ordered set of record ids. Insertion order is preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    order: Vec<LocalId>,
    members: HashSet<LocalId>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &LocalId) -> bool {
        self.members.contains(id)
    }

    /// Append `id` unless already present. Returns true if it was added.
    pub fn insert(&mut self, id: LocalId) -> bool {
        if !self.members.insert(id.clone()) {
            return false;
        }
        self.order.push(id);
        true
    }

    /// Remove `id`. Returns true if it was present.
    pub fn remove(&mut self, id: &LocalId) -> bool {
        if !self.members.remove(id) {
            return false;
        }
        self.order.retain(|other| other != id);
        true
    }

    /// Rewrite the order to `order`, which must hold the current members.
    ///
    /// Ids that are not members are ignored and members missing from
    /// `order` keep their relative order at the end.
    pub fn reorder(&mut self, order: &[LocalId]) {
        let mut next: Vec<LocalId> = Vec::with_capacity(self.order.len());
        let mut seen: HashSet<&LocalId> = HashSet::new();
        for id in order {
            if self.members.contains(id) && seen.insert(id) {
                next.push(id.clone());
            }
        }
        for id in &self.order {
            if !seen.contains(id) {
                next.push(id.clone());
            }
        }
        self.order = next;
    }

    pub fn iter(&self) -> impl Iterator<Item = &LocalId> {
        self.order.iter()
    }

    pub fn as_slice(&self) -> &[LocalId] {
        &self.order
    }

    pub fn to_vec(&self) -> Vec<LocalId> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Current value of one field on one record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordField {
    Attribute(Value),
    X2One(Option<LocalId>),
    X2Many(RecordSet),
}

impl RecordField {
    /// Snapshot of the value.
    pub fn read(&self) -> FieldValue {
        match self {
            RecordField::Attribute(value) => FieldValue::Attr(value.clone()),
            RecordField::X2One(target) => FieldValue::One(target.clone()),
            RecordField::X2Many(targets) => FieldValue::Many(targets.to_vec()),
        }
    }

    /// Every record id currently linked through this field.
    pub fn linked(&self) -> Vec<LocalId> {
        match self {
            RecordField::Attribute(_) => Vec::new(),
            RecordField::X2One(target) => target.iter().cloned().collect(),
            RecordField::X2Many(targets) => targets.to_vec(),
        }
    }

    pub fn is_linked_to(&self, id: &LocalId) -> bool {
        match self {
            RecordField::Attribute(_) => false,
            RecordField::X2One(target) => target.as_ref() == Some(id),
            RecordField::X2Many(targets) => targets.contains(id),
        }
    }
}

/// A record: one slot per field of its model, indexed by `FieldId`.
#[derive(Debug, Clone)]
pub struct Record {
    pub local_id: LocalId,
    pub model: ModelId,
    fields: Vec<RecordField>,
}

impl Record {
    /// A record with every attribute at its default and every relation empty.
    pub fn blank(local_id: LocalId, model: &ModelDef) -> Self {
        let fields = model
            .fields
            .iter()
            .map(|field| match field.kind {
                FieldKind::Attribute => RecordField::Attribute(field.default.clone()),
                FieldKind::Relation(relation) if relation.is_x2one() => RecordField::X2One(None),
                FieldKind::Relation(_) => RecordField::X2Many(RecordSet::new()),
            })
            .collect();
        Self {
            local_id,
            model: model.id,
            fields,
        }
    }

    pub fn field(&self, id: FieldId) -> Option<&RecordField> {
        self.fields.get(id.index())
    }

    pub fn field_mut(&mut self, id: FieldId) -> Option<&mut RecordField> {
        self.fields.get_mut(id.index())
    }

    pub fn fields(&self) -> &[RecordField] {
        &self.fields
    }
}
