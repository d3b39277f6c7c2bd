//! Read-side views over records.

use crate::{LocalId, Value};

/// Snapshot of the current value of one field.
///
/// x2many values are returned as an owned, ordered list; callers never see
/// the live set held by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Attribute value.
    Attr(Value),
    /// x2one target.
    One(Option<LocalId>),
    /// x2many targets, in relation order.
    Many(Vec<LocalId>),
}

impl FieldValue {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            FieldValue::Attr(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_one(&self) -> Option<&LocalId> {
        match self {
            FieldValue::One(target) => target.as_ref(),
            _ => None,
        }
    }

    pub fn as_many(&self) -> Option<&[LocalId]> {
        match self {
            FieldValue::Many(targets) => Some(targets),
            _ => None,
        }
    }

    /// Every record id held by this value, in order.
    pub fn into_ids(self) -> Vec<LocalId> {
        match self {
            FieldValue::Attr(_) => Vec::new(),
            FieldValue::One(target) => target.into_iter().collect(),
            FieldValue::Many(targets) => targets,
        }
    }
}

/// Read access to records by field name.
pub trait RecordRead {
    /// Whether the record currently exists.
    fn exists(&self, record: &LocalId) -> bool;

    /// Current value of `field` on `record`, or None if either is unknown.
    fn read_field(&self, record: &LocalId, field: &str) -> Option<FieldValue>;
}

/// A read view of one record, handed to compute functions and finders.
///
/// Unknown fields read as null / empty.
pub struct RecordView<'a> {
    record: &'a LocalId,
    reader: &'a dyn RecordRead,
}

impl<'a> RecordView<'a> {
    pub fn new(record: &'a LocalId, reader: &'a dyn RecordRead) -> Self {
        Self { record, reader }
    }

    /// The record being viewed.
    pub fn id(&self) -> &LocalId {
        self.record
    }

    /// Raw field value.
    pub fn get(&self, field: &str) -> Option<FieldValue> {
        self.reader.read_field(self.record, field)
    }

    /// Attribute value of a field, Null if not an attribute.
    pub fn attr(&self, field: &str) -> Value {
        self.attr_of(self.record, field)
    }

    /// x2one target of a field.
    pub fn one(&self, field: &str) -> Option<LocalId> {
        self.one_of(self.record, field)
    }

    /// x2many targets of a field.
    pub fn many(&self, field: &str) -> Vec<LocalId> {
        self.many_of(self.record, field)
    }

    /// Attribute value of a field on another record.
    pub fn attr_of(&self, record: &LocalId, field: &str) -> Value {
        match self.reader.read_field(record, field) {
            Some(FieldValue::Attr(value)) => value,
            _ => Value::Null,
        }
    }

    /// x2one target of a field on another record.
    pub fn one_of(&self, record: &LocalId, field: &str) -> Option<LocalId> {
        match self.reader.read_field(record, field) {
            Some(FieldValue::One(target)) => target,
            _ => None,
        }
    }

    /// x2many targets of a field on another record.
    pub fn many_of(&self, record: &LocalId, field: &str) -> Vec<LocalId> {
        match self.reader.read_field(record, field) {
            Some(FieldValue::Many(targets)) => targets,
            _ => Vec::new(),
        }
    }

    /// A view of another record through the same reader.
    pub fn view(&self, record: &'a LocalId) -> RecordView<'a> {
        RecordView::new(record, self.reader)
    }

    pub fn exists(&self, record: &LocalId) -> bool {
        self.reader.exists(record)
    }
}
