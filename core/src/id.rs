//! Identity types for relstore records and schema entries.
//!
//! Records are identified by a `LocalId` that encodes the name of their
//! model. Schema entries (models, fields) use compact numeric ids assigned
//! by the registry builder.

use std::fmt;
use std::sync::Arc;

/// Identifier of a model in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(pub u32);

impl ModelId {
    /// Create a new ModelId from a raw value.
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// Identifier of a field within its model.
///
/// Field ids are dense per model: they index the field slots of every
/// record of that model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub u32);

impl FieldId {
    /// Create a new FieldId from a raw value.
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub fn raw(&self) -> u32 {
        self.0
    }

    /// Slot index of this field in a record.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// Marks keys allocated by the store. Identity keys never start with it.
const GENERATED_MARK: char = '~';

/// Unique identifier of a record instance.
///
/// Rendered as `<Model>_<key>`. The key is either derived from the
/// identifying fields of the record or allocated by the store; allocated
/// keys carry a leading `~` so the two never meet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalId {
    model: Arc<str>,
    key: Arc<str>,
}

impl LocalId {
    /// Create a new LocalId for a record of `model`.
    pub fn new(model: &str, key: impl fmt::Display) -> Self {
        Self {
            model: Arc::from(model),
            key: Arc::from(key.to_string()),
        }
    }

    /// Id of a record keyed by its identifying values, in field order.
    ///
    /// Backslash, `_` and `~` are backslash-escaped in each fragment, so
    /// distinct value tuples always give distinct keys.
    pub fn identified<S: AsRef<str>>(model: &str, fragments: &[S]) -> Self {
        let mut key = String::new();
        for (i, fragment) in fragments.iter().enumerate() {
            if i > 0 {
                key.push('_');
            }
            for c in fragment.as_ref().chars() {
                if matches!(c, '\\' | '_' | GENERATED_MARK) {
                    key.push('\\');
                }
                key.push(c);
            }
        }
        Self::new(model, key)
    }

    /// Id of a record with a store-allocated serial number.
    pub fn generated(model: &str, serial: u64) -> Self {
        Self::new(model, format!("{}{}", GENERATED_MARK, serial))
    }

    /// Whether the key was allocated by the store.
    pub fn is_generated(&self) -> bool {
        self.key.starts_with(GENERATED_MARK)
    }

    /// Name of the model this record belongs to.
    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// The per-model key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.model, self.key)
    }
}
