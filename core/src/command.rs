//! The field command language.
//!
//! Relational fields are never assigned directly: callers describe the
//! intended change as a `FieldCommand` and the mutation engine interprets it.
//! A patch (`Data`) maps field names to inputs, each input being either a
//! plain attribute value or one or more commands.

use crate::{LocalId, Value};

/// A deferred mutation instruction for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldCommand {
    /// Reset the field: unlink everything, or restore the attribute default.
    Clear,
    /// Create new records on the related model and link them.
    Create(Vec<Data>),
    /// Find-or-create records on the related model and link them.
    Insert(Vec<Data>),
    /// Find-or-create records on the related model and replace the field with them.
    InsertAndReplace(Vec<Data>),
    /// Add the given records to the relation.
    Link(Vec<LocalId>),
    /// Make the relation contain exactly the given records, in that order.
    Replace(Vec<LocalId>),
    /// Remove the given records from the relation.
    Unlink(Vec<LocalId>),
    /// Remove every record from the relation.
    UnlinkAll,
}

impl FieldCommand {
    /// Name of the command verb.
    pub fn verb(&self) -> &'static str {
        match self {
            FieldCommand::Clear => "clear",
            FieldCommand::Create(_) => "create",
            FieldCommand::Insert(_) => "insert",
            FieldCommand::InsertAndReplace(_) => "insert-and-replace",
            FieldCommand::Link(_) => "link",
            FieldCommand::Replace(_) => "replace",
            FieldCommand::Unlink(_) => "unlink",
            FieldCommand::UnlinkAll => "unlink-all",
        }
    }
}

/// What a patch assigns to a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput {
    /// A bare value. Only valid on attribute fields.
    Value(Value),
    /// A single command.
    Command(FieldCommand),
    /// Several commands, applied in order.
    Commands(Vec<FieldCommand>),
}

impl From<Value> for FieldInput {
    fn from(value: Value) -> Self {
        FieldInput::Value(value)
    }
}

impl From<bool> for FieldInput {
    fn from(b: bool) -> Self {
        FieldInput::Value(Value::Bool(b))
    }
}

impl From<i64> for FieldInput {
    fn from(i: i64) -> Self {
        FieldInput::Value(Value::Int(i))
    }
}

impl From<i32> for FieldInput {
    fn from(i: i32) -> Self {
        FieldInput::Value(Value::from(i))
    }
}

impl From<f64> for FieldInput {
    fn from(f: f64) -> Self {
        FieldInput::Value(Value::Float(f))
    }
}

impl From<&str> for FieldInput {
    fn from(s: &str) -> Self {
        FieldInput::Value(Value::from(s))
    }
}

impl From<String> for FieldInput {
    fn from(s: String) -> Self {
        FieldInput::Value(Value::String(s))
    }
}

impl From<FieldCommand> for FieldInput {
    fn from(command: FieldCommand) -> Self {
        FieldInput::Command(command)
    }
}

impl From<Vec<FieldCommand>> for FieldInput {
    fn from(commands: Vec<FieldCommand>) -> Self {
        FieldInput::Commands(commands)
    }
}

/// An insertion-ordered patch of field inputs.
///
/// Entries are applied in the order they were added. Setting the same field
/// twice keeps the first position and the last input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Data {
    entries: Vec<(String, FieldInput)>,
}

impl Data {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field input, builder style.
    pub fn with(mut self, field: impl Into<String>, input: impl Into<FieldInput>) -> Self {
        self.set(field, input);
        self
    }

    /// Add or overwrite a field input.
    pub fn set(&mut self, field: impl Into<String>, input: impl Into<FieldInput>) {
        let field = field.into();
        let input = input.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = input,
            None => self.entries.push((field, input)),
        }
    }

    /// Get the input assigned to a field.
    pub fn get(&self, field: &str) -> Option<&FieldInput> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, input)| input)
    }

    /// Get the bare value assigned to a field, if any.
    pub fn value(&self, field: &str) -> Option<&Value> {
        match self.get(field) {
            Some(FieldInput::Value(value)) => Some(value),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldInput)> {
        self.entries
            .iter()
            .map(|(name, input)| (name.as_str(), input))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a patch from a JSON object.
    ///
    /// Nested objects become `insert` commands and arrays of objects become
    /// `insert_and_replace` commands, so a server payload can be ingested
    /// as is. Everything else is a bare value. Returns None if `json` is not
    /// an object.
    pub fn from_json(json: &serde_json::Value) -> Option<Data> {
        let object = json.as_object()?;
        let mut data = Data::new();
        for (name, value) in object {
            data.set(name.clone(), json_input(value));
        }
        Some(data)
    }
}

fn json_input(value: &serde_json::Value) -> FieldInput {
    match value {
        serde_json::Value::Object(_) => match Data::from_json(value) {
            Some(nested) => FieldInput::Command(FieldCommand::Insert(vec![nested])),
            None => FieldInput::Value(Value::from_json(value)),
        },
        serde_json::Value::Array(items)
            if !items.is_empty() && items.iter().all(serde_json::Value::is_object) =>
        {
            let nested = items.iter().filter_map(Data::from_json).collect();
            FieldInput::Command(FieldCommand::InsertAndReplace(nested))
        }
        other => FieldInput::Value(Value::from_json(other)),
    }
}

/// Build a `Data` patch from `field => input` pairs.
#[macro_export]
macro_rules! data {
    () => {
        $crate::Data::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        {
            let mut data = $crate::Data::new();
            $(
                data.set($key, $value);
            )+
            data
        }
    };
}

/// Conversion of command arguments into a list of record ids.
pub trait IntoTargets {
    fn into_targets(self) -> Vec<LocalId>;
}

impl IntoTargets for LocalId {
    fn into_targets(self) -> Vec<LocalId> {
        vec![self]
    }
}

impl IntoTargets for &LocalId {
    fn into_targets(self) -> Vec<LocalId> {
        vec![self.clone()]
    }
}

impl IntoTargets for Vec<LocalId> {
    fn into_targets(self) -> Vec<LocalId> {
        self
    }
}

impl IntoTargets for &Vec<LocalId> {
    fn into_targets(self) -> Vec<LocalId> {
        self.clone()
    }
}

impl IntoTargets for &[LocalId] {
    fn into_targets(self) -> Vec<LocalId> {
        self.to_vec()
    }
}

impl<const N: usize> IntoTargets for [LocalId; N] {
    fn into_targets(self) -> Vec<LocalId> {
        self.into()
    }
}

impl<const N: usize> IntoTargets for &[LocalId; N] {
    fn into_targets(self) -> Vec<LocalId> {
        self.to_vec()
    }
}

/// Conversion of command arguments into a list of patches.
pub trait IntoDataList {
    fn into_data_list(self) -> Vec<Data>;
}

impl IntoDataList for Data {
    fn into_data_list(self) -> Vec<Data> {
        vec![self]
    }
}

impl IntoDataList for Vec<Data> {
    fn into_data_list(self) -> Vec<Data> {
        self
    }
}

pub fn link(targets: impl IntoTargets) -> FieldCommand {
    FieldCommand::Link(targets.into_targets())
}

pub fn unlink(targets: impl IntoTargets) -> FieldCommand {
    FieldCommand::Unlink(targets.into_targets())
}

pub fn unlink_all() -> FieldCommand {
    FieldCommand::UnlinkAll
}

pub fn replace(targets: impl IntoTargets) -> FieldCommand {
    FieldCommand::Replace(targets.into_targets())
}

pub fn create(data: impl IntoDataList) -> FieldCommand {
    FieldCommand::Create(data.into_data_list())
}

pub fn insert(data: impl IntoDataList) -> FieldCommand {
    FieldCommand::Insert(data.into_data_list())
}

pub fn insert_and_replace(data: impl IntoDataList) -> FieldCommand {
    FieldCommand::InsertAndReplace(data.into_data_list())
}

pub fn clear() -> FieldCommand {
    FieldCommand::Clear
}
