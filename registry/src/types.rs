//! Schema definition types.

use relstore_core::{FieldCommand, FieldId, FieldInput, ModelId, RecordView, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Cardinality of a relational field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationType {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl RelationType {
    /// Whether the field holds at most one target.
    pub fn is_x2one(&self) -> bool {
        matches!(self, RelationType::OneToOne | RelationType::ManyToOne)
    }

    /// Whether the field holds an ordered set of targets.
    pub fn is_x2many(&self) -> bool {
        !self.is_x2one()
    }

    /// The relation type an inverse field must have.
    pub fn reciprocal(&self) -> RelationType {
        match self {
            RelationType::OneToOne => RelationType::OneToOne,
            RelationType::OneToMany => RelationType::ManyToOne,
            RelationType::ManyToOne => RelationType::OneToMany,
            RelationType::ManyToMany => RelationType::ManyToMany,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RelationType::OneToOne => "one2one",
            RelationType::OneToMany => "one2many",
            RelationType::ManyToOne => "many2one",
            RelationType::ManyToMany => "many2many",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Attribute,
    Relation(RelationType),
}

/// A compute function: reads the record through a view, returns the new input.
pub type ComputeFn = Arc<dyn Fn(&RecordView<'_>) -> FieldInput + Send + Sync>;

/// A declared dependency of a computed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// A field on the same record.
    Local(String),
    /// A field on every record reached through a relation.
    Through { relation: String, field: String },
}

impl Dependency {
    /// Parse `field` or `relation.field`.
    pub fn parse(path: &str) -> Option<Dependency> {
        let mut parts = path.split('.');
        let first = parts.next().filter(|s| !s.is_empty())?;
        match (parts.next(), parts.next()) {
            (None, _) => Some(Dependency::Local(first.to_string())),
            (Some(second), None) if !second.is_empty() => Some(Dependency::Through {
                relation: first.to_string(),
                field: second.to_string(),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::Local(field) => write!(f, "{}", field),
            Dependency::Through { relation, field } => write!(f, "{}.{}", relation, field),
        }
    }
}

/// A dependency resolved to field ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyRef {
    Local(FieldId),
    Through { relation: FieldId, field: FieldId },
}

/// Compute definition of a field.
#[derive(Clone)]
pub struct ComputeDef {
    pub depends: Vec<String>,
    pub func: ComputeFn,
}

impl fmt::Debug for ComputeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputeDef")
            .field("depends", &self.depends)
            .finish_non_exhaustive()
    }
}

/// Field definition within a model.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Slot id, assigned when the model is added.
    pub id: FieldId,
    pub name: String,
    pub kind: FieldKind,
    /// Name of the related model (relations only).
    pub rel_model: Option<String>,
    /// Name of the inverse field on the related model (relations only).
    pub inverse: Option<String>,
    /// Unlinking a target through this field deletes the target.
    pub is_causal: bool,
    /// Initial attribute value, also restored by `clear`.
    pub default: Value,
    /// Commands applied to a relational field when a record is created.
    pub default_commands: Vec<FieldCommand>,
    pub compute: Option<ComputeDef>,
    /// `relation.field` path this field mirrors.
    pub related: Option<String>,
    /// Inverse generated by the registry builder.
    pub auto_generated: bool,
}

impl FieldDef {
    fn new(name: impl Into<String>, kind: FieldKind, rel_model: Option<String>) -> Self {
        Self {
            id: FieldId::new(0),
            name: name.into(),
            kind,
            rel_model,
            inverse: None,
            is_causal: false,
            default: Value::Null,
            default_commands: Vec::new(),
            compute: None,
            related: None,
            auto_generated: false,
        }
    }

    pub fn attr(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Attribute, None)
    }

    pub fn relation(
        name: impl Into<String>,
        relation: RelationType,
        rel_model: impl Into<String>,
    ) -> Self {
        Self::new(name, FieldKind::Relation(relation), Some(rel_model.into()))
    }

    pub fn one2one(name: impl Into<String>, rel_model: impl Into<String>) -> Self {
        Self::relation(name, RelationType::OneToOne, rel_model)
    }

    pub fn one2many(name: impl Into<String>, rel_model: impl Into<String>) -> Self {
        Self::relation(name, RelationType::OneToMany, rel_model)
    }

    pub fn many2one(name: impl Into<String>, rel_model: impl Into<String>) -> Self {
        Self::relation(name, RelationType::ManyToOne, rel_model)
    }

    pub fn many2many(name: impl Into<String>, rel_model: impl Into<String>) -> Self {
        Self::relation(name, RelationType::ManyToMany, rel_model)
    }

    pub fn inverse(mut self, inverse: impl Into<String>) -> Self {
        self.inverse = Some(inverse.into());
        self
    }

    pub fn causal(mut self) -> Self {
        self.is_causal = true;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = value.into();
        self
    }

    pub fn default_command(mut self, command: FieldCommand) -> Self {
        self.default_commands.push(command);
        self
    }

    /// Make this field computed from the given dependency paths.
    pub fn compute<F>(mut self, depends: &[&str], func: F) -> Self
    where
        F: Fn(&RecordView<'_>) -> FieldInput + Send + Sync + 'static,
    {
        self.compute = Some(ComputeDef {
            depends: depends.iter().map(|d| d.to_string()).collect(),
            func: Arc::new(func),
        });
        self
    }

    /// Make this field mirror `relation.field`.
    pub fn related(mut self, path: impl Into<String>) -> Self {
        self.related = Some(path.into());
        self
    }

    pub fn relation_type(&self) -> Option<RelationType> {
        match self.kind {
            FieldKind::Relation(relation) => Some(relation),
            FieldKind::Attribute => None,
        }
    }

    pub fn is_relation(&self) -> bool {
        matches!(self.kind, FieldKind::Relation(_))
    }

    pub fn is_x2one(&self) -> bool {
        self.relation_type().is_some_and(|r| r.is_x2one())
    }

    pub fn is_x2many(&self) -> bool {
        self.relation_type().is_some_and(|r| r.is_x2many())
    }

    /// Whether the value is derived by the compute engine.
    pub fn is_derived(&self) -> bool {
        self.compute.is_some() || self.related.is_some()
    }

    /// The `(relation, field)` pair of a related path.
    pub fn related_path(&self) -> Option<(&str, &str)> {
        self.related.as_deref().and_then(|path| path.split_once('.'))
    }
}

/// Model definition.
#[derive(Debug, Clone)]
pub struct ModelDef {
    pub id: ModelId,
    pub name: String,
    /// Fields indexed by `FieldId`.
    pub fields: Vec<FieldDef>,
    pub field_names: HashMap<String, FieldId>,
    /// Fields whose values derive the record key (used by `insert`).
    pub identifying: Vec<FieldId>,
}

impl ModelDef {
    pub fn field(&self, id: FieldId) -> Option<&FieldDef> {
        self.fields.get(id.index())
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDef> {
        self.field_names.get(name).and_then(|id| self.field(*id))
    }

    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        self.field_names.get(name).copied()
    }

    pub fn relational_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.is_relation())
    }

    pub fn derived_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.is_derived())
    }

    pub(crate) fn push_field(&mut self, mut field: FieldDef) -> FieldId {
        let id = FieldId::new(self.fields.len() as u32);
        field.id = id;
        self.field_names.insert(field.name.clone(), id);
        self.fields.push(field);
        id
    }
}

/// A derived field that must be recomputed when some field changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependent {
    /// Model owning the derived field.
    pub model: ModelId,
    /// The derived field.
    pub field: FieldId,
    /// Relation to follow from the changed record to reach the records
    /// owning the derived field. None means the changed record itself.
    pub via: Option<FieldId>,
}
