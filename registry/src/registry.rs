//! The Registry - immutable schema lookup.

use crate::{DependencyRef, Dependent, FieldDef, ModelDef};
use relstore_core::{FieldId, ModelId};
use std::collections::HashMap;

/// The Registry provides runtime lookup of model and field definitions.
/// It is immutable after construction.
#[derive(Debug)]
pub struct Registry {
    /// Model definitions by ID.
    models: HashMap<ModelId, ModelDef>,
    /// Model ID lookup by name.
    model_names: HashMap<String, ModelId>,
    /// Resolved dependencies of every derived field.
    dependencies: HashMap<(ModelId, FieldId), Vec<DependencyRef>>,
    /// Derived fields to recompute when a field changes.
    dependents: HashMap<(ModelId, FieldId), Vec<Dependent>>,
}

impl Registry {
    pub(crate) fn new(
        models: HashMap<ModelId, ModelDef>,
        model_names: HashMap<String, ModelId>,
        dependencies: HashMap<(ModelId, FieldId), Vec<DependencyRef>>,
        dependents: HashMap<(ModelId, FieldId), Vec<Dependent>>,
    ) -> Self {
        Self {
            models,
            model_names,
            dependencies,
            dependents,
        }
    }

    // ==================== Model Lookups ====================

    /// Get a model definition by ID.
    pub fn get_model(&self, id: ModelId) -> Option<&ModelDef> {
        self.models.get(&id)
    }

    /// Get a model definition by name.
    pub fn get_model_by_name(&self, name: &str) -> Option<&ModelDef> {
        self.model_names.get(name).and_then(|id| self.models.get(id))
    }

    /// Get a model ID by name.
    pub fn get_model_id(&self, name: &str) -> Option<ModelId> {
        self.model_names.get(name).copied()
    }

    /// All models, ordered by ID.
    pub fn models(&self) -> Vec<&ModelDef> {
        let mut models: Vec<&ModelDef> = self.models.values().collect();
        models.sort_by_key(|m| m.id);
        models
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    // ==================== Field Lookups ====================

    /// Get a field definition.
    pub fn get_field(&self, model: ModelId, field: FieldId) -> Option<&FieldDef> {
        self.get_model(model).and_then(|m| m.field(field))
    }

    /// The model a relational field points to.
    pub fn rel_model_of(&self, field: &FieldDef) -> Option<&ModelDef> {
        field
            .rel_model
            .as_deref()
            .and_then(|name| self.get_model_by_name(name))
    }

    /// The related model and inverse field of a relational field.
    pub fn inverse_of(&self, model: ModelId, field: FieldId) -> Option<(ModelId, &FieldDef)> {
        let field = self.get_field(model, field)?;
        let rel_model = self.rel_model_of(field)?;
        let inverse = rel_model.field_by_name(field.inverse.as_deref()?)?;
        Some((rel_model.id, inverse))
    }

    // ==================== Dependency Lookups ====================

    /// Resolved dependencies of a derived field.
    pub fn dependencies(&self, model: ModelId, field: FieldId) -> &[DependencyRef] {
        self.dependencies
            .get(&(model, field))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Derived fields affected by a change of `field` on a record of `model`.
    pub fn dependents(&self, model: ModelId, field: FieldId) -> &[Dependent] {
        self.dependents
            .get(&(model, field))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
