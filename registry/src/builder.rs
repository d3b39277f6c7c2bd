//! RegistryBuilder for constructing an immutable Registry.

use crate::error::{RegistryError, RegistryResult};
use crate::{
    Dependency, DependencyRef, Dependent, FieldDef, FieldKind, ModelDef, Registry, RelationType,
};
use log::debug;
use regex_lite::Regex;
use relstore_core::{FieldId, ModelId};
use std::collections::HashMap;
use std::sync::OnceLock;

const NAME_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

fn is_valid_name(name: &str) -> bool {
    static NAME_RE: OnceLock<Option<Regex>> = OnceLock::new();
    NAME_RE
        .get_or_init(|| Regex::new(NAME_PATTERN).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(name))
}

/// Builder for constructing an immutable Registry.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    /// Next model ID to allocate.
    next_model_id: u32,
    /// Models being built.
    models: HashMap<ModelId, ModelDef>,
    /// Model name to ID mapping.
    model_names: HashMap<String, ModelId>,
}

impl RegistryBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a model definition.
    pub fn add_model(&mut self, name: impl Into<String>) -> ModelBuilder<'_> {
        ModelBuilder {
            builder: self,
            name: name.into(),
            fields: Vec::new(),
            identifying: Vec::new(),
        }
    }

    /// Build the immutable Registry.
    ///
    /// Missing inverses are generated, then every relation, related path and
    /// compute dependency is checked before the dependency index is built.
    pub fn build(mut self) -> RegistryResult<Registry> {
        self.complete_one_sided_inverses();
        let generated = self.generate_inverses()?;

        let mut model_ids: Vec<ModelId> = self.models.keys().copied().collect();
        model_ids.sort();

        let mut dependencies: HashMap<(ModelId, FieldId), Vec<DependencyRef>> = HashMap::new();
        let mut dependents: HashMap<(ModelId, FieldId), Vec<Dependent>> = HashMap::new();

        for model_id in &model_ids {
            let Some(model) = self.models.get(model_id) else {
                continue;
            };
            for field in &model.fields {
                self.validate_field(model, field)?;

                let refs = self.resolve_dependencies(model, field)?;
                if refs.is_empty() {
                    continue;
                }
                for dep in &refs {
                    match *dep {
                        DependencyRef::Local(source) => {
                            dependents.entry((model.id, source)).or_default().push(Dependent {
                                model: model.id,
                                field: field.id,
                                via: None,
                            });
                        }
                        DependencyRef::Through { relation, field: source } => {
                            let Some((rel_model, inverse)) = self.inverse_ref(model, relation)
                            else {
                                continue;
                            };
                            dependents.entry((rel_model, source)).or_default().push(Dependent {
                                model: model.id,
                                field: field.id,
                                via: Some(inverse),
                            });
                        }
                    }
                }
                dependencies.insert((model.id, field.id), refs);
            }
        }

        debug!(
            "event=registry_build module=registry status=ok models={} generated_inverses={} derived_fields={}",
            self.models.len(),
            generated,
            dependencies.len()
        );

        Ok(Registry::new(
            self.models,
            self.model_names,
            dependencies,
            dependents,
        ))
    }

    /// A relation declaring an inverse whose counterpart declares none gets
    /// the counterpart pointed back at it.
    fn complete_one_sided_inverses(&mut self) {
        let mut links: Vec<(ModelId, FieldId, String)> = Vec::new();
        for model in self.models.values() {
            for field in model.relational_fields() {
                let (Some(rel_model), Some(inverse)) = (&field.rel_model, &field.inverse) else {
                    continue;
                };
                let Some(target) = self
                    .model_names
                    .get(rel_model)
                    .and_then(|id| self.models.get(id))
                else {
                    continue;
                };
                if let Some(counterpart) = target.field_by_name(inverse) {
                    if counterpart.inverse.is_none()
                        && counterpart.rel_model.as_deref() == Some(model.name.as_str())
                    {
                        links.push((target.id, counterpart.id, field.name.clone()));
                    }
                }
            }
        }
        for (model_id, field_id, inverse) in links {
            if let Some(field) = self
                .models
                .get_mut(&model_id)
                .and_then(|m| m.fields.get_mut(field_id.index()))
            {
                field.inverse = Some(inverse);
            }
        }
    }

    /// Generate `_inverse_<Model>_<field>` for relations declared without one.
    fn generate_inverses(&mut self) -> RegistryResult<usize> {
        let mut model_ids: Vec<ModelId> = self.models.keys().copied().collect();
        model_ids.sort();

        let mut generated: Vec<(ModelId, FieldId, ModelId, FieldDef)> = Vec::new();
        for model_id in model_ids {
            let Some(model) = self.models.get(&model_id) else {
                continue;
            };
            for field in model.relational_fields() {
                let Some(rel_model) = field.rel_model.as_deref() else {
                    continue;
                };
                let rel_model_id = *self.model_names.get(rel_model).ok_or_else(|| {
                    RegistryError::unknown_rel_model(&model.name, &field.name, rel_model)
                })?;
                if field.inverse.is_some() {
                    continue;
                }
                let Some(relation) = field.relation_type() else {
                    continue;
                };
                let mut inverse = FieldDef::relation(
                    format!("_inverse_{}_{}", model.name, field.name),
                    relation.reciprocal(),
                    model.name.clone(),
                )
                .inverse(field.name.clone());
                inverse.auto_generated = true;
                generated.push((model.id, field.id, rel_model_id, inverse));
            }
        }

        let count = generated.len();
        for (model_id, field_id, rel_model_id, inverse) in generated {
            let inverse_name = inverse.name.clone();
            let rel_model = self
                .models
                .get_mut(&rel_model_id)
                .ok_or_else(|| RegistryError::InvalidName(inverse_name.clone()))?;
            if rel_model.field_names.contains_key(&inverse_name) {
                return Err(RegistryError::duplicate_field_name(
                    &rel_model.name,
                    inverse_name,
                ));
            }
            rel_model.push_field(inverse);
            if let Some(field) = self
                .models
                .get_mut(&model_id)
                .and_then(|m| m.fields.get_mut(field_id.index()))
            {
                field.inverse = Some(inverse_name);
            }
        }
        Ok(count)
    }

    fn model_by_name(&self, name: &str) -> Option<&ModelDef> {
        self.model_names.get(name).and_then(|id| self.models.get(id))
    }

    /// Related model and inverse field id of a relation.
    fn inverse_ref(&self, model: &ModelDef, relation: FieldId) -> Option<(ModelId, FieldId)> {
        let field = model.field(relation)?;
        let rel_model = self.model_by_name(field.rel_model.as_deref()?)?;
        let inverse = rel_model.field_id(field.inverse.as_deref()?)?;
        Some((rel_model.id, inverse))
    }

    fn validate_field(&self, model: &ModelDef, field: &FieldDef) -> RegistryResult<()> {
        if let FieldKind::Relation(relation) = field.kind {
            self.validate_inverse(model, field, relation)?;
        }

        if field.is_causal
            && !matches!(
                field.relation_type(),
                Some(RelationType::OneToMany) | Some(RelationType::OneToOne)
            )
        {
            return Err(RegistryError::CausalNotAllowed {
                model: model.name.clone(),
                field: field.name.clone(),
            });
        }

        if field.compute.is_some() && field.related.is_some() {
            return Err(RegistryError::ComputeAndRelated {
                model: model.name.clone(),
                field: field.name.clone(),
            });
        }

        if let Some(path) = &field.related {
            self.validate_related(model, field, path)?;
        }
        Ok(())
    }

    fn validate_inverse(
        &self,
        model: &ModelDef,
        field: &FieldDef,
        relation: RelationType,
    ) -> RegistryResult<()> {
        let rel_model_name = field.rel_model.as_deref().unwrap_or_default();
        let rel_model = self.model_by_name(rel_model_name).ok_or_else(|| {
            RegistryError::unknown_rel_model(&model.name, &field.name, rel_model_name)
        })?;
        let inverse_name = field.inverse.as_deref().unwrap_or_default();
        let inverse = rel_model.field_by_name(inverse_name).ok_or_else(|| {
            RegistryError::UnknownInverse {
                model: model.name.clone(),
                field: field.name.clone(),
                rel_model: rel_model.name.clone(),
                inverse: inverse_name.to_string(),
            }
        })?;

        if inverse.rel_model.as_deref() != Some(model.name.as_str()) {
            return Err(RegistryError::inverse_mismatch(
                &model.name,
                &field.name,
                format!("{}/{} targets another model", rel_model.name, inverse.name),
            ));
        }
        if inverse.inverse.as_deref() != Some(field.name.as_str()) {
            return Err(RegistryError::inverse_mismatch(
                &model.name,
                &field.name,
                format!(
                    "{}/{} declares inverse {:?}",
                    rel_model.name, inverse.name, inverse.inverse
                ),
            ));
        }
        match inverse.relation_type() {
            Some(inverse_relation) if inverse_relation == relation.reciprocal() => Ok(()),
            inverse_relation => Err(RegistryError::IncompatibleInverse {
                model: model.name.clone(),
                field: field.name.clone(),
                relation: relation.to_string(),
                inverse_relation: inverse_relation
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "attribute".to_string()),
            }),
        }
    }

    fn validate_related(&self, model: &ModelDef, field: &FieldDef, path: &str) -> RegistryResult<()> {
        let invalid = |message: &str| {
            RegistryError::invalid_related(&model.name, &field.name, path, message)
        };

        let (relation_name, target_name) = path
            .split_once('.')
            .filter(|(a, b)| !a.is_empty() && !b.is_empty() && !b.contains('.'))
            .ok_or_else(|| invalid("expected <relation>.<field>"))?;
        let relation = model
            .field_by_name(relation_name)
            .ok_or_else(|| invalid("unknown relation"))?;
        if !relation.is_relation() {
            return Err(invalid("first hop is not a relational field"));
        }
        let rel_model = relation
            .rel_model
            .as_deref()
            .and_then(|name| self.model_by_name(name))
            .ok_or_else(|| invalid("unknown related model"))?;
        let target = rel_model
            .field_by_name(target_name)
            .ok_or_else(|| invalid("unknown target field"))?;

        if field.is_relation() != target.is_relation() {
            return Err(invalid("field kind does not match target field"));
        }
        if field.is_relation() {
            if field.rel_model != target.rel_model {
                return Err(invalid("related model does not match target field"));
            }
            if field.is_x2one() && (relation.is_x2many() || target.is_x2many()) {
                return Err(invalid("x2one field cannot mirror a multi-valued path"));
            }
        }
        Ok(())
    }

    fn resolve_dependencies(
        &self,
        model: &ModelDef,
        field: &FieldDef,
    ) -> RegistryResult<Vec<DependencyRef>> {
        let paths: Vec<String> = match (&field.related, &field.compute) {
            (Some(path), _) => vec![path.clone()],
            (None, Some(compute)) => compute.depends.clone(),
            (None, None) => return Ok(Vec::new()),
        };

        let mut refs = Vec::new();
        let mut push = |dep: DependencyRef| {
            if !refs.contains(&dep) {
                refs.push(dep);
            }
        };
        for path in &paths {
            let unknown = || RegistryError::unknown_dependency(&model.name, &field.name, path);
            match Dependency::parse(path).ok_or_else(unknown)? {
                Dependency::Local(name) => {
                    push(DependencyRef::Local(model.field_id(&name).ok_or_else(unknown)?));
                }
                Dependency::Through { relation, field: target } => {
                    let relation = model
                        .field_by_name(&relation)
                        .filter(|f| f.is_relation())
                        .ok_or_else(unknown)?;
                    let target = relation
                        .rel_model
                        .as_deref()
                        .and_then(|name| self.model_by_name(name))
                        .and_then(|m| m.field_id(&target))
                        .ok_or_else(unknown)?;
                    push(DependencyRef::Local(relation.id));
                    push(DependencyRef::Through {
                        relation: relation.id,
                        field: target,
                    });
                }
            }
        }
        Ok(refs)
    }
}

/// Builder for a model definition.
pub struct ModelBuilder<'a> {
    builder: &'a mut RegistryBuilder,
    name: String,
    fields: Vec<FieldDef>,
    identifying: Vec<String>,
}

impl<'a> ModelBuilder<'a> {
    /// Add a field.
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Declare the fields whose values identify a record.
    pub fn identified_by(mut self, fields: &[&str]) -> Self {
        self.identifying = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Finish building this model.
    ///
    /// The model id is only taken once the model is accepted.
    pub fn done(self) -> RegistryResult<ModelId> {
        if !is_valid_name(&self.name) {
            return Err(RegistryError::InvalidName(self.name));
        }
        if self.builder.model_names.contains_key(&self.name) {
            return Err(RegistryError::DuplicateModelName(self.name));
        }

        let id = ModelId::new(self.builder.next_model_id);
        let mut model = ModelDef {
            id,
            name: self.name.clone(),
            fields: Vec::new(),
            field_names: HashMap::new(),
            identifying: Vec::new(),
        };
        for field in self.fields {
            if !is_valid_name(&field.name) {
                return Err(RegistryError::InvalidName(format!(
                    "{}/{}",
                    self.name, field.name
                )));
            }
            if model.field_names.contains_key(&field.name) {
                return Err(RegistryError::duplicate_field_name(&self.name, field.name));
            }
            model.push_field(field);
        }

        for name in &self.identifying {
            let id = model
                .field_by_name(name)
                .filter(|f| f.kind == FieldKind::Attribute)
                .map(|f| f.id)
                .ok_or_else(|| RegistryError::InvalidIdentifyingField {
                    model: self.name.clone(),
                    field: name.clone(),
                })?;
            model.identifying.push(id);
        }

        self.builder.next_model_id += 1;
        self.builder.model_names.insert(self.name, id);
        self.builder.models.insert(id, model);

        Ok(id)
    }
}
