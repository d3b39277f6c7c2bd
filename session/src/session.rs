//! Session - the record store facade.

use std::future::Future;
use std::sync::Arc;

use log::debug;
use relstore_core::{Data, FieldId, FieldInput, FieldValue, LocalId, RecordView, Value};
use relstore_graph::Record;
use relstore_mutation::{MutationEvent, MutationExecutor};
use relstore_registry::{ModelDef, Registry};

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::suspend::{Resumed, Suspended};

/// A field given by name or by id.
pub trait FieldKey {
    fn resolve(&self, model: &ModelDef) -> Option<FieldId>;

    fn describe(&self) -> String;
}

impl FieldKey for &str {
    fn resolve(&self, model: &ModelDef) -> Option<FieldId> {
        model.field_id(self)
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

impl FieldKey for String {
    fn resolve(&self, model: &ModelDef) -> Option<FieldId> {
        model.field_id(self)
    }

    fn describe(&self) -> String {
        self.clone()
    }
}

impl FieldKey for FieldId {
    fn resolve(&self, model: &ModelDef) -> Option<FieldId> {
        model.field(*self).map(|field| field.id)
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

/// A reactive record store.
pub struct Session {
    exec: MutationExecutor,
    config: SessionConfig,
}

impl Session {
    /// Create an empty store over `registry` with the default configuration.
    pub fn new(registry: impl Into<Arc<Registry>>) -> Self {
        Self::with_config(registry, SessionConfig::default())
    }

    pub fn with_config(registry: impl Into<Arc<Registry>>, config: SessionConfig) -> Self {
        let exec = MutationExecutor::new(registry.into())
            .with_max_compute_steps(config.max_compute_steps)
            .with_events(config.record_events);
        Self { exec, config }
    }

    pub fn registry(&self) -> &Registry {
        self.exec.registry()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Number of completed recompute passes. Advances once per outermost
    /// update or batch.
    pub fn revision(&self) -> u64 {
        self.exec.revision()
    }

    pub fn events(&self) -> &[MutationEvent] {
        self.exec.events()
    }

    pub fn take_events(&mut self) -> Vec<MutationEvent> {
        self.exec.take_events()
    }

    pub fn pending_computes(&self) -> usize {
        self.exec.pending_computes()
    }

    // ==================== Model Operations ====================

    pub fn create(&mut self, model: &str, data: &Data) -> SessionResult<LocalId> {
        Ok(self.exec.create(model, data)?)
    }

    /// Create several records in one batch.
    pub fn create_many(&mut self, model: &str, items: &[Data]) -> SessionResult<Vec<LocalId>> {
        self.batch(|session| {
            items
                .iter()
                .map(|data| session.create(model, data))
                .collect()
        })
    }

    /// Update the record identified by `data`, or create it.
    pub fn insert(&mut self, model: &str, data: &Data) -> SessionResult<LocalId> {
        Ok(self.exec.insert(model, data)?)
    }

    pub fn insert_many(&mut self, model: &str, items: &[Data]) -> SessionResult<Vec<LocalId>> {
        self.batch(|session| {
            items
                .iter()
                .map(|data| session.insert(model, data))
                .collect()
        })
    }

    /// Every record of `model`, in creation order.
    pub fn all(&self, model: &str) -> SessionResult<Vec<LocalId>> {
        let model = self.model_def(model)?;
        Ok(self.exec.store().ids_of(model.id))
    }

    /// The first record of `model` matching `predicate`.
    ///
    /// Pending computes are not forced.
    pub fn find(
        &self,
        model: &str,
        predicate: impl Fn(&RecordView<'_>) -> bool,
    ) -> SessionResult<Option<LocalId>> {
        let reader = self.exec.reader();
        Ok(self
            .all(model)?
            .into_iter()
            .find(|id| predicate(&RecordView::new(id, &reader))))
    }

    /// Every record of `model` matching `predicate`, in creation order.
    pub fn filter(
        &self,
        model: &str,
        predicate: impl Fn(&RecordView<'_>) -> bool,
    ) -> SessionResult<Vec<LocalId>> {
        let reader = self.exec.reader();
        Ok(self
            .all(model)?
            .into_iter()
            .filter(|id| predicate(&RecordView::new(id, &reader)))
            .collect())
    }

    /// The existing record whose identifying fields match `data`.
    pub fn find_from_data(&self, model: &str, data: &Data) -> SessionResult<Option<LocalId>> {
        Ok(self.exec.find_from_data(model, data)?)
    }

    /// Delete every record.
    pub fn delete_all(&mut self) -> SessionResult<usize> {
        Ok(self.exec.delete_all()?)
    }

    // ==================== Record Operations ====================

    pub fn exists(&self, record: &LocalId) -> bool {
        self.exec.store().contains(record)
    }

    pub fn get(&self, record: &LocalId) -> Option<&Record> {
        self.exec.store().get(record)
    }

    /// Apply `data` to an existing record.
    pub fn update(&mut self, record: &LocalId, data: &Data) -> SessionResult<bool> {
        self.require(record)?;
        Ok(self.exec.update(record, data)?)
    }

    /// Apply one input to one field.
    pub fn set(
        &mut self,
        record: &LocalId,
        field: impl FieldKey,
        input: impl Into<FieldInput>,
    ) -> SessionResult<bool> {
        let field = self.field_id(record, &field)?;
        Ok(self.exec.set(record, field, &input.into())?)
    }

    /// Delete a record and everything reached through its causal fields.
    ///
    /// Deleting a missing record is a no-op returning false, or
    /// `RecordNotFound` with `strict_delete`.
    pub fn delete(&mut self, record: &LocalId) -> SessionResult<bool> {
        if self.config.strict_delete {
            self.require(record)?;
        }
        Ok(self.exec.delete(record)?)
    }

    /// Read a field, running its pending compute first.
    pub fn read(&mut self, record: &LocalId, field: impl FieldKey) -> SessionResult<FieldValue> {
        let field = self.field_id(record, &field)?;
        Ok(self.exec.read(record, field)?)
    }

    /// Read a field as stored, without running pending computes.
    pub fn peek(&self, record: &LocalId, field: impl FieldKey) -> SessionResult<FieldValue> {
        let field = self.field_id(record, &field)?;
        Ok(self
            .exec
            .store()
            .read(record, field)
            .map_err(relstore_mutation::MutationError::from)?)
    }

    pub fn attr(&mut self, record: &LocalId, field: impl FieldKey) -> SessionResult<Value> {
        Ok(self
            .read(record, field)?
            .as_value()
            .cloned()
            .unwrap_or_default())
    }

    pub fn one(&mut self, record: &LocalId, field: impl FieldKey) -> SessionResult<Option<LocalId>> {
        Ok(self.read(record, field)?.as_one().cloned())
    }

    pub fn many(&mut self, record: &LocalId, field: impl FieldKey) -> SessionResult<Vec<LocalId>> {
        Ok(self.read(record, field)?.into_ids())
    }

    /// Recompute a derived field now.
    ///
    /// Fails with `RecordDeleted` if the record no longer exists.
    pub fn compute(&mut self, record: &LocalId, field: impl FieldKey) -> SessionResult<bool> {
        let Some(model) = self.model_of(record) else {
            return Err(SessionError::MutationError(
                relstore_mutation::MutationError::RecordDeleted(record.clone()),
            ));
        };
        let field = field
            .resolve(model)
            .ok_or_else(|| SessionError::unknown_field(&model.name, field.describe()))?;
        Ok(self.exec.compute(record, field)?)
    }

    // ==================== Batches ====================

    /// Run `f` as one update: derived fields are recomputed once, when it
    /// returns.
    pub fn batch<T>(
        &mut self,
        f: impl FnOnce(&mut Session) -> SessionResult<T>,
    ) -> SessionResult<T> {
        self.exec.begin_batch();
        let result = f(self);
        let flushed = self.exec.end_batch();
        let value = result?;
        flushed?;
        debug!(
            "event=batch module=session status=ok revision={}",
            self.exec.revision()
        );
        Ok(value)
    }

    // ==================== Asynchronous Work ====================

    /// Tie `future` to `record`.
    pub fn suspend<F: Future>(&self, record: &LocalId, future: F) -> SessionResult<Suspended<F>> {
        self.require(record)?;
        Ok(Suspended::new(record.clone(), future))
    }

    /// Hand back finished work. Fails with `RecordDeleted` if its record was
    /// deleted meanwhile.
    pub fn resume<T>(&self, resumed: Resumed<T>) -> SessionResult<T> {
        let (record, value) = resumed.into_parts();
        if !self.exists(&record) {
            debug!(
                "event=resume module=session status=discarded record={}",
                record
            );
            return Err(SessionError::RecordDeleted(record));
        }
        Ok(value)
    }

    /// Run the continuation of finished work, unless its record was deleted
    /// meanwhile, in which case it is discarded and `None` is returned.
    pub fn resume_with<T, R>(
        &mut self,
        resumed: Resumed<T>,
        continuation: impl FnOnce(&mut Session, &LocalId, T) -> SessionResult<R>,
    ) -> SessionResult<Option<R>> {
        let (record, value) = resumed.into_parts();
        if !self.exists(&record) {
            debug!(
                "event=resume module=session status=discarded record={}",
                record
            );
            return Ok(None);
        }
        continuation(self, &record, value).map(Some)
    }

    // ==================== Internals ====================

    fn model_def(&self, name: &str) -> SessionResult<&ModelDef> {
        self.registry()
            .get_model_by_name(name)
            .ok_or_else(|| SessionError::unknown_model(name))
    }

    fn model_of(&self, record: &LocalId) -> Option<&ModelDef> {
        let model = self.exec.store().get(record)?.model;
        self.registry().get_model(model)
    }

    fn require(&self, record: &LocalId) -> SessionResult<()> {
        if self.exists(record) {
            Ok(())
        } else {
            Err(SessionError::RecordNotFound(record.clone()))
        }
    }

    fn field_id(&self, record: &LocalId, field: &impl FieldKey) -> SessionResult<FieldId> {
        let model = self
            .model_of(record)
            .ok_or_else(|| SessionError::RecordNotFound(record.clone()))?;
        field
            .resolve(model)
            .ok_or_else(|| SessionError::unknown_field(&model.name, field.describe()))
    }
}
