//! Mutation executor - owns the store and coordinates operations.
//!
//! The executor delegates to specialized operation modules in `ops/`:
//! - `ops/set.rs` - field inputs and command dispatch
//! - `ops/link.rs` / `ops/unlink.rs` / `ops/replace.rs` - relational writes
//! - `ops/create.rs` - record creation and find-or-create
//! - `ops/delete.rs` - deletion with causal cascade
//! - `ops/compute.rs` - computed and related field evaluation
//!
//! Every public write runs in an update scope. When the outermost scope
//! closes, pending computes are flushed and the revision advances.

use std::collections::HashSet;
use std::sync::Arc;

use log::debug;
use relstore_compute::{
    affected_fields, direct_dependencies, FieldRef, PendingCompute, Scheduler, MAX_COMPUTE_STEPS,
};
use relstore_core::{Data, FieldId, FieldInput, FieldValue, LocalId, ModelId};
use relstore_graph::{RecordStore, StoreReader};
use relstore_registry::{ModelDef, Registry};

use crate::error::{MutationError, MutationResult};
use crate::event::MutationEvent;
use crate::ops::{self, InverseMode};

/// Mutation executor.
pub struct MutationExecutor {
    pub(crate) registry: Arc<Registry>,
    pub(crate) store: RecordStore,
    pub(crate) scheduler: Scheduler,
    events: Vec<MutationEvent>,
    record_events: bool,
    /// Nesting of update scopes.
    depth: usize,
    flushing: bool,
    /// Records whose deletion is in progress.
    pub(crate) deleting: HashSet<LocalId>,
    revision: u64,
}

impl MutationExecutor {
    /// Create a new executor over an empty store.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            store: RecordStore::new(),
            scheduler: Scheduler::new(MAX_COMPUTE_STEPS),
            events: Vec::new(),
            record_events: true,
            depth: 0,
            flushing: false,
            deleting: HashSet::new(),
            revision: 0,
        }
    }

    /// Set the compute budget of one flush.
    pub fn with_max_compute_steps(mut self, max_steps: usize) -> Self {
        self.scheduler = Scheduler::new(max_steps);
        self
    }

    /// Enable or disable the event journal.
    pub fn with_events(mut self, enabled: bool) -> Self {
        self.record_events = enabled;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn shared_registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Name-based reader over the current store.
    pub fn reader(&self) -> StoreReader<'_> {
        StoreReader::new(&self.registry, &self.store)
    }

    /// Number of completed flushes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn events(&self) -> &[MutationEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<MutationEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_computes(&self) -> usize {
        self.scheduler.len()
    }

    pub fn is_pending(&self, record: &LocalId, field: FieldId) -> bool {
        self.scheduler
            .is_pending(&FieldRef::new(record.clone(), field))
    }

    // ==================== Model Operations ====================

    /// Create a record of `model` and apply `data` to it.
    pub fn create(&mut self, model: &str, data: &Data) -> MutationResult<LocalId> {
        let model = self.model_id(model)?;
        self.scoped(|exec| ops::create_record(exec, model, data))
    }

    /// Find a record by the identifying fields in `data` and update it, or
    /// create it if there is none.
    pub fn insert(&mut self, model: &str, data: &Data) -> MutationResult<LocalId> {
        let model = self.model_id(model)?;
        self.scoped(|exec| ops::insert_record(exec, model, data))
    }

    /// The existing record identified by `data`, if any.
    pub fn find_from_data(&self, model: &str, data: &Data) -> MutationResult<Option<LocalId>> {
        let model = self
            .registry
            .get_model_by_name(model)
            .ok_or_else(|| MutationError::unknown_model(model))?;
        Ok(ops::identify(model, data).filter(|id| self.store.contains(id)))
    }

    // ==================== Record Operations ====================

    /// Apply a patch to an existing record.
    pub fn update(&mut self, record: &LocalId, data: &Data) -> MutationResult<bool> {
        if !self.store.contains(record) {
            return Err(MutationError::RecordDeleted(record.clone()));
        }
        self.scoped(|exec| ops::apply_data(exec, record, data))
    }

    /// Apply one input to one field.
    pub fn set(
        &mut self,
        record: &LocalId,
        field: FieldId,
        input: &FieldInput,
    ) -> MutationResult<bool> {
        if !self.store.contains(record) {
            return Err(MutationError::RecordDeleted(record.clone()));
        }
        self.scoped(|exec| ops::set(exec, record, field, input, &InverseMode::Update))
    }

    /// Delete a record. Returns false if it did not exist.
    pub fn delete(&mut self, record: &LocalId) -> MutationResult<bool> {
        self.scoped(|exec| ops::delete(exec, record))
    }

    /// Delete every record of every model.
    pub fn delete_all(&mut self) -> MutationResult<usize> {
        self.scoped(|exec| {
            let registry = Arc::clone(&exec.registry);
            let mut deleted = 0;
            for model in registry.models() {
                for id in exec.store.ids_of(model.id) {
                    if ops::delete(exec, &id)? {
                        deleted += 1;
                    }
                }
            }
            Ok(deleted)
        })
    }

    /// Recompute a derived field now.
    ///
    /// Fails with `RecordDeleted` if the record no longer exists.
    pub fn compute(&mut self, record: &LocalId, field: FieldId) -> MutationResult<bool> {
        self.scoped(|exec| {
            exec.scheduler
                .take(&FieldRef::new(record.clone(), field));
            ops::compute(exec, record, field)
        })
    }

    /// Run the pending compute of a field, if any, so that a read sees an
    /// up-to-date value.
    pub fn ensure_computed(&mut self, record: &LocalId, field: FieldId) -> MutationResult<()> {
        let Some(entry) = self
            .scheduler
            .take(&FieldRef::new(record.clone(), field))
        else {
            return Ok(());
        };
        if !self.flushing {
            self.scheduler.reset_steps();
        }
        self.scoped(|exec| exec.run_entry(entry))
    }

    /// Read a field after running its pending compute.
    pub fn read(&mut self, record: &LocalId, field: FieldId) -> MutationResult<FieldValue> {
        self.ensure_computed(record, field)?;
        Ok(self.store.read(record, field)?)
    }

    /// Open an update scope spanning several calls.
    pub fn begin_batch(&mut self) {
        self.depth += 1;
    }

    /// Close a scope opened by `begin_batch`, flushing if it was the outermost.
    pub fn end_batch(&mut self) -> MutationResult<()> {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.flush()?;
        }
        Ok(())
    }

    // ==================== Internals ====================

    fn model_id(&self, name: &str) -> MutationResult<ModelId> {
        self.registry
            .get_model_id(name)
            .ok_or_else(|| MutationError::unknown_model(name))
    }

    pub(crate) fn model_of(&self, record: &LocalId) -> MutationResult<ModelId> {
        self.store
            .get(record)
            .map(|r| r.model)
            .ok_or_else(|| MutationError::RecordDeleted(record.clone()))
    }

    pub(crate) fn model_def(&self, model: ModelId) -> MutationResult<&ModelDef> {
        self.registry
            .get_model(model)
            .ok_or_else(|| MutationError::unknown_model(model.to_string()))
    }

    pub(crate) fn field_name(&self, model: ModelId, field: FieldId) -> String {
        self.registry
            .get_field(model, field)
            .map(|f| f.name.clone())
            .unwrap_or_else(|| field.to_string())
    }

    pub(crate) fn record_event(&mut self, event: MutationEvent) {
        if self.record_events {
            self.events.push(event);
        }
    }

    /// Schedule the derived fields affected by a change of `field` on `record`.
    pub(crate) fn mark_updated(&mut self, record: &LocalId, field: FieldId) -> MutationResult<()> {
        for target in affected_fields(&self.registry, &self.store, record, field) {
            self.scheduler.enqueue(target)?;
        }
        Ok(())
    }

    fn scoped<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> MutationResult<T>,
    ) -> MutationResult<T> {
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        let value = result?;
        if self.depth == 0 {
            self.flush()?;
        }
        Ok(value)
    }

    fn flush(&mut self) -> MutationResult<()> {
        if self.flushing {
            return Ok(());
        }
        self.flushing = true;
        self.scheduler.reset_steps();
        let result = self.run_pending();
        self.flushing = false;
        if let Err(err) = result {
            self.scheduler.clear();
            return Err(err);
        }
        self.revision += 1;
        debug!(
            "event=flush module=mutation status=ok revision={} computes={} records={}",
            self.revision,
            self.scheduler.steps(),
            self.store.len()
        );
        Ok(())
    }

    fn run_pending(&mut self) -> MutationResult<()> {
        while let Some(entry) = self.scheduler.next() {
            self.run_entry(entry)?;
        }
        Ok(())
    }

    /// Run one pending compute, after its pending direct dependencies.
    fn run_entry(&mut self, entry: PendingCompute) -> MutationResult<()> {
        let target = entry.target.clone();
        if !self.store.contains(&target.record) {
            return Ok(());
        }
        for dependency in
            direct_dependencies(&self.registry, &self.store, &target.record, target.field)
        {
            if let Some(pending) = self.scheduler.take(&dependency) {
                self.run_entry(pending)?;
            }
        }

        self.scheduler.begin(entry)?;
        let result = ops::compute(self, &target.record, target.field);
        self.scheduler.end();
        match result {
            Ok(_) => Ok(()),
            Err(err) if err.is_record_deleted() => Ok(()),
            Err(err) => Err(err),
        }
    }
}
