//! Core record storage implementation.

use crate::error::{GraphError, GraphResult};
use crate::index::ModelIndex;
use crate::record::{Record, RecordField};
use relstore_core::{FieldId, FieldValue, LocalId, ModelId, RecordRead};
use relstore_registry::{ModelDef, Registry};
use std::collections::HashMap;

/// Key allocator for records created without identifying data.
#[derive(Debug)]
struct KeyAllocator {
    next_key: u64,
}

impl KeyAllocator {
    fn new() -> Self {
        Self { next_key: 1 }
    }

    fn alloc(&mut self) -> u64 {
        let key = self.next_key;
        self.next_key += 1;
        key
    }
}

/// The in-memory record arena.
#[derive(Debug)]
pub struct RecordStore {
    /// Record storage
    records: HashMap<LocalId, Record>,
    /// Model index
    model_index: ModelIndex,
    /// Key allocator
    key_alloc: KeyAllocator,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            model_index: ModelIndex::new(),
            key_alloc: KeyAllocator::new(),
        }
    }

    /// Allocate an unused id for a new record of `model`.
    pub fn next_local_id(&mut self, model: &ModelDef) -> LocalId {
        loop {
            let id = LocalId::generated(&model.name, self.key_alloc.alloc());
            if !self.records.contains_key(&id) {
                return id;
            }
        }
    }

    // ==================== Record Operations ====================

    /// Add a record.
    pub fn insert(&mut self, record: Record) -> GraphResult<()> {
        if self.records.contains_key(&record.local_id) {
            return Err(GraphError::DuplicateRecord(record.local_id));
        }
        self.model_index
            .insert(record.model, record.local_id.clone());
        self.records.insert(record.local_id.clone(), record);
        Ok(())
    }

    /// Get a record by ID.
    pub fn get(&self, id: &LocalId) -> Option<&Record> {
        self.records.get(id)
    }

    /// Get a mutable reference to a record by ID.
    pub fn get_mut(&mut self, id: &LocalId) -> Option<&mut Record> {
        self.records.get_mut(id)
    }

    /// Remove a record.
    pub fn remove(&mut self, id: &LocalId) -> GraphResult<Record> {
        let record = self
            .records
            .remove(id)
            .ok_or_else(|| GraphError::RecordNotFound(id.clone()))?;
        self.model_index.remove(record.model, id);
        Ok(record)
    }

    pub fn contains(&self, id: &LocalId) -> bool {
        self.records.contains_key(id)
    }

    /// Ids of every record of `model`, in creation order.
    pub fn ids_of(&self, model: ModelId) -> Vec<LocalId> {
        self.model_index.get(model).cloned().collect()
    }

    pub fn count(&self, model: ModelId) -> usize {
        self.model_index.count(model)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    // ==================== Field Operations ====================

    /// Get one field slot of a record.
    pub fn field(&self, id: &LocalId, field: FieldId) -> GraphResult<&RecordField> {
        self.get(id)
            .ok_or_else(|| GraphError::RecordNotFound(id.clone()))?
            .field(field)
            .ok_or_else(|| GraphError::FieldNotFound {
                record: id.clone(),
                field,
            })
    }

    /// Get one field slot of a record, mutably.
    pub fn field_mut(&mut self, id: &LocalId, field: FieldId) -> GraphResult<&mut RecordField> {
        self.records
            .get_mut(id)
            .ok_or_else(|| GraphError::RecordNotFound(id.clone()))?
            .field_mut(field)
            .ok_or_else(|| GraphError::FieldNotFound {
                record: id.clone(),
                field,
            })
    }

    /// Snapshot of one field of a record.
    pub fn read(&self, id: &LocalId, field: FieldId) -> GraphResult<FieldValue> {
        self.field(id, field).map(RecordField::read)
    }
}

/// Name-based read access over a store.
pub struct StoreReader<'a> {
    registry: &'a Registry,
    store: &'a RecordStore,
}

impl<'a> StoreReader<'a> {
    pub fn new(registry: &'a Registry, store: &'a RecordStore) -> Self {
        Self { registry, store }
    }
}

impl RecordRead for StoreReader<'_> {
    fn exists(&self, record: &LocalId) -> bool {
        self.store.contains(record)
    }

    fn read_field(&self, record: &LocalId, field: &str) -> Option<FieldValue> {
        let rec = self.store.get(record)?;
        let field = self.registry.get_model(rec.model)?.field_id(field)?;
        rec.field(field).map(RecordField::read)
    }
}
