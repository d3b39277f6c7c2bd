//! Indexes for record lookups.

use crate::RecordSet;
use relstore_core::{LocalId, ModelId};
use std::collections::HashMap;

/// Model index: ModelId -> records in creation order.
#[derive(Debug, Default)]
pub struct ModelIndex {
    index: HashMap<ModelId, RecordSet>,
}

impl ModelIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, model: ModelId, id: LocalId) {
        self.index.entry(model).or_default().insert(id);
    }

    pub fn remove(&mut self, model: ModelId, id: &LocalId) {
        if let Some(set) = self.index.get_mut(&model) {
            set.remove(id);
            if set.is_empty() {
                self.index.remove(&model);
            }
        }
    }

    pub fn get(&self, model: ModelId) -> impl Iterator<Item = &LocalId> + '_ {
        self.index.get(&model).into_iter().flat_map(|set| set.iter())
    }

    pub fn count(&self, model: ModelId) -> usize {
        self.index.get(&model).map_or(0, RecordSet::len)
    }
}
