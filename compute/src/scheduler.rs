//! Pending-compute queue.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use log::warn;
use relstore_core::{FieldId, LocalId};

use crate::error::{ComputeError, ComputeResult};

/// One field of one record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub record: LocalId,
    pub field: FieldId,
}

impl FieldRef {
    pub fn new(record: LocalId, field: FieldId) -> Self {
        Self { record, field }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.record, self.field)
    }
}

/// A scheduled recompute and the chain of computes that caused it.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCompute {
    pub target: FieldRef,
    pub chain: Vec<FieldRef>,
}

/// Queue of derived fields waiting to be recomputed.
///
/// Entries are unique: scheduling a field that is already pending is a
/// no-op. An entry scheduled while another compute runs inherits that
/// compute's chain, so a field reached again through its own chain is
/// reported as a cycle instead of looping.
#[derive(Debug)]
pub struct Scheduler {
    queue: VecDeque<FieldRef>,
    pending: HashMap<FieldRef, Vec<FieldRef>>,
    running: Vec<PendingCompute>,
    steps: usize,
    max_steps: usize,
}

impl Scheduler {
    pub fn new(max_steps: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            pending: HashMap::new(),
            running: Vec::new(),
            steps: 0,
            max_steps,
        }
    }

    /// Schedule a recompute caused by the current context.
    ///
    /// Returns true if the field was not already pending.
    pub fn enqueue(&mut self, target: FieldRef) -> ComputeResult<bool> {
        let chain = self.current_chain();
        if chain.contains(&target) {
            let rendered = chain
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" -> ");
            warn!(
                "event=compute_cycle module=compute record={} field={} chain={}",
                target.record, target.field, rendered
            );
            return Err(ComputeError::cycle(target.record, target.field, rendered));
        }
        Ok(self.push(target, chain))
    }

    /// Schedule a recompute with no causal chain (new records).
    pub fn enqueue_fresh(&mut self, target: FieldRef) -> bool {
        self.push(target, Vec::new())
    }

    fn push(&mut self, target: FieldRef, chain: Vec<FieldRef>) -> bool {
        if self.pending.contains_key(&target) {
            return false;
        }
        self.queue.push_back(target.clone());
        self.pending.insert(target, chain);
        true
    }

    fn current_chain(&self) -> Vec<FieldRef> {
        match self.running.last() {
            Some(entry) => {
                let mut chain = entry.chain.clone();
                chain.push(entry.target.clone());
                chain
            }
            None => Vec::new(),
        }
    }

    /// Pop the oldest pending entry.
    pub fn next(&mut self) -> Option<PendingCompute> {
        while let Some(target) = self.queue.pop_front() {
            if let Some(chain) = self.pending.remove(&target) {
                return Some(PendingCompute { target, chain });
            }
        }
        None
    }

    /// Remove a specific entry so it can be run out of order.
    pub fn take(&mut self, target: &FieldRef) -> Option<PendingCompute> {
        self.pending
            .remove_entry(target)
            .map(|(target, chain)| PendingCompute { target, chain })
    }

    pub fn is_pending(&self, target: &FieldRef) -> bool {
        self.pending.contains_key(target)
    }

    /// Mark `entry` as running. Counts one step against the pass budget.
    pub fn begin(&mut self, entry: PendingCompute) -> ComputeResult<()> {
        self.steps += 1;
        if self.steps > self.max_steps {
            return Err(ComputeError::step_limit_exceeded(self.max_steps));
        }
        self.running.push(entry);
        Ok(())
    }

    /// Mark the innermost running entry as finished.
    pub fn end(&mut self) -> Option<PendingCompute> {
        self.running.pop()
    }

    pub fn is_running(&self) -> bool {
        !self.running.is_empty()
    }

    /// Start a new pass budget.
    pub fn reset_steps(&mut self) {
        self.steps = 0;
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Drop every pending entry of a deleted record.
    pub fn purge_record(&mut self, record: &LocalId) {
        self.pending.retain(|target, _| &target.record != record);
    }

    /// Drop everything, e.g. after a failed pass.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.pending.clear();
        self.running.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
