//! Session configuration.

use relstore_mutation::MAX_COMPUTE_STEPS;

/// Configuration of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Maximum number of field computations in one recompute pass.
    pub max_compute_steps: usize,
    /// Keep a journal of applied changes.
    pub record_events: bool,
    /// Deleting a missing record is an error instead of a no-op.
    pub strict_delete: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_compute_steps: MAX_COMPUTE_STEPS,
            record_events: true,
            strict_delete: false,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_compute_steps(mut self, steps: usize) -> Self {
        self.max_compute_steps = steps;
        self
    }

    pub fn with_record_events(mut self, enabled: bool) -> Self {
        self.record_events = enabled;
        self
    }

    pub fn with_strict_delete(mut self, enabled: bool) -> Self {
        self.strict_delete = enabled;
        self
    }

    /// No journal, small compute budget.
    pub fn minimal() -> Self {
        Self {
            max_compute_steps: 1_000,
            record_events: false,
            strict_delete: false,
        }
    }
}
