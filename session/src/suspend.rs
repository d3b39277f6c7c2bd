//! Existence guard around asynchronous work started on behalf of a record.
//!
//! A `Suspended` pairs a future with the record that started it. Once the
//! future completes, the `Resumed` value must go back through the session,
//! which checks the record still exists before the continuation touches the
//! store. There is no other cancellation.

use std::future::Future;

use relstore_core::LocalId;

/// Asynchronous work tied to a record.
#[must_use = "suspended work does nothing until waited on"]
pub struct Suspended<F> {
    record: LocalId,
    future: F,
}

impl<F: Future> Suspended<F> {
    pub(crate) fn new(record: LocalId, future: F) -> Self {
        Self { record, future }
    }

    pub fn record(&self) -> &LocalId {
        &self.record
    }

    /// Drive the work to completion.
    pub async fn wait(self) -> Resumed<F::Output> {
        let value = self.future.await;
        Resumed {
            record: self.record,
            value,
        }
    }
}

/// Output of finished asynchronous work, not yet checked against the store.
#[must_use = "resumed work must be handed back to the session"]
#[derive(Debug)]
pub struct Resumed<T> {
    record: LocalId,
    value: T,
}

impl<T> Resumed<T> {
    pub fn record(&self) -> &LocalId {
        &self.record
    }

    pub(crate) fn into_parts(self) -> (LocalId, T) {
        (self.record, self.value)
    }
}
