//! Single-flight record submission

use super::{RecordId, RecordStore, SaveError};
use crate::model::Record;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Wraps a store so at most one save is in flight at a time
///
/// A submit attempted while another is pending fails immediately with
/// [`SaveError::AlreadyInFlight`] and never reaches the store. The flag is
/// cleared when the pending save finishes, fails, or its future is dropped.
/// There is no retry; the caller may submit again once the first completes.
pub struct RecordSubmitter<S> {
    store: S,
    in_flight: AtomicBool,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: RecordStore> RecordSubmitter<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn submit(&self, record: &Record) -> Result<RecordId, SaveError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Save requested while another save is in flight");
            return Err(SaveError::AlreadyInFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let result = self.store.save(record).await;
        match &result {
            Ok(id) => info!(
                record_id = %id,
                client = %record.client_info.client_name,
                transformers = record.transformers.len(),
                "Record saved"
            ),
            Err(e) => warn!(error = %e, "Record save failed"),
        }
        result
    }
}
