//! In-process record store

use super::{RecordId, RecordStore, RecordSummary, SaveError};
use crate::model::{validate_record, Record};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

struct StoredRecord {
    id: RecordId,
    record: Record,
    created_at: DateTime<Utc>,
}

/// Record store kept in memory, used as a test double for the database
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<Vec<StoredRecord>>,
    /// When set, every save fails with this message
    failure: Option<String>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose saves always fail, for exercising error paths
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            failure: Some(message.into()),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn save(&self, record: &Record) -> std::result::Result<RecordId, SaveError> {
        if let Some(message) = &self.failure {
            return Err(SaveError::Storage(Error::Internal(message.clone())));
        }

        let violations = validate_record(record);
        if !violations.is_empty() {
            return Err(SaveError::Rejected(violations));
        }

        let id = RecordId::generate();
        self.records.write().await.push(StoredRecord {
            id,
            record: record.clone(),
            created_at: Utc::now(),
        });
        debug!(record_id = %id, "Record stored in memory");

        Ok(id)
    }

    async fn list(&self) -> Result<Vec<RecordSummary>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .rev()
            .map(|stored| RecordSummary::of(stored.id, &stored.record, stored.created_at))
            .collect())
    }

    async fn get(&self, id: RecordId) -> Result<Option<Record>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|stored| stored.id == id)
            .map(|stored| stored.record.clone()))
    }
}
