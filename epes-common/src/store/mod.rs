//! Persistence gateway
//!
//! The record core only needs create/read access to finalized records. Every
//! backend sits behind [`RecordStore`]; [`crate::db::SqliteRecordStore`] is the
//! durable implementation and [`MemoryRecordStore`] the in-process one used by
//! tests. [`RecordSubmitter`] enforces a single save in flight.

pub mod memory;
pub mod submit;

pub use memory::MemoryRecordStore;
pub use submit::RecordSubmitter;

use crate::model::validate::join_violations;
use crate::model::{Record, Violation};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Identifier of a stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Generate a new random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for RecordId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RecordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| Error::InvalidInput(format!("Invalid record id {:?}: {}", s, e)))
    }
}

/// One line of the stored-records listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub id: RecordId,
    pub client_name: String,
    pub tr_number: String,
    pub date_of_test: NaiveDate,
    pub no_of_transformers: u32,
    pub created_at: DateTime<Utc>,
}

impl RecordSummary {
    pub(crate) fn of(id: RecordId, record: &Record, created_at: DateTime<Utc>) -> Self {
        let client = &record.client_info;
        Self {
            id,
            client_name: client.client_name.clone(),
            tr_number: client.tr_number.clone(),
            date_of_test: client.date_of_test,
            no_of_transformers: client.counts().total(),
            created_at,
        }
    }
}

/// Save failure; nothing was stored
#[derive(Error, Debug)]
pub enum SaveError {
    /// Another save of this record has not finished yet
    #[error("A save is already in flight")]
    AlreadyInFlight,

    /// Record failed structural validation before reaching storage
    #[error("Record rejected: {}", join_violations(.0))]
    Rejected(Vec<Violation>),

    /// Backend failure
    #[error(transparent)]
    Storage(#[from] Error),
}

/// Create/read access to finalized records
///
/// `save` is all-or-nothing: either the client info, every transformer and
/// every present OLTC sub-record are stored and an id is returned, or nothing
/// is stored.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn save(&self, record: &Record) -> std::result::Result<RecordId, SaveError>;

    /// Stored records, newest first
    async fn list(&self) -> Result<Vec<RecordSummary>>;

    /// `Ok(None)` when no record has this id
    async fn get(&self, id: RecordId) -> Result<Option<Record>>;
}

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    async fn save(&self, record: &Record) -> std::result::Result<RecordId, SaveError> {
        (**self).save(record).await
    }

    async fn list(&self) -> Result<Vec<RecordSummary>> {
        (**self).list().await
    }

    async fn get(&self, id: RecordId) -> Result<Option<Record>> {
        (**self).get(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_parse_round_trip() {
        let id = RecordId::generate();
        let parsed: RecordId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_record_id_parse_rejects_garbage() {
        let result = "not-a-uuid".parse::<RecordId>();
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
