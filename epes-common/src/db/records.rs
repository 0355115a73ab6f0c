//! SQLite-backed record store
//!
//! A record is written as one `clients` row, one `transformers` row per
//! transformer (with its `position` in the sequence) and one `oltc_info` row
//! per transformer that has an OLTC, all inside a single transaction.

use crate::model::{
    validate_record, ClientField, ClientInfo, OltcField, OltcInfo, OltcStatus, Record,
    TransformerCounts, TransformerField, TransformerRecord,
};
use crate::store::{RecordId, RecordStore, RecordSummary, SaveError};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Record store persisting to the shared SQLite database
#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the database at `db_path`, creating file and tables if needed
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = super::init_database(db_path).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn insert_record(&self, record: &Record) -> Result<RecordId> {
        let id = RecordId::generate();
        let mut tx = self.pool.begin().await?;

        insert_client(&mut tx, id, &record.client_info).await?;
        for (position, transformer) in record.transformers.iter().enumerate() {
            let row_id = insert_transformer(&mut tx, id, position, transformer).await?;
            if let OltcStatus::WithOltc(info) = &transformer.oltc {
                insert_oltc(&mut tx, &row_id, info).await?;
            }
        }

        // Dropping the transaction on any earlier error rolls everything back
        tx.commit().await?;
        Ok(id)
    }
}

async fn insert_client(
    tx: &mut Transaction<'_, Sqlite>,
    id: RecordId,
    client: &ClientInfo,
) -> Result<()> {
    let counts = client.counts();
    let columns = ClientField::ALL
        .iter()
        .map(|f| f.storage_column())
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO clients (id, {}, date_of_test, no_of_transformers, \
         no_of_transformers_with_oltc, no_of_transformers_without_oltc, created_at) \
         VALUES (?, {}, ?, ?, ?, ?, ?)",
        columns,
        placeholders(ClientField::ALL.len())
    );

    let mut query = sqlx::query(&sql).bind(id.to_string());
    for field in ClientField::ALL {
        query = query.bind(field.get(client));
    }
    query
        .bind(client.date_of_test.to_string())
        .bind(counts.total() as i64)
        .bind(counts.with_oltc() as i64)
        .bind(counts.without_oltc() as i64)
        // Fixed-width timestamps so text order is creation order
        .bind(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(&mut **tx)
        .await?;

    Ok(())
}

async fn insert_transformer(
    tx: &mut Transaction<'_, Sqlite>,
    client_id: RecordId,
    position: usize,
    transformer: &TransformerRecord,
) -> Result<String> {
    let row_id = Uuid::new_v4().to_string();
    let columns = TransformerField::ALL
        .iter()
        .map(|f| f.storage_column())
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO transformers (id, client_id, position, transformer_id, has_oltc, {}) \
         VALUES (?, ?, ?, ?, ?, {})",
        columns,
        placeholders(TransformerField::ALL.len())
    );

    let mut query = sqlx::query(&sql)
        .bind(&row_id)
        .bind(client_id.to_string())
        .bind(position as i64)
        .bind(&transformer.transformer_id)
        .bind(transformer.has_oltc());
    for field in TransformerField::ALL {
        query = query.bind(field.get(transformer));
    }
    query.execute(&mut **tx).await?;

    Ok(row_id)
}

async fn insert_oltc(
    tx: &mut Transaction<'_, Sqlite>,
    transformer_row_id: &str,
    info: &OltcInfo,
) -> Result<()> {
    let columns = OltcField::ALL
        .iter()
        .map(|f| f.storage_column())
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO oltc_info (id, transformer_id, {}) VALUES (?, ?, {})",
        columns,
        placeholders(OltcField::ALL.len())
    );

    let mut query = sqlx::query(&sql)
        .bind(Uuid::new_v4().to_string())
        .bind(transformer_row_id);
    for field in OltcField::ALL {
        query = query.bind(field.get(info));
    }
    query.execute(&mut **tx).await?;

    Ok(())
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    value
        .parse::<NaiveDate>()
        .map_err(|e| Error::InvalidInput(format!("Invalid stored date {:?}: {}", value, e)))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::InvalidInput(format!("Invalid stored timestamp {:?}: {}", value, e)))
}

fn parse_count(row: &SqliteRow, column: &str) -> Result<u32> {
    let value: i64 = row.try_get(column)?;
    u32::try_from(value)
        .map_err(|_| Error::InvalidInput(format!("Invalid stored count {}: {}", column, value)))
}

fn client_from_row(row: &SqliteRow) -> Result<ClientInfo> {
    let date: String = row.try_get("date_of_test")?;
    let mut client = ClientInfo::new(parse_date(&date)?);
    for field in ClientField::ALL {
        *field.get_mut(&mut client) = row.try_get(field.storage_column())?;
    }
    client.set_counts(TransformerCounts::from_stored(
        parse_count(row, "no_of_transformers")?,
        parse_count(row, "no_of_transformers_with_oltc")?,
        parse_count(row, "no_of_transformers_without_oltc")?,
    ));
    Ok(client)
}

fn transformer_from_row(row: &SqliteRow) -> Result<TransformerRecord> {
    let label: String = row.try_get("label")?;
    let has_oltc: bool = row.try_get("has_oltc")?;
    let oltc_row: Option<String> = row.try_get("oltc_row_id")?;

    let oltc = match (has_oltc, oltc_row) {
        (true, Some(_)) => {
            let mut info = OltcInfo::default();
            for field in OltcField::ALL {
                *field.get_mut(&mut info) = row.try_get(field.storage_column())?;
            }
            OltcStatus::WithOltc(info)
        }
        (false, None) => OltcStatus::WithoutOltc,
        (true, None) => {
            return Err(Error::InvalidInput(format!(
                "{} is marked as having an OLTC but no OLTC row is stored",
                label
            )))
        }
        (false, Some(_)) => {
            return Err(Error::InvalidInput(format!(
                "{} has an OLTC row but is marked as having none",
                label
            )))
        }
    };

    let mut transformer = TransformerRecord {
        transformer_id: label,
        oltc,
        ..TransformerRecord::default()
    };
    for field in TransformerField::ALL {
        *field.get_mut(&mut transformer) = row.try_get(field.storage_column())?;
    }
    Ok(transformer)
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn save(&self, record: &Record) -> std::result::Result<RecordId, SaveError> {
        let violations = validate_record(record);
        if !violations.is_empty() {
            warn!(count = violations.len(), "Refusing to store invalid record");
            return Err(SaveError::Rejected(violations));
        }

        let id = self.insert_record(record).await?;
        info!(
            record_id = %id,
            transformers = record.transformers.len(),
            "Record persisted to database"
        );
        Ok(id)
    }

    async fn list(&self) -> Result<Vec<RecordSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT id, client_name, tr_number, date_of_test, no_of_transformers, created_at
            FROM clients
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<RecordSummary> {
                let id: String = row.try_get("id")?;
                let date: String = row.try_get("date_of_test")?;
                let created_at: String = row.try_get("created_at")?;
                Ok(RecordSummary {
                    id: id.parse()?,
                    client_name: row.try_get("client_name")?,
                    tr_number: row.try_get("tr_number")?,
                    date_of_test: parse_date(&date)?,
                    no_of_transformers: parse_count(row, "no_of_transformers")?,
                    created_at: parse_timestamp(&created_at)?,
                })
            })
            .collect()
    }

    async fn get(&self, id: RecordId) -> Result<Option<Record>> {
        let client_row = sqlx::query("SELECT * FROM clients WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        let client_row = match client_row {
            Some(row) => row,
            None => {
                debug!(record_id = %id, "Record not found");
                return Ok(None);
            }
        };
        let client_info = client_from_row(&client_row)?;

        let transformer_columns = TransformerField::ALL
            .iter()
            .map(|f| format!("t.{}", f.storage_column()))
            .chain(OltcField::ALL.iter().map(|f| format!("o.{}", f.storage_column())))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT t.transformer_id AS label, t.has_oltc, o.id AS oltc_row_id, {} \
             FROM transformers t \
             LEFT JOIN oltc_info o ON o.transformer_id = t.id \
             WHERE t.client_id = ? \
             ORDER BY t.position",
            transformer_columns
        );
        let rows = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_all(&self.pool)
            .await?;

        // OLTC text columns are NULL for transformers without an OLTC row,
        // so they are only read when the row exists
        let transformers = rows
            .iter()
            .map(transformer_from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(Record {
            client_info,
            transformers,
        }))
    }
}
