//! Database initialization
//!
//! Creates the database file on first run and the three record tables:
//! `clients`, `transformers` (foreign-keyed to the client) and `oltc_info`
//! (foreign-keyed to the transformer owning it, at most one per transformer).
//! Transformer and OLTC text columns come from the field catalogues.

use crate::model::{OltcField, TransformerField};
use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Busy timeout applied to every connection
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Open (creating if needed) the database at `db_path` and ensure the schema
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Foreign keys, WAL and busy timeout are per-connection settings
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let options = SqliteConnectOptions::from_str(&db_url)?
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_tables(&pool).await?;

    Ok(pool)
}

/// Create the record tables (idempotent)
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_clients_table(pool).await?;
    create_transformers_table(pool).await?;
    create_oltc_info_table(pool).await?;
    Ok(())
}

async fn create_clients_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS clients (
            id TEXT PRIMARY KEY,
            client_name TEXT NOT NULL,
            client_address TEXT NOT NULL,
            pincode TEXT NOT NULL,
            tr_number TEXT NOT NULL,
            date_of_test TEXT NOT NULL,
            no_of_transformers INTEGER NOT NULL,
            no_of_transformers_with_oltc INTEGER NOT NULL,
            no_of_transformers_without_oltc INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_clients_created_at ON clients(created_at)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_transformers_table(pool: &SqlitePool) -> Result<()> {
    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS transformers (
            id TEXT PRIMARY KEY,
            client_id TEXT NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            transformer_id TEXT NOT NULL,
            has_oltc INTEGER NOT NULL,
            {},
            UNIQUE (client_id, position)
        )
        "#,
        text_columns(TransformerField::ALL.iter().map(|f| f.storage_column()))
    );
    sqlx::query(&sql).execute(pool).await?;

    Ok(())
}

async fn create_oltc_info_table(pool: &SqlitePool) -> Result<()> {
    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS oltc_info (
            id TEXT PRIMARY KEY,
            transformer_id TEXT NOT NULL UNIQUE REFERENCES transformers(id) ON DELETE CASCADE,
            {}
        )
        "#,
        text_columns(OltcField::ALL.iter().map(|f| f.storage_column()))
    );
    sqlx::query(&sql).execute(pool).await?;

    Ok(())
}

fn text_columns<'a>(columns: impl Iterator<Item = &'a str>) -> String {
    columns
        .map(|c| format!("{} TEXT NOT NULL", c))
        .collect::<Vec<_>>()
        .join(",\n            ")
}
