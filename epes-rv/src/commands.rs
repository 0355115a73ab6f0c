//! Subcommand implementations
//!
//! Every command takes the store it works on and the writer to report to, so
//! the binary and the tests drive them the same way.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate};
use epes_common::derivation::{derive_transformer_counts, generate_transformer_sequence_with};
use epes_common::export::{export as encode, file_name, json, ExportFormat};
use epes_common::model::{validate_record, ClientInfo, Record, RecordDefaults, MAX_TRANSFORMERS};
use epes_common::store::{RecordId, RecordStore, RecordSubmitter};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Print one line per stored record, newest first
pub async fn list<S: RecordStore>(store: &S, out: &mut impl Write) -> Result<()> {
    let summaries = store.list().await.context("Failed to list records")?;
    if summaries.is_empty() {
        writeln!(out, "No records stored")?;
        return Ok(());
    }

    writeln!(
        out,
        "{:<36}  {:<24}  {:<12}  {:<10}  {:>5}  {}",
        "ID", "CLIENT", "TR NUMBER", "TESTED", "TRANS", "CREATED"
    )?;
    for s in &summaries {
        writeln!(
            out,
            "{:<36}  {:<24}  {:<12}  {:<10}  {:>5}  {}",
            s.id,
            truncate(&s.client_name, 24),
            truncate(&s.tr_number, 12),
            s.date_of_test,
            s.no_of_transformers,
            s.created_at.format("%Y-%m-%d %H:%M:%S")
        )?;
    }
    debug!(count = summaries.len(), "Listed records");
    Ok(())
}

/// Print one record as pretty JSON
pub async fn show<S: RecordStore>(store: &S, id: &str, out: &mut impl Write) -> Result<()> {
    let record = fetch(store, id).await?;
    out.write_all(&json::to_json_bytes(&record)?)?;
    Ok(())
}

/// Write one record to `out_dir`, returning the path written
///
/// The file is named after `export_date`, as `transformer_data_<date>.<ext>`.
pub async fn export<S: RecordStore>(
    store: &S,
    id: &str,
    format: ExportFormat,
    out_dir: &Path,
    export_date: NaiveDate,
) -> Result<PathBuf> {
    let record = fetch(store, id).await?;
    let bytes = encode(&record, format)?;

    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    let path = out_dir.join(file_name(export_date, format));
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!(record_id = %id, format = %format, path = %path.display(), "Record exported");
    Ok(path)
}

/// Store a record read from a JSON export file
pub async fn import<S: RecordStore>(submitter: &RecordSubmitter<S>, file: &Path) -> Result<RecordId> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let record = json::from_json_bytes(&bytes)
        .with_context(|| format!("{} is not a record export", file.display()))?;

    let id = submitter.submit(&record).await?;
    Ok(id)
}

/// Write a JSON record pre-filled with defaults, ready to complete and import
///
/// Client details are left blank; the transformer sequence is generated from
/// the requested counts. The result does not validate until the blank fields
/// are filled in.
pub async fn template(
    defaults: &RecordDefaults,
    total: u32,
    with_oltc: i64,
    out_dir: &Path,
    date: NaiveDate,
) -> Result<PathBuf> {
    if total == 0 {
        bail!("A record needs at least one transformer");
    }
    if total > MAX_TRANSFORMERS {
        bail!(
            "A record covers at most {} transformers, got {}",
            MAX_TRANSFORMERS,
            total
        );
    }

    let counts = derive_transformer_counts(total, with_oltc);
    let mut client_info = ClientInfo::new(date);
    client_info.set_counts(counts);
    let record = Record {
        client_info,
        transformers: generate_transformer_sequence_with(
            counts.total(),
            counts.with_oltc(),
            defaults,
        ),
    };
    debug!(
        violations = validate_record(&record).len(),
        "Template written with blank client details"
    );

    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    let path = out_dir.join(format!("transformer_template_{}.json", date.format("%Y-%m-%d")));
    tokio::fs::write(&path, json::to_json_bytes(&record)?)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}

/// Today's date in local time, used to name export files
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn fetch<S: RecordStore>(store: &S, id: &str) -> Result<Record> {
    let record_id: RecordId = id.parse()?;
    store
        .get(record_id)
        .await
        .with_context(|| format!("Failed to load record {}", record_id))?
        .ok_or_else(|| anyhow!("No record with id {}", record_id))
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Acme", 8), "Acme");
        assert_eq!(truncate("Acme Power Ltd", 8), "Acme Po~");
    }
}
