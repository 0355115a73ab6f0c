//! Command tests against a scratch SQLite database

use chrono::NaiveDate;
use epes_common::db::SqliteRecordStore;
use epes_common::derivation::{derive_transformer_counts, generate_transformer_sequence};
use epes_common::export::json::{from_json_bytes, to_json_bytes};
use epes_common::export::ExportFormat;
use epes_common::model::{ClientInfo, Record, RecordDefaults, MAX_TRANSFORMERS};
use epes_common::store::{RecordStore, RecordSubmitter, SaveError};
use epes_rv::commands;
use tempfile::TempDir;

fn sample_record(name: &str) -> Record {
    let mut client_info = ClientInfo::new(NaiveDate::from_ymd_opt(2024, 11, 3).unwrap());
    client_info.client_name = name.to_string();
    client_info.client_address = "Sector 5".to_string();
    client_info.pincode = "201301".to_string();
    client_info.tr_number = "TR-501".to_string();
    let counts = derive_transformer_counts(2, 1);
    client_info.set_counts(counts);
    Record {
        client_info,
        transformers: generate_transformer_sequence(counts.total(), counts.with_oltc()),
    }
}

async fn open_store(temp_dir: &TempDir) -> SqliteRecordStore {
    SqliteRecordStore::open(&temp_dir.path().join("epes.db"))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_list_empty_and_populated() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir).await;

    let mut out = Vec::new();
    commands::list(&store, &mut out).await.unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "No records stored\n");

    let older = store.save(&sample_record("Older Client")).await.unwrap();
    let newer = store.save(&sample_record("Newer Client")).await.unwrap();

    let mut out = Vec::new();
    commands::list(&store, &mut out).await.unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("ID"));
    assert!(lines[1].starts_with(&newer.to_string()));
    assert!(lines[1].contains("Newer Client"));
    assert!(lines[2].starts_with(&older.to_string()));
}

#[tokio::test]
async fn test_show_prints_json() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir).await;
    let record = sample_record("Acme");
    let id = store.save(&record).await.unwrap();

    let mut out = Vec::new();
    commands::show(&store, &id.to_string(), &mut out).await.unwrap();

    assert_eq!(from_json_bytes(&out).unwrap(), record);
}

#[tokio::test]
async fn test_show_unknown_and_malformed_ids() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir).await;
    let mut out = Vec::new();

    let err = commands::show(&store, "00000000-0000-0000-0000-000000000000", &mut out)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("No record with id"));

    assert!(commands::show(&store, "not-a-uuid", &mut out).await.is_err());
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_export_writes_named_files() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir).await;
    let record = sample_record("Acme");
    let id = store.save(&record).await.unwrap().to_string();
    let out_dir = temp_dir.path().join("exports");
    let date = NaiveDate::from_ymd_opt(2024, 11, 4).unwrap();

    let json_path = commands::export(&store, &id, ExportFormat::Json, &out_dir, date)
        .await
        .unwrap();
    assert_eq!(json_path, out_dir.join("transformer_data_2024-11-04.json"));
    let bytes = std::fs::read(&json_path).unwrap();
    assert_eq!(from_json_bytes(&bytes).unwrap(), record);

    let xlsx_path = commands::export(&store, &id, ExportFormat::Xlsx, &out_dir, date)
        .await
        .unwrap();
    assert_eq!(xlsx_path, out_dir.join("transformer_data_2024-11-04.xlsx"));
    assert!(std::fs::read(&xlsx_path).unwrap().starts_with(b"PK"));
}

#[tokio::test]
async fn test_import_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let record = sample_record("Imported");
    let file = temp_dir.path().join("record.json");
    std::fs::write(&file, to_json_bytes(&record).unwrap()).unwrap();

    let submitter = RecordSubmitter::new(open_store(&temp_dir).await);
    let id = commands::import(&submitter, &file).await.unwrap();

    let stored = submitter.store().get(id).await.unwrap().unwrap();
    assert_eq!(stored, record);
}

#[tokio::test]
async fn test_import_rejects_invalid_record() {
    let temp_dir = TempDir::new().unwrap();
    let mut record = sample_record("Broken");
    record.transformers[0].transformer_id = "Transformer 9".to_string();
    let file = temp_dir.path().join("record.json");
    std::fs::write(&file, to_json_bytes(&record).unwrap()).unwrap();

    let submitter = RecordSubmitter::new(open_store(&temp_dir).await);
    let err = commands::import(&submitter, &file).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SaveError>(),
        Some(SaveError::Rejected(_))
    ));
    assert!(submitter.store().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_template_uses_defaults_and_counts() {
    let temp_dir = TempDir::new().unwrap();
    let defaults = RecordDefaults {
        voltage_hv: "33000".to_string(),
        ..RecordDefaults::default()
    };
    let date = NaiveDate::from_ymd_opt(2024, 11, 5).unwrap();

    let path = commands::template(&defaults, 3, 5, temp_dir.path(), date)
        .await
        .unwrap();
    assert_eq!(path, temp_dir.path().join("transformer_template_2024-11-05.json"));

    let record = from_json_bytes(&std::fs::read(&path).unwrap()).unwrap();
    let counts = record.client_info.counts();
    assert_eq!((counts.total(), counts.with_oltc(), counts.without_oltc()), (3, 3, 0));
    assert!(record.transformers.iter().all(|t| t.has_oltc()));
    assert!(record.transformers.iter().all(|t| t.voltage_hv == "33000"));
    assert!(record.client_info.client_name.is_empty());
}

#[tokio::test]
async fn test_template_requires_a_transformer() {
    let temp_dir = TempDir::new().unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 11, 5).unwrap();

    assert!(
        commands::template(&RecordDefaults::default(), 0, 0, temp_dir.path(), date)
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_template_rejects_total_above_limit() {
    let temp_dir = TempDir::new().unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 11, 5).unwrap();

    let err = commands::template(&RecordDefaults::default(), u32::MAX, 0, temp_dir.path(), date)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("at most"));
    assert!(std::fs::read_dir(temp_dir.path()).unwrap().next().is_none());

    assert!(commands::template(
        &RecordDefaults::default(),
        MAX_TRANSFORMERS + 1,
        0,
        temp_dir.path(),
        date
    )
    .await
    .is_err());
}
