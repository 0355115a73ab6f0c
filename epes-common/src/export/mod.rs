//! Export of finalized records to portable files
//!
//! Both exporters are pure: they read a [`Record`] and return bytes. Choosing
//! where the bytes go is up to the caller; [`file_name`] gives the
//! conventional name.

pub mod json;
pub mod sheet;
pub mod xlsx;

use crate::model::Record;
use crate::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Export file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Pretty-printed structured text, lossless
    Json,
    /// Two-sheet spreadsheet ("Client Info", "Transformer Data")
    Xlsx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Conventional export file name, e.g. `transformer_data_2024-03-05.xlsx`
pub fn file_name(date: NaiveDate, format: ExportFormat) -> String {
    format!("transformer_data_{}.{}", date.format("%Y-%m-%d"), format.extension())
}

/// Encode `record` in `format`
pub fn export(record: &Record, format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Json => json::to_json_bytes(record),
        ExportFormat::Xlsx => xlsx::to_xlsx_bytes(record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(file_name(date, ExportFormat::Json), "transformer_data_2024-03-05.json");
        assert_eq!(file_name(date, ExportFormat::Xlsx), "transformer_data_2024-03-05.xlsx");
    }
}
