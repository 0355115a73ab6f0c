//! Structured text export

use crate::model::Record;
use crate::Result;

/// Pretty-printed JSON (2-space indent) with mixed-case field names and the
/// OLTC sub-record nested under `oltcInfo`
pub fn to_json_bytes(record: &Record) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(record)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parse bytes produced by [`to_json_bytes`]
///
/// Only the shape is checked here; run [`crate::model::validate_record`] to
/// check the invariants.
pub fn from_json_bytes(bytes: &[u8]) -> Result<Record> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derivation::generate_transformer_sequence;
    use crate::model::ClientInfo;
    use chrono::NaiveDate;

    fn sample() -> Record {
        let client_info = ClientInfo::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        Record {
            client_info,
            transformers: generate_transformer_sequence(1, 0),
        }
    }

    #[test]
    fn test_two_space_indent() {
        let text = String::from_utf8(to_json_bytes(&sample()).unwrap()).unwrap();
        assert!(text.starts_with("{\n  \"clientInfo\": {\n    \"clientName\""));
        assert!(text.contains("\n      \"hasOLTC\": false"));
        assert!(!text.contains("oltcInfo"));
    }

    #[test]
    fn test_rejects_truncated_input() {
        let bytes = to_json_bytes(&sample()).unwrap();
        assert!(from_json_bytes(&bytes[..bytes.len() / 2]).is_err());
    }
}
