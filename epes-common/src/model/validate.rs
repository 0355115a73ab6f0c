//! Structural validation
//!
//! Validators never fail; they return the list of violations found so the
//! wizard (or a store) can decide whether to block. An empty list means valid.

use super::{ClientField, ClientInfo, Record, TransformerCounts, TransformerRecord, MAX_TRANSFORMERS};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Why a field failed validation
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationReason {
    #[error("is required")]
    Required,

    #[error("at least one transformer is required")]
    NoTransformers,

    #[error("{total} transformers exceeds the limit of {max}")]
    TooManyTransformers { total: u32, max: u32 },

    #[error("{with_oltc} with OLTC exceeds the total of {total}")]
    OltcExceedsTotal { total: u32, with_oltc: u32 },

    #[error("{with_oltc} with OLTC + {without_oltc} without OLTC does not equal the total of {total}")]
    CountsInconsistent {
        total: u32,
        with_oltc: u32,
        without_oltc: u32,
    },

    #[error("expected identifier {expected:?}, found {actual:?}")]
    IdentifierMismatch { expected: String, actual: String },

    #[error("the first {locked} transformers must have an OLTC")]
    LockedOltc { locked: u32 },

    #[error("expected {expected} transformers, found {actual}")]
    SequenceLength { expected: usize, actual: usize },
}

/// A single field-level or cross-field invariant breach
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Export-style field path, e.g. `clientName` or `transformers[1].hasOLTC`
    pub field: String,
    pub reason: ViolationReason,
}

impl Violation {
    pub fn new(field: impl Into<String>, reason: ViolationReason) -> Self {
        Self {
            field: field.into(),
            reason,
        }
    }

    pub(crate) fn prefixed(mut self, prefix: &str) -> Self {
        self.field = format!("{}.{}", prefix, self.field);
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// One-line description of a violation list, for error messages and logs
pub fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check client text fields and the count invariant
pub fn validate_client_info(info: &ClientInfo) -> Vec<Violation> {
    let mut violations: Vec<Violation> = ClientField::ALL
        .iter()
        .filter(|field| field.get(info).trim().is_empty())
        .map(|field| Violation::new(field.export_name(), ViolationReason::Required))
        .collect();

    let counts = info.counts();
    if counts.total() == 0 {
        violations.push(Violation::new(
            "noOfTransformers",
            ViolationReason::NoTransformers,
        ));
    }
    if counts.total() > MAX_TRANSFORMERS {
        violations.push(Violation::new(
            "noOfTransformers",
            ViolationReason::TooManyTransformers {
                total: counts.total(),
                max: MAX_TRANSFORMERS,
            },
        ));
    }
    if counts.with_oltc() > counts.total() {
        violations.push(Violation::new(
            "noOfTransformersWithOLTC",
            ViolationReason::OltcExceedsTotal {
                total: counts.total(),
                with_oltc: counts.with_oltc(),
            },
        ));
    }
    if counts.with_oltc() as u64 + counts.without_oltc() as u64 != counts.total() as u64 {
        violations.push(Violation::new(
            "noOfTransformersWithoutOLTC",
            ViolationReason::CountsInconsistent {
                total: counts.total(),
                with_oltc: counts.with_oltc(),
                without_oltc: counts.without_oltc(),
            },
        ));
    }

    violations
}

/// Check one transformer's structural fields against its position
///
/// Free-text fields may be empty; only the identifier and the OLTC lock are
/// checked.
pub fn validate_transformer_record(
    record: &TransformerRecord,
    position: usize,
    counts: &TransformerCounts,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    let expected = TransformerRecord::identifier_for(position);
    if record.transformer_id != expected {
        violations.push(Violation::new(
            "transformerId",
            ViolationReason::IdentifierMismatch {
                expected,
                actual: record.transformer_id.clone(),
            },
        ));
    }

    if counts.is_locked(position) && !record.has_oltc() {
        violations.push(Violation::new(
            "hasOLTC",
            ViolationReason::LockedOltc {
                locked: counts.with_oltc(),
            },
        ));
    }

    violations
}

/// Check a whole record: client details, sequence length and every transformer
pub fn validate_record(record: &Record) -> Vec<Violation> {
    let mut violations = validate_client_info(&record.client_info);
    violations.extend(validate_sequence(&record.client_info.counts(), &record.transformers));
    violations
}

/// Structural completeness of a transformer sequence for `counts`
pub(crate) fn validate_sequence(
    counts: &TransformerCounts,
    transformers: &[TransformerRecord],
) -> Vec<Violation> {
    let mut violations = Vec::new();

    if transformers.len() != counts.total() as usize {
        violations.push(Violation::new(
            "transformers",
            ViolationReason::SequenceLength {
                expected: counts.total() as usize,
                actual: transformers.len(),
            },
        ));
    }

    for (position, transformer) in transformers.iter().enumerate() {
        let prefix = format!("transformers[{}]", position);
        violations.extend(
            validate_transformer_record(transformer, position, counts)
                .into_iter()
                .map(|v| v.prefixed(&prefix)),
        );
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OltcStatus, RecordDefaults};
    use chrono::NaiveDate;

    fn filled_client() -> ClientInfo {
        let mut info = ClientInfo::new(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        info.client_name = "Acme Mills".to_string();
        info.client_address = "12 Ring Road".to_string();
        info.pincode = "600001".to_string();
        info.tr_number = "TR-001".to_string();
        info
    }

    #[test]
    fn test_filled_client_is_valid() {
        assert!(validate_client_info(&filled_client()).is_empty());
    }

    #[test]
    fn test_blank_fields_are_required() {
        let mut info = filled_client();
        info.client_name = "   ".to_string();
        info.pincode.clear();

        let violations = validate_client_info(&info);
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["clientName", "pincode"]);
        assert!(violations.iter().all(|v| v.reason == ViolationReason::Required));
    }

    #[test]
    fn test_inconsistent_stored_counts() {
        let mut info = filled_client();
        info.set_counts(TransformerCounts::from_stored(3, 4, 1));

        let violations = validate_client_info(&info);
        assert!(violations
            .iter()
            .any(|v| matches!(v.reason, ViolationReason::OltcExceedsTotal { .. })));
        assert!(violations
            .iter()
            .any(|v| matches!(v.reason, ViolationReason::CountsInconsistent { .. })));
    }

    #[test]
    fn test_zero_transformers_rejected() {
        let mut info = filled_client();
        info.set_counts(TransformerCounts::from_stored(0, 0, 0));

        let violations = validate_client_info(&info);
        assert_eq!(
            violations,
            vec![Violation::new("noOfTransformers", ViolationReason::NoTransformers)]
        );
    }

    #[test]
    fn test_total_above_limit_rejected() {
        let mut info = filled_client();
        info.set_counts(TransformerCounts::derived(MAX_TRANSFORMERS, 0));
        assert!(validate_client_info(&info).is_empty());

        info.set_counts(TransformerCounts::derived(u32::MAX, 3));
        assert_eq!(
            validate_client_info(&info),
            vec![Violation::new(
                "noOfTransformers",
                ViolationReason::TooManyTransformers {
                    total: u32::MAX,
                    max: MAX_TRANSFORMERS,
                }
            )]
        );
    }

    #[test]
    fn test_locked_position_without_oltc() {
        let defaults = RecordDefaults::default();
        let counts = TransformerCounts::derived(2, 1);
        let mut record = defaults.transformer(0, true);
        record.oltc = OltcStatus::WithoutOltc;

        let violations = validate_transformer_record(&record, 0, &counts);
        assert_eq!(
            violations,
            vec![Violation::new("hasOLTC", ViolationReason::LockedOltc { locked: 1 })]
        );
    }

    #[test]
    fn test_empty_text_fields_pass() {
        let defaults = RecordDefaults::default();
        let counts = TransformerCounts::derived(1, 0);
        let record = defaults.transformer(0, false);
        assert!(validate_transformer_record(&record, 0, &counts).is_empty());
    }

    #[test]
    fn test_record_paths_are_prefixed() {
        let defaults = RecordDefaults::default();
        let mut info = filled_client();
        info.set_counts(TransformerCounts::derived(2, 0));
        let mut second = defaults.transformer(1, false);
        second.transformer_id = "T2".to_string();

        let record = Record {
            client_info: info,
            transformers: vec![defaults.transformer(0, false), second],
        };

        let violations = validate_record(&record);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "transformers[1].transformerId");
        assert_eq!(
            violations[0].to_string(),
            "transformers[1].transformerId: expected identifier \"Transformer 2\", found \"T2\""
        );
    }

    #[test]
    fn test_short_sequence_reported() {
        let info = filled_client();
        let record = Record {
            client_info: info,
            transformers: Vec::new(),
        };

        assert_eq!(
            validate_record(&record),
            vec![Violation::new(
                "transformers",
                ViolationReason::SequenceLength { expected: 1, actual: 0 }
            )]
        );
    }
}
