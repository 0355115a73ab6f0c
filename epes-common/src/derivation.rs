//! Derivation engine
//!
//! Pure functions keeping dependent fields consistent: transformer counts,
//! the generated transformer sequence, and the OLTC sub-record attached to a
//! transformer.

use crate::model::{
    OltcStatus, RecordDefaults, TransformerCounts, TransformerRecord, Violation, ViolationReason,
};
use tracing::debug;

/// Clamp the with-OLTC count into `[0, total]` and derive the without-OLTC count
///
/// Negative input counts as zero; input above `total` is capped at `total`.
pub fn derive_transformer_counts(total: u32, with_oltc_raw: i64) -> TransformerCounts {
    let with_oltc = with_oltc_raw.clamp(0, total as i64) as u32;
    TransformerCounts::derived(total, with_oltc)
}

/// Generate `total` default transformers, the first `with_oltc` carrying an OLTC
pub fn generate_transformer_sequence(total: u32, with_oltc: u32) -> Vec<TransformerRecord> {
    generate_transformer_sequence_with(total, with_oltc, &RecordDefaults::default())
}

/// [`generate_transformer_sequence`] with explicit field defaults
///
/// Always builds a new sequence; nothing from a previous sequence survives.
pub fn generate_transformer_sequence_with(
    total: u32,
    with_oltc: u32,
    defaults: &RecordDefaults,
) -> Vec<TransformerRecord> {
    debug!(total, with_oltc, "Generating transformer sequence");
    (0..total as usize)
        .map(|position| defaults.transformer(position, (position as u64) < with_oltc as u64))
        .collect()
}

/// Attach or detach the OLTC sub-record of the transformer at `position`
///
/// Turning OLTC on attaches a fresh default sub-record; turning it off drops
/// the sub-record. Setting the current value again changes nothing. Clearing
/// OLTC on one of the first `counts.with_oltc()` positions is rejected and
/// leaves the record untouched.
pub fn set_has_oltc(
    record: &mut TransformerRecord,
    position: usize,
    counts: &TransformerCounts,
    flag: bool,
    defaults: &RecordDefaults,
) -> Result<(), Violation> {
    if !flag && counts.is_locked(position) {
        return Err(Violation::new(
            "hasOLTC",
            ViolationReason::LockedOltc {
                locked: counts.with_oltc(),
            },
        ));
    }

    match (flag, record.has_oltc()) {
        (true, false) => record.oltc = OltcStatus::WithOltc(defaults.oltc_info()),
        (false, true) => record.oltc = OltcStatus::WithoutOltc,
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_clamp_negative() {
        let counts = derive_transformer_counts(4, -3);
        assert_eq!(counts.with_oltc(), 0);
        assert_eq!(counts.without_oltc(), 4);
    }

    #[test]
    fn test_counts_cap_at_total() {
        let counts = derive_transformer_counts(2, 9);
        assert_eq!(counts.with_oltc(), 2);
        assert_eq!(counts.without_oltc(), 0);
    }

    #[test]
    fn test_counts_zero_total() {
        let counts = derive_transformer_counts(0, 1);
        assert_eq!(counts.total(), 0);
        assert_eq!(counts.with_oltc(), 0);
        assert_eq!(counts.without_oltc(), 0);
    }

    #[test]
    fn test_sequence_marks_leading_positions() {
        let sequence = generate_transformer_sequence(3, 2);
        let flags: Vec<bool> = sequence.iter().map(|t| t.has_oltc()).collect();
        assert_eq!(flags, vec![true, true, false]);
        assert_eq!(sequence[2].transformer_id, "Transformer 3");
    }

    #[test]
    fn test_toggle_on_attaches_fresh_defaults() {
        let defaults = RecordDefaults::default();
        let counts = derive_transformer_counts(2, 0);
        let mut record = defaults.transformer(1, false);

        set_has_oltc(&mut record, 1, &counts, true, &defaults).unwrap();
        assert_eq!(record.oltc.info(), Some(&defaults.oltc_info()));
    }

    #[test]
    fn test_toggle_on_twice_keeps_edits() {
        let defaults = RecordDefaults::default();
        let counts = derive_transformer_counts(2, 0);
        let mut record = defaults.transformer(1, false);

        set_has_oltc(&mut record, 1, &counts, true, &defaults).unwrap();
        record.oltc.info_mut().unwrap().oltc_type = "Reactor".to_string();
        set_has_oltc(&mut record, 1, &counts, true, &defaults).unwrap();

        assert_eq!(record.oltc.info().unwrap().oltc_type, "Reactor");
    }

    #[test]
    fn test_locked_position_rejected() {
        let defaults = RecordDefaults::default();
        let counts = derive_transformer_counts(2, 1);
        let mut record = defaults.transformer(0, true);
        let before = record.clone();

        let err = set_has_oltc(&mut record, 0, &counts, false, &defaults).unwrap_err();
        assert_eq!(err.reason, ViolationReason::LockedOltc { locked: 1 });
        assert_eq!(record, before);
    }
}
