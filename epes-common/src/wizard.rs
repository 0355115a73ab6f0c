//! Data-entry wizard state machine
//!
//! Three linear stages: CLIENT_DETAILS → TRANSFORMER_DATA → CONFIRMATION.
//! `Back` steps one stage towards the start without validation, `Reset`
//! discards everything and re-enters the initial state.
//!
//! The wizard owns the in-progress [`Record`]. Client edits are accepted only
//! in CLIENT_DETAILS, transformer edits only in TRANSFORMER_DATA, and nothing
//! is editable at CONFIRMATION. Transformer counts are derived synchronously
//! with the edit that changes them; the transformer sequence is regenerated
//! when leaving CLIENT_DETAILS with counts that differ from the last
//! generation. Regeneration replaces the sequence, so per-transformer edits
//! made before a count change are lost.
//!
//! Saving and exporting are left to the caller: at CONFIRMATION the wizard
//! hands out the finalized record via [`Wizard::finalized`].

use crate::derivation::{
    derive_transformer_counts, generate_transformer_sequence_with, set_has_oltc,
};
use crate::model::validate::{join_violations, validate_sequence};
use crate::model::{
    validate_client_info, ClientField, ClientInfo, OltcField, Record, RecordDefaults,
    TransformerCounts, TransformerField, TransformerRecord, Violation, ViolationReason,
    MAX_TRANSFORMERS,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Wizard stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    /// Client name, address, test reference and transformer counts
    ClientDetails,
    /// Per-transformer test data and OLTC sub-records
    TransformerData,
    /// Review of the finalized record
    Confirmation,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::ClientDetails, Stage::TransformerData, Stage::Confirmation];

    /// Zero-based position in the flow
    pub fn index(self) -> usize {
        match self {
            Stage::ClientDetails => 0,
            Stage::TransformerData => 1,
            Stage::Confirmation => 2,
        }
    }

    /// Completion percentage shown while this stage is active (33, 66, 100)
    pub fn progress_percent(self) -> u8 {
        ((self.index() + 1) * 100 / Stage::ALL.len()) as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::ClientDetails => "Client Details",
            Stage::TransformerData => "Transformer Data",
            Stage::Confirmation => "Confirmation",
        }
    }

    fn next(self) -> Option<Stage> {
        Stage::ALL.get(self.index() + 1).copied()
    }

    fn previous(self) -> Option<Stage> {
        self.index().checked_sub(1).map(|i| Stage::ALL[i])
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Navigation action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Next,
    Back,
    Reset,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Next => f.write_str("next"),
            Action::Back => f.write_str("back"),
            Action::Reset => f.write_str("reset"),
        }
    }
}

/// Part of the record an edit targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditTarget {
    ClientInfo,
    Transformers,
}

impl fmt::Display for EditTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditTarget::ClientInfo => f.write_str("client info"),
            EditTarget::Transformers => f.write_str("transformer data"),
        }
    }
}

/// Stage change event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTransition {
    pub action: Action,
    pub from: Stage,
    pub to: Stage,
    /// Transformer sequence was rebuilt as part of this transition
    pub regenerated: bool,
    pub transitioned_at: DateTime<Utc>,
}

/// Rejected wizard operation; the wizard state is unchanged
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WizardError {
    #[error("validation failed: {}", join_violations(.0))]
    Invalid(Vec<Violation>),

    #[error("cannot go {action} from {stage}")]
    NoTransition { stage: Stage, action: Action },

    #[error("{target} cannot be edited during {stage}")]
    NotEditable { stage: Stage, target: EditTarget },

    #[error("no transformer at position {0}")]
    NoSuchTransformer(usize),

    #[error("transformer at position {0} has no OLTC")]
    OltcAbsent(usize),
}

/// Single user action, applied with [`Wizard::apply`]
#[derive(Debug, Clone, PartialEq)]
pub enum WizardEvent {
    EditClient { field: ClientField, value: String },
    SetDateOfTest(NaiveDate),
    /// Raw total as typed; negative input counts as zero
    SetTotalTransformers(i64),
    /// Raw with-OLTC count as typed; clamped into `[0, total]`
    SetTransformersWithOltc(i64),
    EditTransformer {
        index: usize,
        field: TransformerField,
        value: String,
    },
    EditOltc {
        index: usize,
        field: OltcField,
        value: String,
    },
    SetHasOltc { index: usize, flag: bool },
    Next,
    Back,
    Reset,
}

/// In-progress servicing record and the stage it is at
#[derive(Debug, Clone, PartialEq)]
pub struct Wizard {
    stage: Stage,
    record: Record,
    /// Counts the current transformer sequence was generated for
    generated_for: TransformerCounts,
    defaults: RecordDefaults,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    /// Fresh wizard at CLIENT_DETAILS with default data
    pub fn new() -> Self {
        Self::with_defaults(RecordDefaults::default())
    }

    /// Fresh wizard whose generated transformers use `defaults`
    pub fn with_defaults(defaults: RecordDefaults) -> Self {
        let client_info = ClientInfo::new(today());
        let counts = client_info.counts();
        let transformers =
            generate_transformer_sequence_with(counts.total(), counts.with_oltc(), &defaults);

        Self {
            stage: Stage::ClientDetails,
            record: Record {
                client_info,
                transformers,
            },
            generated_for: counts,
            defaults,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn progress_percent(&self) -> u8 {
        self.stage.progress_percent()
    }

    pub fn client_info(&self) -> &ClientInfo {
        &self.record.client_info
    }

    pub fn transformers(&self) -> &[TransformerRecord] {
        &self.record.transformers
    }

    pub fn defaults(&self) -> &RecordDefaults {
        &self.defaults
    }

    /// The finalized record, available only at CONFIRMATION
    pub fn finalized(&self) -> Option<&Record> {
        match self.stage {
            Stage::Confirmation => Some(&self.record),
            _ => None,
        }
    }

    /// Apply one event
    ///
    /// Returns the stage transition for navigation events and `None` for
    /// edits.
    pub fn apply(&mut self, event: WizardEvent) -> Result<Option<StageTransition>, WizardError> {
        match event {
            WizardEvent::EditClient { field, value } => self.edit_client(field, value)?,
            WizardEvent::SetDateOfTest(date) => self.set_date_of_test(date)?,
            WizardEvent::SetTotalTransformers(raw) => {
                self.set_total_transformers(raw)?;
            }
            WizardEvent::SetTransformersWithOltc(raw) => {
                self.set_transformers_with_oltc(raw)?;
            }
            WizardEvent::EditTransformer { index, field, value } => {
                self.edit_transformer(index, field, value)?
            }
            WizardEvent::EditOltc { index, field, value } => self.edit_oltc(index, field, value)?,
            WizardEvent::SetHasOltc { index, flag } => self.set_has_oltc(index, flag)?,
            WizardEvent::Next => return self.next().map(Some),
            WizardEvent::Back => return self.back().map(Some),
            WizardEvent::Reset => return Ok(Some(self.reset())),
        }
        Ok(None)
    }

    pub fn edit_client(
        &mut self,
        field: ClientField,
        value: impl Into<String>,
    ) -> Result<(), WizardError> {
        self.require_stage(Stage::ClientDetails, EditTarget::ClientInfo)?;
        *field.get_mut(&mut self.record.client_info) = value.into();
        debug!(field = %field, "Client field edited");
        Ok(())
    }

    pub fn set_date_of_test(&mut self, date: NaiveDate) -> Result<(), WizardError> {
        self.require_stage(Stage::ClientDetails, EditTarget::ClientInfo)?;
        self.record.client_info.date_of_test = date;
        Ok(())
    }

    /// Set the total transformer count, re-clamping the with-OLTC count
    ///
    /// A total above [`MAX_TRANSFORMERS`] is stored as typed and reported
    /// when leaving CLIENT_DETAILS.
    pub fn set_total_transformers(&mut self, raw: i64) -> Result<TransformerCounts, WizardError> {
        self.require_stage(Stage::ClientDetails, EditTarget::ClientInfo)?;
        let total = raw.clamp(0, u32::MAX as i64) as u32;
        let with_oltc = self.record.client_info.counts().with_oltc();
        Ok(self.store_counts(derive_transformer_counts(total, with_oltc as i64)))
    }

    /// Set the with-OLTC count, clamped into `[0, total]`
    pub fn set_transformers_with_oltc(
        &mut self,
        raw: i64,
    ) -> Result<TransformerCounts, WizardError> {
        self.require_stage(Stage::ClientDetails, EditTarget::ClientInfo)?;
        let total = self.record.client_info.counts().total();
        Ok(self.store_counts(derive_transformer_counts(total, raw)))
    }

    fn store_counts(&mut self, counts: TransformerCounts) -> TransformerCounts {
        self.record.client_info.set_counts(counts);
        debug!(
            total = counts.total(),
            with_oltc = counts.with_oltc(),
            without_oltc = counts.without_oltc(),
            "Transformer counts derived"
        );
        counts
    }

    pub fn edit_transformer(
        &mut self,
        index: usize,
        field: TransformerField,
        value: impl Into<String>,
    ) -> Result<(), WizardError> {
        self.require_stage(Stage::TransformerData, EditTarget::Transformers)?;
        let transformer = self.transformer_mut(index)?;
        *field.get_mut(transformer) = value.into();
        debug!(index, field = %field, "Transformer field edited");
        Ok(())
    }

    pub fn edit_oltc(
        &mut self,
        index: usize,
        field: OltcField,
        value: impl Into<String>,
    ) -> Result<(), WizardError> {
        self.require_stage(Stage::TransformerData, EditTarget::Transformers)?;
        let info = self
            .transformer_mut(index)?
            .oltc
            .info_mut()
            .ok_or(WizardError::OltcAbsent(index))?;
        *field.get_mut(info) = value.into();
        debug!(index, field = %field, "OLTC field edited");
        Ok(())
    }

    /// Toggle OLTC on one transformer; locked positions cannot be cleared
    pub fn set_has_oltc(&mut self, index: usize, flag: bool) -> Result<(), WizardError> {
        self.require_stage(Stage::TransformerData, EditTarget::Transformers)?;
        let counts = self.record.client_info.counts();
        let defaults = self.defaults.clone();
        let transformer = self.transformer_mut(index)?;
        set_has_oltc(transformer, index, &counts, flag, &defaults).map_err(|violation| {
            warn!(index, "Rejected clearing OLTC on a locked transformer");
            WizardError::Invalid(vec![violation.prefixed(&format!("transformers[{}]", index))])
        })
    }

    /// Rebuild the transformer sequence from the current counts
    ///
    /// Discards every per-transformer edit. Not available at CONFIRMATION,
    /// and rejected while the total exceeds [`MAX_TRANSFORMERS`].
    pub fn regenerate_transformers(&mut self) -> Result<(), WizardError> {
        if self.stage == Stage::Confirmation {
            return Err(WizardError::NotEditable {
                stage: self.stage,
                target: EditTarget::Transformers,
            });
        }
        let total = self.record.client_info.counts().total();
        if total > MAX_TRANSFORMERS {
            return Err(WizardError::Invalid(vec![Violation::new(
                "noOfTransformers",
                ViolationReason::TooManyTransformers {
                    total,
                    max: MAX_TRANSFORMERS,
                },
            )]));
        }
        self.regenerate();
        Ok(())
    }

    /// True when the sequence differs from the one last generated
    fn has_transformer_edits(&self) -> bool {
        let generated = self.generated_for;
        self.record.transformers.len() != generated.total() as usize
            || self
                .record
                .transformers
                .iter()
                .enumerate()
                .any(|(i, t)| *t != self.defaults.transformer(i, generated.is_locked(i)))
    }

    fn regenerate(&mut self) {
        let counts = self.record.client_info.counts();
        if self.has_transformer_edits() {
            warn!(
                previous_total = self.generated_for.total(),
                total = counts.total(),
                "Regenerating transformers discards edited transformer data"
            );
        }

        self.record.transformers =
            generate_transformer_sequence_with(counts.total(), counts.with_oltc(), &self.defaults);
        self.generated_for = counts;
    }

    /// Advance one stage
    ///
    /// Leaving CLIENT_DETAILS requires valid client info and regenerates the
    /// transformers when the counts changed since the last generation.
    /// Leaving TRANSFORMER_DATA requires a structurally complete sequence.
    pub fn next(&mut self) -> Result<StageTransition, WizardError> {
        let to = self.stage.next().ok_or(WizardError::NoTransition {
            stage: self.stage,
            action: Action::Next,
        })?;

        let mut regenerated = false;
        match self.stage {
            Stage::ClientDetails => {
                let violations = validate_client_info(&self.record.client_info);
                if !violations.is_empty() {
                    debug!(count = violations.len(), "Client details incomplete");
                    return Err(WizardError::Invalid(violations));
                }
                if self.record.client_info.counts() != self.generated_for {
                    self.regenerate();
                    regenerated = true;
                }
            }
            Stage::TransformerData => {
                let violations =
                    validate_sequence(&self.record.client_info.counts(), &self.record.transformers);
                if !violations.is_empty() {
                    return Err(WizardError::Invalid(violations));
                }
            }
            Stage::Confirmation => {}
        }

        Ok(self.transition_to(Action::Next, to, regenerated))
    }

    /// Step back one stage; keeps all data
    pub fn back(&mut self) -> Result<StageTransition, WizardError> {
        let to = self.stage.previous().ok_or(WizardError::NoTransition {
            stage: self.stage,
            action: Action::Back,
        })?;
        Ok(self.transition_to(Action::Back, to, false))
    }

    /// Discard everything and return to the initial state
    pub fn reset(&mut self) -> StageTransition {
        let from = self.stage;
        *self = Self::with_defaults(self.defaults.clone());
        let transition = StageTransition {
            action: Action::Reset,
            from,
            to: self.stage,
            regenerated: true,
            transitioned_at: Utc::now(),
        };
        info!(from = %from, "Wizard reset");
        transition
    }

    fn transition_to(&mut self, action: Action, to: Stage, regenerated: bool) -> StageTransition {
        let transition = StageTransition {
            action,
            from: self.stage,
            to,
            regenerated,
            transitioned_at: Utc::now(),
        };
        self.stage = to;

        info!(
            from = %transition.from,
            to = %transition.to,
            regenerated,
            progress = self.progress_percent(),
            "Wizard stage changed"
        );

        transition
    }

    fn require_stage(&self, expected: Stage, target: EditTarget) -> Result<(), WizardError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(WizardError::NotEditable {
                stage: self.stage,
                target,
            })
        }
    }

    fn transformer_mut(&mut self, index: usize) -> Result<&mut TransformerRecord, WizardError> {
        self.record
            .transformers
            .get_mut(index)
            .ok_or(WizardError::NoSuchTransformer(index))
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
