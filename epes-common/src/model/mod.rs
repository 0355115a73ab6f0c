//! Record model
//!
//! One servicing [`Record`] is a [`ClientInfo`] plus the ordered sequence of
//! [`TransformerRecord`]s it covers. Transformers optionally carry an
//! [`OltcInfo`] sub-record, modelled as the [`OltcStatus`] variant so the
//! `hasOLTC` flag can never disagree with the payload.
//!
//! Field names on the structured-text boundary are the mixed-case names used
//! by the export files (`clientName`, `voltageHV`, `oltcInfo`, ...).

pub mod defaults;
pub mod fields;
pub mod validate;

pub use defaults::RecordDefaults;
pub use fields::{ClientField, OltcField, TransformerField};
pub use validate::{
    validate_client_info, validate_record, validate_transformer_record, Violation, ViolationReason,
};

use chrono::NaiveDate;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Most transformers one record may cover
///
/// Counts above this fail client validation, so no transformer sequence is
/// ever generated for them.
pub const MAX_TRANSFORMERS: u32 = 500;

/// Transformer counts for one client
///
/// Only the derivation engine builds consistent counts; values read back from
/// storage or files go through [`TransformerCounts::from_stored`] and are
/// checked by [`validate_client_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransformerCounts {
    total: u32,
    with_oltc: u32,
    without_oltc: u32,
}

impl TransformerCounts {
    pub(crate) fn derived(total: u32, with_oltc: u32) -> Self {
        debug_assert!(with_oltc <= total);
        Self {
            total,
            with_oltc,
            without_oltc: total - with_oltc,
        }
    }

    /// Rebuild counts exactly as stored, without derivation
    pub fn from_stored(total: u32, with_oltc: u32, without_oltc: u32) -> Self {
        Self {
            total,
            with_oltc,
            without_oltc,
        }
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn with_oltc(&self) -> u32 {
        self.with_oltc
    }

    pub fn without_oltc(&self) -> u32 {
        self.without_oltc
    }

    /// True when position `index` must carry an OLTC
    pub fn is_locked(&self, index: usize) -> bool {
        (index as u64) < self.with_oltc as u64
    }
}

impl Default for TransformerCounts {
    fn default() -> Self {
        Self::derived(1, 0)
    }
}

/// Client-level details entered in the first wizard stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub client_name: String,
    pub client_address: String,
    pub pincode: String,
    pub tr_number: String,
    pub date_of_test: NaiveDate,
    no_of_transformers: u32,
    #[serde(rename = "noOfTransformersWithOLTC")]
    no_of_transformers_with_oltc: u32,
    #[serde(rename = "noOfTransformersWithoutOLTC")]
    no_of_transformers_without_oltc: u32,
}

impl ClientInfo {
    /// Empty client details dated `date_of_test`, one transformer without OLTC
    pub fn new(date_of_test: NaiveDate) -> Self {
        let mut info = Self {
            client_name: String::new(),
            client_address: String::new(),
            pincode: String::new(),
            tr_number: String::new(),
            date_of_test,
            no_of_transformers: 0,
            no_of_transformers_with_oltc: 0,
            no_of_transformers_without_oltc: 0,
        };
        info.set_counts(TransformerCounts::default());
        info
    }

    pub fn counts(&self) -> TransformerCounts {
        TransformerCounts::from_stored(
            self.no_of_transformers,
            self.no_of_transformers_with_oltc,
            self.no_of_transformers_without_oltc,
        )
    }

    pub fn set_counts(&mut self, counts: TransformerCounts) {
        self.no_of_transformers = counts.total;
        self.no_of_transformers_with_oltc = counts.with_oltc;
        self.no_of_transformers_without_oltc = counts.without_oltc;
    }
}

/// On-load tap changer nameplate and test data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OltcInfo {
    pub oltc_make: String,
    pub oltc_type: String,
    pub oltc_serial_number: String,
    pub oltc_year_of_manufacture: String,
    #[serde(rename = "oltcVoltageHV")]
    pub oltc_voltage_hv: String,
    pub oltc_rated_current: String,
    pub oltc_oil_temperature: String,
    pub oltc_electrode_gap: String,
}

/// Whether a transformer has an OLTC, and its data when it does
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OltcStatus {
    WithOltc(OltcInfo),
    #[default]
    WithoutOltc,
}

impl OltcStatus {
    pub fn has_oltc(&self) -> bool {
        matches!(self, OltcStatus::WithOltc(_))
    }

    pub fn info(&self) -> Option<&OltcInfo> {
        match self {
            OltcStatus::WithOltc(info) => Some(info),
            OltcStatus::WithoutOltc => None,
        }
    }

    pub fn info_mut(&mut self) -> Option<&mut OltcInfo> {
        match self {
            OltcStatus::WithOltc(info) => Some(info),
            OltcStatus::WithoutOltc => None,
        }
    }
}

#[derive(Serialize)]
struct OltcWireRef<'a> {
    #[serde(rename = "hasOLTC")]
    has_oltc: bool,
    #[serde(rename = "oltcInfo", skip_serializing_if = "Option::is_none")]
    oltc_info: Option<&'a OltcInfo>,
}

#[derive(Deserialize)]
struct OltcWire {
    #[serde(rename = "hasOLTC")]
    has_oltc: bool,
    #[serde(rename = "oltcInfo", default)]
    oltc_info: Option<OltcInfo>,
}

impl Serialize for OltcStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        OltcWireRef {
            has_oltc: self.has_oltc(),
            oltc_info: self.info(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OltcStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = OltcWire::deserialize(deserializer)?;
        match (wire.has_oltc, wire.oltc_info) {
            (true, Some(info)) => Ok(OltcStatus::WithOltc(info)),
            (false, None) => Ok(OltcStatus::WithoutOltc),
            (true, None) => Err(D::Error::custom("hasOLTC is true but oltcInfo is missing")),
            (false, Some(_)) => Err(D::Error::custom("oltcInfo is present but hasOLTC is false")),
        }
    }
}

/// Test data for one transformer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformerRecord {
    pub transformer_id: String,
    #[serde(flatten)]
    pub oltc: OltcStatus,
    pub transformer_make: String,
    pub capacity: String,
    pub serial_number: String,
    pub year_of_manufacture: String,
    #[serde(rename = "voltageHV")]
    pub voltage_hv: String,
    #[serde(rename = "voltageLV")]
    pub voltage_lv: String,
    #[serde(rename = "currentHV")]
    pub current_hv: String,
    #[serde(rename = "currentLV")]
    pub current_lv: String,
    pub impedance_voltage: String,
    pub oil_temperature: String,
    pub electrode_gap: String,
    pub bdv_sample_no1: String,
    pub bdv_sample_no2: String,
    pub breakdown_voltage: String,
    pub acidity_value: String,
    pub permissible_limit: String,
}

impl TransformerRecord {
    /// Identifier for the transformer at zero-based `position`
    pub fn identifier_for(position: usize) -> String {
        format!("Transformer {}", position + 1)
    }

    pub fn has_oltc(&self) -> bool {
        self.oltc.has_oltc()
    }
}

/// Finalized aggregate: the unit of persistence and export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub client_info: ClientInfo,
    pub transformers: Vec<TransformerRecord>,
}
