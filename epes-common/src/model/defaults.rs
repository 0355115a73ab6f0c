//! Pre-filled values for newly generated transformers and OLTC sub-records

use super::{OltcInfo, OltcStatus, TransformerRecord};
use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Field values used whenever a transformer or OLTC sub-record is created
///
/// Can be overridden from the `[defaults]` table of the TOML config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordDefaults {
    /// Year of manufacture; `None` means the current calendar year
    pub year_of_manufacture: Option<String>,
    pub voltage_hv: String,
    pub voltage_lv: String,
    pub oil_temperature: String,
    pub electrode_gap: String,
    pub bdv_sample: String,
    pub breakdown_voltage: String,
    pub permissible_limit: String,
    pub oltc_make: String,
    pub oltc_voltage_hv: String,
    pub oltc_oil_temperature: String,
    pub oltc_electrode_gap: String,
}

impl Default for RecordDefaults {
    fn default() -> Self {
        Self {
            year_of_manufacture: None,
            voltage_hv: "11000".to_string(),
            voltage_lv: "433".to_string(),
            oil_temperature: "32".to_string(),
            electrode_gap: "2.5".to_string(),
            bdv_sample: "STOOD 40 kV PER MINUTE".to_string(),
            breakdown_voltage: "BROKE AT 60 kV".to_string(),
            permissible_limit: "0.30".to_string(),
            oltc_make: "OLG".to_string(),
            oltc_voltage_hv: "11000".to_string(),
            oltc_oil_temperature: "32".to_string(),
            oltc_electrode_gap: "2.5".to_string(),
        }
    }
}

impl RecordDefaults {
    fn year(&self) -> String {
        self.year_of_manufacture
            .clone()
            .unwrap_or_else(|| chrono::Local::now().year().to_string())
    }

    /// Fresh OLTC sub-record
    pub fn oltc_info(&self) -> OltcInfo {
        OltcInfo {
            oltc_make: self.oltc_make.clone(),
            oltc_type: String::new(),
            oltc_serial_number: String::new(),
            oltc_year_of_manufacture: self.year(),
            oltc_voltage_hv: self.oltc_voltage_hv.clone(),
            oltc_rated_current: String::new(),
            oltc_oil_temperature: self.oltc_oil_temperature.clone(),
            oltc_electrode_gap: self.oltc_electrode_gap.clone(),
        }
    }

    /// Fresh transformer at zero-based `position`
    pub fn transformer(&self, position: usize, with_oltc: bool) -> TransformerRecord {
        let oltc = if with_oltc {
            OltcStatus::WithOltc(self.oltc_info())
        } else {
            OltcStatus::WithoutOltc
        };

        TransformerRecord {
            transformer_id: TransformerRecord::identifier_for(position),
            oltc,
            transformer_make: String::new(),
            capacity: String::new(),
            serial_number: String::new(),
            year_of_manufacture: self.year(),
            voltage_hv: self.voltage_hv.clone(),
            voltage_lv: self.voltage_lv.clone(),
            current_hv: String::new(),
            current_lv: String::new(),
            impedance_voltage: String::new(),
            oil_temperature: self.oil_temperature.clone(),
            electrode_gap: self.electrode_gap.clone(),
            bdv_sample_no1: self.bdv_sample.clone(),
            bdv_sample_no2: self.bdv_sample.clone(),
            breakdown_voltage: self.breakdown_voltage.clone(),
            acidity_value: String::new(),
            permissible_limit: self.permissible_limit.clone(),
        }
    }
}
