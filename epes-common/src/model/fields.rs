//! Editable text field catalogues
//!
//! Each catalogue lists the free-text fields of one entity together with the
//! name used in export files and the column used in storage. Wizard edits,
//! spreadsheet columns and SQL statements are all driven from these lists, so
//! adding a field means adding one line here plus the struct member.

use super::{ClientInfo, OltcInfo, TransformerRecord};
use std::fmt;

macro_rules! text_fields {
    (
        $(#[$meta:meta])*
        $name:ident for $entity:ty {
            $($variant:ident => $field:ident, $export:literal, $column:literal;)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            /// Every field, in export column order
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            /// Mixed-case name used by the export files
            pub fn export_name(self) -> &'static str {
                match self {
                    $($name::$variant => $export,)+
                }
            }

            /// Lower-case underscore column name used in storage
            pub fn storage_column(self) -> &'static str {
                match self {
                    $($name::$variant => $column,)+
                }
            }

            pub fn get(self, entity: &$entity) -> &str {
                match self {
                    $($name::$variant => &entity.$field,)+
                }
            }

            pub fn get_mut(self, entity: &mut $entity) -> &mut String {
                match self {
                    $($name::$variant => &mut entity.$field,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.export_name())
            }
        }
    };
}

text_fields! {
    /// Required free-text fields of [`ClientInfo`]
    ClientField for ClientInfo {
        ClientName => client_name, "clientName", "client_name";
        ClientAddress => client_address, "clientAddress", "client_address";
        Pincode => pincode, "pincode", "pincode";
        TrNumber => tr_number, "trNumber", "tr_number";
    }
}

text_fields! {
    /// Free-text fields of [`TransformerRecord`] (identifier and OLTC status excluded)
    TransformerField for TransformerRecord {
        TransformerMake => transformer_make, "transformerMake", "transformer_make";
        Capacity => capacity, "capacity", "capacity";
        SerialNumber => serial_number, "serialNumber", "serial_number";
        YearOfManufacture => year_of_manufacture, "yearOfManufacture", "year_of_manufacture";
        VoltageHv => voltage_hv, "voltageHV", "voltage_hv";
        VoltageLv => voltage_lv, "voltageLV", "voltage_lv";
        CurrentHv => current_hv, "currentHV", "current_hv";
        CurrentLv => current_lv, "currentLV", "current_lv";
        ImpedanceVoltage => impedance_voltage, "impedanceVoltage", "impedance_voltage";
        OilTemperature => oil_temperature, "oilTemperature", "oil_temperature";
        ElectrodeGap => electrode_gap, "electrodeGap", "electrode_gap";
        BdvSampleNo1 => bdv_sample_no1, "bdvSampleNo1", "bdv_sample_no1";
        BdvSampleNo2 => bdv_sample_no2, "bdvSampleNo2", "bdv_sample_no2";
        BreakdownVoltage => breakdown_voltage, "breakdownVoltage", "breakdown_voltage";
        AcidityValue => acidity_value, "acidityValue", "acidity_value";
        PermissibleLimit => permissible_limit, "permissibleLimit", "permissible_limit";
    }
}

text_fields! {
    /// Free-text fields of [`OltcInfo`]
    OltcField for OltcInfo {
        Make => oltc_make, "oltcMake", "oltc_make";
        Type => oltc_type, "oltcType", "oltc_type";
        SerialNumber => oltc_serial_number, "oltcSerialNumber", "oltc_serial_number";
        YearOfManufacture => oltc_year_of_manufacture, "oltcYearOfManufacture", "oltc_year_of_manufacture";
        VoltageHv => oltc_voltage_hv, "oltcVoltageHV", "oltc_voltage_hv";
        RatedCurrent => oltc_rated_current, "oltcRatedCurrent", "oltc_rated_current";
        OilTemperature => oltc_oil_temperature, "oltcOilTemperature", "oltc_oil_temperature";
        ElectrodeGap => oltc_electrode_gap, "oltcElectrodeGap", "oltc_electrode_gap";
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordDefaults;

    #[test]
    fn test_catalogue_names_match_serialized_keys() {
        let defaults = RecordDefaults::default();
        let transformer = defaults.transformer(0, true);
        let value = serde_json::to_value(&transformer).unwrap();

        for field in TransformerField::ALL {
            assert_eq!(
                value[field.export_name()].as_str(),
                Some(field.get(&transformer)),
                "{} missing from serialized transformer",
                field
            );
        }

        let oltc = &value["oltcInfo"];
        let info = transformer.oltc.info().unwrap();
        for field in OltcField::ALL {
            assert_eq!(oltc[field.export_name()].as_str(), Some(field.get(info)));
        }
    }

    #[test]
    fn test_get_mut_writes_through() {
        let defaults = RecordDefaults::default();
        let mut transformer = defaults.transformer(0, false);
        *TransformerField::Capacity.get_mut(&mut transformer) = "250 kVA".to_string();
        assert_eq!(transformer.capacity, "250 kVA");
    }

    #[test]
    fn test_storage_columns_are_snake_case() {
        let columns = ClientField::ALL
            .iter()
            .map(|f| f.storage_column())
            .chain(TransformerField::ALL.iter().map(|f| f.storage_column()))
            .chain(OltcField::ALL.iter().map(|f| f.storage_column()));

        for column in columns {
            assert!(column
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
        }
    }
}
