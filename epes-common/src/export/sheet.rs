//! Flattening of a record into tabular sheets
//!
//! The spreadsheet export has two sheets. "Client Info" holds a single row
//! with the client details and counts. "Transformer Data" holds one row per
//! transformer: identifier, OLTC flag, the transformer columns, then the OLTC
//! columns, which stay blank for transformers without an OLTC.

use crate::model::{ClientField, ClientInfo, OltcField, TransformerField, TransformerRecord};

pub const CLIENT_SHEET: &str = "Client Info";
pub const TRANSFORMER_SHEET: &str = "Transformer Data";

/// One spreadsheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Bool(bool),
    Blank,
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        matches!(self, Cell::Blank)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

/// A named sheet: header row plus data rows of equal width
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// Index of the column titled `header`
    pub fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Cell at data row `row` under `header`
    pub fn cell(&self, row: usize, header: &str) -> Option<&Cell> {
        let column = self.column(header)?;
        self.rows.get(row)?.get(column)
    }
}

pub fn client_sheet(client: &ClientInfo) -> Sheet {
    let counts = client.counts();

    let mut headers: Vec<String> = ClientField::ALL
        .iter()
        .map(|f| f.export_name().to_string())
        .collect();
    headers.extend(
        [
            "dateOfTest",
            "noOfTransformers",
            "noOfTransformersWithOLTC",
            "noOfTransformersWithoutOLTC",
        ]
        .map(String::from),
    );

    let mut row: Vec<Cell> = ClientField::ALL.iter().map(|f| f.get(client).into()).collect();
    row.push(Cell::Text(client.date_of_test.format("%Y-%m-%d").to_string()));
    row.push(Cell::Integer(counts.total().into()));
    row.push(Cell::Integer(counts.with_oltc().into()));
    row.push(Cell::Integer(counts.without_oltc().into()));

    Sheet {
        name: CLIENT_SHEET.to_string(),
        headers,
        rows: vec![row],
    }
}

pub fn transformer_sheet(transformers: &[TransformerRecord]) -> Sheet {
    let headers = ["transformerId", "hasOLTC"]
        .into_iter()
        .chain(TransformerField::ALL.iter().map(|f| f.export_name()))
        .chain(OltcField::ALL.iter().map(|f| f.export_name()))
        .map(String::from)
        .collect();

    let rows = transformers
        .iter()
        .map(|transformer| {
            let mut row = vec![
                Cell::Text(transformer.transformer_id.clone()),
                Cell::Bool(transformer.has_oltc()),
            ];
            row.extend(TransformerField::ALL.iter().map(|f| f.get(transformer).into()));
            match transformer.oltc.info() {
                Some(info) => row.extend(OltcField::ALL.iter().map(|f| f.get(info).into())),
                None => row.extend(OltcField::ALL.iter().map(|_| Cell::Blank)),
            }
            row
        })
        .collect();

    Sheet {
        name: TRANSFORMER_SHEET.to_string(),
        headers,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derivation::generate_transformer_sequence;
    use chrono::NaiveDate;

    #[test]
    fn test_client_sheet_single_row() {
        let mut client = ClientInfo::new(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        client.client_name = "Acme".to_string();
        let sheet = client_sheet(&client);

        assert_eq!(sheet.name, CLIENT_SHEET);
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0].len(), sheet.headers.len());
        assert_eq!(sheet.cell(0, "clientName"), Some(&Cell::Text("Acme".into())));
        assert_eq!(sheet.cell(0, "dateOfTest"), Some(&Cell::Text("2024-01-15".into())));
        assert_eq!(sheet.cell(0, "noOfTransformers"), Some(&Cell::Integer(1)));
    }

    #[test]
    fn test_oltc_columns_follow_transformer_columns() {
        let sheet = transformer_sheet(&generate_transformer_sequence(2, 1));

        let last_transformer = sheet.column("permissibleLimit").unwrap();
        let first_oltc = sheet.column("oltcMake").unwrap();
        assert_eq!(first_oltc, last_transformer + 1);
        assert_eq!(sheet.headers.len(), 2 + TransformerField::ALL.len() + OltcField::ALL.len());

        assert_eq!(sheet.cell(0, "oltcMake"), Some(&Cell::Text("OLG".into())));
        assert!(sheet.cell(1, "oltcMake").unwrap().is_blank());
        assert_eq!(sheet.cell(1, "hasOLTC"), Some(&Cell::Bool(false)));
    }
}
