//! Spreadsheet workbook writer
//!
//! Writes the smallest Office Open XML package spreadsheet applications
//! accept: content types, package relationships, a workbook listing the
//! sheets, and one worksheet part per sheet. Text is stored as inline strings
//! so no shared-string table is needed.
//!
//! Characters XML 1.0 cannot carry are written as `_xHHHH_` escapes, the
//! form spreadsheet readers decode back into the original character. A
//! literal `_xHHHH_` in the text gets its underscore escaped so it survives.

use super::sheet::{client_sheet, transformer_sheet, Cell, Sheet};
use crate::model::Record;
use crate::Result;
use std::fmt::Write as _;
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Workbook with the "Client Info" and "Transformer Data" sheets
pub fn to_xlsx_bytes(record: &Record) -> Result<Vec<u8>> {
    let sheets = [
        client_sheet(&record.client_info),
        transformer_sheet(&record.transformers),
    ];
    write_workbook(&sheets)
}

/// Package `sheets` as a workbook, in order
pub fn write_workbook(sheets: &[Sheet]) -> Result<Vec<u8>> {
    let mut archive = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut archive));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut parts = vec![
            ("[Content_Types].xml".to_string(), content_types(sheets.len())),
            ("_rels/.rels".to_string(), package_rels()),
            ("xl/workbook.xml".to_string(), workbook(sheets)),
            ("xl/_rels/workbook.xml.rels".to_string(), workbook_rels(sheets.len())),
        ];
        for (i, sheet) in sheets.iter().enumerate() {
            parts.push((format!("xl/worksheets/sheet{}.xml", i + 1), worksheet(sheet)));
        }

        for (path, content) in &parts {
            zip.start_file(path.as_str(), options)?;
            zip.write_all(content.as_bytes())?;
        }
        zip.finish()?;
    }

    debug!(sheets = sheets.len(), bytes = archive.len(), "Workbook written");
    Ok(archive)
}

fn content_types(sheet_count: usize) -> String {
    let mut xml = format!(
        "{}<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
         <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
         <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
         <Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>",
        XML_DECL
    );
    for i in 1..=sheet_count {
        let _ = write!(
            xml,
            "<Override PartName=\"/xl/worksheets/sheet{}.xml\" \
             ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>",
            i
        );
    }
    xml.push_str("</Types>");
    xml
}

fn package_rels() -> String {
    format!(
        "{}<Relationships xmlns=\"{}\">\
         <Relationship Id=\"rId1\" \
         Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" \
         Target=\"xl/workbook.xml\"/></Relationships>",
        XML_DECL, NS_PKG_REL
    )
}

fn workbook(sheets: &[Sheet]) -> String {
    let mut xml = format!(
        "{}<workbook xmlns=\"{}\" xmlns:r=\"{}\"><sheets>",
        XML_DECL, NS_MAIN, NS_REL
    );
    for (i, sheet) in sheets.iter().enumerate() {
        let _ = write!(
            xml,
            "<sheet name=\"{}\" sheetId=\"{}\" r:id=\"rId{}\"/>",
            escape(&sheet.name),
            i + 1,
            i + 1
        );
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn workbook_rels(sheet_count: usize) -> String {
    let mut xml = format!("{}<Relationships xmlns=\"{}\">", XML_DECL, NS_PKG_REL);
    for i in 1..=sheet_count {
        let _ = write!(
            xml,
            "<Relationship Id=\"rId{}\" \
             Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" \
             Target=\"worksheets/sheet{}.xml\"/>",
            i, i
        );
    }
    xml.push_str("</Relationships>");
    xml
}

fn worksheet(sheet: &Sheet) -> String {
    let mut xml = format!("{}<worksheet xmlns=\"{}\"><sheetData>", XML_DECL, NS_MAIN);

    let header_cells: Vec<Cell> = sheet.headers.iter().map(|h| Cell::Text(h.clone())).collect();
    write_row(&mut xml, 1, &header_cells);
    for (i, row) in sheet.rows.iter().enumerate() {
        write_row(&mut xml, i + 2, row);
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

fn write_row(xml: &mut String, row_number: usize, cells: &[Cell]) {
    let _ = write!(xml, "<row r=\"{}\">", row_number);
    for (column, cell) in cells.iter().enumerate() {
        let reference = format!("{}{}", column_letters(column), row_number);
        let _ = match cell {
            Cell::Text(text) => write!(
                xml,
                "<c r=\"{}\" t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
                reference,
                escape(text)
            ),
            Cell::Integer(n) => write!(xml, "<c r=\"{}\"><v>{}</v></c>", reference, n),
            Cell::Bool(b) => write!(xml, "<c r=\"{}\" t=\"b\"><v>{}</v></c>", reference, u8::from(*b)),
            Cell::Blank => Ok(()),
        };
    }
    xml.push_str("</row>");
}

/// Spreadsheet column name for zero-based `index` (0 -> A, 25 -> Z, 26 -> AA)
fn column_letters(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.char_indices() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '_' if starts_with_char_escape(&text[i..]) => out.push_str("_x005F_"),
            c if is_xml_forbidden(c) => {
                let _ = write!(out, "_x{:04X}_", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out
}

/// Characters outside the XML 1.0 `Char` production
fn is_xml_forbidden(c: char) -> bool {
    matches!(
        c,
        '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}'
    )
}

/// `text` begins with `_xHHHH_`
fn starts_with_char_escape(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 7
        && bytes[0] == b'_'
        && bytes[1] == b'x'
        && bytes[2..6].iter().all(u8::is_ascii_hexdigit)
        && bytes[6] == b'_'
}
