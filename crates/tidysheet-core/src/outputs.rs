use std::fmt::Write as _;
use std::io::{Cursor, Write};

use serde::{Deserialize, Serialize};
use tidysheet_parser::{format_number, CellValue, FileFormat, SheetFlavor, TabularFrame};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{PipelineError, Result};

const SHEET_NAME: &str = "Sheet1";

const CONTENT_TYPES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
    r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
    r#"</Types>"#,
);

const ROOT_RELS_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
    r#"</Relationships>"#,
);

const WORKBOOK_RELS_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
    r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
    r#"</Relationships>"#,
);

const STYLES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>"#,
    r#"<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>"#,
    r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
    r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
    r#"<cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs>"#,
    r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
    r#"</styleSheet>"#,
);

/// Whether delimited-text uploads come back as delimited text or as a workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputPreference {
    #[default]
    MatchInput,
    Spreadsheet,
}

impl OutputPreference {
    /// Delimited text may stay delimited text; every workbook input is written as `.xlsx`.
    pub fn resolve(self, input: FileFormat) -> FileFormat {
        if input.is_delimited_text() && self == OutputPreference::MatchInput {
            input
        } else {
            FileFormat::WORKBOOK
        }
    }
}

pub fn suggested_file_name(format: FileFormat) -> String {
    format!("cleaned.{}", format.extension())
}

/// Encode a frame: header row first, then one row per data row, in column order.
pub fn serialize(frame: &TabularFrame, format: FileFormat) -> Result<Vec<u8>> {
    match format {
        FileFormat::DelimitedText => create_csv_bytes(frame),
        FileFormat::SpreadsheetContainer(SheetFlavor::OfficeOpenXml) => {
            create_workbook_bytes(frame)
        }
        FileFormat::SpreadsheetContainer(SheetFlavor::LegacyBinary) => Err(PipelineError::Encode(
            "legacy .xls workbooks cannot be written".to_string(),
        )),
    }
}

fn create_csv_bytes(frame: &TabularFrame) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(frame.column_names())?;
    for row in frame.rows() {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|err| PipelineError::Encode(format!("failed to flush CSV output: {err}")))
}

fn create_workbook_bytes(frame: &TabularFrame) -> Result<Vec<u8>> {
    let workbook_xml = format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            r#"<sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        ),
        SHEET_NAME
    );
    let sheet_xml = worksheet_xml(frame)?;

    let parts: [(&str, &[u8]); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes()),
        ("_rels/.rels", ROOT_RELS_XML.as_bytes()),
        ("xl/workbook.xml", workbook_xml.as_bytes()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML.as_bytes()),
        ("xl/styles.xml", STYLES_XML.as_bytes()),
        ("xl/worksheets/sheet1.xml", sheet_xml.as_bytes()),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, contents) in parts {
        zip.start_file(name, options)?;
        zip.write_all(contents)?;
    }
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

fn worksheet_xml(frame: &TabularFrame) -> Result<String> {
    let mut xml = String::with_capacity(256 + frame.height() * frame.width() * 24);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#);
    xml.push_str("<sheetData>");

    let header: Vec<CellValue> = frame
        .column_names()
        .into_iter()
        .map(CellValue::from)
        .collect();
    write_row(&mut xml, 1, header.iter())?;
    for (index, row) in frame.rows().enumerate() {
        write_row(&mut xml, index + 2, row.into_iter())?;
    }

    xml.push_str("</sheetData></worksheet>");
    Ok(xml)
}

fn write_row<'a>(
    xml: &mut String,
    row_number: usize,
    cells: impl Iterator<Item = &'a CellValue>,
) -> Result<()> {
    write!(xml, r#"<row r="{row_number}">"#).map_err(xml_error)?;
    for (column_index, cell) in cells.enumerate() {
        let reference = format!("{}{}", column_letters(column_index), row_number);
        let written = match cell {
            CellValue::Text(value) => write!(
                xml,
                r#"<c r="{reference}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                escape_xml(value)
            ),
            CellValue::Number(value) => {
                write!(xml, r#"<c r="{reference}"><v>{}</v></c>"#, format_number(*value))
            }
            CellValue::Bool(value) => write!(
                xml,
                r#"<c r="{reference}" t="b"><v>{}</v></c>"#,
                u8::from(*value)
            ),
            CellValue::Empty => Ok(()),
        };
        written.map_err(xml_error)?;
    }
    xml.push_str("</row>");
    Ok(())
}

fn xml_error(err: std::fmt::Error) -> PipelineError {
    PipelineError::Encode(format!("failed to build worksheet XML: {err}"))
}

/// Zero-based column index to spreadsheet letters: 0 → `A`, 25 → `Z`, 26 → `AA`.
pub fn column_letters(index: usize) -> String {
    let mut letters = Vec::new();
    let mut remaining = index + 1;
    while remaining > 0 {
        let offset = (remaining - 1) % 26;
        letters.push(b'A' + offset as u8);
        remaining = (remaining - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Escape markup characters and drop code points XML 1.0 cannot carry.
fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\t' | '\n' | '\r' => escaped.push(ch),
            c if c < '\u{20}' || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            c => escaped.push(c),
        }
    }
    escaped
}
