use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest magnitude at which an integral `f64` is still written without a fractional part.
const INTEGRAL_DISPLAY_LIMIT: f64 = 1e15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SheetFlavor {
    /// Zip-based Office Open XML workbook (`.xlsx`).
    OfficeOpenXml,
    /// Legacy binary workbook (`.xls`).
    LegacyBinary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileFormat {
    DelimitedText,
    SpreadsheetContainer(SheetFlavor),
}

impl FileFormat {
    /// Spreadsheet container written on output; legacy workbooks are never produced.
    pub const WORKBOOK: FileFormat = FileFormat::SpreadsheetContainer(SheetFlavor::OfficeOpenXml);

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(FileFormat::DelimitedText),
            "xlsx" => Some(FileFormat::SpreadsheetContainer(SheetFlavor::OfficeOpenXml)),
            "xls" => Some(FileFormat::SpreadsheetContainer(SheetFlavor::LegacyBinary)),
            _ => None,
        }
    }

    /// Resolve the format from a declared file name. Content is never sniffed.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::DelimitedText => "csv",
            FileFormat::SpreadsheetContainer(SheetFlavor::OfficeOpenXml) => "xlsx",
            FileFormat::SpreadsheetContainer(SheetFlavor::LegacyBinary) => "xls",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            FileFormat::DelimitedText => "text/csv; charset=utf-8",
            FileFormat::SpreadsheetContainer(SheetFlavor::OfficeOpenXml) => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            FileFormat::SpreadsheetContainer(SheetFlavor::LegacyBinary) => {
                "application/vnd.ms-excel"
            }
        }
    }

    pub fn is_delimited_text(&self) -> bool {
        matches!(self, FileFormat::DelimitedText)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::DelimitedText => f.write_str("delimited text"),
            FileFormat::SpreadsheetContainer(_) => {
                write!(f, "spreadsheet ({})", self.extension())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    /// Missing marker: the source had no value for this cell.
    Empty,
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Missing, or text that is empty once trimmed.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(value) => value.trim().is_empty(),
            CellValue::Number(_) | CellValue::Bool(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(value) => f.write_str(value),
            CellValue::Number(value) => f.write_str(&format_number(*value)),
            CellValue::Bool(value) => write!(f, "{value}"),
            CellValue::Empty => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

/// Shortest text that parses back to the same `f64`; integral values carry no fraction.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < INTEGRAL_DISPLAY_LIMIT {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("row {row_index} has {found} cells but the header has {expected}")]
    RowTooWide {
        row_index: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<CellValue>,
}

/// Named columns of equal length. Cell vectors are only reachable mutably through
/// operations that preserve the shared height.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TabularFrame {
    columns: Vec<Column>,
    height: usize,
}

impl TabularFrame {
    /// Build a frame from row-major cells. Short rows are padded with missing cells.
    pub fn from_rows(
        headers: Vec<String>,
        rows: Vec<Vec<CellValue>>,
    ) -> Result<Self, ShapeError> {
        let width = headers.len();
        let height = rows.len();
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|name| Column {
                name,
                cells: Vec::with_capacity(height),
            })
            .collect();

        for (row_index, row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(ShapeError::RowTooWide {
                    row_index,
                    expected: width,
                    found: row.len(),
                });
            }
            let found = row.len();
            for (column, cell) in columns.iter_mut().zip(row) {
                column.cells.push(cell);
            }
            for column in columns.iter_mut().skip(found) {
                column.cells.push(CellValue::Empty);
            }
        }

        Ok(Self { columns, height })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.height == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub fn column_names_mut(&mut self) -> impl Iterator<Item = &mut String> {
        self.columns.iter_mut().map(|column| &mut column.name)
    }

    pub fn row(&self, index: usize) -> Option<Vec<&CellValue>> {
        if index >= self.height {
            return None;
        }
        Some(self.columns.iter().map(|column| &column.cells[index]).collect())
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&CellValue>> + '_ {
        (0..self.height).map(move |index| {
            self.columns
                .iter()
                .map(|column| &column.cells[index])
                .collect()
        })
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut CellValue> {
        self.columns
            .iter_mut()
            .flat_map(|column| column.cells.iter_mut())
    }

    /// Keep rows whose mask entry is `true`. A mask shorter than the frame drops the tail.
    pub fn retain_rows(&mut self, mask: &[bool]) {
        for column in &mut self.columns {
            let mut index = 0;
            column.cells.retain(|_| {
                let keep = mask.get(index).copied().unwrap_or(false);
                index += 1;
                keep
            });
        }
        self.height = mask
            .iter()
            .take(self.height)
            .filter(|keep| **keep)
            .count();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestedFile {
    pub format: FileFormat,
    pub frame: TabularFrame,
}
