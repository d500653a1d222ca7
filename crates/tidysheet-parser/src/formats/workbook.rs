use std::fmt::Display;
use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, DataType, Range, Reader, Xls, Xlsx};
use chrono::{NaiveDateTime, NaiveTime};

use crate::errors::IngestError;
use crate::formats::header_name;
use crate::model::{format_number, CellValue, SheetFlavor, TabularFrame};
use crate::registry::TableDecoder;

/// Reads the first worksheet of a workbook, treating row 1 as the header.
pub struct WorkbookDecoder {
    flavor: SheetFlavor,
}

impl WorkbookDecoder {
    pub fn new(flavor: SheetFlavor) -> Self {
        Self { flavor }
    }
}

impl TableDecoder for WorkbookDecoder {
    fn name(&self) -> &'static str {
        match self.flavor {
            SheetFlavor::OfficeOpenXml => "xlsx_workbook",
            SheetFlavor::LegacyBinary => "xls_workbook",
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<TabularFrame, IngestError> {
        let decoder = self.name();
        let cursor = Cursor::new(bytes);
        let range = match self.flavor {
            SheetFlavor::OfficeOpenXml => {
                let workbook: Xlsx<_> = open_workbook_from_rs(cursor)
                    .map_err(|err| workbook_error(decoder, err))?;
                first_sheet(workbook, decoder)?
            }
            SheetFlavor::LegacyBinary => {
                let workbook: Xls<_> = open_workbook_from_rs(cursor)
                    .map_err(|err| workbook_error(decoder, err))?;
                first_sheet(workbook, decoder)?
            }
        };

        frame_from_range(&range, decoder)
    }
}

fn workbook_error(decoder: &'static str, err: impl Display) -> IngestError {
    IngestError::Workbook {
        decoder,
        message: err.to_string(),
    }
}

fn first_sheet<'a, W>(mut workbook: W, decoder: &'static str) -> Result<Range<Data>, IngestError>
where
    W: Reader<Cursor<&'a [u8]>>,
    W::Error: Display,
{
    workbook
        .worksheet_range_at(0)
        .ok_or_else(|| workbook_error(decoder, "workbook does not contain any worksheets"))?
        .map_err(|err| workbook_error(decoder, err))
}

/// Row 1 of the used range is the header. Columns left of the used range are
/// kept as blank columns so positions match the sheet from column A.
pub(crate) fn frame_from_range(
    range: &Range<Data>,
    decoder: &'static str,
) -> Result<TabularFrame, IngestError> {
    let leading = range.start().map_or(0, |(_, column)| column as usize);
    let mut rows = range.rows();
    let header_row = rows
        .next()
        .ok_or(IngestError::MissingHeader { decoder })?;

    let headers: Vec<String> = std::iter::repeat(String::new())
        .take(leading)
        .chain(header_row.iter().map(header_text))
        .enumerate()
        .map(|(index, raw)| header_name(index, &raw))
        .collect();

    let body: Vec<Vec<CellValue>> = rows
        .map(|row| {
            std::iter::repeat(CellValue::Empty)
                .take(leading)
                .chain(row.iter().map(convert_cell))
                .collect()
        })
        .collect();

    TabularFrame::from_rows(headers, body)
        .map_err(|source| IngestError::Shape { decoder, source })
}

fn header_text(cell: &Data) -> String {
    match convert_cell(cell) {
        CellValue::Empty => String::new(),
        other => other.to_string(),
    }
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(value) => CellValue::Text(value.clone()),
        Data::Int(value) => CellValue::Number(*value as f64),
        Data::Float(value) => CellValue::Number(*value),
        Data::Bool(value) => CellValue::Bool(*value),
        Data::DateTime(_) => match cell.as_datetime() {
            Some(datetime) => CellValue::Text(format_datetime(datetime)),
            None => cell
                .as_f64()
                .map(|serial| CellValue::Text(format_number(serial)))
                .unwrap_or(CellValue::Empty),
        },
        Data::DateTimeIso(value) | Data::DurationIso(value) => CellValue::Text(value.clone()),
        Data::Error(err) => CellValue::Text(err.to_string()),
    }
}

fn format_datetime(datetime: NaiveDateTime) -> String {
    if datetime.time() == NaiveTime::MIN {
        datetime.format("%Y-%m-%d").to_string()
    } else {
        datetime.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
