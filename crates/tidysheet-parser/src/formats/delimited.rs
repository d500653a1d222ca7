use csv::ReaderBuilder;

use crate::errors::IngestError;
use crate::formats::{header_name, infer_delimited_cell};
use crate::model::{CellValue, TabularFrame};
use crate::registry::TableDecoder;

const DECODER_NAME: &str = "delimited_text";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Comma-separated text with the column headers on the first row.
pub struct DelimitedTextDecoder;

impl TableDecoder for DelimitedTextDecoder {
    fn name(&self) -> &'static str {
        DECODER_NAME
    }

    fn decode(&self, bytes: &[u8]) -> Result<TabularFrame, IngestError> {
        let content = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        if let Err(err) = std::str::from_utf8(content) {
            return Err(IngestError::InvalidEncoding {
                decoder: DECODER_NAME,
                offset: err.valid_up_to(),
            });
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(content);
        let mut records = reader.records();

        let header_record = match records.next() {
            Some(record) => record.map_err(|source| IngestError::Csv {
                decoder: DECODER_NAME,
                source,
            })?,
            None => return Err(IngestError::MissingHeader { decoder: DECODER_NAME }),
        };
        let headers: Vec<String> = header_record
            .iter()
            .enumerate()
            .map(|(index, raw)| header_name(index, raw))
            .collect();
        let width = headers.len();

        let mut rows = Vec::new();
        for (offset, record) in records.enumerate() {
            let record = record.map_err(|source| IngestError::Csv {
                decoder: DECODER_NAME,
                source,
            })?;
            let line_index = record
                .position()
                .map(|position| position.line() as usize)
                .unwrap_or(offset + 2);
            if record.len() > width {
                return Err(IngestError::DataRow {
                    decoder: DECODER_NAME,
                    line_index,
                    message: format!("expected {width} fields, saw {}", record.len()),
                });
            }
            let row: Vec<CellValue> = record.iter().map(infer_delimited_cell).collect();
            rows.push(row);
        }

        TabularFrame::from_rows(headers, rows).map_err(|source| IngestError::Shape {
            decoder: DECODER_NAME,
            source,
        })
    }
}
