use thiserror::Error;

use crate::model::ShapeError;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unsupported file type '{file_name}'; expected one of .csv, .xlsx, .xls")]
    UnsupportedFormat { file_name: String },

    #[error("{decoder} file is not valid UTF-8 (first invalid byte at offset {offset})")]
    InvalidEncoding {
        decoder: &'static str,
        offset: usize,
    },

    #[error("{decoder} CSV error: {source}")]
    Csv {
        decoder: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("{decoder} could not open workbook: {message}")]
    Workbook {
        decoder: &'static str,
        message: String,
    },

    #[error("{decoder} file did not contain a header row")]
    MissingHeader { decoder: &'static str },

    #[error("{decoder} data row {line_index} invalid: {message}")]
    DataRow {
        decoder: &'static str,
        line_index: usize,
        message: String,
    },

    #[error("{decoder} produced an inconsistent table: {source}")]
    Shape {
        decoder: &'static str,
        #[source]
        source: ShapeError,
    },
}

impl IngestError {
    /// True when the file was rejected on its name alone, before any bytes were read.
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self, IngestError::UnsupportedFormat { .. })
    }
}
