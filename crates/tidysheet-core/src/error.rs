// crates/tidysheet-core/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("could not decode upload: {0}")]
    Decode(String),

    #[error("could not encode cleaned output: {0}")]
    Encode(String),
}

impl From<tidysheet_parser::IngestError> for PipelineError {
    fn from(err: tidysheet_parser::IngestError) -> Self {
        if err.is_unsupported_format() {
            PipelineError::UnsupportedFormat(err.to_string())
        } else {
            PipelineError::Decode(err.to_string())
        }
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::Encode(format!("CSV writer failed: {err}"))
    }
}

impl From<zip::result::ZipError> for PipelineError {
    fn from(err: zip::result::ZipError) -> Self {
        PipelineError::Encode(format!("workbook archive failed: {err}"))
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Encode(format!("output buffer write failed: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
