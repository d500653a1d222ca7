use crate::errors::IngestError;
use crate::formats::{DelimitedTextDecoder, WorkbookDecoder};
use crate::model::{FileFormat, IngestedFile, TabularFrame};

pub trait TableDecoder {
    fn name(&self) -> &'static str;
    fn decode(&self, bytes: &[u8]) -> Result<TabularFrame, IngestError>;
}

pub fn decoder_for(format: FileFormat) -> Box<dyn TableDecoder> {
    match format {
        FileFormat::DelimitedText => Box::new(DelimitedTextDecoder),
        FileFormat::SpreadsheetContainer(flavor) => Box::new(WorkbookDecoder::new(flavor)),
    }
}

/// Decode an upload, choosing the decoder from the file name's extension.
pub fn ingest(file_name: &str, bytes: &[u8]) -> Result<IngestedFile, IngestError> {
    let format = FileFormat::from_file_name(file_name).ok_or_else(|| {
        IngestError::UnsupportedFormat {
            file_name: file_name.to_string(),
        }
    })?;
    let frame = decoder_for(format).decode(bytes)?;
    Ok(IngestedFile { format, frame })
}
