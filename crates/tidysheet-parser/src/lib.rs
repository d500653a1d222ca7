pub mod errors;
pub mod formats;
pub mod model;
mod registry;

pub use errors::IngestError;
pub use model::{
    format_number, CellValue, Column, FileFormat, IngestedFile, ShapeError, SheetFlavor,
    TabularFrame,
};
pub use registry::{decoder_for, ingest, TableDecoder};

/// Extensions accepted by [`ingest`], lower-case and without the leading dot.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

#[cfg(test)]
mod tests;
