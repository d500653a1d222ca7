pub mod cleaning;
pub mod error;
pub mod outputs;
pub mod pipeline;

pub use tidysheet_parser::{
    CellValue, FileFormat, IngestedFile, TabularFrame, SUPPORTED_EXTENSIONS,
};
