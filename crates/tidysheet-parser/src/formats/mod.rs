mod common;
mod delimited;
mod workbook;

pub use delimited::DelimitedTextDecoder;
pub use workbook::WorkbookDecoder;

#[cfg(test)]
pub(crate) use workbook::frame_from_range;

pub(crate) use common::{header_name, infer_delimited_cell};
