//! One upload through ingest -> clean -> serialize. Either a complete
//! [`CleanedOutput`] comes back or a single [`PipelineError`]; nothing partial.

use std::fmt;

use serde::Serialize;
use tidysheet_parser::ingest;
use tracing::{debug, info, warn};

use crate::cleaning::{clean, CleaningSummary};
use crate::error::Result;
use crate::outputs::{serialize, suggested_file_name, OutputPreference};

#[derive(Debug, Clone, Copy)]
pub struct UploadRequest<'a> {
    pub file_name: &'a str,
    pub bytes: &'a [u8],
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanedOutput {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub suggested_file_name: String,
    pub summary: CleaningSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStage {
    Received,
    Ingested,
    Transformed,
    Serialized,
}

impl RequestStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStage::Received => "received",
            RequestStage::Ingested => "ingested",
            RequestStage::Transformed => "transformed",
            RequestStage::Serialized => "serialized",
        }
    }
}

impl fmt::Display for RequestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn clean_upload(
    request: UploadRequest<'_>,
    preference: OutputPreference,
) -> Result<CleanedOutput> {
    let digest = compute_hash(request.bytes);
    let mut stage = RequestStage::Received;
    debug!(file_name = request.file_name, bytes = request.bytes.len(), %digest, %stage, "upload received");

    let result = run_stages(request, preference, &mut stage);
    match &result {
        Ok(output) => info!(
            file_name = request.file_name,
            %digest,
            rows = output.summary.row_count,
            columns = output.summary.column_count,
            output = %output.suggested_file_name,
            "upload cleaned"
        ),
        Err(err) => warn!(
            file_name = request.file_name,
            %digest,
            failed_after = %stage,
            error = %err,
            "upload rejected"
        ),
    }
    result
}

fn run_stages(
    request: UploadRequest<'_>,
    preference: OutputPreference,
    stage: &mut RequestStage,
) -> Result<CleanedOutput> {
    let ingested = ingest(request.file_name, request.bytes)?;
    *stage = RequestStage::Ingested;

    let output_format = preference.resolve(ingested.format);
    let frame = clean(ingested.frame);
    let summary = CleaningSummary::of(&frame);
    *stage = RequestStage::Transformed;

    let bytes = serialize(&frame, output_format)?;
    *stage = RequestStage::Serialized;

    Ok(CleanedOutput {
        bytes,
        content_type: output_format.content_type(),
        suggested_file_name: suggested_file_name(output_format),
        summary,
    })
}

/// Hex blake3 digest of the upload, used to correlate log lines.
pub fn compute_hash(contents: &[u8]) -> String {
    blake3::hash(contents).to_hex().to_string()
}
