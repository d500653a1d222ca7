//! Handlers for the cleaning service.

use axum::{
    extract::{Multipart, Query, State},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tidysheet_core::outputs::OutputPreference;
use tidysheet_core::pipeline::{clean_upload, CleanedOutput, UploadRequest};
use tracing::{error, info};
use uuid::Uuid;

use super::error::AppError;
use super::state::AppState;
use crate::usage::UsageStatus;

pub const SESSION_HEADER: HeaderName = HeaderName::from_static("x-session-id");
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
pub const ROW_COUNT_HEADER: HeaderName = HeaderName::from_static("x-row-count");
pub const COLUMN_COUNT_HEADER: HeaderName = HeaderName::from_static("x-column-count");
pub const USAGE_COUNT_HEADER: HeaderName = HeaderName::from_static("x-usage-count");

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub message: &'static str,
    pub clean_endpoint: &'static str,
    pub supported_extensions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CleanQuery {
    /// `xlsx` asks for a workbook back even for CSV uploads.
    #[serde(default)]
    pub format: Option<String>,
}

impl CleanQuery {
    fn preference(&self) -> Result<OutputPreference, AppError> {
        match self.format.as_deref().map(str::trim) {
            None | Some("") | Some("match") => Ok(OutputPreference::MatchInput),
            Some(value) if value.eq_ignore_ascii_case("xlsx") => Ok(OutputPreference::Spreadsheet),
            Some(other) => Err(AppError::BadRequest(format!(
                "unknown output format '{other}'; use 'xlsx' or omit the parameter"
            ))),
        }
    }
}

/// GET /
pub async fn home() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "Tidysheet cleaning API is running",
        clean_endpoint: "/clean",
        supported_extensions: supported_extensions(),
    })
}

fn supported_extensions() -> Vec<String> {
    tidysheet_core::SUPPORTED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect()
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /usage
///
/// Free runs used today by the session named in `x-session-id`.
pub async fn usage(State(state): State<AppState>, headers: HeaderMap) -> Json<UsageStatus> {
    let today = Local::now().date_naive();
    let status = match session_key(&headers) {
        Some(key) => state.usage.peek(&key, today).await,
        None => state.usage.fresh(),
    };
    Json(status)
}

/// POST /clean
///
/// Multipart upload with exactly one file part. Responds with the cleaned file.
pub async fn clean(
    State(state): State<AppState>,
    Query(query): Query<CleanQuery>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let request_id = Uuid::new_v4();
    let preference = query.preference()?;
    let (file_name, bytes) = read_single_file(multipart).await?;

    let max_bytes = state.config.max_upload_bytes();
    if bytes.len() > max_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "File is {:.2} MB. Upload cap is {} MB.",
            bytes.len() as f64 / (1024.0 * 1024.0),
            state.config.max_upload_mb
        )));
    }

    info!(%request_id, %file_name, bytes = bytes.len(), "cleaning upload");

    let output = tokio::task::spawn_blocking(move || {
        clean_upload(
            UploadRequest {
                file_name: &file_name,
                bytes: &bytes,
            },
            preference,
        )
    })
    .await
    .map_err(|err| {
        error!(%request_id, "cleaning task failed: {err}");
        AppError::Internal
    })??;

    let mut response_headers = download_headers(&output)?;
    response_headers.insert(
        REQUEST_ID_HEADER,
        HeaderValue::from_str(&request_id.to_string()).map_err(|_| AppError::Internal)?,
    );

    if let Some(key) = session_key(&headers) {
        let status = state.usage.increment(&key, Local::now().date_naive()).await;
        response_headers.insert(USAGE_COUNT_HEADER, HeaderValue::from(status.used));
    }

    Ok((response_headers, output.bytes).into_response())
}

async fn read_single_file(mut multipart: Multipart) -> Result<(String, Vec<u8>), AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await? {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if upload.is_some() {
            return Err(AppError::BadRequest(
                "expected exactly one file part".to_string(),
            ));
        }
        let bytes = field.bytes().await?;
        upload = Some((file_name, bytes.to_vec()));
    }

    upload.ok_or_else(|| AppError::BadRequest("missing file part".to_string()))
}

fn download_headers(output: &CleanedOutput) -> Result<HeaderMap, AppError> {
    let disposition = format!(
        "attachment; filename=\"{}\"",
        output.suggested_file_name
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(output.content_type),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition).map_err(|_| AppError::Internal)?,
    );
    headers.insert(ROW_COUNT_HEADER, HeaderValue::from(output.summary.row_count));
    headers.insert(
        COLUMN_COUNT_HEADER,
        HeaderValue::from(output.summary.column_count),
    );
    Ok(headers)
}

fn session_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get(&SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
