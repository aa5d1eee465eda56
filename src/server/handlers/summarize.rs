//! Paper summary endpoint.
//!
//! Accepts either `multipart/form-data` (file field `paper`, text field
//! `paperText`) or a JSON body `{ "paperText": ... }`. An uploaded file wins
//! over pasted text. Uploads are written to a scoped temporary file inside
//! the upload directory and removed when the request finishes, whatever the
//! outcome.

use axum::{
    extract::{
        multipart::{Field, MultipartError},
        FromRequest, Multipart, Request, State,
    },
    http::{header::CONTENT_TYPE, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::super::routes::FORM_OVERHEAD_BYTES;
use super::super::{ApiError, AppState};
use crate::config::Settings;
use crate::extract::{extract_text, DocumentKind};
use crate::models::SummaryContext;
use crate::utils::format_size;

const SUMMARY_FAILED: &str = "Failed to summarize paper. Please try again.";

/// JSON body of `POST /summarize`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SummarizeRequest {
    pub paper_text: Option<String>,
}

/// A received upload. The file is deleted when this is dropped.
struct Upload {
    file: NamedTempFile,
    kind: DocumentKind,
    original_name: String,
}

/// Paper input gathered from the request body.
#[derive(Default)]
struct PaperInput {
    upload: Option<Upload>,
    paper_text: Option<String>,
}

pub async fn summarize(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<Value>, ApiError> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let input = if is_multipart {
        read_multipart(&state, request).await?
    } else {
        read_json(&state.settings, request).await?
    };

    let (text, context) = match input.upload {
        Some(upload) => {
            info!(
                file = %upload.original_name,
                kind = ?upload.kind,
                "Extracting uploaded paper"
            );
            let text = extract_text(upload.file.path(), upload.kind)
                .await
                .map_err(|e| ApiError::extraction(e, SUMMARY_FAILED))?;
            let context = SummaryContext {
                original_filename: Some(upload.original_name),
            };
            (text, context)
        }
        None => match input.paper_text {
            Some(text) if !text.is_empty() => (text, SummaryContext::default()),
            _ => return Err(ApiError::bad_request("No paper text or file provided")),
        },
    };

    let summary = state
        .summarizer
        .summarize(&text, context)
        .await
        .map_err(|e| ApiError::service(e, SUMMARY_FAILED))?;

    if summary.is_fallback() {
        info!("Returning fallback summary");
    }
    Ok(Json(summary.into_body()))
}

async fn read_json(settings: &Settings, request: Request) -> Result<PaperInput, ApiError> {
    let limit = settings.max_upload_bytes + FORM_OVERHEAD_BYTES;
    let body = axum::body::to_bytes(request.into_body(), limit)
        .await
        .map_err(|_| ApiError::bad_request("Request body too large"))?;

    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(PaperInput::default());
    }

    let parsed: SummarizeRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))?;

    Ok(PaperInput {
        upload: None,
        paper_text: parsed.paper_text,
    })
}

async fn read_multipart(state: &AppState, request: Request) -> Result<PaperInput, ApiError> {
    let mut multipart = Multipart::from_request(request, state)
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?;

    let mut input = PaperInput::default();
    let settings = &state.settings;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, settings))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("paper") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                if filename.is_empty() {
                    debug!("Skipping empty file field");
                    continue;
                }
                // Gate on the extension before anything touches the disk.
                let kind = DocumentKind::from_filename(&filename)
                    .map_err(|e| ApiError::extraction(e, SUMMARY_FAILED))?;
                input.upload = Some(receive_upload(&mut field, filename, kind, settings).await?);
            }
            Some("paperText") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, settings))?;
                input.paper_text = Some(text);
            }
            other => debug!(field = ?other, "Ignoring unexpected form field"),
        }
    }

    Ok(input)
}

/// Stream one file field into a temp file, enforcing the size cap.
async fn receive_upload(
    field: &mut Field<'_>,
    original_name: String,
    kind: DocumentKind,
    settings: &Settings,
) -> Result<Upload, ApiError> {
    tokio::fs::create_dir_all(&settings.upload_dir)
        .await
        .map_err(|e| ApiError::internal(SUMMARY_FAILED, e))?;

    let file = tempfile::Builder::new()
        .prefix("paper-")
        .suffix(kind.extension())
        .tempfile_in(&settings.upload_dir)
        .map_err(|e| ApiError::internal(SUMMARY_FAILED, e))?;
    let mut out = tokio::fs::File::from_std(
        file.reopen()
            .map_err(|e| ApiError::internal(SUMMARY_FAILED, e))?,
    );

    let mut written = 0usize;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(e, settings))?
    {
        written += chunk.len();
        if written > settings.max_upload_bytes {
            return Err(too_large(settings));
        }
        out.write_all(&chunk)
            .await
            .map_err(|e| ApiError::internal(SUMMARY_FAILED, e))?;
    }
    out.flush()
        .await
        .map_err(|e| ApiError::internal(SUMMARY_FAILED, e))?;

    debug!(
        file = %original_name,
        bytes = written,
        path = %file.path().display(),
        "Upload stored"
    );
    Ok(Upload {
        file,
        kind,
        original_name,
    })
}

fn too_large(settings: &Settings) -> ApiError {
    ApiError::bad_request(format!(
        "File too large. Maximum size is {}.",
        format_size(settings.max_upload_bytes as u64)
    ))
}

fn multipart_error(err: MultipartError, settings: &Settings) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return too_large(settings);
    }
    ApiError::bad_request(err.body_text())
}
