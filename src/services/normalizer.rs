//! Request normalization.
//!
//! Accepts either a direct JSON body or a multipart form with a JSON-encoded
//! `body` field plus file parts, and produces a single decoded payload and an
//! in-memory files map regardless of transport encoding.

use crate::error::AppError;
use crate::services::providers::CaseFile;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Multipart form field that carries the JSON-encoded payload.
pub const PAYLOAD_FIELD: &str = "body";

/// Upper bound on a direct JSON body (attachments travel as multipart).
const MAX_JSON_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Normalized request: one decoded payload plus owned attachments.
///
/// `payload` is `None` when the required field was absent from a multipart
/// form. `skipped` reports every file part that was dropped and why, so the
/// route layer can log it and tests can assert on it.
#[derive(Debug, Default)]
pub struct NormalizedRequest {
    pub payload: Option<Value>,
    pub files: BTreeMap<String, CaseFile>,
    pub skipped: Vec<SkippedFile>,
}

/// One file part that was excluded from the files map.
#[derive(Debug)]
pub struct SkippedFile {
    pub field: String,
    pub file_name: String,
    pub reason: SkipReason,
}

/// Why a file part was excluded. Never fatal to the request.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("file name has no extension")]
    MissingExtension,

    #[error("unsupported file extension: {0}")]
    UnsupportedExtension(String),

    #[error("unreadable file content: {0}")]
    Unreadable(String),
}

/// Decode an inbound request into a payload and files map.
///
/// Unsupported content types and malformed JSON (in either transport) are
/// input errors and reject the request before any external call.
pub async fn normalize_request(req: Request) -> Result<NormalizedRequest, AppError> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(media_type_of)
        .unwrap_or_default();

    match content_type.as_str() {
        "application/json" => normalize_json(req).await,
        "multipart/form-data" => normalize_multipart(req).await,
        other => Err(AppError::BadRequest(anyhow::anyhow!(
            "unsupported content type: {}",
            if other.is_empty() { "<none>" } else { other }
        ))),
    }
}

async fn normalize_json(req: Request) -> Result<NormalizedRequest, AppError> {
    let bytes = axum::body::to_bytes(req.into_body(), MAX_JSON_BODY_BYTES)
        .await
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("failed to read request body: {}", e)))?;

    let payload: Value = serde_json::from_slice(&bytes)
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("invalid JSON body: {}", e)))?;

    Ok(NormalizedRequest {
        payload: Some(payload),
        ..Default::default()
    })
}

async fn normalize_multipart(req: Request) -> Result<NormalizedRequest, AppError> {
    let mut multipart = Multipart::from_request(req, &())
        .await
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("invalid multipart request: {}", e)))?;

    let mut normalized = NormalizedRequest::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("failed to read multipart field: {}", e)))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        if let Some(file_name) = field.file_name().map(str::to_string) {
            // MIME type comes from the extension table, not the part's
            // declared content type
            let mime_type = match mime_for_file_name(&file_name) {
                Ok(mime) => mime,
                Err(reason) => {
                    normalized.skipped.push(SkippedFile {
                        field: field_name,
                        file_name,
                        reason,
                    });
                    continue;
                }
            };

            let content = match field.bytes().await {
                Ok(bytes) => bytes.to_vec(),
                Err(e) => {
                    normalized.skipped.push(SkippedFile {
                        field: field_name,
                        file_name,
                        reason: SkipReason::Unreadable(e.to_string()),
                    });
                    continue;
                }
            };

            normalized.files.insert(
                field_name,
                CaseFile {
                    file_name,
                    mime_type: mime_type.to_string(),
                    content,
                },
            );
        } else if field_name == PAYLOAD_FIELD {
            let text = field.text().await.map_err(|e| {
                AppError::BadRequest(anyhow::anyhow!(
                    "failed to read form field '{}': {}",
                    PAYLOAD_FIELD,
                    e
                ))
            })?;

            let payload: Value = serde_json::from_str(&text).map_err(|e| {
                AppError::BadRequest(anyhow::anyhow!(
                    "invalid JSON in form field '{}': {}",
                    PAYLOAD_FIELD,
                    e
                ))
            })?;

            normalized.payload = Some(payload);
        }
        // Other plain fields are ignored
    }

    Ok(normalized)
}

/// Strip parameters (boundary, charset) from a Content-Type header value.
fn media_type_of(header: &str) -> String {
    header
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

fn mime_for_file_name(file_name: &str) -> Result<&'static str, SkipReason> {
    let (_, extension) = file_name
        .rsplit_once('.')
        .ok_or(SkipReason::MissingExtension)?;

    mime_for_extension(extension)
        .ok_or_else(|| SkipReason::UnsupportedExtension(extension.to_string()))
}

/// Fixed extension-to-MIME whitelist, looked up uppercased.
fn mime_for_extension(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_uppercase().as_str() {
        "PDF" => Some("application/pdf"),
        "JPG" | "JPEG" => Some("image/jpeg"),
        "PNG" => Some("image/png"),
        "GIF" => Some("image/gif"),
        "BMP" => Some("image/bmp"),
        "WEBP" => Some("image/webp"),
        "TXT" => Some("text/plain"),
        "DOC" => Some("application/msword"),
        "DOCX" => {
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        }
        _ => None,
    }
}
