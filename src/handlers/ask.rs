//! The adjudication endpoint: normalize the request, call the model,
//! normalize the response.

use crate::error::AppError;
use crate::prompt::ADJUDICATOR_SYSTEM_PROMPT;
use crate::services::normalizer::normalize_request;
use crate::services::verdict::parse_model_text;
use crate::startup::AppState;
use axum::{
    extract::{Request, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

/// `POST /ask/gemini`
///
/// Accepts `application/json` (the payload is the body) or
/// `multipart/form-data` (JSON-encoded payload in the `body` field, plus
/// zero or more file parts). An empty file set is a normal variant of the
/// input, not an error.
pub async fn ask_gemini(
    State(state): State<AppState>,
    req: Request,
) -> Result<impl IntoResponse, AppError> {
    let normalized = normalize_request(req).await?;

    for skipped in &normalized.skipped {
        tracing::warn!(
            field = %skipped.field,
            file_name = %skipped.file_name,
            reason = %skipped.reason,
            "Dropped file part"
        );
    }

    let payload = match normalized.payload {
        Some(value) if !value.is_null() => value,
        _ => {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "body field is required"
            )))
        }
    };

    let raw_text = state
        .text_provider
        .generate(ADJUDICATOR_SYSTEM_PROMPT, &payload, &normalized.files)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Generation call failed");
            AppError::GenerationFailed
        })?;

    match parse_model_text(&raw_text) {
        Some(verdict) => Ok(Json(json!({ "response": verdict }))),
        None => Err(AppError::BadGateway(
            "model returned unparsable output".to_string(),
        )),
    }
}
