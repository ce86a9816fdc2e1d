//! Generation provider abstractions and implementations.
//!
//! A trait-based seam between the route layer and the external model API,
//! allowing the Gemini backend to be swapped for a mock in tests.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// One uploaded attachment, fully read into memory and owned by the request.
#[derive(Debug, Clone)]
pub struct CaseFile {
    pub file_name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Empty response from model")]
    EmptyResponse,
}

/// Trait for text generation providers (e.g., Gemini).
///
/// `generate` issues a single attempt with no retry: any failure is a
/// terminal outcome for the request. Files that fail to upload are skipped
/// by the implementation rather than failing the call.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generate the raw model text for a payload plus attachments.
    async fn generate(
        &self,
        system_prompt: &str,
        payload: &Value,
        files: &BTreeMap<String, CaseFile>,
    ) -> Result<String, ProviderError>;

    /// Verify the provider is usable (configuration-level check).
    async fn health_check(&self) -> Result<(), ProviderError>;
}

/// Serialize the payload for the final content part: strings go through
/// verbatim, structured values are re-encoded as JSON text.
pub(crate) fn payload_to_text(payload: &Value) -> String {
    match payload {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_payloads_are_not_requoted() {
        assert_eq!(payload_to_text(&json!("the case")), "the case");
    }

    #[test]
    fn structured_payloads_are_serialized() {
        assert_eq!(
            payload_to_text(&json!({"prompt": "case"})),
            r#"{"prompt":"case"}"#
        );
    }
}
