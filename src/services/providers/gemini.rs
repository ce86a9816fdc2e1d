//! Gemini provider implementation.
//!
//! Uploads attachments through the Files API, then issues one
//! `generateContent` call combining the system instruction, the uploaded
//! file references, and the user payload.

use super::{payload_to_text, CaseFile, ProviderError, TextProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub upload_base: String,
}

/// Gemini text provider.
pub struct GeminiTextProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiTextProvider {
    pub fn new(config: GeminiConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Build the API URL for the given model and method.
    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.config.api_base, self.config.model, method, self.config.api_key
        )
    }

    /// Upload one attachment through the Files API resumable protocol.
    ///
    /// Two requests: a `start` call that yields an upload session URL, then
    /// the raw bytes with `upload, finalize`. Returns the hosted file
    /// reference to embed in the generation call.
    async fn upload_file(&self, file: &CaseFile) -> Result<UploadedFile, ProviderError> {
        let start_url = format!("{}/files?key={}", self.config.upload_base, self.config.api_key);

        let start_response = self
            .client
            .post(&start_url)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", file.content.len())
            .header("X-Goog-Upload-Header-Content-Type", &file.mime_type)
            .json(&json!({ "file": { "display_name": file.file_name } }))
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !start_response.status().is_success() {
            let status = start_response.status();
            let error_text = start_response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError(format!(
                "File upload start failed {}: {}",
                status, error_text
            )));
        }

        let upload_url = start_response
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                ProviderError::ApiError("Upload session missing x-goog-upload-url".to_string())
            })?;

        let finalize_response = self
            .client
            .post(&upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(file.content.clone())
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !finalize_response.status().is_success() {
            let status = finalize_response.status();
            let error_text = finalize_response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError(format!(
                "File upload finalize failed {}: {}",
                status, error_text
            )));
        }

        let uploaded: FileUploadResponse = finalize_response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse upload response: {}", e)))?;

        Ok(uploaded.file)
    }

    /// Upload all attachments, skipping failures.
    ///
    /// A failed upload is logged and excluded; it aborts neither the other
    /// uploads nor the generation call.
    async fn upload_files(&self, files: &BTreeMap<String, CaseFile>) -> Vec<UploadedFile> {
        let mut uploaded = Vec::with_capacity(files.len());

        for (field, file) in files {
            match self.upload_file(file).await {
                Ok(reference) => {
                    tracing::debug!(
                        field = %field,
                        file_name = %file.file_name,
                        uri = %reference.uri,
                        "Uploaded attachment"
                    );
                    uploaded.push(reference);
                }
                Err(e) => {
                    tracing::warn!(
                        field = %field,
                        file_name = %file.file_name,
                        error = %e,
                        "Skipping attachment that failed to upload"
                    );
                }
            }
        }

        uploaded
    }
}

#[async_trait]
impl TextProvider for GeminiTextProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        payload: &Value,
        files: &BTreeMap<String, CaseFile>,
    ) -> Result<String, ProviderError> {
        // File references first, payload text as the final part
        let mut parts: Vec<ContentPart> = self
            .upload_files(files)
            .await
            .into_iter()
            .map(|f| ContentPart::FileData {
                file_data: FileData {
                    file_uri: f.uri,
                    mime_type: f.mime_type,
                },
            })
            .collect();
        parts.push(ContentPart::Text {
            text: payload_to_text(payload),
        });

        let request = GenerateContentRequest {
            system_instruction: Some(Content {
                role: None,
                parts: vec![ContentPart::Text {
                    text: system_prompt.to_string(),
                }],
            }),
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
        };

        let url = self.api_url("generateContent");

        tracing::debug!(
            model = %self.config.model,
            file_count = files.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }

            return Err(ProviderError::ApiError(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        api_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .and_then(|p| match p {
                ContentPart::Text { text } => Some(text.clone()),
                _ => None,
            })
            .ok_or(ProviderError::EmptyResponse)
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }

        // List models to verify the API key works
        let url = format!("{}/models?key={}", self.config.api_base, self.config.api_key);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::ApiError(format!(
                "Health check failed: {}",
                response.status()
            )))
        }
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ContentPart {
    Text {
        text: String,
    },
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    file_uri: String,
    mime_type: String,
}

#[derive(Debug, Deserialize)]
struct FileUploadResponse {
    file: UploadedFile,
}

/// Hosted file reference returned by the Files API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedFile {
    uri: String,
    mime_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}
