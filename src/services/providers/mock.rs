//! Mock provider implementation for testing.

use super::{CaseFile, ProviderError, TextProvider};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// One recorded `generate` invocation.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system_prompt: String,
    pub payload: Value,
    pub file_fields: Vec<String>,
}

/// Mock text provider that records its calls and returns a canned outcome.
#[derive(Clone)]
pub struct MockTextProvider {
    response: Option<String>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockTextProvider {
    /// Provider that succeeds with the given model text.
    pub fn with_response(text: impl Into<String>) -> Self {
        Self {
            response: Some(text.into()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Provider whose generation and health calls always fail.
    pub fn failing() -> Self {
        Self {
            response: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Calls recorded so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("mock calls lock poisoned").clone()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        payload: &Value,
        files: &BTreeMap<String, CaseFile>,
    ) -> Result<String, ProviderError> {
        self.calls
            .lock()
            .expect("mock calls lock poisoned")
            .push(RecordedCall {
                system_prompt: system_prompt.to_string(),
                payload: payload.clone(),
                file_fields: files.keys().cloned().collect(),
            });

        match &self.response {
            Some(text) => Ok(text.clone()),
            None => Err(ProviderError::ApiError(
                "mock provider configured to fail".to_string(),
            )),
        }
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.response.is_some() {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "mock provider configured to fail".to_string(),
            ))
        }
    }
}
