//! Gemini AI provider implementation.
//!
//! Calls the `generateContent` method of Google's Gemini API. The API key is
//! sent in the `x-goog-api-key` header so it never appears in URLs, and
//! therefore never in transport error messages either.

use super::{truncate_for_log, ProviderError, TextProvider};
use crate::config::GeminiSettings;
use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Upstream error bodies are cut to this many characters in logs.
const MAX_LOGGED_BODY_CHARS: usize = 500;

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<Secret<String>>,
    pub model: String,
    pub api_base_url: String,
    pub timeout: Duration,
}

impl From<&GeminiSettings> for GeminiConfig {
    fn from(settings: &GeminiSettings) -> Self {
        Self {
            api_key: settings.usable_api_key().cloned(),
            model: settings.model.clone(),
            api_base_url: settings.api_base_url.clone(),
            timeout: settings.timeout(),
        }
    }
}

/// Gemini text provider.
pub struct GeminiTextProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiTextProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, client })
    }

    /// Build the `generateContent` URL for the configured model.
    fn api_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn api_key_header(&self) -> Result<HeaderValue, ProviderError> {
        let key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| ProviderError::NotConfigured("Gemini API key not configured".into()))?;

        let mut value = HeaderValue::from_str(key.expose_secret()).map_err(|_| {
            ProviderError::NotConfigured("Gemini API key contains invalid characters".into())
        })?;
        value.set_sensitive(true);
        Ok(value)
    }
}

#[async_trait]
impl TextProvider for GeminiTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        system_instruction: &str,
    ) -> Result<String, ProviderError> {
        let api_key = self.api_key_header()?;
        let request = GenerateContentRequest::new(prompt, system_instruction);

        tracing::debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(self.api_url())
            .header(API_KEY_HEADER, api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let body = truncate_for_log(&error_text, MAX_LOGGED_BODY_CHARS);

            tracing::error!(
                status = status.as_u16(),
                body = %body,
                "Gemini API returned an error status"
            );

            return Err(ProviderError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let raw = response.text().await.map_err(|e| {
            ProviderError::Network(format!("Failed to read response: {}", e.without_url()))
        })?;

        // Only a body that is not JSON at all is retried; any JSON shape is
        // inspected for the text and otherwise reported as empty.
        let api_response: Value = serde_json::from_str(&raw)
            .map_err(|e| ProviderError::Network(format!("Failed to parse response: {}", e)))?;

        match first_candidate_text(&api_response) {
            Some(text) => Ok(text.to_string()),
            None => {
                let finish_reason = first_finish_reason(&api_response).map(str::to_string);
                let block_reason = block_reason(&api_response).map(str::to_string);

                tracing::error!(
                    finish_reason = ?finish_reason,
                    block_reason = ?block_reason,
                    "Gemini response was valid but contained no text candidate"
                );

                Err(ProviderError::EmptyGeneration {
                    finish_reason,
                    block_reason,
                })
            }
        }
    }

    fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    system_instruction: Content,
}

impl GenerateContentRequest {
    fn new(prompt: &str, system_instruction: &str) -> Self {
        Self {
            contents: vec![Content::text(prompt)],
            system_instruction: Content::text(system_instruction),
        }
    }
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

impl Content {
    fn text(text: &str) -> Self {
        Self {
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

/// `candidates[0].content.parts[0].text`, if it is a non-empty string.
///
/// Missing fields, `null`s and values of the wrong type all yield `None`.
fn first_candidate_text(response: &Value) -> Option<&str> {
    response
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
        .filter(|text| !text.is_empty())
}

fn first_finish_reason(response: &Value) -> Option<&str> {
    response
        .get("candidates")?
        .get(0)?
        .get("finishReason")?
        .as_str()
}

fn block_reason(response: &Value) -> Option<&str> {
    response.get("promptFeedback")?.get("blockReason")?.as_str()
}
