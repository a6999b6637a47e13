//! Failure taxonomy of the enhancement relay and its mapping to HTTP.

use crate::models::EnhancementResponse;
use crate::services::providers::ProviderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnhanceError {
    #[error("API key is missing or default. Please configure the server.")]
    MissingCredential,

    #[error("Missing 'userPrompt' in request body.")]
    InvalidInput,

    /// Upstream rejected the request for a reason retrying will not fix.
    /// `detail` is server-side context only and never sent to the client.
    #[error("API call failed with status {status}. Check your API key or payload.")]
    UpstreamClientError { status: u16, detail: String },

    #[error("Failed to get a response from Gemini after {attempts} attempts. Last error: {last_error}")]
    UpstreamExhausted { attempts: u32, last_error: String },

    #[error("AI did not return a valid prompt. Check API response structure.")]
    EmptyGeneration,
}

impl EnhanceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EnhanceError::InvalidInput => StatusCode::BAD_REQUEST,
            EnhanceError::UpstreamClientError { status, .. } => {
                StatusCode::from_u16(*status)
                    .ok()
                    .filter(|s| !s.is_informational())
                    .unwrap_or(StatusCode::BAD_GATEWAY)
            }
            EnhanceError::MissingCredential
            | EnhanceError::UpstreamExhausted { .. }
            | EnhanceError::EmptyGeneration => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ProviderError> for EnhanceError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotConfigured(_) => EnhanceError::MissingCredential,
            ProviderError::Http { status, body } => EnhanceError::UpstreamClientError {
                status,
                detail: body,
            },
            ProviderError::EmptyGeneration { .. } => EnhanceError::EmptyGeneration,
            // Transport failures are always retried and normally arrive as
            // `RetryOutcome::Exhausted`; a lone one is a single spent attempt.
            err @ ProviderError::Network(_) => EnhanceError::UpstreamExhausted {
                attempts: 1,
                last_error: err.to_string(),
            },
        }
    }
}

impl IntoResponse for EnhanceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(EnhancementResponse::failure(self.to_string()))).into_response()
    }
}
