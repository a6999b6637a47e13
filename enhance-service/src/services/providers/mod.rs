//! Text generation provider abstractions and implementations.
//!
//! A provider performs exactly one upstream attempt per call. Retrying is the
//! caller's business (see [`crate::services::enhancer`]).

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for a single provider attempt.
///
/// The `Display` text may reach the client inside an exhausted-retries
/// message, so it never includes response bodies or request URLs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// Non-2xx reply. `body` is truncated and only meant for server logs.
    #[error("API call failed with status {status}.")]
    Http { status: u16, body: String },

    /// Transport failure, or a 2xx reply whose body could not be read.
    #[error("Network or request error: {0}")]
    Network(String),

    /// 2xx reply without usable text, e.g. safety-filtered output.
    #[error("Provider returned no text")]
    EmptyGeneration {
        finish_reason: Option<String>,
        block_reason: Option<String>,
    },
}

/// Trait for text generation providers (e.g., Gemini).
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Make one generation call and return the first candidate's text.
    async fn generate(&self, prompt: &str, system_instruction: &str)
        -> Result<String, ProviderError>;

    /// Whether a usable credential is present.
    fn is_configured(&self) -> bool;
}

/// Cut `text` to at most `max_chars` characters for logging.
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
