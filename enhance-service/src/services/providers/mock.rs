//! Mock provider implementation for testing.

use super::{ProviderError, TextProvider};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted text provider.
///
/// Each call pops the next scripted reply; once the script runs out the last
/// reply is repeated. Every prompt it receives is recorded.
pub struct MockTextProvider {
    configured: bool,
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    fallback: Result<String, ProviderError>,
    prompts: Mutex<Vec<String>>,
}

impl MockTextProvider {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        let fallback = replies
            .last()
            .cloned()
            .unwrap_or_else(|| Ok("Mock response".to_string()));

        Self {
            configured: true,
            script: Mutex::new(replies.into()),
            fallback,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A provider that always answers with `text`.
    pub fn always(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    /// A provider that reports no credential.
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new(Vec::new())
        }
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or_default()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        _system_instruction: &str,
    ) -> Result<String, ProviderError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        self.script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| self.fallback.clone())
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}
