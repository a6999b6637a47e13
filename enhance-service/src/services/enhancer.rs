//! Prompt enhancement: validation, bounded retry and outcome mapping around a
//! single [`TextProvider`].

use crate::config::EnhanceConfig;
use crate::error::EnhanceError;
use crate::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use crate::services::providers::{ProviderError, TextProvider};
use service_core::error::AppError;
use service_core::retry::{
    classify_http_status, run_with_retry, Decision, RetryConfig, RetryOutcome, StatusClass,
};
use std::sync::Arc;

const OPERATION_NAME: &str = "gemini_generate_content";

/// Classify the result of one provider attempt.
pub fn classify(result: Result<String, ProviderError>) -> Decision<String, ProviderError> {
    match result {
        Ok(text) => Decision::StopSuccess(text),
        Err(err @ ProviderError::Http { status, .. }) => match classify_http_status(status) {
            StatusClass::Transient => Decision::Retry(err),
            StatusClass::Permanent | StatusClass::Success => Decision::StopFail(err),
        },
        Err(err @ ProviderError::Network(_)) => Decision::Retry(err),
        Err(err @ (ProviderError::EmptyGeneration { .. } | ProviderError::NotConfigured(_))) => {
            Decision::StopFail(err)
        }
    }
}

pub struct PromptEnhancer {
    provider: Arc<dyn TextProvider>,
    retry: RetryConfig,
    system_instruction: String,
}

impl PromptEnhancer {
    pub fn new(
        provider: Arc<dyn TextProvider>,
        retry: RetryConfig,
        system_instruction: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            retry,
            system_instruction: system_instruction.into(),
        }
    }

    /// Build an enhancer backed by Gemini.
    pub fn from_config(config: &EnhanceConfig) -> Result<Self, AppError> {
        let provider = GeminiTextProvider::new(GeminiConfig::from(&config.gemini))
            .map_err(|e| {
                AppError::ConfigError(anyhow::Error::new(e).context("Failed to create HTTP client"))
            })?;

        Ok(Self::new(
            Arc::new(provider),
            config.retry.clone(),
            config.system_instruction.clone(),
        ))
    }

    /// Whether requests can be served at all.
    pub fn is_ready(&self) -> bool {
        self.provider.is_configured()
    }

    /// Turn a user prompt into an enhanced prompt.
    pub async fn enhance(&self, user_prompt: &str) -> Result<String, EnhanceError> {
        if !self.provider.is_configured() {
            tracing::error!("Gemini API key is missing or default");
            return Err(EnhanceError::MissingCredential);
        }

        if user_prompt.is_empty() {
            return Err(EnhanceError::InvalidInput);
        }

        tracing::info!(prompt_len = user_prompt.len(), "Enhancement request received");

        let system_instruction = self.system_instruction.as_str();
        let provider = self.provider.as_ref();

        let outcome = run_with_retry(&self.retry, OPERATION_NAME, |attempt| async move {
            tracing::debug!(attempt, "Calling Gemini API");
            classify(provider.generate(user_prompt, system_instruction).await)
        })
        .await;

        match outcome {
            RetryOutcome::Success(text) => {
                tracing::info!(output_len = text.len(), "Enhancement succeeded");
                Ok(text)
            }
            RetryOutcome::Failed(err) => Err(EnhanceError::from(err)),
            RetryOutcome::Exhausted {
                attempts,
                last_error,
            } => Err(EnhanceError::UpstreamExhausted {
                attempts,
                last_error: last_error.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::mock::MockTextProvider;
    use std::time::Duration;

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_jitter: Duration::ZERO,
        }
    }

    fn http(status: u16) -> Result<String, ProviderError> {
        Err(ProviderError::Http {
            status,
            body: format!("status {}", status),
        })
    }

    fn enhancer(provider: Arc<MockTextProvider>) -> PromptEnhancer {
        PromptEnhancer::new(provider, fast_retry(), "instruction")
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            classify(Ok("text".into())),
            Decision::StopSuccess("text".to_string())
        );
        assert!(matches!(classify(http(503)), Decision::Retry(_)));
        assert!(matches!(classify(http(500)), Decision::Retry(_)));
        assert!(matches!(classify(http(429)), Decision::Retry(_)));
        assert!(matches!(classify(http(400)), Decision::StopFail(_)));
        assert!(matches!(classify(http(401)), Decision::StopFail(_)));
        assert!(matches!(classify(http(403)), Decision::StopFail(_)));
        assert!(matches!(
            classify(Err(ProviderError::Network("dns".into()))),
            Decision::Retry(_)
        ));
        assert!(matches!(
            classify(Err(ProviderError::EmptyGeneration {
                finish_reason: Some("SAFETY".into()),
                block_reason: None
            })),
            Decision::StopFail(_)
        ));
    }

    #[tokio::test]
    async fn test_enhance_success() {
        let provider = Arc::new(MockTextProvider::always("A majestic dragon"));
        let result = enhancer(provider.clone()).enhance("dragon").await;

        assert_eq!(result, Ok("A majestic dragon".to_string()));
        assert_eq!(provider.prompts(), vec!["dragon".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_prompt_makes_no_call() {
        let provider = Arc::new(MockTextProvider::always("unused"));
        let enhancer = enhancer(provider.clone());

        assert_eq!(enhancer.enhance("").await, Err(EnhanceError::InvalidInput));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_whitespace_prompt_is_forwarded_verbatim() {
        let provider = Arc::new(MockTextProvider::always(" "));
        let result = enhancer(provider.clone()).enhance("   ").await;

        assert_eq!(result, Ok(" ".to_string()));
        assert_eq!(provider.prompts(), vec!["   ".to_string()]);
    }

    #[test]
    fn test_from_config_builds_gemini_enhancer() {
        let config = EnhanceConfig {
            common: service_core::config::Config { port: 0 },
            gemini: crate::config::GeminiSettings {
                api_key: None,
                model: "gemini-test".to_string(),
                api_base_url: "http://127.0.0.1:1".to_string(),
                timeout_secs: 1,
            },
            retry: fast_retry(),
            system_instruction: "instruction".to_string(),
            otlp_endpoint: None,
        };

        let enhancer = PromptEnhancer::from_config(&config).unwrap();
        assert!(!enhancer.is_ready());
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_call() {
        let provider = Arc::new(MockTextProvider::unconfigured());
        let enhancer = enhancer(provider.clone());

        assert!(!enhancer.is_ready());
        assert_eq!(
            enhancer.enhance("dragon").await,
            Err(EnhanceError::MissingCredential)
        );
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let provider = Arc::new(MockTextProvider::new(vec![
            http(503),
            Err(ProviderError::Network("connection refused".into())),
            Ok("third time lucky".into()),
        ]));

        let result = enhancer(provider.clone()).enhance("dragon").await;

        assert_eq!(result, Ok("third time lucky".to_string()));
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let provider = Arc::new(MockTextProvider::new(vec![http(401), Ok("never".into())]));

        let result = enhancer(provider.clone()).enhance("dragon").await;

        assert_eq!(
            result,
            Err(EnhanceError::UpstreamClientError {
                status: 401,
                detail: "status 401".to_string()
            })
        );
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_carries_last_error() {
        let provider = Arc::new(MockTextProvider::new(vec![
            Err(ProviderError::Network("timeout".into())),
            http(500),
            http(429),
        ]));

        let result = enhancer(provider.clone()).enhance("dragon").await;

        assert_eq!(
            result,
            Err(EnhanceError::UpstreamExhausted {
                attempts: 3,
                last_error: "API call failed with status 429.".to_string()
            })
        );
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_empty_generation_is_not_retried() {
        let provider = Arc::new(MockTextProvider::new(vec![Err(
            ProviderError::EmptyGeneration {
                finish_reason: None,
                block_reason: Some("SAFETY".into()),
            },
        )]));

        let result = enhancer(provider.clone()).enhance("dragon").await;

        assert_eq!(result, Err(EnhanceError::EmptyGeneration));
        assert_eq!(provider.call_count(), 1);
    }
}
