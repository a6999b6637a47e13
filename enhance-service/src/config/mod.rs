use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use service_core::retry::RetryConfig;
use std::env;
use std::time::Duration;

/// Gemini API base URL.
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-preview-09-2025";

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Value shipped in sample `.env` files; treated the same as no key at all.
pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY_HERE";

/// Instruction sent alongside every prompt.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = r#"You are an expert AI art prompt engineer. Your task is to take the user's structured base prompt and convert it into a single, cohesive, highly descriptive, and artistic prompt ready for an image generation model.

RULES:
- Combine all structured components into one continuous paragraph.
- Elaborate on the user's inputs, adding rich adjectives, sensory details, and cinematic descriptions.
- DO NOT include any numbered lists, introductory text (like "Here is your enhanced prompt:"), or labels (like "Subject:").
- The output must be the final, polished prompt text only.
- Ensure all quality modifiers are at the very end.

Example Transformation:
Input: Main Subject: silver dragon | Action: soaring over a stormy sea | Medium: digital painting | Lighting: cinematic volumetric lighting | Composition: rule of thirds | Modifiers: 8k
Output: A majestic, ancient silver dragon, scales catching the dramatic volumetric lighting, soaring with powerful wings over a turbulent, stormy sea. The composition adheres to the rule of thirds, emphasizing the scale and drama. Highly detailed, fantasy art, digital painting, 8k, smooth, trending on ArtStation.
"#;

#[derive(Debug, Clone, Deserialize)]
pub struct EnhanceConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub gemini: GeminiSettings,
    #[serde(skip, default)]
    pub retry: RetryConfig,
    pub system_instruction: String,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiSettings {
    /// Absent when the operator has not configured a key; requests then fail
    /// with a server misconfiguration error instead of the process exiting.
    pub api_key: Option<Secret<String>>,
    pub model: String,
    pub api_base_url: String,
    pub timeout_secs: u64,
}

impl GeminiSettings {
    /// The configured key, unless it is missing, blank or the placeholder.
    pub fn usable_api_key(&self) -> Option<&Secret<String>> {
        self.api_key.as_ref().filter(|key| {
            let key = key.expose_secret().trim();
            !key.is_empty() && key != PLACEHOLDER_API_KEY
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl EnhanceConfig {
    pub fn load() -> Result<Self, AppError> {
        let mut common = core_config::Config::load()?;

        if let Ok(port) = env::var("PORT") {
            common.port = port.parse().map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("PORT must be a valid port: {}", e))
            })?;
        }

        let api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("GOOGLE_API_KEY"))
            .ok()
            .map(Secret::new);

        let timeout_secs = match env::var("GEMINI_TIMEOUT_SECS") {
            Ok(val) => val.parse().map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!(
                    "GEMINI_TIMEOUT_SECS must be a whole number of seconds: {}",
                    e
                ))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(EnhanceConfig {
            common,
            gemini: GeminiSettings {
                api_key,
                model: get_env("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
                api_base_url: get_env("GEMINI_API_BASE_URL", DEFAULT_GEMINI_API_BASE),
                timeout_secs,
            },
            retry: RetryConfig::default(),
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
        })
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
