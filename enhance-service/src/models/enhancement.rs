use serde::{Deserialize, Serialize};

/// Body of `POST /api/enhance-prompt`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementRequest {
    #[serde(default)]
    pub user_prompt: Option<String>,
}

/// Envelope returned to the client for every outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhanced_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EnhancementResponse {
    pub fn success(enhanced_prompt: impl Into<String>) -> Self {
        Self {
            success: true,
            enhanced_prompt: Some(enhanced_prompt.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            enhanced_prompt: None,
            error: Some(error.into()),
        }
    }
}
