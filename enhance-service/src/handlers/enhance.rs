use crate::error::EnhanceError;
use crate::models::{EnhancementRequest, EnhancementResponse};
use crate::startup::AppState;
use axum::{extract::rejection::JsonRejection, extract::State, Json};

/// `POST /api/enhance-prompt`
///
/// A body that is missing, malformed, or lacks `userPrompt` is reported as a
/// missing prompt. Credential problems take precedence over input problems.
pub async fn enhance_prompt(
    State(state): State<AppState>,
    payload: Result<Json<EnhancementRequest>, JsonRejection>,
) -> Result<Json<EnhancementResponse>, EnhanceError> {
    let user_prompt = match payload {
        Ok(Json(request)) => request.user_prompt.unwrap_or_default(),
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "Rejected enhancement request body");
            String::new()
        }
    };

    let enhanced = state.enhancer.enhance(&user_prompt).await.map_err(|e| {
        tracing::error!(
            error = %e,
            status = e.status_code().as_u16(),
            detail = ?upstream_detail(&e),
            "Enhancement failed"
        );
        e
    })?;

    Ok(Json(EnhancementResponse::success(enhanced)))
}

fn upstream_detail(err: &EnhanceError) -> Option<&str> {
    match err {
        EnhanceError::UpstreamClientError { detail, .. } => Some(detail.as_str()),
        _ => None,
    }
}
