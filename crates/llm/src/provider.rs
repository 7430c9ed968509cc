use async_trait::async_trait;
use dermai_core::config::GenerationConfig;
use dermai_core::AppError;

/// Trait for text-generation backends. The conversation is flattened into a
/// single prompt before it reaches the provider.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send one generation request and return the reply text.
    async fn complete(
        &self,
        prompt: &str,
        generation: &GenerationConfig,
    ) -> Result<String, LlmError>;

    fn name(&self) -> &str;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    /// Upstream answered with a non-success status. `message` is the
    /// upstream `error.message`, or the status text when there is none.
    #[error("{message}")]
    ApiError { status: u16, message: String },
    #[error("failed to parse response: {0}")]
    ParseError(String),
    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

impl LlmError {
    /// HTTP status to hand back to a caller of the proxy.
    pub fn status(&self) -> u16 {
        match self {
            LlmError::ApiError { status, .. } => *status,
            LlmError::HttpError(e) => e.status().map(|s| s.as_u16()).unwrap_or(502),
            LlmError::ParseError(_) => 502,
            LlmError::NotConfigured(_) => 503,
        }
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        AppError::AssistantUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_surfaces_upstream_message() {
        let err = LlmError::ApiError {
            status: 429,
            message: "Resource has been exhausted".into(),
        };
        assert_eq!(err.status(), 429);
        let app: AppError = err.into();
        assert_eq!(app.to_string(), "Chat Error: Resource has been exhausted");
    }

    #[test]
    fn missing_config_is_service_unavailable() {
        let err = LlmError::NotConfigured("GEMINI_API_KEY not set".into());
        assert_eq!(err.status(), 503);
        assert_eq!(err.to_string(), "provider not configured: GEMINI_API_KEY not set");
    }
}
