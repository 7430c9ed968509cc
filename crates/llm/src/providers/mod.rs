pub mod gemini;
pub mod proxy;

use dermai_core::config::AssistantConfig;
use tracing::info;

use crate::provider::{LlmError, LlmProvider};

/// Create the appropriate assistant provider based on config.
pub fn create_provider(config: &AssistantConfig) -> Result<Box<dyn LlmProvider>, LlmError> {
    let provider: Box<dyn LlmProvider> = match config.provider.as_str() {
        "proxy" => {
            if config.proxy_url.is_empty() {
                return Err(LlmError::NotConfigured("ASSISTANT_PROXY_URL not set".into()));
            }
            Box::new(proxy::ProxyProvider::new(config.proxy_url.clone()))
        }
        "gemini" => {
            let api_key = config
                .gemini_api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("GEMINI_API_KEY not set".into()))?;
            Box::new(gemini::GeminiProvider::new(
                api_key.clone(),
                config.gemini_model.clone(),
                config.gemini_base_url.clone(),
            ))
        }
        other => {
            return Err(LlmError::NotConfigured(format!(
                "unknown assistant provider: '{}'",
                other
            )))
        }
    };
    info!(provider = provider.name(), "Assistant provider ready");
    Ok(provider)
}
