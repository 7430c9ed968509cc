use std::sync::Arc;

use dermai_core::config::AssistantConfig;
use dermai_llm::{GeminiProvider, LlmProvider};
use tracing::{info, warn};

pub struct AppState {
    /// Upstream provider. `None` when no API key is configured; the assistant
    /// route then answers 503.
    pub provider: Option<Arc<dyn LlmProvider>>,
}

impl AppState {
    pub fn new(provider: Option<Arc<dyn LlmProvider>>) -> Self {
        Self { provider }
    }

    /// The proxy always talks to Gemini directly, whatever `ASSISTANT_PROVIDER`
    /// the clients use.
    pub fn from_config(config: &AssistantConfig) -> Self {
        let provider: Option<Arc<dyn LlmProvider>> = match &config.gemini_api_key {
            Some(key) => {
                info!(model = %config.gemini_model, "Assistant proxy ready");
                Some(Arc::new(GeminiProvider::new(
                    key.clone(),
                    config.gemini_model.clone(),
                    config.gemini_base_url.clone(),
                )))
            }
            None => {
                warn!("GEMINI_API_KEY not set, POST /api/assistant will answer 503");
                None
            }
        };
        Self { provider }
    }
}
