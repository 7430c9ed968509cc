use async_trait::async_trait;
use dermai_core::config::GenerationConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::provider::{LlmError, LlmProvider};

/// Body of `POST /api/assistant`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyRequest {
    pub prompt: String,
    #[serde(default)]
    pub generation_config: GenerationConfig,
}

/// Reply of `POST /api/assistant`: `{ "text": ... }` on success, `{ "error": ... }`
/// with the upstream status otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProxyReply {
    Text { text: String },
    Error { error: String },
}

/// Talks to the assistant proxy, which holds the API key.
pub struct ProxyProvider {
    client: reqwest::Client,
    url: String,
}

impl ProxyProvider {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl LlmProvider for ProxyProvider {
    async fn complete(
        &self,
        prompt: &str,
        generation: &GenerationConfig,
    ) -> Result<String, LlmError> {
        let body = ProxyRequest {
            prompt: prompt.to_string(),
            generation_config: *generation,
        };

        debug!(url = %self.url, prompt_chars = prompt.len(), "Assistant proxy request");

        let response = self.client.post(&self.url).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        let parsed = serde_json::from_str::<ProxyReply>(&text);
        if status.is_success() {
            return match parsed {
                Ok(ProxyReply::Text { text }) => Ok(text),
                Ok(ProxyReply::Error { error }) => Err(LlmError::ApiError {
                    status: status.as_u16(),
                    message: error,
                }),
                Err(e) => Err(LlmError::ParseError(e.to_string())),
            };
        }

        let message = match parsed {
            Ok(ProxyReply::Error { error }) => error,
            _ => format!("Request failed with status code {}", status.as_u16()),
        };
        Err(LlmError::ApiError {
            status: status.as_u16(),
            message,
        })
    }

    fn name(&self) -> &str {
        "proxy"
    }
}
