use async_trait::async_trait;
use dermai_core::config::GenerationConfig;
use serde_json::json;
use tracing::debug;

use crate::provider::{LlmError, LlmProvider};

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key,
        )
    }

    /// Build the request body for the Gemini generateContent API. The whole
    /// conversation travels as one user turn.
    fn build_request_body(prompt: &str, generation: &GenerationConfig) -> serde_json::Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }],
            }],
            "generationConfig": generation,
        })
    }
}

/// Pull `error.message` out of an upstream error body.
pub(crate) fn upstream_message(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| match status.canonical_reason() {
            Some(reason) => reason.to_string(),
            None => format!("Request failed with status code {}", status.as_u16()),
        })
}

/// The endpoint carries the API key, so transport errors drop their URL.
fn redact(err: reqwest::Error) -> LlmError {
    LlmError::HttpError(err.without_url())
}

/// `candidates[0].content.parts[0].text`
pub(crate) fn extract_text(resp: &serde_json::Value) -> Result<String, LlmError> {
    resp["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| {
            LlmError::ParseError("missing candidates[0].content.parts[0].text".into())
        })
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn complete(
        &self,
        prompt: &str,
        generation: &GenerationConfig,
    ) -> Result<String, LlmError> {
        let body = Self::build_request_body(prompt, generation);

        debug!(model = %self.model, prompt_chars = prompt.len(), "Gemini request");

        let response = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(redact)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message: upstream_message(&body, status),
            });
        }

        let resp: serde_json::Value = response.json().await.map_err(redact)?;
        extract_text(&resp)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_structure() {
        let body = GeminiProvider::build_request_body(
            "You are helpful.\n\nUser: Hello",
            &GenerationConfig::default(),
        );

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[0]["parts"][0]["text"], "You are helpful.\n\nUser: Hello");

        let temp = body["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temp - 0.7).abs() < 1e-6, "temperature should be ~0.7, got {temp}");
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
        assert!(body.get("system_instruction").is_none());
    }

    #[test]
    fn test_endpoint_carries_model_and_key() {
        let provider = GeminiProvider::new(
            "k123".into(),
            "gemini-2.0-flash".into(),
            "http://localhost:9000/".into(),
        );
        assert_eq!(
            provider.endpoint(),
            "http://localhost:9000/v1beta/models/gemini-2.0-flash:generateContent?key=k123"
        );
    }

    #[test]
    fn test_upstream_message_fallbacks() {
        let status = reqwest::StatusCode::BAD_REQUEST;
        assert_eq!(
            upstream_message(r#"{"error":{"code":400,"message":"API key not valid"}}"#, status),
            "API key not valid"
        );
        assert_eq!(upstream_message("<html>", status), "Bad Request");
    }

    #[test]
    fn test_extract_text_requires_candidate() {
        let ok = json!({"candidates":[{"content":{"parts":[{"text":"Hi"}]}}]});
        assert_eq!(extract_text(&ok).unwrap(), "Hi");
        assert!(matches!(
            extract_text(&json!({"candidates": []})),
            Err(LlmError::ParseError(_))
        ));
    }
}
