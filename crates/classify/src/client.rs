use std::time::Duration;

use async_trait::async_trait;
use dermai_core::config::ClassifierConfig;
use dermai_core::{ClassificationRequest, ClassificationResult};
use reqwest::multipart::{Form, Part};
use tracing::{debug, warn};

use crate::error::ClassifyError;

/// Remote classification backend.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Submit one request. Each call is independent: nothing is queued,
    /// de-duplicated, or retried.
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationResult, ClassifyError>;
}

/// Posts the form as `multipart/form-data` to `<base_url>/predict`.
pub struct HttpClassifier {
    client: reqwest::Client,
    predict_url: String,
}

impl HttpClassifier {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClassifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClassifyError::RequestFailed(e.to_string()))?;
        Ok(Self {
            client,
            predict_url: format!("{}/predict", base_url.trim_end_matches('/')),
        })
    }

    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ClassifyError> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn predict_url(&self) -> &str {
        &self.predict_url
    }

    fn build_form(request: &ClassificationRequest) -> Result<Form, ClassifyError> {
        let image = Part::bytes(request.image.bytes.clone())
            .file_name(request.image.file_name.clone())
            .mime_str(&request.image.mime_type)
            .map_err(|e| ClassifyError::Validation(format!("invalid image type: {e}")))?;

        let patient = &request.patient;
        Ok(Form::new()
            .part("image", image)
            .text("dx_type", patient.dx_type.clone())
            .text("age", patient.age.clone())
            .text("sex", patient.sex.as_str())
            .text("localization", patient.localization.clone()))
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationResult, ClassifyError> {
        let form = Self::build_form(request)?;

        debug!(
            url = %self.predict_url,
            file = %request.image.file_name,
            "Submitting image for classification"
        );

        let response = self
            .client
            .post(&self.predict_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClassifyError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClassifyError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            warn!(%status, "classification backend returned non-2xx status");
            return Err(ClassifyError::RequestFailed(
                error_field(&body).unwrap_or_else(|| {
                    format!("Request failed with status code {}", status.as_u16())
                }),
            ));
        }

        serde_json::from_str::<ClassificationResult>(&body).map_err(|e| {
            warn!(error = %e, "classification response did not parse");
            ClassifyError::RequestFailed(
                error_field(&body).unwrap_or_else(|| format!("malformed response: {e}")),
            )
        })
    }
}

/// Pull `error` out of a JSON error body, if there is one.
fn error_field(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match &value["error"] {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_url_joins_cleanly() {
        let c = HttpClassifier::new("http://localhost:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(c.predict_url(), "http://localhost:5000/predict");
    }

    #[test]
    fn error_field_extraction() {
        assert_eq!(
            error_field(r#"{"error":"model unavailable"}"#).as_deref(),
            Some("model unavailable")
        );
        assert_eq!(error_field(r#"{"detail":"x"}"#), None);
        assert_eq!(error_field("<html>"), None);
    }
}
