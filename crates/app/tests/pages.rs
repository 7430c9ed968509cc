//! Page behaviour with in-memory classifier and assistant fakes.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dermai_app::{ChatPage, PredictionPage};
use dermai_classify::{Classifier, ClassifyError};
use dermai_core::config::{GenerationConfig, PageFeatures};
use dermai_core::{AppError, ClassificationRequest, ClassificationResult, PatientInfo, Role};
use dermai_llm::conversation::{QuickAction, CHATBOT_GREETING, HELP_MESSAGE, PREDICTION_GREETING};
use dermai_llm::{Assistant, LlmError, LlmProvider};
use tokio::sync::Notify;

fn result(class: &str) -> ClassificationResult {
    serde_json::from_value(serde_json::json!({
        "cnn_result": {
            "predicted_class": class,
            "confidence": 0.82,
            "all_probabilities": {"nv": 0.82, "mel": 0.10, "bcc": 0.08}
        },
        "nlp_result": {"predicted_class": class, "confidence": null},
        "segmentation_result": "Symmetric lesion with regular borders.",
        "combined_result": {"predicted_class": class, "confidence": 0.82, "source": "cnn"},
        "plot_image": ""
    }))
    .unwrap()
}

fn png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(8, 8, image::Rgb([150, 100, 80]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn patient(age: &str) -> PatientInfo {
    PatientInfo {
        age: age.into(),
        ..PatientInfo::default()
    }
}

/// Answers by the patient's age: `slow` waits for the gate, `fail` errors,
/// anything else returns a result named after the age.
#[derive(Default)]
struct FakeClassifier {
    calls: AtomicUsize,
    gate: Notify,
}

impl FakeClassifier {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for FakeClassifier {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationResult, ClassifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match request.patient.age.as_str() {
            "slow" => {
                self.gate.notified().await;
                Ok(result("stale"))
            }
            "fail" => Err(ClassifyError::RequestFailed("model unavailable".into())),
            other => Ok(result(other)),
        }
    }
}

async fn page_with_image(
    classifier: Arc<FakeClassifier>,
    features: PageFeatures,
) -> PredictionPage {
    let page = PredictionPage::new(classifier, features);
    page.drop_file("lesion.png", png()).await.unwrap();
    page
}

async fn wait_for_calls(classifier: &FakeClassifier, n: usize) {
    while classifier.calls() < n {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn submit_without_image_never_calls_backend() {
    let classifier = Arc::new(FakeClassifier::default());
    let page = PredictionPage::new(classifier.clone(), PageFeatures::full());

    let err = page.submit().await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(classifier.calls(), 0);

    let state = page.snapshot().await;
    assert_eq!(state.error.as_deref(), Some("Please select an image before predicting."));
    assert!(!state.loading);
}

#[tokio::test]
async fn failed_submit_keeps_previous_result() {
    let classifier = Arc::new(FakeClassifier::default());
    let page = page_with_image(classifier, PageFeatures::full()).await;

    page.set_patient(patient("nv")).await;
    page.submit().await.unwrap();

    page.set_patient(patient("fail")).await;
    let err = page.submit().await.unwrap_err();
    assert!(err.to_string().contains("model unavailable"));

    let state = page.snapshot().await;
    assert_eq!(state.result.unwrap().combined_result.predicted_class, "nv");
    assert_eq!(state.error.as_deref(), Some("Error: model unavailable"));
    assert!(!state.loading);
}

#[tokio::test]
async fn stale_response_is_discarded() {
    let classifier = Arc::new(FakeClassifier::default());
    let page = page_with_image(classifier.clone(), PageFeatures::full()).await;

    page.set_patient(patient("slow")).await;
    let first = tokio::spawn({
        let page = page.clone();
        async move { page.submit().await }
    });
    wait_for_calls(&classifier, 1).await;

    page.set_patient(patient("fresh")).await;
    let second = page.submit().await.unwrap();
    assert_eq!(second.unwrap().combined_result.predicted_class, "fresh");

    classifier.gate.notify_one();
    assert!(first.await.unwrap().unwrap().is_none());

    let state = page.snapshot().await;
    assert_eq!(state.result.unwrap().combined_result.predicted_class, "fresh");
    assert!(!state.loading);
}

#[tokio::test]
async fn disposed_page_ignores_late_response() {
    let classifier = Arc::new(FakeClassifier::default());
    let page = page_with_image(classifier.clone(), PageFeatures::full()).await;

    page.set_patient(patient("slow")).await;
    let pending = tokio::spawn({
        let page = page.clone();
        async move { page.submit().await }
    });
    wait_for_calls(&classifier, 1).await;

    page.dispose();
    classifier.gate.notify_one();

    assert!(pending.await.unwrap().unwrap().is_none());
    assert!(page.snapshot().await.result.is_none());
}

#[tokio::test]
async fn report_is_built_from_submitted_request() {
    let classifier = Arc::new(FakeClassifier::default());
    let page = page_with_image(classifier, PageFeatures::full()).await;
    page.set_patient(patient("nv")).await;
    page.submit().await.unwrap();

    let report = page.download_report().await.unwrap();
    assert!(report.file_name.starts_with("DermAI_Report_"));
    assert_eq!(report.page_count, 1);
    assert!(report.bytes.starts_with(b"%PDF"));
    assert!(!page.snapshot().await.pdf_generating);
}

#[tokio::test]
async fn report_failure_keeps_result() {
    let classifier = Arc::new(FakeClassifier::default());
    let page = PredictionPage::new(classifier, PageFeatures::full());
    // Accepted by extension, but not decodable.
    page.drop_file("broken.png", b"not a png".to_vec()).await.unwrap();
    page.set_patient(patient("nv")).await;
    page.submit().await.unwrap();

    let err = page.download_report().await.unwrap_err();
    assert!(matches!(err, AppError::ReportGenerationFailed(_)));

    let state = page.snapshot().await;
    assert!(state.result.is_some());
    assert!(!state.pdf_generating);
    assert!(state.error.unwrap().starts_with("Failed to generate PDF"));
}

#[tokio::test]
async fn busy_report_is_recorded_on_the_page() {
    let classifier = Arc::new(FakeClassifier::default());
    let page = page_with_image(classifier, PageFeatures::full()).await;
    page.set_patient(patient("nv")).await;
    page.submit().await.unwrap();

    let running = page.report_job().start().unwrap();
    let err = page.download_report().await.unwrap_err();
    assert!(matches!(err, AppError::ReportGenerationFailed(_)));

    let state = page.snapshot().await;
    assert_eq!(state.error.as_deref(), Some(err.to_string().as_str()));
    assert!(state.result.is_some());

    drop(running);
    assert!(page.download_report().await.is_ok());
}

#[tokio::test]
async fn report_needs_a_result_and_the_feature() {
    let classifier = Arc::new(FakeClassifier::default());
    let page = page_with_image(classifier.clone(), PageFeatures::full()).await;
    assert!(matches!(page.download_report().await, Err(AppError::Validation(_))));

    let minimal = page_with_image(classifier, PageFeatures::minimal()).await;
    minimal.set_patient(patient("nv")).await;
    minimal.submit().await.unwrap();
    assert!(matches!(minimal.download_report().await, Err(AppError::Validation(_))));
    assert!(matches!(minimal.send_chat("hi").await, Err(AppError::Validation(_))));
}

// ── Assistant fakes ───────────────────────────────────────────

/// Replies `"reply N"` and records prompts; a prompt ending in `boom` fails.
#[derive(Default)]
struct EchoProvider {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl LlmProvider for EchoProvider {
    async fn complete(
        &self,
        prompt: &str,
        _generation: &GenerationConfig,
    ) -> Result<String, LlmError> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(prompt.to_string());
        if prompt.ends_with("boom") {
            return Err(LlmError::ApiError {
                status: 500,
                message: "upstream exploded".into(),
            });
        }
        Ok(format!("reply {}", prompts.len()))
    }

    fn name(&self) -> &str {
        "echo"
    }
}

#[tokio::test]
async fn prediction_chat_opens_with_greeting_and_resets_on_new_result() {
    let classifier = Arc::new(FakeClassifier::default());
    let provider = Arc::new(EchoProvider::default());
    let page = page_with_image(classifier, PageFeatures::full())
        .await
        .with_assistant(Assistant::prediction_followup(provider.clone()));

    page.open_chat().await.unwrap();
    page.send_chat("Is it serious?").await.unwrap();

    let state = page.snapshot().await;
    assert!(state.chat_open);
    assert_eq!(
        state.chat.turns(),
        vec![
            (Role::User, PREDICTION_GREETING),
            (Role::Assistant, "reply 1"),
            (Role::User, "Is it serious?"),
            (Role::Assistant, "reply 2"),
        ]
    );
    assert!(provider.prompts.lock().unwrap()[1]
        .ends_with("Assistant: reply 1\nUser: Is it serious?"));

    page.set_patient(patient("nv")).await;
    page.submit().await.unwrap();
    let state = page.snapshot().await;
    assert!(state.chat.is_empty());
    assert!(!state.chat_open);
}

#[tokio::test]
async fn chat_page_flow() {
    let provider = Arc::new(EchoProvider::default());
    let page = ChatPage::new(Assistant::chatbot(provider.clone()));

    page.initialize().await.unwrap();
    assert_eq!(
        page.snapshot().await.transcript.turns(),
        vec![(Role::Assistant, "reply 1")]
    );
    assert!(provider.prompts.lock().unwrap()[0].ends_with(&format!("User: {}", CHATBOT_GREETING)));

    page.ask_about("melanoma").await.unwrap();
    page.quick_action(QuickAction::Help).await.unwrap();

    let state = page.snapshot().await;
    let turns = state.transcript.turns();
    assert_eq!(turns[1], (Role::User, "Tell me more about Melanoma"));
    assert_eq!(turns[2], (Role::Assistant, "reply 2"));
    assert_eq!(turns[3], (Role::Assistant, HELP_MESSAGE));

    // A failing turn keeps the user message and records the error.
    let err = page.send("boom").await.unwrap_err();
    assert!(err.to_string().contains("upstream exploded"));
    let state = page.snapshot().await;
    assert_eq!(state.transcript.last().unwrap().content, "boom");
    assert_eq!(state.error.as_deref(), Some("Failed to get response: upstream exploded"));

    page.quick_action(QuickAction::NewChat).await.unwrap();
    assert_eq!(page.snapshot().await.transcript.len(), 1);
    assert_eq!(page.suggested_questions().len(), 8);
}
