use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use dermai_classify::{Classifier, FormInput, HttpClassifier, ResultView};
use dermai_core::config::{Config, PageFeatures};
use dermai_core::{
    AppError, ClassificationRequest, ClassificationResult, PatientInfo, RequestTracker, Transcript,
};
use dermai_llm::conversation::PREDICTION_GREETING;
use dermai_llm::{create_provider, Assistant};
use dermai_report::{GeneratedReport, ReportGenerator, ReportInput, ReportJob};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const CHAT_DISABLED: &str = "Chat is not enabled on this page.";
pub const REPORT_DISABLED: &str = "Report download is not enabled on this page.";
pub const NO_RESULT: &str = "Run a prediction before downloading a report.";

/// Everything the prediction screen shows.
#[derive(Debug, Clone, Default)]
pub struct PredictionState {
    pub form: FormInput,
    /// Last successful classification. A failed submit leaves it in place.
    pub result: Option<ClassificationResult>,
    /// The request that produced `result`; the report is built from it.
    pub submitted: Option<ClassificationRequest>,
    pub error: Option<String>,
    pub loading: bool,
    pub pdf_generating: bool,
    pub chat: Transcript,
    pub chat_open: bool,
    pub chat_loading: bool,
}

impl PredictionState {
    pub fn view(&self) -> Option<ResultView> {
        self.result.as_ref().map(ResultView::from)
    }
}

/// Upload form, classification result, report download and follow-up chat.
#[derive(Clone)]
pub struct PredictionPage {
    state: Arc<Mutex<PredictionState>>,
    classifier: Arc<dyn Classifier>,
    assistant: Option<Assistant>,
    reports: ReportGenerator,
    report_job: ReportJob,
    features: PageFeatures,
    tracker: RequestTracker,
    chat_tracker: RequestTracker,
}

impl PredictionPage {
    pub fn new(classifier: Arc<dyn Classifier>, features: PageFeatures) -> Self {
        Self {
            state: Arc::default(),
            classifier,
            assistant: None,
            reports: ReportGenerator::default(),
            report_job: ReportJob::new(),
            features,
            tracker: RequestTracker::new(),
            chat_tracker: RequestTracker::new(),
        }
    }

    pub fn with_assistant(mut self, assistant: Assistant) -> Self {
        self.assistant = Some(assistant);
        self
    }

    pub fn with_report_generator(mut self, reports: ReportGenerator) -> Self {
        self.reports = reports;
        self
    }

    /// Wire the page from configuration. A chat-enabled page whose assistant
    /// provider cannot be built still works, with chat reporting an error.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let classifier = HttpClassifier::new(
            &config.prediction.backend_url,
            Duration::from_secs(config.classifier.timeout_secs),
        )?;
        let mut page = Self::new(Arc::new(classifier), config.prediction.features);

        if config.prediction.features.chat {
            match create_provider(&config.assistant) {
                Ok(provider) => {
                    page = page.with_assistant(Assistant::prediction_followup(Arc::from(provider)))
                }
                Err(e) => warn!(error = %e, "Prediction page chat unavailable"),
            }
        }
        Ok(page)
    }

    pub fn features(&self) -> PageFeatures {
        self.features
    }

    /// Shared by every clone of the page.
    pub fn report_job(&self) -> &ReportJob {
        &self.report_job
    }

    pub async fn snapshot(&self) -> PredictionState {
        self.state.lock().await.clone()
    }

    pub async fn view(&self) -> Option<ResultView> {
        self.state.lock().await.view()
    }

    // ── Form ──────────────────────────────────────────────────

    pub async fn select_image(&self, path: &Path) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        let outcome = state.form.select_image(path).map_err(AppError::from);
        record(&mut state.error, outcome)
    }

    pub async fn drop_file(&self, file_name: &str, bytes: Vec<u8>) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        let outcome = state.form.drop_file(file_name, bytes).map_err(AppError::from);
        record(&mut state.error, outcome)
    }

    pub async fn set_patient(&self, patient: PatientInfo) {
        self.state.lock().await.form.patient = patient;
    }

    // ── Classification ────────────────────────────────────────

    /// Submit the form. Returns `Ok(None)` when the response arrived after a
    /// newer submit or after the page was disposed and was therefore dropped.
    pub async fn submit(&self) -> Result<Option<ClassificationResult>, AppError> {
        let (request, ticket) = {
            let mut state = self.state.lock().await;
            state.error = None;
            let request = match state.form.validate() {
                Ok(request) => request,
                Err(e) => {
                    let err = AppError::from(e);
                    state.error = Some(err.to_string());
                    return Err(err);
                }
            };
            state.loading = true;
            (request, self.tracker.begin())
        };

        debug!(seq = ticket.seq(), file = %request.image.file_name, "Submitting classification");
        let outcome = self.classifier.classify(&request).await;

        let mut state = self.state.lock().await;
        if !self.tracker.is_current(ticket) {
            debug!(seq = ticket.seq(), "Discarding stale classification response");
            return Ok(None);
        }
        state.loading = false;

        match outcome {
            Ok(result) => {
                info!(
                    class = %result.combined_result.predicted_class,
                    confidence = result.combined_result.confidence,
                    "Classification received"
                );
                // A new result starts a new follow-up conversation.
                self.chat_tracker.begin();
                state.chat.reset();
                state.chat_open = false;
                state.chat_loading = false;
                state.result = Some(result.clone());
                state.submitted = Some(request);
                Ok(Some(result))
            }
            Err(e) => {
                let err = AppError::from(e);
                warn!(error = %err, "Classification failed");
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    // ── Report ────────────────────────────────────────────────

    /// Build the PDF for the current result. Runs on the blocking pool with
    /// `pdf_generating` set; a failure is reported without touching the result.
    pub async fn download_report(&self) -> Result<GeneratedReport, AppError> {
        if !self.features.report {
            return Err(AppError::Validation(REPORT_DISABLED.into()));
        }

        let input = {
            let mut state = self.state.lock().await;
            let input = match (&state.result, &state.submitted) {
                (Some(result), Some(request)) => Some(ReportInput {
                    result: result.clone(),
                    patient: request.patient.clone(),
                    image: request.image.bytes.clone(),
                }),
                _ => None,
            };
            match input {
                Some(input) => input,
                None => {
                    let err = AppError::Validation(NO_RESULT.into());
                    state.error = Some(err.to_string());
                    return Err(err);
                }
            }
        };

        let guard = {
            let mut state = self.state.lock().await;
            match self.report_job.start() {
                Ok(guard) => {
                    state.pdf_generating = true;
                    guard
                }
                Err(e) => {
                    let err = AppError::from(e);
                    state.error = Some(err.to_string());
                    return Err(err);
                }
            }
        };

        let reports = self.reports.clone();
        let outcome = match tokio::task::spawn_blocking(move || reports.generate(&input)).await {
            Ok(generated) => generated.map_err(AppError::from),
            Err(e) => Err(AppError::ReportGenerationFailed(e.to_string())),
        };
        drop(guard);

        let mut state = self.state.lock().await;
        state.pdf_generating = false;
        match &outcome {
            Ok(report) => {
                info!(file = %report.file_name, pages = report.page_count, "Report generated")
            }
            Err(err) => {
                warn!(error = %err, "Report generation failed");
                state.error = Some(err.to_string());
            }
        }
        outcome
    }

    // ── Follow-up chat ────────────────────────────────────────

    fn assistant(&self) -> Result<&Assistant, AppError> {
        if !self.features.chat {
            return Err(AppError::Validation(CHAT_DISABLED.into()));
        }
        self.assistant
            .as_ref()
            .ok_or_else(|| AppError::AssistantUnavailable("assistant is not configured".into()))
    }

    /// Start a fresh conversation with the assistant's introduction. The
    /// transcript becomes `[greeting prompt, reply]`.
    pub async fn open_chat(&self) -> Result<Option<String>, AppError> {
        let assistant = self.assistant()?;
        let ticket = {
            let mut state = self.state.lock().await;
            state.error = None;
            state.chat.reset();
            state.chat_loading = true;
            self.chat_tracker.begin()
        };

        let outcome = assistant.introduce(PREDICTION_GREETING).await;

        let mut state = self.state.lock().await;
        if !self.chat_tracker.is_current(ticket) {
            return Ok(None);
        }
        state.chat_loading = false;
        match outcome {
            Ok(reply) => {
                state.chat.push_user(PREDICTION_GREETING);
                state.chat.push_assistant(reply.clone());
                state.chat_open = true;
                Ok(Some(reply))
            }
            Err(e) => {
                let err = AppError::from(e);
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Send one follow-up message. Blank input is ignored. The user message
    /// stays in the transcript whether or not the assistant answers.
    pub async fn send_chat(&self, message: &str) -> Result<Option<String>, AppError> {
        let message = message.trim();
        if message.is_empty() {
            return Ok(None);
        }
        let assistant = self.assistant()?;

        let (history, ticket) = {
            let mut state = self.state.lock().await;
            let history = state.chat.clone();
            state.chat.push_user(message);
            state.chat_loading = true;
            (history, self.chat_tracker.begin())
        };

        let outcome = assistant.reply(&history, message).await;

        let mut state = self.state.lock().await;
        if !self.chat_tracker.is_current(ticket) {
            return Ok(None);
        }
        state.chat_loading = false;
        match outcome {
            Ok(reply) => {
                state.chat.push_assistant(reply.clone());
                Ok(Some(reply))
            }
            Err(e) => {
                let err = AppError::from(e);
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Leave the page: every in-flight response is ignored from now on.
    pub fn dispose(&self) {
        self.tracker.dispose();
        self.chat_tracker.dispose();
    }
}

fn record(error: &mut Option<String>, outcome: Result<(), AppError>) -> Result<(), AppError> {
    match &outcome {
        Ok(()) => *error = None,
        Err(e) => *error = Some(e.to_string()),
    }
    outcome
}
