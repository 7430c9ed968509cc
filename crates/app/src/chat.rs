use std::sync::Arc;

use dermai_core::config::AssistantConfig;
use dermai_core::{AppError, RequestTracker, Transcript};
use dermai_llm::conversation::{
    find_condition, QuickAction, CHATBOT_GREETING, SKIN_CONDITIONS, SUGGESTED_QUESTIONS,
};
use dermai_llm::{create_provider, Assistant, LlmError, SkinCondition};
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct ChatState {
    /// Visible conversation. The greeting prompt is not part of it, only the
    /// assistant's introduction.
    pub transcript: Transcript,
    pub loading: bool,
    pub error: Option<String>,
}

/// Standalone dermatology assistant.
#[derive(Clone)]
pub struct ChatPage {
    state: Arc<Mutex<ChatState>>,
    assistant: Assistant,
    tracker: RequestTracker,
}

impl ChatPage {
    pub fn new(assistant: Assistant) -> Self {
        Self {
            state: Arc::default(),
            assistant,
            tracker: RequestTracker::new(),
        }
    }

    pub fn from_config(config: &AssistantConfig) -> Result<Self, AppError> {
        let provider = create_provider(config).map_err(|e| AppError::Config(e.to_string()))?;
        Ok(Self::new(Assistant::chatbot(Arc::from(provider))))
    }

    pub fn assistant(&self) -> &Assistant {
        &self.assistant
    }

    pub async fn snapshot(&self) -> ChatState {
        self.state.lock().await.clone()
    }

    pub fn suggested_questions(&self) -> &'static [&'static str] {
        &SUGGESTED_QUESTIONS
    }

    pub fn skin_conditions(&self) -> &'static [SkinCondition] {
        &SKIN_CONDITIONS
    }

    /// Clear the conversation and fetch a fresh introduction.
    pub async fn initialize(&self) -> Result<Option<String>, AppError> {
        let ticket = {
            let mut state = self.state.lock().await;
            state.transcript.reset();
            state.error = None;
            state.loading = true;
            self.tracker.begin()
        };

        let outcome = self.assistant.introduce(CHATBOT_GREETING).await;

        let mut state = self.state.lock().await;
        if !self.tracker.is_current(ticket) {
            return Ok(None);
        }
        state.loading = false;
        match outcome {
            Ok(reply) => {
                state.transcript.push_assistant(reply.clone());
                Ok(Some(reply))
            }
            Err(e) => Err(fail(&mut state, "Failed to initialize chat", e)),
        }
    }

    /// Send one message. Blank input is ignored. Returns `Ok(None)` when the
    /// reply was superseded or the page is gone.
    pub async fn send(&self, message: &str) -> Result<Option<String>, AppError> {
        let message = message.trim();
        if message.is_empty() {
            return Ok(None);
        }

        let (history, ticket) = {
            let mut state = self.state.lock().await;
            let history = state.transcript.clone();
            state.transcript.push_user(message);
            state.error = None;
            state.loading = true;
            (history, self.tracker.begin())
        };

        debug!(seq = ticket.seq(), turns = history.len(), "Sending chat message");
        let outcome = self.assistant.reply(&history, message).await;

        let mut state = self.state.lock().await;
        if !self.tracker.is_current(ticket) {
            return Ok(None);
        }
        state.loading = false;
        match outcome {
            Ok(reply) => {
                state.transcript.push_assistant(reply.clone());
                Ok(Some(reply))
            }
            Err(e) => Err(fail(&mut state, "Failed to get response", e)),
        }
    }

    /// Ask about a catalog condition by name.
    pub async fn ask_about(&self, condition: &str) -> Result<Option<String>, AppError> {
        let condition = find_condition(condition).ok_or_else(|| {
            AppError::Validation(format!("Unknown skin condition: {}", condition.trim()))
        })?;
        self.send(&condition.question()).await
    }

    pub async fn quick_action(&self, action: QuickAction) -> Result<Option<String>, AppError> {
        match action.canned_message() {
            Some(text) => {
                self.state.lock().await.transcript.push_assistant(text);
                Ok(Some(text.to_string()))
            }
            None => self.initialize().await,
        }
    }

    pub fn dispose(&self) {
        self.tracker.dispose();
    }
}

fn fail(state: &mut ChatState, context: &str, err: LlmError) -> AppError {
    warn!(error = %err, "{}", context);
    let message = format!("{}: {}", context, err);
    state.error = Some(message.clone());
    AppError::AssistantUnavailable(message)
}
