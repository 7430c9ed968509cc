use std::sync::Arc;

use dermai_core::config::GenerationConfig;
use dermai_core::Transcript;
use tracing::{debug, warn};

use crate::prompt::flatten_prompt;
use crate::provider::{LlmError, LlmProvider};

// ── Canned content ────────────────────────────────────────────

pub const CHATBOT_INSTRUCTIONS: &str = "You are a medical chatbot specialized in skin lesion analysis and dermatology. Provide helpful, accurate information about skin conditions, diagnosis methods, and general dermatology knowledge. Always clarify that you're an AI assistant and not a replacement for professional medical advice.";

pub const CHATBOT_GREETING: &str =
    "Please introduce yourself and explain how you can assist with skin lesion questions.";

pub const PREDICTION_INSTRUCTIONS: &str =
    "You are a medical chatbot specialized in skin lesion analysis.";

pub const PREDICTION_GREETING: &str = "Please introduce yourself and explain how you can assist me.";

pub const HELP_MESSAGE: &str = "# How to use the DermAI Medical Assistant\n\n- Type your questions about skin conditions, diagnosis, or treatments in the input field\n- Click on suggested questions to quickly get information\n- Use the sidebar to explore common skin conditions\n- Your conversation is private and not stored permanently\n\nRemember that this AI assistant provides general information and is not a substitute for professional medical advice.";

pub const CAPABILITIES_MESSAGE: &str = "# DermAI Medical Assistant Capabilities\n\n- Provide information about common skin conditions and lesions\n- Explain diagnostic techniques used in dermatology\n- Describe treatment options for various skin conditions\n- Explain how our AI classification system works\n- Answer general questions about skin health and care\n\nI cannot:\n- Provide definitive medical diagnosis\n- Replace consultation with a healthcare professional\n- Analyze images directly in this chat interface (use our Prediction page for that)\n- Access your personal medical records";

pub const SUGGESTED_QUESTIONS: [&str; 8] = [
    "What are the common types of skin cancer?",
    "How can I differentiate between a benign mole and melanoma?",
    "What factors increase the risk of skin lesions?",
    "How accurate is AI in diagnosing skin conditions?",
    "What should I do if I notice a changing mole?",
    "How does the CNN model analyze skin images?",
    "What's the difference between basal cell and squamous cell carcinoma?",
    "How often should I get a skin check?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkinCondition {
    pub name: &'static str,
    pub description: &'static str,
}

impl SkinCondition {
    /// Prompt sent when the condition is picked from the catalog.
    pub fn question(&self) -> String {
        format!("Tell me more about {}", self.name)
    }
}

pub const SKIN_CONDITIONS: [SkinCondition; 6] = [
    SkinCondition { name: "Melanoma", description: "A serious form of skin cancer" },
    SkinCondition { name: "Basal Cell Carcinoma", description: "Most common type of skin cancer" },
    SkinCondition {
        name: "Squamous Cell Carcinoma",
        description: "Second most common skin cancer",
    },
    SkinCondition { name: "Actinic Keratosis", description: "Precancerous skin growth" },
    SkinCondition { name: "Nevus", description: "Common mole" },
    SkinCondition { name: "Seborrheic Keratosis", description: "Benign skin growth" },
];

pub fn find_condition(name: &str) -> Option<&'static SkinCondition> {
    SKIN_CONDITIONS
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
}

/// Chat sidebar shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    NewChat,
    Help,
    Capabilities,
}

impl QuickAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuickAction::NewChat => "new-chat",
            QuickAction::Help => "help",
            QuickAction::Capabilities => "capabilities",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "new-chat" | "new" | "reset" => Some(QuickAction::NewChat),
            "help" => Some(QuickAction::Help),
            "capabilities" => Some(QuickAction::Capabilities),
            _ => None,
        }
    }

    /// Locally appended assistant message, if the action has one.
    pub fn canned_message(&self) -> Option<&'static str> {
        match self {
            QuickAction::NewChat => None,
            QuickAction::Help => Some(HELP_MESSAGE),
            QuickAction::Capabilities => Some(CAPABILITIES_MESSAGE),
        }
    }
}

// ── Conversation ──────────────────────────────────────────────

/// One chat turn: flatten `transcript` plus `new_message`, send it, and on
/// success append the user message and the reply. On failure the transcript
/// gets only the user message.
pub async fn converse(
    provider: &dyn LlmProvider,
    transcript: &mut Transcript,
    new_message: &str,
    system_prompt: &str,
    generation: &GenerationConfig,
) -> Result<String, LlmError> {
    let prompt = flatten_prompt(system_prompt, transcript, new_message);
    transcript.push_user(new_message);

    match provider.complete(&prompt, generation).await {
        Ok(reply) => {
            transcript.push_assistant(reply.clone());
            debug!(provider = provider.name(), turns = transcript.len(), "Assistant replied");
            Ok(reply)
        }
        Err(e) => {
            warn!(provider = provider.name(), error = %e, "Assistant request failed");
            Err(e)
        }
    }
}

/// A provider bound to its instructions and sampling settings.
#[derive(Clone)]
pub struct Assistant {
    provider: Arc<dyn LlmProvider>,
    system_prompt: String,
    generation: GenerationConfig,
}

impl Assistant {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        system_prompt: impl Into<String>,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            provider,
            system_prompt: system_prompt.into(),
            generation,
        }
    }

    /// General dermatology chat.
    pub fn chatbot(provider: Arc<dyn LlmProvider>) -> Self {
        Self::new(provider, CHATBOT_INSTRUCTIONS, GenerationConfig::default())
    }

    /// Follow-up chat next to a prediction result.
    pub fn prediction_followup(provider: Arc<dyn LlmProvider>) -> Self {
        Self::new(provider, PREDICTION_INSTRUCTIONS, GenerationConfig::compact())
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn generation(&self) -> &GenerationConfig {
        &self.generation
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Ask for a reply to `new_message` given `history`, leaving the history
    /// untouched. Callers that cannot hold the transcript across the request
    /// use this and append the messages themselves.
    pub async fn reply(&self, history: &Transcript, new_message: &str) -> Result<String, LlmError> {
        let prompt = flatten_prompt(&self.system_prompt, history, new_message);
        self.provider.complete(&prompt, &self.generation).await
    }

    pub async fn converse(
        &self,
        transcript: &mut Transcript,
        new_message: &str,
    ) -> Result<String, LlmError> {
        converse(
            self.provider.as_ref(),
            transcript,
            new_message,
            &self.system_prompt,
            &self.generation,
        )
        .await
    }

    /// Greeting turn on an empty conversation.
    pub async fn introduce(&self, greeting_prompt: &str) -> Result<String, LlmError> {
        self.reply(&Transcript::new(), greeting_prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dermai_core::Role;
    use std::sync::Mutex;

    /// Records prompts and answers from a script.
    struct Scripted {
        replies: Mutex<Vec<Result<String, LlmError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for Scripted {
        async fn complete(
            &self,
            prompt: &str,
            _generation: &GenerationConfig,
        ) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies.lock().unwrap().remove(0)
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    #[tokio::test]
    async fn converse_appends_user_then_assistant() {
        let provider = Scripted::new(vec![Ok("Melanoma is...".into())]);
        let assistant = Assistant::chatbot(provider.clone());
        let mut transcript = Transcript::new();

        let reply = assistant
            .converse(&mut transcript, "What is melanoma?")
            .await
            .unwrap();

        assert_eq!(reply, "Melanoma is...");
        assert_eq!(
            transcript.turns(),
            vec![
                (Role::User, "What is melanoma?"),
                (Role::Assistant, "Melanoma is...")
            ]
        );
        assert_eq!(
            provider.prompts.lock().unwrap()[0],
            format!("{}\n\nUser: What is melanoma?", CHATBOT_INSTRUCTIONS)
        );
    }

    #[tokio::test]
    async fn failed_turn_keeps_only_user_message() {
        let provider = Scripted::new(vec![Err(LlmError::ApiError {
            status: 503,
            message: "overloaded".into(),
        })]);
        let assistant = Assistant::prediction_followup(provider);
        let mut transcript = Transcript::new();

        let err = assistant.converse(&mut transcript, "Hello").await.unwrap_err();
        assert_eq!(err.to_string(), "overloaded");
        assert_eq!(transcript.turns(), vec![(Role::User, "Hello")]);
    }

    #[tokio::test]
    async fn introduce_uses_empty_history() {
        let provider = Scripted::new(vec![Ok("I am DermAI.".into())]);
        let assistant = Assistant::prediction_followup(provider.clone());

        assert_eq!(assistant.introduce(PREDICTION_GREETING).await.unwrap(), "I am DermAI.");
        assert_eq!(
            provider.prompts.lock().unwrap()[0],
            format!("{}\n\nUser: {}", PREDICTION_INSTRUCTIONS, PREDICTION_GREETING)
        );
        assert_eq!(assistant.generation().max_output_tokens, 2000);
    }

    #[test]
    fn condition_catalog() {
        let nevus = find_condition("nevus").unwrap();
        assert_eq!(nevus.question(), "Tell me more about Nevus");
        assert!(find_condition("psoriasis").is_none());
        assert_eq!(SKIN_CONDITIONS.len(), 6);
    }

    #[test]
    fn quick_actions() {
        assert_eq!(QuickAction::parse("help"), Some(QuickAction::Help));
        assert_eq!(QuickAction::parse("new-chat").unwrap().as_str(), "new-chat");
        assert!(QuickAction::NewChat.canned_message().is_none());
        assert!(QuickAction::Capabilities
            .canned_message()
            .unwrap()
            .starts_with("# DermAI Medical Assistant Capabilities"));
    }
}
