pub mod conversation;
pub mod prompt;
pub mod provider;
pub mod providers;

pub use conversation::{converse, Assistant, QuickAction, SkinCondition};
pub use prompt::flatten_prompt;
pub use provider::{LlmError, LlmProvider};
pub use providers::create_provider;
pub use providers::gemini::GeminiProvider;
pub use providers::proxy::{ProxyProvider, ProxyReply, ProxyRequest};
