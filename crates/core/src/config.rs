use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub classifier: ClassifierConfig,
    pub assistant: AssistantConfig,
    pub server: ServerConfig,
    pub report: ReportConfig,
    pub prediction: PredictionPageConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `DERMAI_PROFILE`. When set (e.g. `PROD`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("DERMAI_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        let classifier = ClassifierConfig::from_env_profiled(p);
        let prediction = PredictionPageConfig::from_env_profiled(p, &classifier.base_url);
        Self {
            profile: p.to_string(),
            classifier,
            assistant: AssistantConfig::from_env_profiled(p),
            server: ServerConfig::from_env_profiled(p),
            report: ReportConfig::from_env_profiled(p),
            prediction,
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  classifier:  url={}, timeout={}s",
            self.classifier.base_url,
            self.classifier.timeout_secs
        );
        tracing::info!(
            "  assistant:   provider={}, model={}, key={}, ready={}",
            self.assistant.provider,
            self.assistant.gemini_model,
            if self.assistant.gemini_api_key.is_some() { "set" } else { "(none)" },
            self.assistant.is_configured()
        );
        tracing::info!("  server:      {}:{}", self.server.host, self.server.port);
        tracing::info!("  report:      dir={}", self.report.output_dir.display());
        tracing::info!(
            "  prediction:  chat={}, report={}",
            self.prediction.features.chat,
            self.prediction.features.report
        );
    }
}

// ── Classification backend ────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl ClassifierConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            base_url: profiled_env_or(p, "CLASSIFIER_URL", "http://localhost:5000"),
            timeout_secs: profiled_env_u64(p, "CLASSIFIER_TIMEOUT_SECS", 120),
        }
    }
}

// ── Assistant (generative-text API) ───────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// "proxy" (default, key stays on the server) or "gemini" (direct).
    pub provider: String,
    pub proxy_url: String,
    /// Only read by the proxy server or an explicit direct setup.
    #[serde(skip_serializing)]
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
}

impl AssistantConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            provider: profiled_env_or(p, "ASSISTANT_PROVIDER", "proxy"),
            proxy_url: profiled_env_or(
                p,
                "ASSISTANT_PROXY_URL",
                "http://localhost:3001/api/assistant",
            ),
            gemini_api_key: profiled_env_opt(p, "GEMINI_API_KEY"),
            gemini_model: profiled_env_or(p, "GEMINI_MODEL", "gemini-2.0-flash"),
            gemini_base_url: profiled_env_or(
                p,
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com",
            ),
        }
    }

    pub fn is_configured(&self) -> bool {
        match self.provider.as_str() {
            "gemini" => self.gemini_api_key.is_some(),
            "proxy" => !self.proxy_url.is_empty(),
            _ => false,
        }
    }
}

/// Fixed sampling parameters sent with every assistant request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl GenerationConfig {
    /// Shorter, cooler replies for the follow-up chat on the prediction page.
    pub fn compact() -> Self {
        Self {
            temperature: 0.5,
            max_output_tokens: 2000,
            ..Self::default()
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 8192,
        }
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "PORT", 3001),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
        }
    }
}

// ── Report ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
}

impl ReportConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            output_dir: PathBuf::from(profiled_env_or(p, "REPORT_DIR", ".")),
        }
    }
}

// ── Prediction page ───────────────────────────────────────────

/// Optional parts of the prediction page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFeatures {
    pub chat: bool,
    pub report: bool,
}

impl PageFeatures {
    pub fn full() -> Self {
        Self { chat: true, report: true }
    }

    pub fn minimal() -> Self {
        Self { chat: false, report: false }
    }

    /// Parse `full`, `minimal`, or a comma list such as `chat,report`.
    pub fn parse(spec: &str) -> Self {
        match spec.trim().to_lowercase().as_str() {
            "full" | "" => Self::full(),
            "minimal" | "none" => Self::minimal(),
            list => {
                let mut features = Self::minimal();
                for item in list.split(',').map(str::trim) {
                    match item {
                        "chat" => features.chat = true,
                        "report" => features.report = true,
                        other => {
                            tracing::warn!(feature = %other, "Unknown prediction page feature, ignoring")
                        }
                    }
                }
                features
            }
        }
    }
}

impl Default for PageFeatures {
    fn default() -> Self {
        Self::full()
    }
}

/// One prediction page configuration, resolved at deploy time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionPageConfig {
    pub backend_url: String,
    pub features: PageFeatures,
}

impl PredictionPageConfig {
    fn from_env_profiled(p: &str, backend_url: &str) -> Self {
        Self {
            backend_url: backend_url.to_string(),
            features: PageFeatures::parse(&profiled_env_or(p, "PREDICTION_FEATURES", "full")),
        }
    }
}
