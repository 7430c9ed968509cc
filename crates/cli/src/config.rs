use anyhow::{Context, Result};
use dermai_core::Config;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// CLI configuration loaded from TOML file. Every value is a fallback for the
/// matching environment variable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Classification backend base URL (CLASSIFIER_URL)
    #[serde(default)]
    pub classifier_url: Option<String>,

    /// "proxy" or "gemini" (ASSISTANT_PROVIDER)
    #[serde(default)]
    pub assistant_provider: Option<String>,

    /// Assistant proxy endpoint (ASSISTANT_PROXY_URL)
    #[serde(default)]
    pub assistant_proxy_url: Option<String>,

    /// Where reports are written (REPORT_DIR)
    #[serde(default)]
    pub report_dir: Option<PathBuf>,

    /// Default system prompt for `dermai chat`
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl CliConfig {
    /// Return the default config directory path: ~/.config/dermai/
    pub fn default_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("could not determine user config directory")?
            .join("dermai");
        Ok(config_dir)
    }

    /// Return the default config file path.
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("config.toml"))
    }

    /// Load config from the given path, or the default path.
    /// Returns default config if the file does not exist.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => Self::default_config_path()?,
        };

        if config_path.exists() {
            debug!(?config_path, "Loading config");
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read config: {}", config_path.display()))?;
            let config: Self = toml::from_str(&content)
                .with_context(|| format!("failed to parse config: {}", config_path.display()))?;
            Ok(config)
        } else {
            debug!(?config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Fill in values the environment left unset.
    /// Priority: cli flag > env var > config file > built-in default.
    pub fn apply(&self, config: &mut Config) {
        self.apply_with(config, |key| std::env::var(key).is_ok_and(|v| !v.is_empty()));
    }

    fn apply_with(&self, config: &mut Config, env_has: impl Fn(&str) -> bool) {
        if let Some(url) = self.classifier_url.as_ref().filter(|_| !env_has("CLASSIFIER_URL")) {
            config.classifier.base_url = url.clone();
            config.prediction.backend_url = url.clone();
        }
        if let Some(provider) = self
            .assistant_provider
            .as_ref()
            .filter(|_| !env_has("ASSISTANT_PROVIDER"))
        {
            config.assistant.provider = provider.clone();
        }
        if let Some(url) = self
            .assistant_proxy_url
            .as_ref()
            .filter(|_| !env_has("ASSISTANT_PROXY_URL"))
        {
            config.assistant.proxy_url = url.clone();
        }
        if let Some(dir) = self.report_dir.as_ref().filter(|_| !env_has("REPORT_DIR")) {
            config.report.output_dir = dir.clone();
        }
    }
}
