//! Configuration loading and management.
//!
//! Loads configuration from `./prospector.toml` (or
//! `$PROSPECTOR_CONFIG_PATH`). Environment variables override file values;
//! file values override defaults.
//!
//! Precedence: env vars > config file > defaults.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level configuration loaded from TOML.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProspectorConfig {
    /// Text-generation provider settings (`[llm]`).
    pub llm: LlmConfig,
    /// Prospect-search tunables (`[search]`).
    pub search: SearchConfig,
    /// Connected-mailbox settings (`[mailbox]`).
    pub mailbox: MailboxConfig,
    /// Filesystem paths for persistent state (`[paths]`).
    pub paths: PathsConfig,
}

/// Text-generation provider settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    /// Model identifier.
    pub model: String,
    /// API key. Usually supplied via `PROSPECTOR_GEMINI_API_KEY`.
    pub api_key: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_owned(),
            api_key: String::new(),
        }
    }
}

/// Prospect-search tunables. The original prompts varied both values
/// across revisions; neither is a contract.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// How many companies a search asks the model for.
    pub result_target: u32,
    /// Optional probability floor passed into the search prompt.
    pub min_hire_probability: Option<f64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            result_target: 20,
            min_hire_probability: None,
        }
    }
}

/// Connected-mailbox settings.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct MailboxConfig {
    /// Gmail access token. Empty means no mailbox is connected; drafts are
    /// then recorded locally only. Usually supplied via
    /// `PROSPECTOR_GMAIL_TOKEN`.
    pub access_token: String,
}

/// Filesystem paths for persistent state.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    /// SQLite database holding all application state.
    pub database: String,
    /// Directory for rotated JSON log files.
    pub logs_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            database: "prospector.db".to_owned(),
            logs_dir: "logs".to_owned(),
        }
    }
}

impl ProspectorConfig {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// Config file path: `$PROSPECTOR_CONFIG_PATH` or `./prospector.toml`.
    /// If the file does not exist, defaults are used.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load using a custom env resolver (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let path = match env("PROSPECTOR_CONFIG_PATH") {
            Some(p) => PathBuf::from(p),
            None => PathBuf::from("prospector.toml"),
        };

        let mut config = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                toml::from_str(&contents).context("failed to parse config TOML")?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config file found, using defaults");
                Self::default()
            }
            Err(e) => return Err(anyhow::anyhow!("failed to read config file: {e}")),
        };

        config.apply_overrides(env);
        Ok(config)
    }

    /// Apply environment variable overrides (env > config > defaults).
    fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("PROSPECTOR_GEMINI_API_KEY") {
            self.llm.api_key = v;
        }
        if let Some(v) = env("PROSPECTOR_GEMINI_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = env("PROSPECTOR_GMAIL_TOKEN") {
            self.mailbox.access_token = v;
        }
        if let Some(v) = env("PROSPECTOR_DB_PATH") {
            self.paths.database = v;
        }
        if let Some(v) = env("PROSPECTOR_LOGS_DIR") {
            self.paths.logs_dir = v;
        }
        if let Some(v) = env("PROSPECTOR_RESULT_TARGET") {
            match v.parse() {
                Ok(n) => self.search.result_target = n,
                Err(_) => tracing::warn!(
                    var = "PROSPECTOR_RESULT_TARGET",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
        if let Some(v) = env("PROSPECTOR_MIN_HIRE_PROBABILITY") {
            match v.parse() {
                Ok(n) => self.search.min_hire_probability = Some(n),
                Err(_) => tracing::warn!(
                    var = "PROSPECTOR_MIN_HIRE_PROBABILITY",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
    }
}
