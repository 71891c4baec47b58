//! Service configuration for mora-gen
//!
//! Bootstrap TOML (`~/.config/mora/mora-gen.toml` unless overridden) with
//! built-in defaults for every key. API keys resolve ENV → TOML.

use mora_common::config::{load_toml_or_default, resolve_root_folder, ROOT_FOLDER_ENV};
use mora_common::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Module name used for the config file name and in health responses
pub const MODULE_NAME: &str = "mora-gen";

/// Environment variable for the transcript service API key
pub const TRANSCRIPT_API_KEY_ENV: &str = "MORA_TRANSCRIPT_API_KEY";

/// Environment variable for the LLM API key
pub const LLM_API_KEY_ENV: &str = "MORA_LLM_API_KEY";

/// Complete mora-gen configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Data folder holding the SQLite database (optional)
    pub root_folder: Option<PathBuf>,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub pipeline: PipelineConfig,
    pub events: EventsConfig,
    pub store: StoreConfig,
    pub cache: CacheConfig,
    pub transcript: TranscriptConfig,
    pub llm: LlmConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5740,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Stage timeouts and limits for the pipeline driver
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub max_video_duration_secs: f64,
    pub transcript_timeout_secs: u64,
    pub planning_timeout_secs: u64,
    pub synthesis_timeout_secs: u64,
    pub timeline_timeout_secs: u64,
    pub max_segments: usize,
    /// Whole-session deadline enforced by the supervisor (unset = none)
    pub session_deadline_secs: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_video_duration_secs: 7200.0,
            transcript_timeout_secs: 60,
            planning_timeout_secs: 40,
            synthesis_timeout_secs: 120,
            timeline_timeout_secs: 30,
            max_segments: 5,
            session_deadline_secs: None,
        }
    }
}

impl PipelineConfig {
    pub fn transcript_timeout(&self) -> Duration {
        Duration::from_secs(self.transcript_timeout_secs)
    }

    pub fn planning_timeout(&self) -> Duration {
        Duration::from_secs(self.planning_timeout_secs)
    }

    pub fn synthesis_timeout(&self) -> Duration {
        Duration::from_secs(self.synthesis_timeout_secs)
    }

    pub fn timeline_timeout(&self) -> Duration {
        Duration::from_secs(self.timeline_timeout_secs)
    }

    pub fn session_deadline(&self) -> Option<Duration> {
        self.session_deadline_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub keep_alive_secs: u64,
    pub subscriber_buffer: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            keep_alive_secs: 15,
            subscriber_buffer: mora_common::events::DEFAULT_SUBSCRIBER_BUFFER,
        }
    }
}

impl EventsConfig {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub max_sessions: usize,
    pub session_ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_sessions: 1000,
            session_ttl_secs: 3600,
            sweep_interval_secs: 60,
        }
    }
}

impl StoreConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 86_400,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    pub api_url: String,
    pub api_key: Option<String>,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.bibigpt.co/api/v1".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API (`/chat/completions` is appended)
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.deepseek.com/v1".to_string(),
            api_key: None,
            model: "deepseek-chat".to_string(),
            temperature: 0.3,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Explicit database file; defaults to `<root_folder>/mora.db`
    pub path: Option<PathBuf>,
}

impl ServiceConfig {
    /// Load from the located TOML file, or defaults if none exists
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        load_toml_or_default(explicit, MODULE_NAME)
    }

    /// Resolve the SQLite database path
    ///
    /// `[database] path` wins; otherwise `mora.db` inside the root folder
    /// resolved CLI → `MORA_ROOT_FOLDER` → TOML → OS default.
    pub fn database_path(&self, cli_root_folder: Option<&Path>) -> PathBuf {
        if let Some(path) = &self.database.path {
            return path.clone();
        }
        let root = resolve_root_folder(
            cli_root_folder,
            ROOT_FOLDER_ENV,
            self.root_folder.as_deref(),
        );
        root.join("mora.db")
    }

    /// Fill API keys from the environment (ENV beats TOML)
    pub fn resolve_api_keys(&mut self) {
        self.transcript.api_key = resolve_api_key(
            "Transcript",
            TRANSCRIPT_API_KEY_ENV,
            self.transcript.api_key.as_deref(),
        );
        self.llm.api_key = resolve_api_key("LLM", LLM_API_KEY_ENV, self.llm.api_key.as_deref());
    }
}

/// Resolve an API key from ENV then TOML
///
/// Warns when the key is present in both sources; returns `None` when
/// neither provides a usable value.
pub fn resolve_api_key(label: &str, env_var: &str, toml_value: Option<&str>) -> Option<String> {
    let env_key = std::env::var(env_var).ok().filter(|k| is_valid_key(k));
    let toml_key = toml_value.filter(|k| is_valid_key(k)).map(str::to_string);

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "{} API key found in multiple sources: environment, TOML. Using environment (highest priority).",
            label
        );
    }

    if let Some(key) = env_key {
        info!("{} API key loaded from environment variable", label);
        return Some(key);
    }

    if let Some(key) = toml_key {
        info!("{} API key loaded from TOML config", label);
        return Some(key);
    }

    warn!(
        "{} API key not configured (set {} or add api_key to the TOML config)",
        label, env_var
    );
    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
