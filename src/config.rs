use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::models::{EmbeddingFailurePolicy, MatchingPolicy, DEFAULT_MIN_SIMILARITY};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub embedding: EmbeddingSettings,
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// OpenAI-compatible embeddings endpoint
    Http,
    /// Offline hashed bag-of-words vectors
    Hashing,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingSettings {
    #[serde(default = "default_provider")]
    pub provider: EmbeddingProvider,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_embedding_path")]
    pub path: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    pub api_key: Option<String>,
    pub dimensions: Option<usize>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    pub cache_size: Option<u64>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_base: default_api_base(),
            path: default_embedding_path(),
            model: default_embedding_model(),
            api_key: None,
            dimensions: None,
            timeout_ms: default_timeout_ms(),
            cache_size: None,
        }
    }
}

fn default_provider() -> EmbeddingProvider { EmbeddingProvider::Hashing }
fn default_api_base() -> String { "https://api.openai.com".to_string() }
fn default_embedding_path() -> String { "/v1/embeddings".to_string() }
fn default_embedding_model() -> String { "text-embedding-3-small".to_string() }
fn default_timeout_ms() -> u64 { 10_000 }

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSettings {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,
    #[serde(default = "default_top_n")]
    pub default_top_n: u16,
    #[serde(default = "default_max_top_n")]
    pub max_top_n: u16,
    #[serde(default)]
    pub on_embedding_failure: EmbeddingFailurePolicy,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            min_similarity: default_min_similarity(),
            default_top_n: default_top_n(),
            max_top_n: default_max_top_n(),
            on_embedding_failure: EmbeddingFailurePolicy::default(),
        }
    }
}

impl MatchingSettings {
    pub fn policy(&self) -> MatchingPolicy {
        MatchingPolicy {
            min_similarity: self.min_similarity,
            on_embedding_failure: self.on_embedding_failure,
        }
    }

    /// Requested result count, defaulted and capped by the settings
    pub fn resolve_top_n(&self, requested: Option<u16>) -> usize {
        let max = self.max_top_n.max(1);
        requested.unwrap_or(self.default_top_n).clamp(1, max) as usize
    }
}

fn default_min_similarity() -> f64 { DEFAULT_MIN_SIMILARITY }
fn default_top_n() -> u16 { 5 }
fn default_max_top_n() -> u16 { 20 }

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u64,
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl(),
            max_sessions: default_max_sessions(),
            max_turns: default_max_turns(),
        }
    }
}

fn default_session_ttl() -> u64 { 1800 }
fn default_max_sessions() -> u64 { 10_000 }
fn default_max_turns() -> usize { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event
    #[default]
    Json,
    /// Multi-line human readable output
    Pretty,
    /// Single-line text
    Compact,
}

impl LogFormat {
    /// Parse a `LOG_FORMAT` style value, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with YOJANA__)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., YOJANA__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?;

        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        settings.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("YOJANA")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Apply well-known variables that are not under the YOJANA__ prefix
///
/// EMBEDDING_API_KEY wins over OPENAI_API_KEY; CATALOG_PATH sets the catalog.
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let api_key = env::var("EMBEDDING_API_KEY")
        .or_else(|_| env::var("OPENAI_API_KEY"))
        .ok()
        .filter(|k| !k.is_empty());
    let catalog_path = env::var("CATALOG_PATH").ok();

    let mut builder = Config::builder().add_source(settings);

    if let Some(key) = api_key {
        builder = builder.set_override("embedding.api_key", key)?;
    }
    if let Some(path) = catalog_path {
        builder = builder.set_override("catalog.path", path)?;
    }

    builder.build()
}
