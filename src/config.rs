use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::document::ChunkMode;
use crate::engine::{DedupePolicy, GenerationMode};
use crate::error::{SowError, SowResult};

pub const DEFAULT_CONFIG_FILE: &str = "sowcrew.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub chunking: ChunkingConfig,
    pub generation: GenerationConfig,
    pub execution: ExecutionLimits,
    pub server: ServerConfig,
    #[serde(skip)]
    pub secrets: Secrets,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub team_file: PathBuf,
    pub docs_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub output_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            team_file: PathBuf::from("config/team.json"),
            docs_dir: PathBuf::from("docs"),
            logs_dir: PathBuf::from("logs"),
            output_file: PathBuf::from("result.json"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub mode: ChunkMode,
    /// Maximum chunk size in characters
    pub max_size: usize,
    /// Overlap between adjacent chunks, also the lookback window for breaks
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            mode: ChunkMode::Overlap,
            max_size: 8000,
            overlap: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[serde(rename = "openai", alias = "open_ai")]
    OpenAi,
    Anthropic,
    Ollama,
}

impl ProviderKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "openai" | "open_ai" => Some(ProviderKind::OpenAi),
            "anthropic" => Some(ProviderKind::Anthropic),
            "ollama" => Some(ProviderKind::Ollama),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub mode: GenerationMode,
    pub dedupe: DedupePolicy,
    pub provider: ProviderKind,
    pub model: Option<String>,
    pub temperature: f32,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub ollama_base_url: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            mode: GenerationMode::TeamWide,
            dedupe: DedupePolicy::PreserveOrder,
            provider: ProviderKind::OpenAi,
            model: None,
            temperature: 0.7,
            max_retries: 2,
            retry_backoff_ms: 500,
            ollama_base_url: None,
        }
    }
}

/// Limits handed to the task executor. The coordinator never enforces these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionLimits {
    pub max_rpm: u32,
    pub max_tokens_per_agent: u32,
    pub max_input_tokens: u32,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            max_rpm: 10,
            max_tokens_per_agent: 500,
            max_input_tokens: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Runs kept in memory; the oldest idle run is evicted beyond this
    pub max_runs: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            max_runs: 100,
        }
    }
}

#[derive(Clone, Default)]
pub struct Secrets {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "<redacted>");
        f.debug_struct("Secrets")
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("anthropic_api_key", &redact(&self.anthropic_api_key))
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Defaults, then the TOML file (explicit path, or `sowcrew.toml` if it
    /// exists), then environment overrides.
    pub fn load(path: Option<&Path>) -> SowResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> SowResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SowError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> SowResult<Self> {
        toml::from_str(raw).map_err(|e| SowError::Configuration(format!("invalid config: {}", e)))
    }

    fn apply_env(&mut self) {
        self.secrets.openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        self.secrets.anthropic_api_key = std::env::var("ANTHROPIC_API_KEY").ok();

        if let Some(provider) = std::env::var("SOWCREW_PROVIDER")
            .ok()
            .and_then(|p| ProviderKind::from_str(&p))
        {
            self.generation.provider = provider;
        }
        if let Ok(model) = std::env::var("SOWCREW_MODEL") {
            self.generation.model = Some(model);
        }
        if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
            self.generation.ollama_base_url = Some(url);
        }
    }
}
