use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ValidationErrors),
    #[error("{0} environment variable not set")]
    MissingEnv(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[serde(default)]
    pub pdf_files: Vec<String>,
    #[serde(alias = "index_directory")]
    pub chroma_directory: String,
    #[serde(default)]
    #[validate]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    #[validate]
    pub retriever: RetrieverConfig,
    #[validate]
    pub llm: LlmConfig,
    #[serde(default)]
    #[validate]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    #[validate]
    pub web_search: WebSearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_overlap"))]
pub struct ChunkingConfig {
    #[validate(range(min = 1))]
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

fn validate_overlap(chunking: &ChunkingConfig) -> Result<(), ValidationError> {
    if chunking.chunk_overlap >= chunking.chunk_size {
        let mut err = ValidationError::new("chunk_overlap");
        err.message = Some("chunk_overlap must be smaller than chunk_size".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RetrieverConfig {
    #[validate(range(min = 1))]
    pub k: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self { k: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LlmConfig {
    #[validate(length(min = 1))]
    pub model: String,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EmbeddingConfig {
    #[validate(length(min = 1))]
    pub model: String,
    #[validate(range(min = 1, max = 2048))]
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-ada-002".to_string(),
            batch_size: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WebSearchConfig {
    #[validate(length(min = 1))]
    pub engine: String,
    #[validate(range(min = 1, max = 10))]
    pub max_results: usize,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            engine: "google".to_string(),
            max_results: 3,
        }
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&raw).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
            path: "<inline>".to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn index_dir(&self) -> PathBuf {
        PathBuf::from(&self.chroma_directory)
    }
}

/// API keys pulled from the process environment (after `.env` is loaded).
#[derive(Clone, Default)]
pub struct Credentials {
    pub openai_api_key: Option<String>,
    pub serpapi_api_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "***"))
            .field("serpapi_api_key", &self.serpapi_api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Self {
        let read = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            openai_api_key: read("OPENAI_API_KEY"),
            serpapi_api_key: read("SERPAPI_API_KEY"),
        }
    }

    pub fn with_openai_override(mut self, api_key: Option<String>) -> Self {
        if let Some(key) = api_key {
            self.openai_api_key = Some(key);
        }
        self
    }

    pub fn openai(&self) -> Result<&str, ConfigError> {
        self.openai_api_key
            .as_deref()
            .ok_or(ConfigError::MissingEnv("OPENAI_API_KEY"))
    }

    pub fn serpapi(&self) -> Result<&str, ConfigError> {
        self.serpapi_api_key
            .as_deref()
            .ok_or(ConfigError::MissingEnv("SERPAPI_API_KEY"))
    }
}
