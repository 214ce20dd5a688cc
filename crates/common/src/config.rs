use crate::error::SemStoreError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Which embedding backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// Ollama `/api/embeddings`
    Ollama,
    /// Local feature-hashing embedder (no model, no network)
    Hashing,
}

impl FromStr for EmbedderKind {
    type Err = SemStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "hashing" | "hash" => Ok(Self::Hashing),
            other => Err(SemStoreError::config(format!(
                "Unknown embedder '{}' (expected 'ollama' or 'hashing')",
                other
            ))),
        }
    }
}

impl std::fmt::Display for EmbedderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ollama => write!(f, "ollama"),
            Self::Hashing => write!(f, "hashing"),
        }
    }
}

/// SemStore application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Embedding backend
    pub embedder: EmbedderKind,

    /// Ollama API base URL
    pub ollama_base_url: String,

    /// Embedding model name
    pub embedding_model: String,

    /// Output dimension of the hashing embedder
    pub hashing_dimension: usize,

    /// Number of results returned when the caller gives no k
    pub default_top_k: usize,

    /// Server bind address
    pub server_host: String,

    /// Server port
    pub server_port: u16,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            embedder: EmbedderKind::Ollama,
            ollama_base_url: "http://localhost:11434".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            hashing_dimension: 384,
            default_top_k: 3,
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            log_dir: PathBuf::from("./log"),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self, SemStoreError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        let defaults = Self::default();

        let embedder = match std::env::var("SEMSTORE_EMBEDDER") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.embedder,
        };

        let config = Self {
            embedder,
            ollama_base_url: std::env::var("OLLAMA_BASE_URL")
                .unwrap_or(defaults.ollama_base_url),
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or(defaults.embedding_model),
            hashing_dimension: Self::get_env_parsed("HASHING_DIMENSION")
                .unwrap_or(defaults.hashing_dimension),
            default_top_k: Self::get_env_parsed("DEFAULT_TOP_K")
                .unwrap_or(defaults.default_top_k),
            server_host: std::env::var("SERVER_HOST")
                .unwrap_or(defaults.server_host),
            server_port: Self::get_env_parsed("SERVER_PORT")
                .unwrap_or(defaults.server_port),
            log_dir: std::env::var("LOG_DIR")
                .ok()
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            log_level: std::env::var("LOG_LEVEL")
                .unwrap_or(defaults.log_level),
        };

        config.validate()?;

        Ok(config)
    }

    /// Parse an environment variable, ignoring missing or malformed values
    fn get_env_parsed<T: FromStr>(key: &str) -> Option<T> {
        std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
    }

    /// Get log file path
    pub fn get_log_path(&self, filename: &str) -> PathBuf {
        self.log_dir.join(filename)
    }

    /// Get server bind address (host:port)
    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), SemStoreError> {
        if self.embedding_model.trim().is_empty() {
            return Err(SemStoreError::config("Embedding model name cannot be empty"));
        }

        if self.embedder == EmbedderKind::Ollama
            && !self.ollama_base_url.starts_with("http://")
            && !self.ollama_base_url.starts_with("https://")
        {
            return Err(SemStoreError::config(
                "Ollama base URL must start with http:// or https://",
            ));
        }

        if self.hashing_dimension == 0 {
            return Err(SemStoreError::config("Hashing dimension cannot be 0"));
        }

        if self.default_top_k == 0 {
            return Err(SemStoreError::config("Default top-k cannot be 0"));
        }

        if self.server_port == 0 {
            return Err(SemStoreError::config("Server port cannot be 0"));
        }

        Ok(())
    }
}
