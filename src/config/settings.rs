use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/users.db";
pub const DEFAULT_MODEL_DIR: &str = "fine-tuned-resume-model";
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";
pub const DEFAULT_HF_MODEL_NAME: &str = "fine-tuned-resume-matcher";
pub const DEFAULT_HF_ENDPOINT: &str = "https://huggingface.co";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Which sentence encoder backs the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    FastEmbed,
    Hashing,
}

/// Endpoint of an OpenAI-compatible chat completion API used for summaries.
#[derive(Debug, Clone)]
pub struct RemoteSummarizerSettings {
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: String,
    pub model_dir: PathBuf,
    pub embedding_model: String,
    pub embedding_backend: EmbeddingBackend,
    pub model_cache_dir: PathBuf,
    pub hf_token: Option<String>,
    pub hf_model_name: String,
    pub hf_endpoint: String,
    pub summarizer: Option<RemoteSummarizerSettings>,
    pub max_upload_bytes: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host_raw = var_or("HOST", "127.0.0.1");
        let host = host_raw
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidValue {
                key: "HOST",
                value: host_raw.clone(),
            })?;

        let port = parse_var("PORT", 5000u16)?;
        let max_upload_bytes = parse_var("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;

        let embedding_backend = match var_or("EMBEDDING_BACKEND", "fastembed")
            .to_ascii_lowercase()
            .as_str()
        {
            "fastembed" => EmbeddingBackend::FastEmbed,
            "hashing" => EmbeddingBackend::Hashing,
            other => {
                return Err(ConfigError::InvalidValue {
                    key: "EMBEDDING_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let summarizer = non_empty_var("SUMMARIZER_URL").map(|url| RemoteSummarizerSettings {
            url,
            model: var_or("SUMMARIZER_MODEL", "gpt-4o-mini"),
            api_key: non_empty_var("SUMMARIZER_API_KEY"),
        });

        Ok(Settings {
            host,
            port,
            database_url: var_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            model_dir: PathBuf::from(var_or("MODEL_DIR", DEFAULT_MODEL_DIR)),
            embedding_model: var_or("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            embedding_backend,
            model_cache_dir: PathBuf::from(var_or("MODEL_CACHE_DIR", ".model_cache")),
            hf_token: non_empty_var("HF_TOKEN"),
            hf_model_name: var_or("HF_MODEL_NAME", DEFAULT_HF_MODEL_NAME),
            hf_endpoint: var_or("HF_ENDPOINT", DEFAULT_HF_ENDPOINT),
            summarizer,
            max_upload_bytes,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }
}

fn var_or(key: &str, default: &str) -> String {
    non_empty_var(key).unwrap_or_else(|| default.to_string())
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty_var(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        None => Ok(default),
    }
}
