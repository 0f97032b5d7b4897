//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `PRISM_*` environment variables.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;

use crate::constants::{DEFAULT_OVERFETCH_MULTIPLIER, DEFAULT_RERANK_TIMEOUT_MS};

/// When embedding and reranking capabilities are constructed.
///
/// `Eager` pays the full model-load cost at boot so the first request is
/// fast; `Lazy` defers each capability to its first use, which keeps boot
/// quick but makes the first request per modality pay the cold start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupMode {
    /// Construct every capability at boot.
    Eager,
    /// Construct each capability on first use.
    Lazy,
}

impl std::str::FromStr for StartupMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eager" => Ok(StartupMode::Eager),
            "lazy" => Ok(StartupMode::Lazy),
            _ => Err(ConfigError::InvalidStartupMode {
                value: s.to_string(),
            }),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `PRISM_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Qdrant endpoint URL. Default: `http://localhost:6334`.
    pub qdrant_url: String,

    /// Local object-store root used when no store URL is configured.
    /// Default: `./.objects`.
    pub store_path: PathBuf,

    /// Remote object-store base URL. When set, fragments are fetched over
    /// HTTP instead of from `store_path`.
    pub store_url: Option<String>,

    /// Path to the text embedding model file (GGUF).
    pub text_model_path: Option<PathBuf>,

    /// Path to the code embedding model file (GGUF).
    pub code_model_path: Option<PathBuf>,

    /// Path to the CLIP model directory (safetensors + tokenizer).
    pub clip_model_path: Option<PathBuf>,

    /// Path to the cross-encoder reranker directory (BERT + tokenizer).
    pub reranker_path: Option<PathBuf>,

    /// Plot-to-table transcriber endpoint URL.
    pub plot_transcriber_url: Option<String>,

    /// First-stage candidates fetched per final result slot. Default: `5`.
    pub overfetch_multiplier: usize,

    /// Reranking deadline per modality, in milliseconds.
    pub rerank_timeout_ms: u64,

    /// Capability construction mode. Default: [`StartupMode::Lazy`].
    pub startup_mode: StartupMode,
}

/// Default Qdrant URL used when `PRISM_QDRANT_URL` is not set.
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            qdrant_url: DEFAULT_QDRANT_URL.to_string(),
            store_path: PathBuf::from("./.objects"),
            store_url: None,
            text_model_path: None,
            code_model_path: None,
            clip_model_path: None,
            reranker_path: None,
            plot_transcriber_url: None,
            overfetch_multiplier: DEFAULT_OVERFETCH_MULTIPLIER,
            rerank_timeout_ms: DEFAULT_RERANK_TIMEOUT_MS,
            startup_mode: StartupMode::Lazy,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "PRISM_PORT";
    const ENV_BIND_ADDR: &'static str = "PRISM_BIND_ADDR";
    const ENV_QDRANT_URL: &'static str = "PRISM_QDRANT_URL";
    const ENV_STORE_PATH: &'static str = "PRISM_STORE_PATH";
    const ENV_STORE_URL: &'static str = "PRISM_STORE_URL";
    const ENV_TEXT_MODEL_PATH: &'static str = "PRISM_TEXT_MODEL_PATH";
    const ENV_CODE_MODEL_PATH: &'static str = "PRISM_CODE_MODEL_PATH";
    const ENV_CLIP_MODEL_PATH: &'static str = "PRISM_CLIP_MODEL_PATH";
    const ENV_RERANKER_PATH: &'static str = "PRISM_RERANKER_PATH";
    const ENV_PLOT_TRANSCRIBER_URL: &'static str = "PRISM_PLOT_TRANSCRIBER_URL";
    const ENV_OVERFETCH_MULTIPLIER: &'static str = "PRISM_OVERFETCH_MULTIPLIER";
    const ENV_RERANK_TIMEOUT_MS: &'static str = "PRISM_RERANK_TIMEOUT_MS";
    const ENV_STARTUP_MODE: &'static str = "PRISM_STARTUP_MODE";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let qdrant_url = Self::parse_string_from_env(Self::ENV_QDRANT_URL, defaults.qdrant_url);
        let store_path = Self::parse_path_from_env(Self::ENV_STORE_PATH, defaults.store_path);
        let store_url = Self::parse_optional_string_from_env(Self::ENV_STORE_URL);
        let text_model_path = Self::parse_optional_path_from_env(Self::ENV_TEXT_MODEL_PATH);
        let code_model_path = Self::parse_optional_path_from_env(Self::ENV_CODE_MODEL_PATH);
        let clip_model_path = Self::parse_optional_path_from_env(Self::ENV_CLIP_MODEL_PATH);
        let reranker_path = Self::parse_optional_path_from_env(Self::ENV_RERANKER_PATH);
        let plot_transcriber_url =
            Self::parse_optional_string_from_env(Self::ENV_PLOT_TRANSCRIBER_URL);
        let overfetch_multiplier = Self::parse_usize_from_env(
            Self::ENV_OVERFETCH_MULTIPLIER,
            defaults.overfetch_multiplier,
        );
        let rerank_timeout_ms =
            Self::parse_u64_from_env(Self::ENV_RERANK_TIMEOUT_MS, defaults.rerank_timeout_ms);
        let startup_mode = Self::parse_startup_mode_from_env(defaults.startup_mode)?;

        Ok(Self {
            port,
            bind_addr,
            qdrant_url,
            store_path,
            store_url,
            text_model_path,
            code_model_path,
            clip_model_path,
            reranker_path,
            plot_transcriber_url,
            overfetch_multiplier,
            rerank_timeout_ms,
            startup_mode,
        })
    }

    /// Validates paths and basic invariants (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.overfetch_multiplier == 0 {
            return Err(ConfigError::InvalidOverfetch {
                value: self.overfetch_multiplier,
            });
        }

        if self.store_url.is_none() && self.store_path.exists() && !self.store_path.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: self.store_path.clone(),
            });
        }

        for path in [&self.text_model_path, &self.code_model_path]
            .into_iter()
            .flatten()
        {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        for path in [&self.clip_model_path, &self.reranker_path]
            .into_iter()
            .flatten()
        {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_startup_mode_from_env(default: StartupMode) -> Result<StartupMode, ConfigError> {
        match env::var(Self::ENV_STARTUP_MODE) {
            Ok(value) => value.parse(),
            Err(_) => Ok(default),
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name).map(PathBuf::from).unwrap_or(default)
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        Self::parse_optional_string_from_env(var_name).map(PathBuf::from)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }

    fn parse_usize_from_env(var_name: &str, default: usize) -> usize {
        env::var(var_name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn parse_u64_from_env(var_name: &str, default: u64) -> u64 {
        env::var(var_name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }
}
