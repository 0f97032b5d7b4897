use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors raised while loading or validating [`Config`](super::Config).
pub enum ConfigError {
    /// Port value could not be parsed.
    #[error("invalid port value '{value}': {source}")]
    PortParseError {
        /// Raw environment value.
        value: String,
        /// Parse failure.
        source: std::num::ParseIntError,
    },

    /// Port 0 is not a usable listen port.
    #[error("port must be non-zero, got '{value}'")]
    InvalidPort {
        /// Raw environment value.
        value: String,
    },

    /// Bind address could not be parsed.
    #[error("invalid bind address '{value}': {source}")]
    InvalidBindAddr {
        /// Raw environment value.
        value: String,
        /// Parse failure.
        source: std::net::AddrParseError,
    },

    /// A configured path does not exist.
    #[error("configured path not found: {path}")]
    PathNotFound {
        /// Offending path.
        path: PathBuf,
    },

    /// A path that must be a file is not one.
    #[error("configured path is not a file: {path}")]
    NotAFile {
        /// Offending path.
        path: PathBuf,
    },

    /// A path that must be a directory is not one.
    #[error("configured path is not a directory: {path}")]
    NotADirectory {
        /// Offending path.
        path: PathBuf,
    },

    /// Overfetch multiplier outside the usable range.
    #[error("overfetch multiplier must be at least 1, got {value}")]
    InvalidOverfetch {
        /// Configured value.
        value: usize,
    },

    /// Startup mode string was not recognized.
    #[error("invalid startup mode '{value}' (expected 'eager' or 'lazy')")]
    InvalidStartupMode {
        /// Raw environment value.
        value: String,
    },
}
