//! Error types for configuration loading and logging.

use std::path::PathBuf;

/// Errors raised while configuring or driving a [`crate::driver::ControlUnit`].
#[derive(Debug, thiserror::Error)]
pub enum PoetError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid configuration table: {0}")]
    InvalidTable(String),

    #[error("failed to open log file {path}: {source}")]
    LogOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to read configuration at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
