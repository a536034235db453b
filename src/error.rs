//! Error types for the essay builder

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced at the crate boundary.
///
/// Scoring itself never fails: degenerate input degrades to zero weights.
/// These variants cover configuration, input decoding and the CLI.
#[derive(Error, Debug)]
pub enum EssayError {
    /// Upload is not valid UTF-8
    #[error("Upload '{name}' is not valid UTF-8: {source}")]
    Decode {
        name: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// Reading an input file failed
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No usable document is left after decoding
    #[error("Corpus is empty")]
    EmptyCorpus,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON rendering error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<toml::de::Error> for EssayError {
    fn from(e: toml::de::Error) -> Self {
        EssayError::Config(format!("Failed to parse TOML: {}", e))
    }
}

impl From<toml::ser::Error> for EssayError {
    fn from(e: toml::ser::Error) -> Self {
        EssayError::Config(format!("Failed to serialize to TOML: {}", e))
    }
}

/// Result type alias for essay operations
pub type Result<T> = std::result::Result<T, EssayError>;
