use std::path::PathBuf;

use tabmimic_core::{CodecError, Error as CoreError};
use tabmimic_generate::GenerationError;
use tabmimic_profile::ProfileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("profile document error: {0}")]
    Codec(#[from] CodecError),
    #[error("profiling error: {0}")]
    Profile(#[from] ProfileError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unsupported engine: {0}")]
    UnsupportedEngine(String),
    #[error("logging setup failed: {0}")]
    Logging(String),
    #[error("report encoding failed: {0}")]
    Report(#[from] serde_json::Error),
}
