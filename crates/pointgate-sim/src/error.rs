//! Simulation error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Failed to create output file at {path}: {source}")]
    OutputFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] pointgate_config::ConfigError),
}
