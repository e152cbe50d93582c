use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PodfetchError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to load manifest from {path}: {reason}")]
    ManifestLoad { path: PathBuf, reason: String },

    #[error("Failed to save manifest to {path}: {reason}")]
    ManifestSave { path: PathBuf, reason: String },

    #[error("Manifest validation failed: {details}")]
    ManifestValidation { details: String },

    #[error("Invalid command line arguments: {details}")]
    CliArgumentValidation { details: String },

    #[error("Failed to hash configuration file {path}: {reason}")]
    ConfigFileHash { path: PathBuf, reason: String },

    #[error("Download archive error: {0}")]
    Archive(#[from] crate::archive::ArchiveError),

    #[error("Fetch finished with errors ({downloaded} episodes downloaded)")]
    BatchFinishedWithErrors { downloaded: usize },

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(#[from] eyre::Report),
}
