//! Error types for document and configuration files.
//!
//! Provides a unified error type covering I/O, YAML, missing documents and
//! incomplete connection settings.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing pgdoc files.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The expected comment document does not exist.
    #[error("document not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    /// Connection settings are incomplete or contradictory.
    #[error("invalid connection config: {0}")]
    InvalidConfig(String),
}

/// Convenience alias for results with [`DocumentError`].
pub type Result<T> = std::result::Result<T, DocumentError>;
