//! Error types for catalog reads and comment synchronization.
//!
//! Provides a unified error type covering database access, row conversion,
//! runtime setup and comment document failures.

use thiserror::Error;

/// Errors that can occur while talking to PostgreSQL.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Database statement or connection failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// A result row did not have the expected shape.
    #[error("conversion error: {0}")]
    ConversionError(String),

    /// The async runtime backing the blocking connection could not start.
    #[error("runtime error: {0}")]
    RuntimeError(#[from] std::io::Error),

    /// A comment document failed structural validation.
    #[error("invalid document '{name}': {problems}")]
    InvalidDocument {
        /// Schema name from the document.
        name: String,
        /// All problems found, joined with `; `.
        problems: String,
    },

    /// The documentation template failed to render.
    #[error("render error: {0}")]
    RenderError(#[from] pgdoc_core::RenderError),

    /// Error reading or writing document files.
    #[error("document error: {0}")]
    DocumentError(#[from] pgdoc_db::DocumentError),
}

/// Convenience alias for results with [`CatalogError`].
pub type Result<T> = std::result::Result<T, CatalogError>;
