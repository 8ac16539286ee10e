//! Comment document files and connection settings for pgdoc.
//!
//! This crate handles everything pgdoc keeps on disk:
//!
//! - [`DocumentDir`]: one `<schema>.yaml` comment document per schema,
//!   plus rendered `<schema>.md` pages.
//! - [`read_document`] and [`collect_document_paths`]: parsing single
//!   files and finding every document below a directory.
//! - [`ConnectionConfig`]: database connection settings from YAML or the
//!   environment.
//!
//! # Quick start
//!
//! ```no_run
//! use pgdoc_db::{ConnectionConfig, DocumentDir};
//!
//! let config = ConnectionConfig::load("pgdoc.yml").unwrap();
//! println!("database: {:?}", config.dbname);
//!
//! let dir = DocumentDir::new("comments/");
//! let doc = dir.read_document("public").unwrap();
//! println!("{} tables", doc.tables.len());
//! ```

mod config;
mod error;
mod store;

pub use config::{ConnectionConfig, URL_ENV_VARS};
pub use error::{DocumentError, Result};
pub use store::{
    DOCUMENT_EXTENSION, DocumentDir, MARKDOWN_EXTENSION, collect_document_paths, read_document,
};
