//! PostgreSQL side of pgdoc: catalog reads and comment synchronization.
//!
//! This crate connects the catalog model of `pgdoc-core` and the document
//! files of `pgdoc-db` to a live database.
//!
//! # Architecture
//!
//! - **`connection`**: the [`Connection`] trait every statement goes
//!   through, with [`SqlValue`] parameters and [`Row`] results
//! - **`pg`**: [`PgConnection`], a blocking sqlx connection
//! - **`catalog`**: [`PgCatalog`], the catalog reader and
//!   [`CatalogSource`](pgdoc_core::CatalogSource) of live schema graphs
//! - **`sync`**: [`Synchronizer`], which turns descriptions into
//!   `COMMENT ON` statements and reports each outcome
//! - **`workflow`**: one function per command, from [`doc_schema`] and
//!   [`schema_yaml`] to [`sync_all`]
//!
//! # Quick start
//!
//! ```no_run
//! use pgdoc_db::{ConnectionConfig, DocumentDir};
//! use pgdoc_postgres::{PgConnection, all_yamls, sync_all};
//!
//! let config = ConnectionConfig::from_env().expect("DATABASE_URL not set");
//! let conn = PgConnection::connect(&config).unwrap();
//! let dir = DocumentDir::new("comments");
//!
//! // Export, edit the YAML files by hand, then apply them back.
//! all_yamls(&conn, &dir).unwrap();
//! let report = sync_all(&conn, dir.root()).unwrap();
//! println!("clean: {}", report.is_clean());
//! ```

mod catalog;
mod connection;
mod error;
mod pg;
mod sync;
mod workflow;

pub use catalog::PgCatalog;
pub use connection::{Connection, Row, SqlValue};
pub use error::{CatalogError, Result};
pub use pg::PgConnection;
pub use sync::{
    ObjectKind, SyncEntry, SyncReport, SyncStatus, Synchronizer, comment_statement, quote_ident,
};
pub use workflow::{
    DirectorySyncReport, FileOutcome, FileSyncReport, all_yamls, doc_all, doc_schema, schema_yaml,
    sync_all, sync_file, sync_schema,
};
