//! Catalog model and comment document format for PostgreSQL schemas.
//!
//! This crate defines the types shared by every pgdoc component:
//!
//! - [`Schema`], [`Relation`] (a table or a view), [`Column`],
//!   [`Constraint`] and [`Index`]: mirrors of catalog objects whose child
//!   collections are loaded once through a [`CatalogSource`] and cached.
//! - [`SchemaDocument`]: the editable document carrying names and
//!   descriptions, with [`to_document`] and [`from_document`] converting
//!   between graph and document.
//! - [`validate_document`]: structural checks run before a document drives
//!   any comment statement.
//! - [`schema_page`] and [`Renderer`]: human-readable documentation of a
//!   schema through a replaceable Markdown template.
//!
//! The crate performs no I/O; reading the catalog and writing files live in
//! `pgdoc-postgres` and `pgdoc-db`.
//!
//! # Example
//!
//! ```
//! use pgdoc_core::*;
//!
//! let yaml_doc = SchemaDocument {
//!     name: "app".into(),
//!     description: Some("Application data".into()),
//!     tables: vec![RelationDocument {
//!         name: "users".into(),
//!         description: Some("Registered users".into()),
//!         columns: vec![ColumnDocument { name: "email".into(), description: None }],
//!     }],
//!     views: Vec::new(),
//! };
//! assert!(validate_document(&yaml_doc).is_empty());
//!
//! let schema = from_document(yaml_doc);
//! let users = &schema.loaded_tables().unwrap()[0];
//! assert_eq!(users.kind(), RelationKind::Table);
//! assert_eq!(users.loaded_columns().unwrap()[0].description, None);
//! ```

mod document;
mod render;
mod source;
mod types;
mod validate;

pub use document::{
    ColumnDocument, RelationDocument, SchemaDocument, from_document, to_document,
};
pub use render::{
    ColumnRow, DEFAULT_TEMPLATE, IndexRow, RenderError, Renderer, SchemaPage, TablePage,
    ViewPage, schema_page,
};
pub use source::CatalogSource;
pub use types::*;
pub use validate::{ValidationError, validate_document};
