//! Comment document validation.
//!
//! A document is edited by hand, so before it drives any comment statement
//! it is checked for structural problems: empty names and duplicate
//! relations or columns. Every problem found is reported, not only the
//! first one.
//!
//! # Examples
//!
//! ```
//! use pgdoc_core::*;
//!
//! let mut doc = SchemaDocument {
//!     name: "app".into(),
//!     description: None,
//!     tables: vec![RelationDocument {
//!         name: "users".into(),
//!         description: None,
//!         columns: Vec::new(),
//!     }],
//!     views: Vec::new(),
//! };
//! assert!(validate_document(&doc).is_empty());
//!
//! doc.tables.push(doc.tables[0].clone());
//! let errors = validate_document(&doc);
//! assert_eq!(errors, vec![ValidationError::DuplicateTable("app.users".into())]);
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::document::{RelationDocument, SchemaDocument};

/// Document validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Schema name is empty or whitespace-only.
    #[error("schema name cannot be empty")]
    EmptySchemaName,
    /// A table or view in the named schema has an empty name.
    #[error("relation name cannot be empty in schema {0}")]
    EmptyRelationName(String),
    /// A column of the named relation has an empty name.
    #[error("column name cannot be empty in relation {0}")]
    EmptyColumnName(String),
    /// Two tables share a name.
    #[error("duplicate table: {0}")]
    DuplicateTable(String),
    /// Two views share a name.
    #[error("duplicate view: {0}")]
    DuplicateView(String),
    /// Two columns of one relation share a name.
    #[error("duplicate column: {0}")]
    DuplicateColumn(String),
}

/// Validates a comment document, returning every problem found.
pub fn validate_document(document: &SchemaDocument) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if document.name.trim().is_empty() {
        errors.push(ValidationError::EmptySchemaName);
        return errors;
    }

    validate_relations(
        &document.name,
        &document.tables,
        ValidationError::DuplicateTable,
        &mut errors,
    );
    validate_relations(
        &document.name,
        &document.views,
        ValidationError::DuplicateView,
        &mut errors,
    );

    errors
}

fn validate_relations(
    schema: &str,
    relations: &[RelationDocument],
    duplicate: fn(String) -> ValidationError,
    errors: &mut Vec<ValidationError>,
) {
    let mut seen: HashSet<&str> = HashSet::new();
    for relation in relations {
        if relation.name.trim().is_empty() {
            errors.push(ValidationError::EmptyRelationName(schema.to_string()));
            continue;
        }
        let qualified = format!("{schema}.{}", relation.name);
        if !seen.insert(relation.name.as_str()) {
            errors.push(duplicate(qualified.clone()));
        }

        let mut columns: HashSet<&str> = HashSet::new();
        for column in &relation.columns {
            if column.name.trim().is_empty() {
                errors.push(ValidationError::EmptyColumnName(qualified.clone()));
            } else if !columns.insert(column.name.as_str()) {
                errors.push(ValidationError::DuplicateColumn(format!(
                    "{qualified}.{}",
                    column.name
                )));
            }
        }
    }
}
