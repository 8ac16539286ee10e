//! Applies the descriptions of a schema graph to the database as comments.
//!
//! Every object is updated with its own `COMMENT ON` statement. A failing
//! statement is recorded in the [`SyncReport`] and logged, and the walk
//! moves on: one renamed column never stops the rest of the schema from
//! being synchronized.
//!
//! # Example
//!
//! ```no_run
//! use pgdoc_core::from_document;
//! use pgdoc_db::{ConnectionConfig, read_document};
//! use pgdoc_postgres::{PgConnection, Synchronizer};
//!
//! let conn = PgConnection::connect(&ConnectionConfig::from_url("postgres:///app")).unwrap();
//! let schema = from_document(read_document("comments/public.yaml").unwrap());
//!
//! let report = Synchronizer::new(&conn).apply(&schema).unwrap();
//! for entry in report.failures() {
//!     eprintln!("{}: {:?}", entry.object, entry.status);
//! }
//! ```

use pgdoc_core::{Relation, RelationKind, Schema};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::PgCatalog;
use crate::connection::{Connection, SqlValue};
use crate::error::Result;

/// The kind of catalog object a comment is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Schema,
    Table,
    View,
    Column,
}

impl ObjectKind {
    /// Keyword used after `COMMENT ON`.
    pub fn sql_keyword(self) -> &'static str {
        match self {
            ObjectKind::Schema => "SCHEMA",
            ObjectKind::Table => "TABLE",
            ObjectKind::View => "VIEW",
            ObjectKind::Column => "COLUMN",
        }
    }
}

impl From<RelationKind> for ObjectKind {
    fn from(kind: RelationKind) -> Self {
        match kind {
            RelationKind::Table => ObjectKind::Table,
            RelationKind::View => ObjectKind::View,
        }
    }
}

/// Outcome for a single object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// The comment statement succeeded.
    Applied,
    /// The statement failed with the given database message.
    Failed(String),
    /// Not attempted because the owning table could not be commented.
    Skipped,
}

impl SyncStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, SyncStatus::Failed(_))
    }
}

/// One object visited by the synchronizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncEntry {
    pub kind: ObjectKind,
    /// Dotted name, e.g. `app.users.email`.
    pub object: String,
    pub status: SyncStatus,
}

/// Everything a schema synchronization did, in visiting order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Name of the synchronized schema.
    pub schema: String,
    pub entries: Vec<SyncEntry>,
}

impl SyncReport {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            entries: Vec::new(),
        }
    }

    /// Entries whose statement failed.
    pub fn failures(&self) -> Vec<&SyncEntry> {
        self.entries.iter().filter(|e| e.status.is_failed()).collect()
    }

    pub fn applied_count(&self) -> usize {
        self.count(|status| *status == SyncStatus::Applied)
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|status| *status == SyncStatus::Skipped)
    }

    /// `true` when no statement failed.
    pub fn is_clean(&self) -> bool {
        !self.entries.iter().any(|e| e.status.is_failed())
    }

    fn count(&self, pred: impl Fn(&SyncStatus) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.status)).count()
    }

    fn record(&mut self, kind: ObjectKind, object: String, status: SyncStatus) {
        match &status {
            SyncStatus::Failed(cause) => {
                warn!(kind = kind.sql_keyword(), object = %object, error = %cause, "Failed to update comment");
            }
            SyncStatus::Skipped => {
                debug!(kind = kind.sql_keyword(), object = %object, "Skipped comment update");
            }
            SyncStatus::Applied => {}
        }
        self.entries.push(SyncEntry {
            kind,
            object,
            status,
        });
    }
}

/// Quotes an identifier for SQL text, doubling embedded quotes.
///
/// ```
/// use pgdoc_postgres::quote_ident;
///
/// assert_eq!(quote_ident("users"), r#""users""#);
/// assert_eq!(quote_ident(r#"say "hi""#), r#""say ""hi""""#);
/// ```
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn qualified_ident(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| quote_ident(part))
        .collect::<Vec<_>>()
        .join(".")
}

/// Builds the `COMMENT ON` statement for one object.
///
/// `target` is the already quoted object name. A description is bound as
/// `$1`; no description clears the comment with `IS NULL`.
pub fn comment_statement(
    kind: ObjectKind,
    target: &str,
    description: Option<&str>,
) -> (String, Vec<SqlValue>) {
    let prefix = format!("COMMENT ON {} {target} IS", kind.sql_keyword());
    match description {
        Some(text) => (format!("{prefix} $1"), vec![SqlValue::from(text)]),
        None => (format!("{prefix} NULL"), Vec::new()),
    }
}

/// Writes the descriptions of a schema graph back to the database.
///
/// Walks the schema, then each table followed by its columns, then each
/// view. View columns are not commented. Collections not yet loaded on the
/// graph are read from the catalog over the same connection, so a graph
/// from [`PgCatalog::find_schema`] is walked in full. A graph built by
/// [`from_document`](pgdoc_core::from_document) is fully loaded and never
/// touches the catalog.
pub struct Synchronizer<'c, C: Connection + ?Sized> {
    catalog: PgCatalog<'c, C>,
}

impl<'c, C: Connection + ?Sized> Synchronizer<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self {
            catalog: PgCatalog::new(conn),
        }
    }

    /// Issues one comment statement per object and reports each outcome.
    ///
    /// # Errors
    ///
    /// Failed comment statements are recorded in the report, not returned.
    /// An error is returned only when a collection missing from the graph
    /// cannot be read from the catalog.
    pub fn apply(&self, schema: &Schema) -> Result<SyncReport> {
        info!(schema = %schema.name, "Synchronizing comments");
        let mut report = SyncReport::new(&schema.name);

        let status = self.comment(
            ObjectKind::Schema,
            &quote_ident(&schema.name),
            schema.description.as_deref(),
        );
        report.record(ObjectKind::Schema, schema.name.clone(), status);

        for table in schema.tables(&self.catalog)? {
            let table_failed = self.apply_relation(table, &mut report);
            for column in table.columns(&self.catalog)? {
                let status = if table_failed {
                    SyncStatus::Skipped
                } else {
                    self.comment(
                        ObjectKind::Column,
                        &qualified_ident(&[column.schema.as_str(), &column.table, &column.name]),
                        column.description.as_deref(),
                    )
                };
                report.record(ObjectKind::Column, column.qualified_name(), status);
            }
        }

        for view in schema.views(&self.catalog)? {
            self.apply_relation(view, &mut report);
        }

        info!(
            schema = %schema.name,
            applied = report.applied_count(),
            failed = report.failures().len(),
            "Finished synchronizing comments"
        );
        Ok(report)
    }

    /// Comments the relation itself and returns whether that failed.
    fn apply_relation(&self, relation: &Relation, report: &mut SyncReport) -> bool {
        let kind = ObjectKind::from(relation.kind());
        let status = self.comment(
            kind,
            &qualified_ident(&[relation.schema.as_str(), &relation.name]),
            relation.description.as_deref(),
        );
        let failed = status.is_failed();
        report.record(kind, relation.qualified_name(), status);
        failed
    }

    fn comment(&self, kind: ObjectKind, target: &str, description: Option<&str>) -> SyncStatus {
        let (sql, params) = comment_statement(kind, target, description);
        match self.catalog.connection().execute(&sql, &params) {
            Ok(()) => SyncStatus::Applied,
            Err(err) => SyncStatus::Failed(err.to_string()),
        }
    }
}
