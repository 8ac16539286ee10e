//! The six pgdoc commands, each wiring the catalog reader, document files
//! and synchronizer together over one connection.
//!
//! Functions returning `Option` use `None` for "schema not found"; the
//! caller decides how to tell the user.

use std::path::{Path, PathBuf};

use pgdoc_core::{Renderer, Schema, from_document, schema_page, to_document, validate_document};
use pgdoc_db::{DocumentDir, collect_document_paths, read_document};
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::PgCatalog;
use crate::connection::Connection;
use crate::error::{CatalogError, Result};
use crate::sync::{SyncReport, Synchronizer};

/// Writes `<dir>/<schema>.md` for one schema.
pub fn doc_schema<C: Connection + ?Sized>(
    conn: &C,
    dir: &DocumentDir,
    renderer: &Renderer,
    schema: &str,
) -> Result<Option<PathBuf>> {
    let catalog = PgCatalog::new(conn);
    catalog
        .find_schema(schema)?
        .map(|found| write_markdown(&catalog, dir, renderer, &found))
        .transpose()
}

/// Writes a Markdown page for every user schema.
pub fn doc_all<C: Connection + ?Sized>(
    conn: &C,
    dir: &DocumentDir,
    renderer: &Renderer,
) -> Result<Vec<PathBuf>> {
    let catalog = PgCatalog::new(conn);
    catalog
        .list_schemas()?
        .iter()
        .map(|schema| write_markdown(&catalog, dir, renderer, schema))
        .collect()
}

/// Exports the comment document of one schema to `<dir>/<schema>.yaml`.
pub fn schema_yaml<C: Connection + ?Sized>(
    conn: &C,
    dir: &DocumentDir,
    schema: &str,
) -> Result<Option<PathBuf>> {
    let catalog = PgCatalog::new(conn);
    catalog
        .find_schema(schema)?
        .map(|found| write_document(&catalog, dir, &found))
        .transpose()
}

/// Exports the comment document of every user schema.
pub fn all_yamls<C: Connection + ?Sized>(conn: &C, dir: &DocumentDir) -> Result<Vec<PathBuf>> {
    let catalog = PgCatalog::new(conn);
    catalog
        .list_schemas()?
        .iter()
        .map(|schema| write_document(&catalog, dir, schema))
        .collect()
}

/// Applies `<dir>/<schema>.yaml` to the database.
///
/// # Errors
///
/// A missing document surfaces as [`CatalogError::DocumentError`] wrapping
/// [`DocumentNotFound`](pgdoc_db::DocumentError::DocumentNotFound). Failed
/// comment statements are not errors; they are listed in the report.
pub fn sync_schema<C: Connection + ?Sized>(
    conn: &C,
    dir: &DocumentDir,
    schema: &str,
) -> Result<SyncReport> {
    sync_file(conn, &dir.document_path(schema))
}

/// Reads, validates and applies a single document file.
pub fn sync_file<C: Connection + ?Sized>(conn: &C, path: &Path) -> Result<SyncReport> {
    info!(path = %path.display(), "Syncing document");
    if !path.is_file() {
        return Err(pgdoc_db::DocumentError::DocumentNotFound(path.to_path_buf()).into());
    }
    let document = read_document(path)?;

    let problems = validate_document(&document);
    if !problems.is_empty() {
        return Err(CatalogError::InvalidDocument {
            name: document.name,
            problems: problems
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        });
    }

    Synchronizer::new(conn).apply(&from_document(document))
}

/// Applies every document found below `root`, one file at a time.
///
/// A file that cannot be read, parsed or validated is recorded as failed
/// and the walk continues. Only an unreadable `root` aborts; subdirectories
/// that cannot be listed are logged and skipped.
pub fn sync_all<C: Connection + ?Sized>(conn: &C, root: &Path) -> Result<DirectorySyncReport> {
    let mut report = DirectorySyncReport::default();
    for path in collect_document_paths(root)? {
        let outcome = match sync_file(conn, &path) {
            Ok(synced) => FileOutcome::Synced(synced),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Skipping document");
                FileOutcome::Failed(err.to_string())
            }
        };
        report.files.push(FileSyncReport { path, outcome });
    }
    Ok(report)
}

fn write_markdown<C: Connection + ?Sized>(
    catalog: &PgCatalog<'_, C>,
    dir: &DocumentDir,
    renderer: &Renderer,
    schema: &Schema,
) -> Result<PathBuf> {
    let markdown = renderer.render(&schema_page(schema, catalog)?)?;
    let path = dir.write_markdown(&schema.name, &markdown)?;
    info!(schema = %schema.name, path = %path.display(), "Wrote documentation");
    Ok(path)
}

fn write_document<C: Connection + ?Sized>(
    catalog: &PgCatalog<'_, C>,
    dir: &DocumentDir,
    schema: &Schema,
) -> Result<PathBuf> {
    let document = to_document(schema, catalog)?;
    let path = dir.write_document(&document)?;
    info!(schema = %schema.name, path = %path.display(), "Exported comment document");
    Ok(path)
}

/// Result of [`sync_all`], one entry per document file in walk order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectorySyncReport {
    pub files: Vec<FileSyncReport>,
}

/// What happened to one document file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSyncReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOutcome {
    /// The document was applied; individual statements may still have failed.
    Synced(SyncReport),
    /// The document never reached the database.
    Failed(String),
}

impl DirectorySyncReport {
    /// Files that could not be applied at all.
    pub fn failed_files(&self) -> impl Iterator<Item = &FileSyncReport> {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Failed(_)))
    }

    /// Number of failed comment statements across all synced files.
    pub fn statement_failures(&self) -> usize {
        self.files
            .iter()
            .map(|f| match &f.outcome {
                FileOutcome::Synced(report) => report.failures().len(),
                FileOutcome::Failed(_) => 0,
            })
            .sum()
    }

    /// `true` when every file was applied without a failed statement.
    pub fn is_clean(&self) -> bool {
        self.failed_files().next().is_none() && self.statement_failures() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::SyncStatus;

    #[test]
    fn test_directory_report_summaries() {
        let mut failing = SyncReport::new("b");
        failing.entries.push(crate::sync::SyncEntry {
            kind: crate::sync::ObjectKind::Schema,
            object: "b".into(),
            status: SyncStatus::Failed("permission denied".into()),
        });

        let report = DirectorySyncReport {
            files: vec![
                FileSyncReport {
                    path: "a.yaml".into(),
                    outcome: FileOutcome::Synced(SyncReport::new("a")),
                },
                FileSyncReport {
                    path: "b.yaml".into(),
                    outcome: FileOutcome::Synced(failing),
                },
                FileSyncReport {
                    path: "c.yaml".into(),
                    outcome: FileOutcome::Failed("YAML error".into()),
                },
            ],
        };

        assert_eq!(report.statement_failures(), 1);
        assert_eq!(report.failed_files().count(), 1);
        assert!(!report.is_clean());
        assert!(DirectorySyncReport::default().is_clean());
    }
}
