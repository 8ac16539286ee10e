//! Comment documents on disk.
//!
//! Each schema lives in its own `<dir>/<schema>.yaml` file. Rendered
//! documentation is written next to it as `<dir>/<schema>.md`.
//!
//! # Example
//!
//! ```no_run
//! use pgdoc_db::DocumentDir;
//!
//! let dir = DocumentDir::new("docs/comments");
//! for path in dir.collect_documents().unwrap() {
//!     let doc = pgdoc_db::read_document(&path).unwrap();
//!     println!("{}: {} relations", doc.name, doc.relation_count());
//! }
//! ```

use std::ffi::OsStr;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use pgdoc_core::SchemaDocument;
use tracing::{debug, warn};

use crate::error::{DocumentError, Result};

/// Extension of comment document files.
pub const DOCUMENT_EXTENSION: &str = "yaml";

/// Extension of rendered documentation files.
pub const MARKDOWN_EXTENSION: &str = "md";

/// A directory holding one comment document per schema.
#[derive(Debug, Clone)]
pub struct DocumentDir {
    root: PathBuf,
}

impl DocumentDir {
    /// Wraps `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns `<root>/<schema>.yaml`.
    pub fn document_path(&self, schema: &str) -> PathBuf {
        self.root.join(format!("{schema}.{DOCUMENT_EXTENSION}"))
    }

    /// Returns `<root>/<schema>.md`.
    pub fn markdown_path(&self, schema: &str) -> PathBuf {
        self.root.join(format!("{schema}.{MARKDOWN_EXTENSION}"))
    }

    /// Writes `document` as block-style YAML, replacing any previous file.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::IoError`] if the directory or file cannot be
    /// written, or [`DocumentError::YamlError`] if serialization fails.
    pub fn write_document(&self, document: &SchemaDocument) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)?;
        let path = self.document_path(&document.name);
        let file = fs::File::create(&path)?;
        let mut writer = BufWriter::new(file);
        serde_yaml::to_writer(&mut writer, document)?;
        writer.flush()?;
        debug!(path = %path.display(), "Wrote comment document");
        Ok(path)
    }

    /// Writes rendered Markdown for `schema`.
    pub fn write_markdown(&self, schema: &str, markdown: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)?;
        let path = self.markdown_path(schema);
        fs::write(&path, markdown)?;
        debug!(path = %path.display(), "Wrote schema documentation");
        Ok(path)
    }

    /// Reads the document of `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::DocumentNotFound`] if `<root>/<schema>.yaml`
    /// is not a file.
    pub fn read_document(&self, schema: &str) -> Result<SchemaDocument> {
        let path = self.document_path(schema);
        if !path.is_file() {
            return Err(DocumentError::DocumentNotFound(path));
        }
        read_document(&path)
    }

    /// Returns every document below the directory, see
    /// [`collect_document_paths`].
    pub fn collect_documents(&self) -> Result<Vec<PathBuf>> {
        collect_document_paths(&self.root)
    }
}

/// Parses a comment document file.
///
/// # Errors
///
/// Returns [`DocumentError::IoError`] if the file cannot be opened, or
/// [`DocumentError::YamlError`] if it is not a valid document.
pub fn read_document(path: impl AsRef<Path>) -> Result<SchemaDocument> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    let document = serde_yaml::from_reader(reader)?;
    Ok(document)
}

/// Finds every `*.yaml` file below `dir`, recursively.
///
/// Directories are walked depth-first with entries sorted by name, so the
/// returned order is stable across runs. Symbolic links to directories are
/// not followed. A subdirectory that cannot be listed is logged and left
/// out.
///
/// # Errors
///
/// Returns [`DocumentError::IoError`] if `dir` itself cannot be listed.
pub fn collect_document_paths(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    let entries = sorted_entries(dir.as_ref())?;
    walk(entries, &mut paths);
    Ok(paths)
}

/// Lists `dir` as `(path, is_dir)` pairs sorted by path. `is_dir` comes from
/// the entry's own file type, so a symlink never counts as a directory.
fn sorted_entries(dir: &Path) -> std::io::Result<Vec<(PathBuf, bool)>> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| {
            let entry = entry?;
            Ok((entry.path(), entry.file_type()?.is_dir()))
        })
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

fn walk(entries: Vec<(PathBuf, bool)>, paths: &mut Vec<PathBuf>) {
    for (path, is_dir) in entries {
        if is_dir {
            match sorted_entries(&path) {
                Ok(children) => walk(children, paths),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Skipping unreadable directory");
                }
            }
        } else if path.extension() == Some(OsStr::new(DOCUMENT_EXTENSION)) {
            paths.push(path);
        }
    }
}
