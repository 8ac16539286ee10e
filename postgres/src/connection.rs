//! The statement boundary between pgdoc and a database.
//!
//! [`Connection`] is the only way catalog reads and comment statements reach
//! PostgreSQL. [`PgConnection`](crate::PgConnection) implements it against a
//! live server; tests implement it with scripted rows.
//!
//! Placeholders are written `$1`, `$2`, ... as in PostgreSQL itself.

use crate::error::{CatalogError, Result};

/// Executes SQL with positional parameters.
pub trait Connection {
    /// Runs a row-returning statement.
    fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>>;

    /// Runs a statement that returns no rows. Each call commits on its own.
    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<()>;
}

impl<C: Connection + ?Sized> Connection for &C {
    fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        (**self).query(sql, params)
    }

    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<()> {
        (**self).execute(sql, params)
    }
}

/// A parameter or result value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Null,
    Text(String),
    Int(i64),
    TextArray(Vec<String>),
}

impl SqlValue {
    fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Text(_) => "text",
            SqlValue::Int(_) => "integer",
            SqlValue::TextArray(_) => "text[]",
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

/// One result row, addressed by column position.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    values: Vec<SqlValue>,
}

impl Row {
    pub fn new(values: Vec<SqlValue>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the raw value at `idx`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ConversionError`] if the row is shorter.
    pub fn get(&self, idx: usize) -> Result<&SqlValue> {
        self.values.get(idx).ok_or_else(|| {
            CatalogError::ConversionError(format!(
                "column {idx} out of range for row of {} values",
                self.values.len()
            ))
        })
    }

    /// Reads a nullable text column.
    pub fn text(&self, idx: usize) -> Result<Option<String>> {
        match self.get(idx)? {
            SqlValue::Null => Ok(None),
            SqlValue::Text(text) => Ok(Some(text.clone())),
            other => Err(mismatch(idx, "text", other)),
        }
    }

    /// Reads a text column that must not be null.
    pub fn required_text(&self, idx: usize) -> Result<String> {
        self.text(idx)?.ok_or_else(|| {
            CatalogError::ConversionError(format!("column {idx}: unexpected null"))
        })
    }

    /// Reads a nullable integer column.
    pub fn int(&self, idx: usize) -> Result<Option<i64>> {
        match self.get(idx)? {
            SqlValue::Null => Ok(None),
            SqlValue::Int(n) => Ok(Some(*n)),
            other => Err(mismatch(idx, "integer", other)),
        }
    }

    /// Reads a text array column. Null reads as empty.
    pub fn text_array(&self, idx: usize) -> Result<Vec<String>> {
        match self.get(idx)? {
            SqlValue::Null => Ok(Vec::new()),
            SqlValue::TextArray(items) => Ok(items.clone()),
            other => Err(mismatch(idx, "text[]", other)),
        }
    }
}

impl From<Vec<SqlValue>> for Row {
    fn from(values: Vec<SqlValue>) -> Self {
        Self::new(values)
    }
}

fn mismatch(idx: usize, expected: &str, found: &SqlValue) -> CatalogError {
    CatalogError::ConversionError(format!(
        "column {idx}: expected {expected}, found {}",
        found.type_name()
    ))
}
