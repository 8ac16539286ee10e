//! Catalog entity definitions.
//!
//! These types mirror the PostgreSQL catalog objects that carry comments:
//! schemas, relations (tables and views) and columns. Tables additionally
//! expose their constraints and indexes, which are read-only and only used
//! for documentation.
//!
//! Child collections are loaded lazily through a
//! [`CatalogSource`](crate::CatalogSource) and cached inside the entity, so a
//! graph reflects the catalog as it was when each collection was first read.

use std::cell::OnceCell;

use crate::source::{CatalogSource, load_once};

/// A namespace grouping tables and views.
///
/// # Examples
///
/// ```
/// use pgdoc_core::{Relation, Schema};
///
/// let schema = Schema::new("sales", Some("Sales data".into()))
///     .with_tables(vec![Relation::table("sales", "orders", None)])
///     .with_views(Vec::new());
///
/// assert_eq!(schema.loaded_tables().unwrap()[0].name, "orders");
/// assert!(schema.loaded_views().unwrap().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// Schema name, the identity key.
    pub name: String,
    /// Comment attached to the schema.
    pub description: Option<String>,
    tables: OnceCell<Vec<Relation>>,
    views: OnceCell<Vec<Relation>>,
}

impl Schema {
    /// Creates a schema whose tables and views are not loaded yet.
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
            tables: OnceCell::new(),
            views: OnceCell::new(),
        }
    }

    /// Marks `tables` as the loaded table collection.
    pub fn with_tables(mut self, tables: Vec<Relation>) -> Self {
        self.tables = OnceCell::from(tables);
        self
    }

    /// Marks `views` as the loaded view collection.
    pub fn with_views(mut self, views: Vec<Relation>) -> Self {
        self.views = OnceCell::from(views);
        self
    }

    /// Returns the base tables, reading them from `source` on first access.
    pub fn tables<S: CatalogSource + ?Sized>(&self, source: &S) -> Result<&[Relation], S::Error> {
        load_once(&self.tables, || source.load_tables(&self.name))
    }

    /// Returns the views, reading them from `source` on first access.
    pub fn views<S: CatalogSource + ?Sized>(&self, source: &S) -> Result<&[Relation], S::Error> {
        load_once(&self.views, || source.load_views(&self.name))
    }

    /// Returns the tables if they have been loaded.
    pub fn loaded_tables(&self) -> Option<&[Relation]> {
        self.tables.get().map(Vec::as_slice)
    }

    /// Returns the views if they have been loaded.
    pub fn loaded_views(&self) -> Option<&[Relation]> {
        self.views.get().map(Vec::as_slice)
    }
}

/// Discriminates tables from views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// A base table (`table_type = 'BASE TABLE'`).
    Table,
    /// A view (`table_type = 'VIEW'`).
    View,
}

impl RelationKind {
    /// Value of `information_schema.tables.table_type` for this kind.
    pub fn catalog_table_type(self) -> &'static str {
        match self {
            RelationKind::Table => "BASE TABLE",
            RelationKind::View => "VIEW",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum RelationDetail {
    Table {
        constraints: OnceCell<Vec<Constraint>>,
        indexes: OnceCell<Vec<Index>>,
    },
    View,
}

/// A table or view inside a schema.
///
/// Only tables carry constraints and indexes; asking a view for them yields
/// an empty slice without touching the catalog.
///
/// # Examples
///
/// ```
/// use pgdoc_core::{Column, Relation, RelationKind};
///
/// let view = Relation::view("sales", "monthly_totals", None)
///     .with_columns(vec![Column::new("sales", "monthly_totals", "month")]);
///
/// assert_eq!(view.kind(), RelationKind::View);
/// assert_eq!(view.qualified_name(), "sales.monthly_totals");
/// assert_eq!(view.loaded_columns().unwrap().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    /// Name of the owning schema.
    pub schema: String,
    /// Relation name, unique within its schema and kind.
    pub name: String,
    /// Comment attached to the relation.
    pub description: Option<String>,
    columns: OnceCell<Vec<Column>>,
    detail: RelationDetail,
}

impl Relation {
    /// Creates a table with no collections loaded.
    pub fn table(
        schema: impl Into<String>,
        name: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            description,
            columns: OnceCell::new(),
            detail: RelationDetail::Table {
                constraints: OnceCell::new(),
                indexes: OnceCell::new(),
            },
        }
    }

    /// Creates a view with no columns loaded.
    pub fn view(
        schema: impl Into<String>,
        name: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            description,
            columns: OnceCell::new(),
            detail: RelationDetail::View,
        }
    }

    /// Creates a relation of the given kind.
    pub fn of_kind(
        kind: RelationKind,
        schema: impl Into<String>,
        name: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        match kind {
            RelationKind::Table => Self::table(schema, name, description),
            RelationKind::View => Self::view(schema, name, description),
        }
    }

    /// Marks `columns` as the loaded column collection.
    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = OnceCell::from(columns);
        self
    }

    /// Returns whether this is a table or a view.
    pub fn kind(&self) -> RelationKind {
        match self.detail {
            RelationDetail::Table { .. } => RelationKind::Table,
            RelationDetail::View => RelationKind::View,
        }
    }

    /// Returns `true` for tables.
    pub fn is_table(&self) -> bool {
        self.kind() == RelationKind::Table
    }

    /// Returns `schema.name`.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Returns the columns, reading them from `source` on first access.
    pub fn columns<S: CatalogSource + ?Sized>(&self, source: &S) -> Result<&[Column], S::Error> {
        load_once(&self.columns, || source.load_columns(&self.schema, &self.name))
    }

    /// Returns the columns if they have been loaded.
    pub fn loaded_columns(&self) -> Option<&[Column]> {
        self.columns.get().map(Vec::as_slice)
    }

    /// Returns the table constraints. Views always return an empty slice.
    pub fn constraints<S: CatalogSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<&[Constraint], S::Error> {
        match &self.detail {
            RelationDetail::Table { constraints, .. } => {
                load_once(constraints, || source.load_constraints(&self.schema, &self.name))
            }
            RelationDetail::View => Ok(&[]),
        }
    }

    /// Returns the table indexes. Views always return an empty slice.
    pub fn indexes<S: CatalogSource + ?Sized>(&self, source: &S) -> Result<&[Index], S::Error> {
        match &self.detail {
            RelationDetail::Table { indexes, .. } => {
                load_once(indexes, || source.load_indexes(&self.schema, &self.name))
            }
            RelationDetail::View => Ok(&[]),
        }
    }

    /// Returns `true` when a constraint reads exactly `PRIMARY KEY (<column>)`.
    ///
    /// Multi-column keys never match a single column.
    pub fn is_primary_key<S: CatalogSource + ?Sized>(
        &self,
        column: &str,
        source: &S,
    ) -> Result<bool, S::Error> {
        Ok(self
            .constraints(source)?
            .iter()
            .any(|c| c.is_primary_key_on(column)))
    }

    /// Returns `true` when a constraint reads exactly `UNIQUE (<column>)`.
    pub fn is_unique<S: CatalogSource + ?Sized>(
        &self,
        column: &str,
        source: &S,
    ) -> Result<bool, S::Error> {
        Ok(self.constraints(source)?.iter().any(|c| c.is_unique_on(column)))
    }
}

/// Catalog nullability of a column, parsed from `is_nullable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Nullability {
    /// `is_nullable = 'YES'`
    Nullable,
    /// `is_nullable = 'NO'`
    NotNull,
    /// Not read from the catalog (document-sourced columns) or unrecognized.
    #[default]
    Unknown,
}

impl Nullability {
    /// Parses the catalog's `YES`/`NO` text.
    ///
    /// ```
    /// use pgdoc_core::Nullability;
    ///
    /// assert_eq!(Nullability::from_catalog(Some("NO")), Nullability::NotNull);
    /// assert_eq!(Nullability::from_catalog(Some("YES")), Nullability::Nullable);
    /// assert_eq!(Nullability::from_catalog(None), Nullability::Unknown);
    /// ```
    pub fn from_catalog(text: Option<&str>) -> Self {
        match text {
            Some("YES") => Nullability::Nullable,
            Some("NO") => Nullability::NotNull,
            _ => Nullability::Unknown,
        }
    }

    /// Returns `false` only for columns known to be `NOT NULL`.
    pub fn allows_null(self) -> bool {
        self != Nullability::NotNull
    }
}

/// A column of a table or view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Column {
    /// Name of the owning schema.
    pub schema: String,
    /// Name of the owning relation.
    pub table: String,
    /// Column name.
    pub name: String,
    /// Comment attached to the column.
    pub description: Option<String>,
    /// Default expression text, if any.
    pub default: Option<String>,
    /// Catalog nullability.
    pub nullability: Nullability,
    /// Raw catalog type name (`information_schema.columns.data_type`).
    pub data_type: String,
    /// Declared length for character types.
    pub character_maximum_length: Option<i64>,
    /// Declared or implied precision for numeric types.
    pub numeric_precision: Option<i64>,
}

impl Column {
    /// Creates a column with only its identity set.
    pub fn new(
        schema: impl Into<String>,
        table: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Sets the raw catalog type name.
    pub fn with_type(mut self, data_type: &str) -> Self {
        self.data_type = data_type.to_string();
        self
    }

    /// Returns `schema.table.column`.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}.{}", self.schema, self.table, self.name)
    }

    /// Renders the catalog type for documentation.
    ///
    /// `character varying` with a known length becomes `character varying(N)`;
    /// `integer` and `double precision` carry their numeric precision; every
    /// other type is returned unchanged.
    ///
    /// ```
    /// use pgdoc_core::Column;
    ///
    /// let mut col = Column::new("s", "t", "code").with_type("character varying");
    /// col.character_maximum_length = Some(255);
    /// assert_eq!(col.formatted_type(), "character varying(255)");
    ///
    /// let mut id = Column::new("s", "t", "id").with_type("integer");
    /// id.numeric_precision = Some(32);
    /// assert_eq!(id.formatted_type(), "integer(32)");
    ///
    /// assert_eq!(Column::new("s", "t", "body").with_type("text").formatted_type(), "text");
    /// ```
    pub fn formatted_type(&self) -> String {
        let size = match self.data_type.as_str() {
            "character varying" => self.character_maximum_length,
            "integer" | "double precision" => self.numeric_precision,
            _ => None,
        };
        match size {
            Some(n) => format!("{}({n})", self.data_type),
            None => self.data_type.clone(),
        }
    }

    /// Returns the default expression, or `none`.
    pub fn formatted_default(&self) -> &str {
        self.default.as_deref().unwrap_or("none")
    }

    /// Returns `no` for `NOT NULL` columns, `yes` otherwise.
    pub fn formatted_nullable(&self) -> &'static str {
        if self.nullability.allows_null() {
            "yes"
        } else {
            "no"
        }
    }
}

/// A table constraint as rendered by `pg_get_constraintdef`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    /// Constraint name.
    pub name: String,
    /// Definition text, e.g. `PRIMARY KEY (id)`.
    pub definition: String,
}

impl Constraint {
    /// Creates a constraint.
    pub fn new(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definition: definition.into(),
        }
    }

    /// Exact textual match against `PRIMARY KEY (<column>)`.
    pub fn is_primary_key_on(&self, column: &str) -> bool {
        self.definition == format!("PRIMARY KEY ({column})")
    }

    /// Exact textual match against `UNIQUE (<column>)`.
    pub fn is_unique_on(&self, column: &str) -> bool {
        self.definition == format!("UNIQUE ({column})")
    }
}

/// An index on a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    /// Index name.
    pub name: String,
    /// Access method (`btree`, `hash`, `gin`, ...).
    pub index_type: String,
    /// Indexed expressions in key order.
    pub fields: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Source that counts calls and serves fixed collections.
    #[derive(Default)]
    struct CountingSource {
        calls: Cell<usize>,
        constraints: Vec<Constraint>,
    }

    impl CatalogSource for CountingSource {
        type Error = String;

        fn load_tables(&self, schema: &str) -> Result<Vec<Relation>, String> {
            self.calls.set(self.calls.get() + 1);
            Ok(vec![
                Relation::table(schema, "a", None),
                Relation::table(schema, "b", None),
            ])
        }

        fn load_views(&self, schema: &str) -> Result<Vec<Relation>, String> {
            self.calls.set(self.calls.get() + 1);
            Ok(vec![Relation::view(schema, "v", None)])
        }

        fn load_columns(&self, schema: &str, relation: &str) -> Result<Vec<Column>, String> {
            self.calls.set(self.calls.get() + 1);
            Ok(vec![
                Column::new(schema, relation, "id"),
                Column::new(schema, relation, "name"),
            ])
        }

        fn load_constraints(&self, _: &str, _: &str) -> Result<Vec<Constraint>, String> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.constraints.clone())
        }

        fn load_indexes(&self, _: &str, _: &str) -> Result<Vec<Index>, String> {
            self.calls.set(self.calls.get() + 1);
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_schema_collections_are_memoized() {
        let source = CountingSource::default();
        let schema = Schema::new("app", None);

        assert_eq!(schema.tables(&source).unwrap().len(), 2);
        assert_eq!(schema.tables(&source).unwrap().len(), 2);
        assert_eq!(schema.views(&source).unwrap().len(), 1);
        assert_eq!(schema.views(&source).unwrap().len(), 1);
        assert_eq!(source.calls.get(), 2);
    }

    #[test]
    fn test_preloaded_collections_skip_the_source() {
        let source = CountingSource::default();
        let schema = Schema::new("app", None)
            .with_tables(vec![Relation::table("app", "t", None).with_columns(Vec::new())])
            .with_views(Vec::new());

        let tables = schema.tables(&source).unwrap();
        assert_eq!(tables.len(), 1);
        assert!(tables[0].columns(&source).unwrap().is_empty());
        assert!(schema.views(&source).unwrap().is_empty());
        assert_eq!(source.calls.get(), 0);
    }

    #[test]
    fn test_views_never_report_constraints() {
        let source = CountingSource {
            constraints: vec![Constraint::new("pk", "PRIMARY KEY (id)")],
            ..Default::default()
        };
        let view = Relation::view("app", "v", None);

        assert!(view.constraints(&source).unwrap().is_empty());
        assert!(view.indexes(&source).unwrap().is_empty());
        assert!(!view.is_primary_key("id", &source).unwrap());
        assert!(!view.is_unique("id", &source).unwrap());
        assert_eq!(source.calls.get(), 0);
    }

    #[test]
    fn test_single_column_primary_key() {
        let source = CountingSource {
            constraints: vec![
                Constraint::new("t_pkey", "PRIMARY KEY (id)"),
                Constraint::new("t_name_key", "UNIQUE (name)"),
            ],
            ..Default::default()
        };
        let table = Relation::table("app", "t", None);

        assert!(table.is_primary_key("id", &source).unwrap());
        assert!(!table.is_primary_key("name", &source).unwrap());
        assert!(table.is_unique("name", &source).unwrap());
        assert!(!table.is_unique("id", &source).unwrap());
        // constraints fetched once for all four checks
        assert_eq!(source.calls.get(), 1);
    }

    #[test]
    fn test_multi_column_primary_key_matches_no_column() {
        let source = CountingSource {
            constraints: vec![Constraint::new("t_pkey", "PRIMARY KEY (a, b)")],
            ..Default::default()
        };
        let table = Relation::table("app", "t", None);

        assert!(!table.is_primary_key("a", &source).unwrap());
        assert!(!table.is_primary_key("b", &source).unwrap());
    }

    #[test]
    fn test_formatted_type_rules() {
        let mut varchar = Column::new("s", "t", "c").with_type("character varying");
        assert_eq!(varchar.formatted_type(), "character varying");
        varchar.character_maximum_length = Some(255);
        assert_eq!(varchar.formatted_type(), "character varying(255)");

        let mut double = Column::new("s", "t", "c").with_type("double precision");
        double.numeric_precision = Some(53);
        assert_eq!(double.formatted_type(), "double precision(53)");

        let mut numeric = Column::new("s", "t", "c").with_type("numeric");
        numeric.numeric_precision = Some(10);
        assert_eq!(numeric.formatted_type(), "numeric");

        let text = Column::new("s", "t", "c").with_type("text");
        assert_eq!(text.formatted_type(), "text");
    }

    #[test]
    fn test_formatted_default_and_nullable() {
        let mut col = Column::new("s", "t", "c");
        assert_eq!(col.formatted_default(), "none");
        assert_eq!(col.formatted_nullable(), "yes");

        col.default = Some("now()".into());
        col.nullability = Nullability::from_catalog(Some("NO"));
        assert_eq!(col.formatted_default(), "now()");
        assert_eq!(col.formatted_nullable(), "no");
    }

    #[test]
    fn test_qualified_names() {
        let table = Relation::table("app", "users", None);
        let column = Column::new("app", "users", "email");
        assert_eq!(table.qualified_name(), "app.users");
        assert_eq!(column.qualified_name(), "app.users.email");
    }

    #[test]
    fn test_views_have_no_table_metadata() {
        let view = Relation::view("app", "v", None);
        let source = CountingSource::default();
        assert_eq!(view.kind(), RelationKind::View);
        assert!(view.constraints(&source).unwrap().is_empty());
        assert!(view.indexes(&source).unwrap().is_empty());
    }
}
