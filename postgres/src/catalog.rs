//! Reads schemas, relations, columns, constraints and indexes from the
//! PostgreSQL system catalog.
//!
//! Every statement casts its result columns to `text`, `int4` or `text[]`
//! so rows decode the same way on every server version. Relations are
//! resolved with `format('%I.%I', schema, name)::regclass`, which quotes
//! both parts and therefore handles mixed-case and unusual names.

use pgdoc_core::{
    CatalogSource, Column, Constraint, Index, Nullability, Relation, RelationKind, Schema,
};
use tracing::debug;

use crate::connection::{Connection, Row, SqlValue};
use crate::error::{CatalogError, Result};

const LIST_SCHEMAS_SQL: &str = "\
SELECT ns.nspname::text,
       pg_catalog.obj_description(ns.oid, 'pg_namespace')::text
FROM pg_catalog.pg_namespace ns
WHERE ns.nspname <> 'information_schema'
  AND ns.nspname NOT LIKE 'pg_%'
ORDER BY ns.nspname";

const FIND_SCHEMA_SQL: &str = "\
SELECT ns.nspname::text,
       pg_catalog.obj_description(ns.oid, 'pg_namespace')::text
FROM pg_catalog.pg_namespace ns
WHERE ns.nspname = $1";

const RELATIONS_SQL: &str = "\
SELECT t.table_name::text,
       pg_catalog.obj_description(
           format('%I.%I', t.table_schema, t.table_name)::regclass, 'pg_class')::text
FROM information_schema.tables t
WHERE t.table_schema = $1 AND t.table_type = $2
ORDER BY t.table_name";

const COLUMNS_SQL: &str = "\
SELECT c.column_name::text,
       pg_catalog.col_description(
           format('%I.%I', c.table_schema, c.table_name)::regclass,
           c.ordinal_position::int4)::text,
       c.column_default::text,
       c.is_nullable::text,
       c.data_type::text,
       c.character_maximum_length::int4,
       c.numeric_precision::int4
FROM information_schema.columns c
WHERE c.table_schema = $1 AND c.table_name = $2
ORDER BY c.ordinal_position";

const CONSTRAINTS_SQL: &str = "\
SELECT r.conname::text,
       pg_catalog.pg_get_constraintdef(r.oid, true)::text
FROM pg_catalog.pg_constraint r
WHERE r.conrelid = format('%I.%I', $1::text, $2::text)::regclass
ORDER BY r.conname";

const INDEXES_SQL: &str = "\
SELECT i.relname::text,
       am.amname::text,
       ARRAY(
           SELECT pg_catalog.pg_get_indexdef(idx.indexrelid, k + 1, true)
           FROM generate_subscripts(idx.indkey, 1) AS k
           ORDER BY k
       )::text[]
FROM pg_catalog.pg_index idx
JOIN pg_catalog.pg_class i ON i.oid = idx.indexrelid
JOIN pg_catalog.pg_am am ON am.oid = i.relam
WHERE idx.indrelid = format('%I.%I', $1::text, $2::text)::regclass
ORDER BY i.relname";

/// Catalog reader over a [`Connection`].
///
/// Entry points are [`list_schemas`](Self::list_schemas) and
/// [`find_schema`](Self::find_schema); the returned [`Schema`]s load their
/// children lazily by passing this reader back as their [`CatalogSource`].
pub struct PgCatalog<'c, C: Connection + ?Sized> {
    conn: &'c C,
}

impl<'c, C: Connection + ?Sized> PgCatalog<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    /// Returns the underlying connection.
    pub fn connection(&self) -> &'c C {
        self.conn
    }

    /// Lists user schemas ordered by name.
    ///
    /// `information_schema` and every `pg_*` schema are left out.
    pub fn list_schemas(&self) -> Result<Vec<Schema>> {
        let rows = self.conn.query(LIST_SCHEMAS_SQL, &[])?;
        let schemas = rows.iter().map(schema_from_row).collect::<Result<Vec<_>>>()?;
        debug!(count = schemas.len(), "Listed schemas");
        Ok(schemas)
    }

    /// Looks up a schema by exact name. Returns `Ok(None)` if it does not
    /// exist.
    pub fn find_schema(&self, name: &str) -> Result<Option<Schema>> {
        let rows = self.conn.query(FIND_SCHEMA_SQL, &[SqlValue::from(name)])?;
        rows.first().map(schema_from_row).transpose()
    }

    fn load_relations(&self, schema: &str, kind: RelationKind) -> Result<Vec<Relation>> {
        let rows = self.conn.query(
            RELATIONS_SQL,
            &[schema.into(), kind.catalog_table_type().into()],
        )?;
        rows.iter()
            .map(|row| {
                Ok(Relation::of_kind(
                    kind,
                    schema,
                    row.required_text(0)?,
                    row.text(1)?,
                ))
            })
            .collect()
    }
}

impl<C: Connection + ?Sized> CatalogSource for PgCatalog<'_, C> {
    type Error = CatalogError;

    fn load_tables(&self, schema: &str) -> Result<Vec<Relation>> {
        self.load_relations(schema, RelationKind::Table)
    }

    fn load_views(&self, schema: &str) -> Result<Vec<Relation>> {
        self.load_relations(schema, RelationKind::View)
    }

    fn load_columns(&self, schema: &str, relation: &str) -> Result<Vec<Column>> {
        let rows = self
            .conn
            .query(COLUMNS_SQL, &[schema.into(), relation.into()])?;
        rows.iter()
            .map(|row| {
                Ok(Column {
                    description: row.text(1)?,
                    default: row.text(2)?,
                    nullability: Nullability::from_catalog(row.text(3)?.as_deref()),
                    data_type: row.required_text(4)?,
                    character_maximum_length: row.int(5)?,
                    numeric_precision: row.int(6)?,
                    ..Column::new(schema, relation, row.required_text(0)?)
                })
            })
            .collect()
    }

    fn load_constraints(&self, schema: &str, table: &str) -> Result<Vec<Constraint>> {
        let rows = self
            .conn
            .query(CONSTRAINTS_SQL, &[schema.into(), table.into()])?;
        rows.iter()
            .map(|row| Ok(Constraint::new(row.required_text(0)?, row.required_text(1)?)))
            .collect()
    }

    fn load_indexes(&self, schema: &str, table: &str) -> Result<Vec<Index>> {
        let rows = self.conn.query(INDEXES_SQL, &[schema.into(), table.into()])?;
        rows.iter()
            .map(|row| {
                Ok(Index {
                    name: row.required_text(0)?,
                    index_type: row.required_text(1)?,
                    fields: row.text_array(2)?,
                })
            })
            .collect()
    }
}

fn schema_from_row(row: &Row) -> Result<Schema> {
    Ok(Schema::new(row.required_text(0)?, row.text(1)?))
}
