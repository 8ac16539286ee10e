//! The comment document: the editable, serializable form of a schema.
//!
//! A document carries only names and descriptions. Keys are numbered
//! (`"1. name"`, `"2. description"`, ...) so every serializer writes them in
//! the same order, which keeps diffs of edited documents stable.
//!
//! Whether a relation is a table or a view is decided by the list holding
//! it: `"3. tables"` or `"4. views"`.
//!
//! # Example
//!
//! ```
//! use pgdoc_core::{ColumnDocument, RelationDocument, SchemaDocument, from_document};
//!
//! let doc = SchemaDocument {
//!     name: "sales".into(),
//!     description: Some("Sales data".into()),
//!     tables: vec![RelationDocument {
//!         name: "orders".into(),
//!         description: None,
//!         columns: vec![ColumnDocument {
//!             name: "id".into(),
//!             description: Some("Order number".into()),
//!         }],
//!     }],
//!     views: Vec::new(),
//! };
//!
//! let schema = from_document(doc);
//! let orders = &schema.loaded_tables().unwrap()[0];
//! assert_eq!(orders.qualified_name(), "sales.orders");
//! assert_eq!(orders.loaded_columns().unwrap()[0].qualified_name(), "sales.orders.id");
//! ```

use serde::{Deserialize, Serialize};

use crate::source::CatalogSource;
use crate::types::{Column, Relation, RelationKind, Schema};

/// Document form of a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(rename = "1. name")]
    pub name: String,
    #[serde(rename = "2. description", default)]
    pub description: Option<String>,
    #[serde(rename = "3. tables", default)]
    pub tables: Vec<RelationDocument>,
    #[serde(rename = "4. views", default)]
    pub views: Vec<RelationDocument>,
}

/// Document form of a table or view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDocument {
    #[serde(rename = "1. name")]
    pub name: String,
    #[serde(rename = "2. description", default)]
    pub description: Option<String>,
    #[serde(rename = "3. columns", default)]
    pub columns: Vec<ColumnDocument>,
}

/// Document form of a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDocument {
    #[serde(rename = "1. name")]
    pub name: String,
    #[serde(rename = "2. description", default)]
    pub description: Option<String>,
}

impl SchemaDocument {
    /// Total number of relations in the document.
    pub fn relation_count(&self) -> usize {
        self.tables.len() + self.views.len()
    }
}

/// Projects a schema graph onto its document form.
///
/// Tables, views and their columns are loaded through `source` when the
/// graph does not hold them yet. Types, nullability, constraints and indexes
/// are not part of the document.
pub fn to_document<S: CatalogSource + ?Sized>(
    schema: &Schema,
    source: &S,
) -> Result<SchemaDocument, S::Error> {
    let tables = schema
        .tables(source)?
        .iter()
        .map(|table| relation_document(table, source))
        .collect::<Result<Vec<_>, _>>()?;
    let views = schema
        .views(source)?
        .iter()
        .map(|view| relation_document(view, source))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SchemaDocument {
        name: schema.name.clone(),
        description: schema.description.clone(),
        tables,
        views,
    })
}

fn relation_document<S: CatalogSource + ?Sized>(
    relation: &Relation,
    source: &S,
) -> Result<RelationDocument, S::Error> {
    let columns = relation
        .columns(source)?
        .iter()
        .map(|column| ColumnDocument {
            name: column.name.clone(),
            description: column.description.clone(),
        })
        .collect();

    Ok(RelationDocument {
        name: relation.name.clone(),
        description: relation.description.clone(),
        columns,
    })
}

/// Rebuilds a detached schema graph from a document.
///
/// Every collection of the result is loaded (possibly empty), so walking it
/// never reaches a catalog source.
pub fn from_document(document: SchemaDocument) -> Schema {
    let schema_name = document.name;
    let tables = document
        .tables
        .into_iter()
        .map(|rel| detached_relation(RelationKind::Table, &schema_name, rel))
        .collect();
    let views = document
        .views
        .into_iter()
        .map(|rel| detached_relation(RelationKind::View, &schema_name, rel))
        .collect();

    Schema::new(schema_name, document.description)
        .with_tables(tables)
        .with_views(views)
}

fn detached_relation(kind: RelationKind, schema: &str, doc: RelationDocument) -> Relation {
    let columns = doc
        .columns
        .into_iter()
        .map(|col| Column {
            description: col.description,
            ..Column::new(schema, doc.name.as_str(), col.name)
        })
        .collect();

    Relation::of_kind(kind, schema, doc.name, doc.description).with_columns(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Constraint, Index};

    /// A small live-like catalog: two tables and a view.
    struct FixtureSource;

    impl CatalogSource for FixtureSource {
        type Error = String;

        fn load_tables(&self, schema: &str) -> Result<Vec<Relation>, String> {
            Ok(vec![
                Relation::table(schema, "customers", Some("People who buy".into())),
                Relation::table(schema, "orders", None),
            ])
        }

        fn load_views(&self, schema: &str) -> Result<Vec<Relation>, String> {
            Ok(vec![Relation::view(schema, "open_orders", Some("Unshipped".into()))])
        }

        fn load_columns(&self, schema: &str, relation: &str) -> Result<Vec<Column>, String> {
            let mut id = Column::new(schema, relation, "id").with_type("integer");
            id.numeric_precision = Some(32);
            let note = Column::new(schema, relation, "note")
                .with_type("text")
                .with_description("Free text: with a colon");
            Ok(vec![id, note])
        }

        fn load_constraints(&self, _: &str, _: &str) -> Result<Vec<Constraint>, String> {
            Ok(vec![Constraint::new("pk", "PRIMARY KEY (id)")])
        }

        fn load_indexes(&self, _: &str, _: &str) -> Result<Vec<Index>, String> {
            Ok(Vec::new())
        }
    }

    /// Source for graphs that must already be fully loaded.
    struct NoCatalog;

    impl CatalogSource for NoCatalog {
        type Error = String;

        fn load_tables(&self, schema: &str) -> Result<Vec<Relation>, String> {
            Err(format!("tables of {schema} not loaded"))
        }

        fn load_views(&self, schema: &str) -> Result<Vec<Relation>, String> {
            Err(format!("views of {schema} not loaded"))
        }

        fn load_columns(&self, schema: &str, relation: &str) -> Result<Vec<Column>, String> {
            Err(format!("columns of {schema}.{relation} not loaded"))
        }

        fn load_constraints(&self, _: &str, _: &str) -> Result<Vec<Constraint>, String> {
            Err("constraints not loaded".into())
        }

        fn load_indexes(&self, _: &str, _: &str) -> Result<Vec<Index>, String> {
            Err("indexes not loaded".into())
        }
    }

    #[test]
    fn test_to_document_shape() {
        let schema = Schema::new("shop", Some("Shop schema".into()));
        let doc = to_document(&schema, &FixtureSource).unwrap();

        assert_eq!(doc.name, "shop");
        assert_eq!(doc.description.as_deref(), Some("Shop schema"));
        assert_eq!(doc.tables.len(), 2);
        assert_eq!(doc.views.len(), 1);
        assert_eq!(doc.tables[0].name, "customers");
        assert_eq!(doc.tables[1].description, None);
        assert_eq!(doc.tables[0].columns[1].name, "note");
        assert_eq!(doc.relation_count(), 3);
    }

    #[test]
    fn test_round_trip_keeps_names_and_descriptions() {
        let live = Schema::new("shop", Some("Shop schema".into()));
        let doc = to_document(&live, &FixtureSource).unwrap();

        let detached = from_document(doc.clone());
        // the detached graph is complete: projecting it needs no catalog
        let again = to_document(&detached, &NoCatalog).unwrap();
        assert_eq!(again, doc);

        let tables = detached.loaded_tables().unwrap();
        assert!(tables.iter().all(Relation::is_table));
        let views = detached.loaded_views().unwrap();
        assert!(views.iter().all(|v| v.kind() == RelationKind::View));
        let note = &tables[0].loaded_columns().unwrap()[1];
        assert_eq!(note.qualified_name(), "shop.customers.note");
        assert_eq!(note.description.as_deref(), Some("Free text: with a colon"));
        // catalog-only fields are not carried by the document
        assert!(note.data_type.is_empty());
    }

    #[test]
    fn test_yaml_keys_are_numbered_and_ordered() {
        let doc = to_document(&Schema::new("shop", None), &FixtureSource).unwrap();
        let yaml = serde_yaml::to_string(&doc).unwrap();

        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        let keys: Vec<&str> = value
            .as_mapping()
            .unwrap()
            .keys()
            .map(|k| k.as_str().unwrap())
            .collect();
        assert_eq!(keys, vec!["1. name", "2. description", "3. tables", "4. views"]);
        assert!(value["2. description"].is_null());

        let table_keys: Vec<&str> = value["3. tables"][0]
            .as_mapping()
            .unwrap()
            .keys()
            .map(|k| k.as_str().unwrap())
            .collect();
        assert_eq!(table_keys, vec!["1. name", "2. description", "3. columns"]);
        // block style, one key per line
        assert!(yaml.lines().count() > 10);
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let schema = Schema::new("shop", None);
        let first = serde_yaml::to_string(&to_document(&schema, &FixtureSource).unwrap()).unwrap();
        let second = serde_yaml::to_string(&to_document(&schema, &FixtureSource).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_keys_default_to_empty() {
        let yaml = "1. name: bare\n3. tables:\n- 1. name: t\n";
        let doc: SchemaDocument = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(doc.description, None);
        assert!(doc.views.is_empty());
        assert!(doc.tables[0].columns.is_empty());

        let schema = from_document(doc);
        let table = &schema.loaded_tables().unwrap()[0];
        // an absent columns key still yields a loaded, empty collection
        assert_eq!(table.loaded_columns(), Some(&[][..]));
    }
}
