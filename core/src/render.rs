//! Markdown documentation for a schema.
//!
//! Unlike the comment document, the rendered page shows everything the
//! catalog knows: column types, nullability, defaults, key flags and
//! indexes. A schema is first flattened into a [`SchemaPage`], which is
//! then rendered through a Jinja template. The built-in layout is
//! [`DEFAULT_TEMPLATE`]; [`Renderer::with_template`] swaps in another one.
//!
//! Templates see the page as `schema` and may use the `cell` filter, which
//! keeps free text inside a single Markdown table cell.

use std::borrow::Cow;

use minijinja::{Environment, context};
use serde::Serialize;
use thiserror::Error;

use crate::source::CatalogSource;
use crate::types::{Relation, Schema};

/// Page layout used when no template is given.
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/schema.md");

const PAGE_TEMPLATE: &str = "schema.md";

/// A template could not be compiled or rendered.
#[derive(Debug, Error)]
#[error("template error: {0}")]
pub struct RenderError(#[from] minijinja::Error);

/// Everything a documentation template can show about one schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaPage {
    pub name: String,
    pub description: Option<String>,
    pub tables: Vec<TablePage>,
    pub views: Vec<ViewPage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TablePage {
    pub name: String,
    pub description: Option<String>,
    pub columns: Vec<ColumnRow>,
    pub indexes: Vec<IndexRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewPage {
    pub name: String,
    pub description: Option<String>,
    pub columns: Vec<ColumnRow>,
}

/// One column with its display-ready type, nullability and default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnRow {
    pub name: String,
    pub data_type: String,
    /// `yes` or `no`.
    pub nullable: String,
    /// Default expression, or `none`.
    pub default: String,
    pub primary_key: bool,
    pub unique: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexRow {
    pub name: String,
    /// Access method, e.g. `btree`.
    pub method: String,
    pub fields: Vec<String>,
}

/// Flattens `schema` into a [`SchemaPage`].
///
/// Collections not yet loaded are read through `source`.
pub fn schema_page<S: CatalogSource + ?Sized>(
    schema: &Schema,
    source: &S,
) -> Result<SchemaPage, S::Error> {
    let tables = schema
        .tables(source)?
        .iter()
        .map(|table| table_page(table, source))
        .collect::<Result<Vec<_>, _>>()?;

    let views = schema
        .views(source)?
        .iter()
        .map(|view| {
            Ok(ViewPage {
                name: view.name.clone(),
                description: view.description.clone(),
                columns: column_rows(view, source)?,
            })
        })
        .collect::<Result<Vec<_>, S::Error>>()?;

    Ok(SchemaPage {
        name: schema.name.clone(),
        description: schema.description.clone(),
        tables,
        views,
    })
}

fn table_page<S: CatalogSource + ?Sized>(
    table: &Relation,
    source: &S,
) -> Result<TablePage, S::Error> {
    let indexes = table
        .indexes(source)?
        .iter()
        .map(|index| IndexRow {
            name: index.name.clone(),
            method: index.index_type.clone(),
            fields: index.fields.clone(),
        })
        .collect();

    Ok(TablePage {
        name: table.name.clone(),
        description: table.description.clone(),
        columns: column_rows(table, source)?,
        indexes,
    })
}

fn column_rows<S: CatalogSource + ?Sized>(
    relation: &Relation,
    source: &S,
) -> Result<Vec<ColumnRow>, S::Error> {
    relation
        .columns(source)?
        .iter()
        .map(|column| {
            Ok(ColumnRow {
                name: column.name.clone(),
                data_type: column.formatted_type(),
                nullable: column.formatted_nullable().to_string(),
                default: column.formatted_default().to_string(),
                primary_key: relation.is_primary_key(&column.name, source)?,
                unique: relation.is_unique(&column.name, source)?,
                description: column.description.clone(),
            })
        })
        .collect()
}

/// Renders [`SchemaPage`]s through a compiled template.
pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    /// Uses [`DEFAULT_TEMPLATE`].
    pub fn new() -> Result<Self, RenderError> {
        Self::with_template(DEFAULT_TEMPLATE)
    }

    /// Compiles `template` in place of the built-in layout.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the template has a syntax error.
    pub fn with_template(template: impl Into<Cow<'static, str>>) -> Result<Self, RenderError> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.add_filter("cell", cell);
        env.add_template_owned(PAGE_TEMPLATE, template)?;
        Ok(Self { env })
    }

    /// Renders one page.
    pub fn render(&self, page: &SchemaPage) -> Result<String, RenderError> {
        let template = self.env.get_template(PAGE_TEMPLATE)?;
        Ok(template.render(context! { schema => page })?)
    }
}

/// Keeps free text inside a single table cell.
fn cell(text: Option<String>) -> String {
    text.unwrap_or_default()
        .replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace('\n', "<br>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Column, Constraint, Index, Nullability};

    struct ShopSource;

    impl CatalogSource for ShopSource {
        type Error = String;

        fn load_tables(&self, schema: &str) -> Result<Vec<Relation>, String> {
            Ok(vec![Relation::table(schema, "orders", Some("Placed orders".into()))])
        }

        fn load_views(&self, schema: &str) -> Result<Vec<Relation>, String> {
            Ok(vec![Relation::view(schema, "recent", None)])
        }

        fn load_columns(&self, schema: &str, relation: &str) -> Result<Vec<Column>, String> {
            let mut id = Column::new(schema, relation, "id").with_type("integer");
            id.numeric_precision = Some(32);
            id.nullability = Nullability::NotNull;
            let mut code = Column::new(schema, relation, "code")
                .with_type("character varying")
                .with_description("Line one\nline | two");
            code.character_maximum_length = Some(12);
            Ok(vec![id, code])
        }

        fn load_constraints(&self, _: &str, _: &str) -> Result<Vec<Constraint>, String> {
            Ok(vec![
                Constraint::new("orders_pkey", "PRIMARY KEY (id)"),
                Constraint::new("orders_code_key", "UNIQUE (code)"),
            ])
        }

        fn load_indexes(&self, _: &str, _: &str) -> Result<Vec<Index>, String> {
            Ok(vec![Index {
                name: "orders_pkey".into(),
                index_type: "btree".into(),
                fields: vec!["id".into()],
            }])
        }
    }

    fn render(schema: &Schema) -> String {
        let page = schema_page(schema, &ShopSource).unwrap();
        Renderer::new().unwrap().render(&page).unwrap()
    }

    #[test]
    fn test_schema_page_flags_and_types() {
        let page = schema_page(&Schema::new("shop", None), &ShopSource).unwrap();
        let id = &page.tables[0].columns[0];
        assert_eq!(id.data_type, "integer(32)");
        assert_eq!(id.nullable, "no");
        assert_eq!(id.default, "none");
        assert!(id.primary_key && !id.unique);
        assert!(page.tables[0].columns[1].unique);
        assert_eq!(page.tables[0].indexes[0].method, "btree");
        // views carry no key flags
        assert!(!page.views[0].columns[0].primary_key);
    }

    #[test]
    fn test_render_markdown_sections() {
        let md = render(&Schema::new("shop", Some("Shop schema".into())));

        assert!(md.starts_with("# Schema `shop`\n\nShop schema\n\n"));
        assert!(md.contains("## Tables\n\n### `orders`\n\nPlaced orders\n\n"));
        assert!(md.contains("| `id` | integer(32) | no | none | yes | no |  |\n"));
        assert!(md.contains(
            "| `code` | character varying(12) | yes | none | no | yes | Line one<br>line \\| two |"
        ));
        assert!(md.contains("|-------------|\n| `id`"));
        assert!(md.contains("| `orders_pkey` | btree | id |\n\n## Views"));
        assert!(md.contains("## Views\n\n### `recent`\n\n| Column | Type | Description |"));
        assert!(md.ends_with("| `code` | character varying(12) | Line one<br>line \\| two |\n\n"));
    }

    #[test]
    fn test_render_empty_schema() {
        let schema = Schema::new("empty", None)
            .with_tables(Vec::new())
            .with_views(Vec::new());
        assert_eq!(render(&schema), "# Schema `empty`\n\n");
    }

    #[test]
    fn test_custom_template() {
        let renderer = Renderer::with_template(
            "{{ schema.name }}:{% for t in schema.tables %} {{ t.name }}{% endfor %}.",
        )
        .unwrap();
        let page = schema_page(&Schema::new("shop", None), &ShopSource).unwrap();
        assert_eq!(renderer.render(&page).unwrap(), "shop: orders.");
    }

    #[test]
    fn test_broken_template_is_rejected() {
        let err = Renderer::with_template("{% for t in schema.tables %}").err().unwrap();
        assert!(err.to_string().starts_with("template error"), "{err}");
    }
}
