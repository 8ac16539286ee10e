//! Blocking PostgreSQL connection built on sqlx.
//!
//! pgdoc is a sequential command-line tool, so [`PgConnection`] owns a
//! current-thread tokio runtime and drives every sqlx future to completion
//! with `block_on`. The pool is capped at one connection that is opened once
//! and kept for the whole process.

use std::str::FromStr;
use std::sync::LazyLock;

use pgdoc_db::ConnectionConfig;
use regex::Regex;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Column as _, PgPool, Postgres, Row as _, TypeInfo as _};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

use crate::connection::{Connection, Row, SqlValue};
use crate::error::{CatalogError, Result};

/// Quoted identifiers, string literals, or a `$n` placeholder (group 1).
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:[^"]|"")*"|'(?:[^']|'')*'|\$(\d+)"#).expect("static regex must compile")
});

/// A live connection to PostgreSQL.
///
/// # Examples
///
/// ```no_run
/// use pgdoc_db::ConnectionConfig;
/// use pgdoc_postgres::{PgCatalog, PgConnection};
///
/// let config = ConnectionConfig::from_url("postgres://postgres@localhost/app");
/// let conn = PgConnection::connect(&config).unwrap();
/// let catalog = PgCatalog::new(&conn);
/// for schema in catalog.list_schemas().unwrap() {
///     println!("{}", schema.name);
/// }
/// ```
pub struct PgConnection {
    pool: PgPool,
    runtime: Runtime,
}

impl PgConnection {
    /// Opens the connection described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::RuntimeError`] if the runtime cannot start,
    /// [`CatalogError::DocumentError`] if `config` is incomplete, or
    /// [`CatalogError::DatabaseError`] if the server is unreachable or
    /// rejects the login.
    pub fn connect(config: &ConnectionConfig) -> Result<Self> {
        config.validate()?;
        let options = connect_options(config)?;
        let runtime = Builder::new_current_thread().enable_all().build()?;

        let pool = runtime.block_on(
            PgPoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options),
        )?;
        info!("Connected to PostgreSQL");

        Ok(Self { pool, runtime })
    }

    /// Closes the connection, waiting for the server to acknowledge.
    pub fn close(self) {
        self.runtime.block_on(self.pool.close());
    }

    /// Renders `value` as an SQL literal using the server's own quoting.
    fn literal(&self, value: &SqlValue) -> Result<String> {
        match value {
            SqlValue::Null => Ok("NULL".to_string()),
            SqlValue::Int(n) => Ok(n.to_string()),
            SqlValue::Text(_) | SqlValue::TextArray(_) => {
                let query = bind_value(sqlx::query("SELECT pg_catalog.quote_nullable($1)"), value);
                let row = self.runtime.block_on(query.fetch_one(&self.pool))?;
                Ok(row.try_get::<String, _>(0)?)
            }
        }
    }
}

impl Connection for PgConnection {
    fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        let query = params
            .iter()
            .fold(sqlx::query(sql), |query, value| bind_value(query, value));
        let rows = self.runtime.block_on(query.fetch_all(&self.pool))?;
        rows.iter().map(decode_row).collect()
    }

    /// Utility statements such as `COMMENT` cannot take bind parameters, so
    /// each value is quoted by the server and spliced in place of its `$n`.
    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<()> {
        let rendered = if params.is_empty() {
            sql.to_string()
        } else {
            let literals = params
                .iter()
                .map(|value| self.literal(value))
                .collect::<Result<Vec<_>>>()?;
            render_placeholders(sql, &literals)?
        };
        debug!(statement = %rendered, "Executing");
        self.runtime
            .block_on(sqlx::raw_sql(&rendered).execute(&self.pool))?;
        Ok(())
    }
}

fn connect_options(config: &ConnectionConfig) -> Result<PgConnectOptions> {
    if let Some(url) = &config.url {
        return Ok(PgConnectOptions::from_str(url)?);
    }

    let mut options = PgConnectOptions::new();
    if let Some(host) = &config.host {
        options = options.host(host);
    }
    if let Some(port) = config.port {
        options = options.port(port);
    }
    if let Some(user) = &config.user {
        options = options.username(user);
    }
    if let Some(password) = &config.password {
        options = options.password(password);
    }
    if let Some(dbname) = &config.dbname {
        options = options.database(dbname);
    }
    Ok(options)
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &SqlValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Text(text) => query.bind(text.clone()),
        SqlValue::Int(n) => query.bind(*n),
        SqlValue::TextArray(items) => query.bind(items.clone()),
    }
}

fn decode_row(row: &PgRow) -> Result<Row> {
    let mut values = Vec::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        let value = match column.type_info().name() {
            "TEXT" | "VARCHAR" | "NAME" | "BPCHAR" | "CHAR" => row
                .try_get::<Option<String>, _>(idx)?
                .map_or(SqlValue::Null, SqlValue::Text),
            "INT2" => row
                .try_get::<Option<i16>, _>(idx)?
                .map_or(SqlValue::Null, |n| SqlValue::Int(n.into())),
            "INT4" => row
                .try_get::<Option<i32>, _>(idx)?
                .map_or(SqlValue::Null, |n| SqlValue::Int(n.into())),
            "INT8" => row
                .try_get::<Option<i64>, _>(idx)?
                .map_or(SqlValue::Null, SqlValue::Int),
            "TEXT[]" | "VARCHAR[]" | "NAME[]" => row
                .try_get::<Option<Vec<String>>, _>(idx)?
                .map_or(SqlValue::Null, SqlValue::TextArray),
            other => {
                return Err(CatalogError::ConversionError(format!(
                    "unsupported type {other} in result column '{}'",
                    column.name()
                )));
            }
        };
        values.push(value);
    }
    Ok(Row::new(values))
}

/// Replaces each `$n` outside quotes with `literals[n - 1]`.
pub(crate) fn render_placeholders(sql: &str, literals: &[String]) -> Result<String> {
    let mut out = String::with_capacity(sql.len());
    let mut last = 0;

    for caps in PLACEHOLDER_RE.captures_iter(sql) {
        let Some(number) = caps.get(1) else {
            continue;
        };
        let literal = number
            .as_str()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| literals.get(idx))
            .ok_or_else(|| {
                CatalogError::ConversionError(format!(
                    "no value bound for placeholder ${}",
                    number.as_str()
                ))
            })?;
        // `$` sits right before the digits.
        out.push_str(&sql[last..number.start() - 1]);
        out.push_str(literal);
        last = number.end();
    }
    out.push_str(&sql[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_placeholders() {
        let sql = r#"COMMENT ON TABLE "app"."users" IS $1"#;
        let rendered = render_placeholders(sql, &["'Registered users'".to_string()]).unwrap();
        assert_eq!(rendered, r#"COMMENT ON TABLE "app"."users" IS 'Registered users'"#);
    }

    #[test]
    fn test_placeholders_inside_quotes_are_kept() {
        let sql = r#"COMMENT ON COLUMN "s"."price$1"."a""$2" IS $1"#;
        let rendered = render_placeholders(sql, &["'x'".to_string()]).unwrap();
        assert_eq!(rendered, r#"COMMENT ON COLUMN "s"."price$1"."a""$2" IS 'x'"#);

        let literal = "SELECT '$1', $2";
        let rendered = render_placeholders(literal, &["a".into(), "b".into()]).unwrap();
        assert_eq!(rendered, "SELECT '$1', b");
    }

    #[test]
    fn test_multi_digit_and_missing_placeholders() {
        let literals: Vec<String> = (1..=10).map(|n| n.to_string()).collect();
        assert_eq!(render_placeholders("$1 $10", &literals).unwrap(), "1 10");

        assert!(matches!(
            render_placeholders("IS $2", &["'x'".to_string()]),
            Err(CatalogError::ConversionError(_))
        ));
        assert!(render_placeholders("IS $0", &["'x'".to_string()]).is_err());
    }

    #[test]
    fn test_connect_options_from_parts() {
        let config = ConnectionConfig {
            host: Some("db.internal".into()),
            port: Some(6432),
            user: Some("docs".into()),
            dbname: Some("warehouse".into()),
            ..Default::default()
        };
        let options = connect_options(&config).unwrap();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6432);
        assert_eq!(options.get_username(), "docs");
        assert_eq!(options.get_database(), Some("warehouse"));
    }

    #[test]
    fn test_connect_options_from_url() {
        let config = ConnectionConfig::from_url("postgres://alice@example.com:5433/sales");
        let options = connect_options(&config).unwrap();
        assert_eq!(options.get_host(), "example.com");
        assert_eq!(options.get_port(), 5433);
        assert_eq!(options.get_database(), Some("sales"));

        let bad = ConnectionConfig::from_url("not a url");
        assert!(matches!(
            connect_options(&bad),
            Err(CatalogError::DatabaseError(_))
        ));
    }
}
