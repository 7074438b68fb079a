use crate::error::DbError;
use configuration::DatabaseConfig;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{FromRow, Row};
use std::str::FromStr;
use std::time::Duration;

/// Tables owned by the migrations, in drop order.
const TABLES: [&str; 4] = ["sessions", "market_data", "users", "_sqlx_migrations"];

/// Opens a connection pool to the SQLite database named by `config.url`.
///
/// The database file is created when it does not exist yet. Foreign keys are
/// enforced on every connection.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, DbError> {
    if config.url.trim().is_empty() {
        return Err(DbError::ConnectionConfig("database.url must be set.".to_string()));
    }

    let options = SqliteConnectOptions::from_str(&config.url)
        .map_err(|e| DbError::ConnectionConfig(e.to_string()))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect_with(options)
        .await
        .map_err(DbError::Connection)?;

    tracing::debug!(url = %config.url, "Database pool opened.");
    Ok(pool)
}

/// Opens a private in-memory database.
///
/// The pool holds exactly one connection that never expires, since every new
/// `:memory:` connection would see an empty database of its own.
pub async fn connect_in_memory() -> Result<SqlitePool, DbError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|e| DbError::ConnectionConfig(e.to_string()))?
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(DbError::Connection)
}

/// Applies any pending migrations embedded from `./migrations`.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Drops every application table and re-creates the schema from scratch.
///
/// All users, sessions and submissions are lost.
pub async fn reset_database(pool: &SqlitePool) -> Result<(), DbError> {
    let mut tx = pool.begin().await.map_err(DbError::Write)?;
    for table in TABLES {
        sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
            .execute(&mut *tx)
            .await
            .map_err(DbError::Write)?;
    }
    tx.commit().await.map_err(DbError::Write)?;

    tracing::warn!("All tables dropped; re-applying migrations.");
    run_migrations(pool).await
}

/// One column as reported by SQLite's `table_info` pragma.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub not_null: bool,
    pub primary_key: bool,
}

/// Names of the user tables in the database, sorted.
pub async fn list_tables(pool: &SqlitePool) -> Result<Vec<String>, DbError> {
    let rows = sqlx::query(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(pool)
    .await
    .map_err(DbError::Read)?;

    Ok(rows.into_iter().map(|row| row.get("name")).collect())
}

/// Describes the columns of `table`. Unknown tables are `NotFound`.
pub async fn table_columns(pool: &SqlitePool, table: &str) -> Result<Vec<ColumnInfo>, DbError> {
    let columns = sqlx::query_as::<_, ColumnInfo>(
        r#"
        SELECT name, type AS data_type, "notnull" != 0 AS not_null, pk != 0 AS primary_key
        FROM pragma_table_info(?1)
        ORDER BY cid
        "#,
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(DbError::Read)?;

    if columns.is_empty() {
        return Err(DbError::NotFound);
    }
    Ok(columns)
}
