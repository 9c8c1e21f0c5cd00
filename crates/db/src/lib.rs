// crates/db/src/lib.rs
//! Schema-scoped Postgres client for the back-office data store.
//!
//! Every table reference is qualified with the configured [`SchemaName`], so the
//! same binary can serve any tenant schema without touching `search_path`.

mod queries;
mod schema;

pub use schema::{SchemaName, DEFAULT_SCHEMA};

use std::str::FromStr;
use std::time::Duration;

use backoffice_core::StoreError;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::ConnectOptions;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Postgres error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Invalid schema name '{0}': expected a plain SQL identifier")]
    InvalidSchema(String),
}

impl DbError {
    /// SQLSTATE reported by the server, if any.
    pub fn code(&self) -> Option<String> {
        match self {
            DbError::Sqlx(e) => e
                .as_database_error()
                .and_then(|d| d.code())
                .map(|c| c.into_owned()),
            DbError::InvalidSchema(_) => None,
        }
    }

    /// Convert into the store-boundary error, tagging the relation queried.
    pub fn into_store_error(self, relation: &'static str) -> StoreError {
        match self {
            DbError::Sqlx(sqlx::Error::PoolTimedOut) | DbError::Sqlx(sqlx::Error::PoolClosed) => {
                StoreError::Unavailable(self.to_string())
            }
            _ => StoreError::Query {
                relation,
                code: self.code(),
                message: self.to_string(),
            },
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Connection settings for [`Database::connect`].
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub schema: SchemaName,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DbConfig {
    pub fn new(url: impl Into<String>, schema: SchemaName) -> Self {
        Self {
            url: url.into(),
            schema,
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

/// Postgres handle: a connection pool plus the schema every query is scoped to.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
    schema: SchemaName,
}

impl Database {
    /// Open a pool against `config.url`. Statements slower than five seconds are
    /// logged at `warn`.
    pub async fn connect(config: &DbConfig) -> DbResult<Self> {
        let options = PgConnectOptions::from_str(&config.url)?.log_slow_statements(
            tracing::log::LevelFilter::Warn,
            Duration::from_secs(5),
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await?;

        info!(
            schema = %config.schema,
            max_connections = config.max_connections,
            "Database pool opened"
        );
        Ok(Self::from_pool(pool, config.schema.clone()))
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool, schema: SchemaName) -> Self {
        Self { pool, schema }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn schema(&self) -> &SchemaName {
        &self.schema
    }

    /// `"schema"."table"`, safe to splice into SQL.
    pub fn table(&self, name: &str) -> String {
        self.schema.qualify(name)
    }

    /// Round-trip a trivial statement.
    pub async fn ping(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_error_has_no_code() {
        let err = DbError::Sqlx(sqlx::Error::RowNotFound);
        assert_eq!(err.code(), None);
        assert_eq!(DbError::InvalidSchema("x-y".into()).code(), None);
    }

    #[test]
    fn test_pool_timeout_maps_to_unavailable() {
        let err = DbError::Sqlx(sqlx::Error::PoolTimedOut).into_store_error("membro");
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[test]
    fn test_query_error_keeps_relation() {
        let err = DbError::Sqlx(sqlx::Error::RowNotFound).into_store_error("cp_cliente");
        assert_eq!(err.relation(), Some("cp_cliente"));
    }

    #[test]
    fn test_default_config() {
        let config = DbConfig::new("postgres://localhost/app", SchemaName::default());
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout, Duration::from_secs(30));
        assert_eq!(config.schema.as_str(), DEFAULT_SCHEMA);
    }

    #[tokio::test]
    async fn test_table_is_schema_qualified() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let db = Database::from_pool(pool, "tenant_a".parse().unwrap());
        assert_eq!(db.table("membro"), "\"tenant_a\".\"membro\"");
    }
}
