// crates/server/src/config.rs
//! Startup configuration.
//!
//! Parsed once in `main` from flags with environment fallbacks, then handed to
//! the database client and [`AppState`](crate::state::AppState). Nothing reads
//! the environment after startup.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use backoffice_core::{AggregatorOptions, LookupPolicy};
use backoffice_db::{DbConfig, SchemaName, DEFAULT_SCHEMA};
use clap::Parser;

/// Default port for the server.
pub const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Clone, Parser)]
#[command(name = "backoffice", version, about = "Back-office API server")]
pub struct Config {
    /// Postgres connection string.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Schema every query is scoped to.
    #[arg(long, env = "SUPABASE_DB_SCHEMA", default_value = DEFAULT_SCHEMA)]
    pub db_schema: SchemaName,

    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 10)]
    pub db_max_connections: u32,

    #[arg(long, env = "DB_ACQUIRE_TIMEOUT_SECS", default_value_t = 30)]
    pub db_acquire_timeout_secs: u64,

    /// Upper bound on one active-sessions aggregation.
    #[arg(long, env = "LIVE_REQUEST_DEADLINE_MS", default_value_t = 10_000)]
    pub request_deadline_ms: u64,

    /// `fail-fast` or `isolate`: how reference-lookup failures are handled.
    #[arg(long, env = "LIVE_LOOKUP_POLICY", default_value_t = LookupPolicy::FailFast)]
    pub lookup_policy: LookupPolicy,
}

impl Config {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn db(&self) -> DbConfig {
        DbConfig {
            url: self.database_url.clone(),
            schema: self.db_schema.clone(),
            max_connections: self.db_max_connections,
            acquire_timeout: Duration::from_secs(self.db_acquire_timeout_secs),
        }
    }

    pub fn aggregator(&self) -> AggregatorOptions {
        AggregatorOptions {
            policy: self.lookup_policy,
            deadline: Duration::from_millis(self.request_deadline_ms),
        }
    }
}
