//! Service configuration read from the environment.
mod dependencies;

pub use dependencies::Dependencies;

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use answerboard_ledger::votes::DEFAULT_MAX_RETRIES;
use tracing::info;

use crate::errors::ServerError;

const DEFAULT_SERVER_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
const DEFAULT_SERVER_PORT: u16 = 8080;
const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_NOTIFICATION_QUEUE_CAPACITY: usize = 1024;

/// Where questions, answers, ledgers and notifications are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres { database_url: String },
    /// Process-local storage, lost on restart.
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub storage: StorageBackend,
    pub database_max_connections: u32,
    pub notification_queue_capacity: usize,
    pub vote_max_retries: usize,
}

impl Config {
    /// Reads the configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SERVER_HOST`: Address to bind (default: 0.0.0.0)
    /// - `SERVER_PORT`: Port to bind (default: 8080)
    /// - `STORAGE_BACKEND`: "postgres" or "memory" (default: postgres)
    /// - `DATABASE_URL`: PostgreSQL connection string, required for postgres
    /// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
    /// - `NOTIFICATION_QUEUE_CAPACITY`: Pending notifications kept before dropping (default: 1024)
    /// - `VOTE_MAX_RETRIES`: Retries after a contended write (default: 5)
    ///
    /// # Errors
    ///
    /// * `ServerError::Config` - A variable is set to an unparsable value, or
    ///   `DATABASE_URL` is missing for the postgres backend
    pub fn from_env() -> Result<Self, ServerError> {
        let host = parse_var("SERVER_HOST", DEFAULT_SERVER_HOST)?;
        let port = parse_var("SERVER_PORT", DEFAULT_SERVER_PORT)?;

        let storage = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .trim()
            .to_lowercase()
            .as_str()
        {
            "postgres" | "postgresql" => StorageBackend::Postgres {
                database_url: env::var("DATABASE_URL").map_err(|_| {
                    ServerError::config("DATABASE_URL must be set when STORAGE_BACKEND is postgres")
                })?,
            },
            "memory" => StorageBackend::Memory,
            other => {
                return Err(ServerError::config(format!(
                    "STORAGE_BACKEND must be 'postgres' or 'memory', got '{other}'"
                )));
            }
        };

        let config = Self {
            host,
            port,
            storage,
            database_max_connections: parse_var(
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_DATABASE_MAX_CONNECTIONS,
            )?,
            notification_queue_capacity: parse_var(
                "NOTIFICATION_QUEUE_CAPACITY",
                DEFAULT_NOTIFICATION_QUEUE_CAPACITY,
            )?,
            vote_max_retries: parse_var("VOTE_MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
        };

        info!(
            host = %config.host,
            port = config.port,
            storage = config.storage.name(),
            database_max_connections = config.database_max_connections,
            notification_queue_capacity = config.notification_queue_capacity,
            vote_max_retries = config.vote_max_retries,
            "Configuration loaded"
        );

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl StorageBackend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Postgres { .. } => "postgres",
            Self::Memory => "memory",
        }
    }
}

/// Parses `name` if set, otherwise returns `default`.
fn parse_var<T>(name: &str, default: T) -> Result<T, ServerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ServerError::config(format!("invalid {name} '{raw}': {e}"))),
        Err(_) => Ok(default),
    }
}
