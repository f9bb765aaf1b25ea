use std::env;
use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://graphs.db?mode=rwc";
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {name} '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Server settings, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `DATABASE_URL`
    pub database_url: String,
    /// `GRAPH_SERVER_BIND`
    pub bind_addr: SocketAddr,
    /// `GRAPH_DB_MAX_CONNECTIONS`
    pub max_connections: u32,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let bind = lookup("GRAPH_SERVER_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind.parse::<SocketAddr>().map_err(|err| {
            ConfigError::Invalid {
                name: "GRAPH_SERVER_BIND",
                value: bind.clone(),
                reason: err.to_string(),
            }
        })?;

        let max_connections = match lookup("GRAPH_DB_MAX_CONNECTIONS") {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        name: "GRAPH_DB_MAX_CONNECTIONS",
                        value: raw,
                        reason: "must be at least 1".to_string(),
                    });
                }
                Ok(count) => count,
                Err(err) => {
                    return Err(ConfigError::Invalid {
                        name: "GRAPH_DB_MAX_CONNECTIONS",
                        value: raw,
                        reason: err.to_string(),
                    });
                }
            },
        };

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
        })
    }
}

/// Installs the global `tracing` subscriber, honouring `RUST_LOG`.
///
/// Later calls are ignored.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dag_service=info,tower_http=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
