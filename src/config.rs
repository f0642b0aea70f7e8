//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Storage configuration
    pub storage: StorageConfig,
    /// Scheduler configuration
    pub scheduler: SchedulerConfig,
    /// Authentication configuration
    pub auth: AuthConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    pub database_path: String,
}

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between assignment passes, in milliseconds
    pub interval_ms: u64,
}

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Optional static shared secret. When set, HTTP callers must present it
    /// as a bearer token. The hub treats it as opaque.
    pub token: Option<String>,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            },
            storage: StorageConfig {
                database_path: env::var("DATABASE_PATH")
                    .unwrap_or_else(|_| Self::default_database_path()),
            },
            scheduler: SchedulerConfig {
                interval_ms: env::var("SCHEDULER_INTERVAL_MS")
                    .ok()
                    .and_then(|i| i.parse().ok())
                    .unwrap_or(1000),
            },
            auth: AuthConfig {
                token: env::var("AUTH_TOKEN").ok().filter(|t| !t.is_empty()),
            },
        }
    }

    /// Default database location: `~/.ailink/hub.db`, falling back to the
    /// working directory when there is no home.
    fn default_database_path() -> String {
        if let Some(home) = env::var_os("HOME") {
            format!("{}/.ailink/hub.db", home.to_string_lossy())
        } else {
            "hub.db".to_string()
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
