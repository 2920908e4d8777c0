use std::fmt;
use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgSslMode};

/// Log output format selected with `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Service configuration sourced from the environment. Every variable is
/// optional; unparsable values fall back to their defaults.
#[derive(Clone)]
pub struct Config {
    pub bind_address: String,
    pub server_port: u16,
    pub db_host: String,
    pub db_port: u16,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
    pub db_ssl_mode: String,
    pub db_max_connections: u32,
    /// Bound on the startup connection probe.
    pub db_connect_timeout: Duration,
    /// Ceiling on the processing time of a single request.
    pub request_timeout: Duration,
    /// Time in-flight requests get to finish after a shutdown signal.
    pub shutdown_grace: Duration,
    pub log_level: String,
    pub log_format: LogFormat,
    pub docs_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let number = |key: &str, default: u64, max: u64| {
            lookup(key)
                .and_then(|value| value.trim().parse::<u64>().ok())
                .filter(|value| (1..=max).contains(value))
                .unwrap_or(default)
        };
        let port = |key: &str, default: u16| {
            lookup(key)
                .and_then(|value| value.trim().parse::<u16>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(default)
        };

        let log_format = match text("LOG_FORMAT", "text").to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Self {
            bind_address: text("BIND_ADDRESS", "0.0.0.0"),
            server_port: port("SERVER_PORT", 8080),
            db_host: text("DB_HOST", "localhost"),
            db_port: port("DB_PORT", 5432),
            db_user: text("DB_USER", "postgres"),
            db_password: text("DB_PASSWORD", "postgres"),
            db_name: text("DB_NAME", "subscriptions"),
            db_ssl_mode: text("DB_SSL_MODE", "disable"),
            db_max_connections: number("DB_MAX_CONNECTIONS", 5, 1_000) as u32,
            db_connect_timeout: Duration::from_secs(number("DB_CONNECT_TIMEOUT_SECS", 5, 300)),
            request_timeout: Duration::from_secs(number("REQUEST_TIMEOUT_SECS", 60, 3_600)),
            shutdown_grace: Duration::from_secs(number("SHUTDOWN_GRACE_SECS", 10, 3_600)),
            log_level: text("LOG_LEVEL", "info").to_ascii_lowercase(),
            log_format,
            docs_dir: PathBuf::from(text("DOCS_DIR", "docs")),
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.bind_address, self.server_port).parse()
    }

    /// libpq keyword/value connection string with the password masked, for logs.
    pub fn redacted_dsn(&self) -> String {
        format!(
            "host={} port={} user={} password=<redacted> dbname={} sslmode={}",
            self.db_host, self.db_port, self.db_user, self.db_name, self.db_ssl_mode
        )
    }

    pub fn ssl_mode(&self) -> PgSslMode {
        PgSslMode::from_str(&self.db_ssl_mode).unwrap_or_else(|_| {
            tracing::warn!(
                ssl_mode = %self.db_ssl_mode,
                "unknown DB_SSL_MODE; falling back to disable"
            );
            PgSslMode::Disable
        })
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .username(&self.db_user)
            .password(&self.db_password)
            .database(&self.db_name)
            .ssl_mode(self.ssl_mode())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("server_port", &self.server_port)
            .field("db_host", &self.db_host)
            .field("db_port", &self.db_port)
            .field("db_user", &self.db_user)
            .field("db_password", &"<redacted>")
            .field("db_name", &self.db_name)
            .field("db_ssl_mode", &self.db_ssl_mode)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_connect_timeout", &self.db_connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("shutdown_grace", &self.shutdown_grace)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("docs_dir", &self.docs_dir)
            .finish()
    }
}
