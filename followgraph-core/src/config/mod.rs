//! Configuration management for followgraph
//!
//! Environment-based configuration with TOML file support, defaults, and
//! validation.

use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

mod error;

pub use error::ConfigError;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Edge store configuration
    pub store: StoreConfig,

    /// Collection paging
    pub pagination: PaginationConfig,

    /// Bulk admission
    pub admission: AdmissionConfig,

    /// Credential registry
    pub auth: AuthConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_address: SocketAddr,

    /// Host used in actor ids and collection links
    pub hostname: String,

    /// Public base URL; derived from `hostname` when unset
    pub base_url: Option<String>,

    /// Graceful shutdown timeout
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

/// Which edge store backend to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "sqlite" => Ok(StoreBackend::Sqlite),
            other => Err(ConfigError::InvalidValue {
                name: "store backend".to_string(),
                message: format!("expected memory or sqlite, got {}", other),
            }),
        }
    }
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// SQLite database file (sqlite backend only)
    pub database_path: PathBuf,

    /// Maximum pooled connections
    pub pool_size: u32,

    /// How long a writer waits on a locked database
    #[serde(with = "humantime_serde")]
    pub busy_timeout: Duration,
}

/// Pagination configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Page size when the request omits `count`
    pub default_count: usize,
}

/// Admission queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Maximum in-flight operations for bulk drivers
    pub concurrency_limit: usize,
}

/// A client credential provisioned at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedClient {
    pub client_id: String,
    pub client_secret: String,
}

/// Argon2 cost parameters for account passwords
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordHashConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

/// Credential registry configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub clients: Vec<SeedClient>,
    pub password_hash: PasswordHashConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include target module
    pub with_target: bool,
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder and serve `/metrics`
    pub enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 4815)),
            hostname: "localhost".to_string(),
            base_url: None,
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    /// Base URL used for collection ids and links
    pub fn public_base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.hostname, self.bind_address.port()),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database_path: PathBuf::from("./data/followgraph.db"),
            pool_size: 8,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_count: crate::core_pagination::DEFAULT_COUNT,
        }
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self { concurrency_limit: 10 }
    }
}

impl Default for PasswordHashConfig {
    fn default() -> Self {
        // argon2 crate defaults (19 MiB, 2 passes, 1 lane)
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_target: true,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn parse_env<T>(name: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                name: name.to_string(),
                message: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables follow the pattern: FOLLOWGRAPH_<SECTION>_<KEY>
    /// Example: FOLLOWGRAPH_SERVER_BIND_ADDRESS=0.0.0.0:4815
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay any FOLLOWGRAPH_* variables onto this configuration
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        // Server config
        if let Some(addr) = parse_env("FOLLOWGRAPH_SERVER_BIND_ADDRESS")? {
            self.server.bind_address = addr;
        }
        if let Ok(hostname) = env::var("FOLLOWGRAPH_SERVER_HOSTNAME") {
            self.server.hostname = hostname;
        }
        if let Ok(base_url) = env::var("FOLLOWGRAPH_SERVER_BASE_URL") {
            self.server.base_url = Some(base_url);
        }

        // Store config
        if let Some(backend) = parse_env("FOLLOWGRAPH_STORE_BACKEND")? {
            self.store.backend = backend;
        }
        if let Ok(path) = env::var("FOLLOWGRAPH_STORE_DATABASE_PATH") {
            self.store.database_path = PathBuf::from(path);
        }
        if let Some(size) = parse_env("FOLLOWGRAPH_STORE_POOL_SIZE")? {
            self.store.pool_size = size;
        }

        // Pagination and admission
        if let Some(count) = parse_env("FOLLOWGRAPH_PAGINATION_DEFAULT_COUNT")? {
            self.pagination.default_count = count;
        }
        if let Some(limit) = parse_env("FOLLOWGRAPH_ADMISSION_CONCURRENCY_LIMIT")? {
            self.admission.concurrency_limit = limit;
        }

        // Logging config
        if let Ok(level) = env::var("FOLLOWGRAPH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = parse_env("FOLLOWGRAPH_LOG_JSON")? {
            self.logging.json_format = json;
        }

        // Metrics config
        if let Some(enabled) = parse_env("FOLLOWGRAPH_METRICS_ENABLED")? {
            self.metrics.enabled = enabled;
        }

        Ok(())
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.hostname.is_empty() {
            return Err(ConfigError::ValidationFailed("hostname must not be empty".to_string()));
        }

        if self.store.pool_size == 0 {
            return Err(ConfigError::ValidationFailed(
                "pool_size must be greater than 0".to_string(),
            ));
        }

        if self.pagination.default_count == 0 {
            return Err(ConfigError::ValidationFailed(
                "default_count must be greater than 0".to_string(),
            ));
        }

        if self.admission.concurrency_limit == 0 {
            return Err(ConfigError::ValidationFailed(
                "concurrency_limit must be greater than 0".to_string(),
            ));
        }

        let hash = &self.auth.password_hash;
        if hash.iterations == 0 || hash.parallelism == 0 || hash.memory_kib < 8 * hash.parallelism {
            return Err(ConfigError::ValidationFailed(
                "password_hash parameters out of range".to_string(),
            ));
        }

        if let Err(e) = self.logging.level.parse::<crate::logging::LogLevel>() {
            return Err(ConfigError::ValidationFailed(e.to_string()));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pagination.default_count, 20);
        assert_eq!(config.server.public_base_url(), "http://localhost:4815");
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.store.pool_size = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.pagination.default_count = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.admission.concurrency_limit = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.auth.password_hash.iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_level_validation() {
        let mut config = Config::default();

        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "debug".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("followgraph.toml");

        let mut config = Config::default();
        config.store.backend = StoreBackend::Sqlite;
        config.server.base_url = Some("https://social.example/".to_string());
        config.auth.clients.push(SeedClient {
            client_id: "app".to_string(),
            client_secret: "secret".to_string(),
        });
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.store.backend, StoreBackend::Sqlite);
        assert_eq!(loaded.auth.clients, config.auth.clients);
        assert_eq!(loaded.server.public_base_url(), "https://social.example");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[store]\nbackend = \"sqlite\"\n").unwrap();
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.store.pool_size, 8);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_file_errors_name_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let err = Config::from_file(&missing).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("absent.toml"));

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[server\n").unwrap();
        assert!(matches!(
            Config::from_file(&broken),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_parse_env_values() {
        // Variable names are unique to this test; nothing else reads them.
        env::set_var("FOLLOWGRAPH_TEST_PARSE_OK", "64");
        env::set_var("FOLLOWGRAPH_TEST_PARSE_BAD", "lots");
        env::remove_var("FOLLOWGRAPH_TEST_PARSE_UNSET");

        assert_eq!(parse_env::<u32>("FOLLOWGRAPH_TEST_PARSE_OK").unwrap(), Some(64));
        assert_eq!(parse_env::<u32>("FOLLOWGRAPH_TEST_PARSE_UNSET").unwrap(), None);
        match parse_env::<u32>("FOLLOWGRAPH_TEST_PARSE_BAD") {
            Err(ConfigError::InvalidValue { name, .. }) => {
                assert_eq!(name, "FOLLOWGRAPH_TEST_PARSE_BAD")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("SQLite".parse::<StoreBackend>().unwrap(), StoreBackend::Sqlite);
        assert!("redis".parse::<StoreBackend>().is_err());
    }
}
