//! Chat server configuration
//!
//! Values are layered: built-in defaults, then an optional TOML file named by
//! `LINKUP_CONFIG`, then individual environment variables. The result is
//! validated once before the server starts.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming an optional TOML config file
pub const CONFIG_PATH_VAR: &str = "LINKUP_CONFIG";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_PRESENCE_DEBOUNCE_MS: u64 = 100;
const DEFAULT_FRIENDSHIP_TTL_SECS: u64 = 30;
const DEFAULT_FRIENDSHIP_CAPACITY: usize = 256;
const DEFAULT_OUTBOUND_QUEUE: usize = 256;
const DEFAULT_PING_INTERVAL_SECS: u64 = 25;

/// Runtime configuration of the chat server
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub host: String,
    pub port: u16,
    /// Shared HMAC secret for bearer tokens
    pub jwt_secret: String,
    /// Postgres connection string; the in-memory store is used when absent
    pub database_url: Option<String>,
    /// Coalescing window for the online-users list broadcast
    pub presence_debounce: Duration,
    pub friendship_cache_ttl: Duration,
    pub friendship_cache_capacity: usize,
    /// Bound on each connection's outbound event queue
    pub outbound_queue: usize,
    pub ping_interval: Duration,
}

impl ChatConfig {
    /// Create a new ChatConfigBuilder
    pub fn builder() -> ChatConfigBuilder {
        ChatConfigBuilder::default()
    }

    /// Load from `LINKUP_CONFIG` and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var(CONFIG_PATH_VAR).ok().map(PathBuf::from);
        Self::from_sources(file.as_deref(), |key| std::env::var(key).ok())
    }

    /// Layer a config file and an environment lookup over the defaults
    pub fn from_sources<F>(file: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(path) = file {
            builder = builder.apply_file(FileConfig::read(path)?);
        }

        if let Some(port) = env("SERVER_PORT") {
            builder = builder.port(parse_var("SERVER_PORT", &port)?);
        }
        if let Some(secret) = env("JWT_SECRET") {
            builder = builder.jwt_secret(secret);
        }
        if let Some(url) = env("DATABASE_URL").filter(|url| !url.trim().is_empty()) {
            builder = builder.database_url(url);
        }
        if let Some(ms) = env("PRESENCE_DEBOUNCE_MS") {
            builder = builder.presence_debounce(Duration::from_millis(parse_var(
                "PRESENCE_DEBOUNCE_MS",
                &ms,
            )?));
        }
        if let Some(secs) = env("FRIENDSHIP_CACHE_TTL_SECS") {
            builder = builder.friendship_cache_ttl(Duration::from_secs(parse_var(
                "FRIENDSHIP_CACHE_TTL_SECS",
                &secs,
            )?));
        }

        builder.build()
    }

    /// Socket address string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingValue("JWT_SECRET"));
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingValue("host"));
        }
        if self.friendship_cache_capacity == 0 {
            return Err(ConfigError::invalid("friendship_cache_capacity", "0"));
        }
        if self.outbound_queue == 0 {
            return Err(ConfigError::invalid("outbound_queue", "0"));
        }
        if self.ping_interval.is_zero() {
            return Err(ConfigError::invalid("ping_interval_secs", "0"));
        }
        Ok(())
    }
}

/// Builder for ChatConfig
#[derive(Debug, Clone)]
pub struct ChatConfigBuilder {
    host: String,
    port: u16,
    jwt_secret: Option<String>,
    database_url: Option<String>,
    presence_debounce: Duration,
    friendship_cache_ttl: Duration,
    friendship_cache_capacity: usize,
    outbound_queue: usize,
    ping_interval: Duration,
}

impl Default for ChatConfigBuilder {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            jwt_secret: None,
            database_url: None,
            presence_debounce: Duration::from_millis(DEFAULT_PRESENCE_DEBOUNCE_MS),
            friendship_cache_ttl: Duration::from_secs(DEFAULT_FRIENDSHIP_TTL_SECS),
            friendship_cache_capacity: DEFAULT_FRIENDSHIP_CAPACITY,
            outbound_queue: DEFAULT_OUTBOUND_QUEUE,
            ping_interval: Duration::from_secs(DEFAULT_PING_INTERVAL_SECS),
        }
    }
}

impl ChatConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = Some(secret.into());
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn presence_debounce(mut self, window: Duration) -> Self {
        self.presence_debounce = window;
        self
    }

    pub fn friendship_cache_ttl(mut self, ttl: Duration) -> Self {
        self.friendship_cache_ttl = ttl;
        self
    }

    pub fn friendship_cache_capacity(mut self, capacity: usize) -> Self {
        self.friendship_cache_capacity = capacity;
        self
    }

    pub fn outbound_queue(mut self, size: usize) -> Self {
        self.outbound_queue = size;
        self
    }

    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    fn apply_file(mut self, file: FileConfig) -> Self {
        if let Some(host) = file.host {
            self.host = host;
        }
        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(secret) = file.jwt_secret {
            self.jwt_secret = Some(secret);
        }
        if let Some(url) = file.database_url {
            self.database_url = Some(url);
        }
        if let Some(ms) = file.presence_debounce_ms {
            self.presence_debounce = Duration::from_millis(ms);
        }
        if let Some(secs) = file.friendship_cache_ttl_secs {
            self.friendship_cache_ttl = Duration::from_secs(secs);
        }
        if let Some(capacity) = file.friendship_cache_capacity {
            self.friendship_cache_capacity = capacity;
        }
        if let Some(size) = file.outbound_queue {
            self.outbound_queue = size;
        }
        if let Some(secs) = file.ping_interval_secs {
            self.ping_interval = Duration::from_secs(secs);
        }
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<ChatConfig, ConfigError> {
        let config = ChatConfig {
            host: self.host,
            port: self.port,
            jwt_secret: self.jwt_secret.ok_or(ConfigError::MissingValue("JWT_SECRET"))?,
            database_url: self.database_url,
            presence_debounce: self.presence_debounce,
            friendship_cache_ttl: self.friendship_cache_ttl,
            friendship_cache_capacity: self.friendship_cache_capacity,
            outbound_queue: self.outbound_queue,
            ping_interval: self.ping_interval,
        };
        config.validate()?;
        Ok(config)
    }
}

/// On-disk shape of the TOML config file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    jwt_secret: Option<String>,
    database_url: Option<String>,
    presence_debounce_ms: Option<u64>,
    friendship_cache_ttl_secs: Option<u64>,
    friendship_cache_capacity: Option<usize>,
    outbound_queue: Option<usize>,
    ping_interval_secs: Option<u64>,
}

impl FileConfig {
    fn read(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&raw)?)
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::invalid(key, raw))
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    fn invalid(key: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key,
            value: value.into(),
        }
    }
}
