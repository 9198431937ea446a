//! Configuration types for debrid-tracker

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

/// Debrid API settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DebridConfig {
    /// Bearer credential for the debrid API (None = adding torrents is disabled)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the REST API (default: "https://api.real-debrid.com/rest/1.0")
    #[serde(default = "default_debrid_base_url")]
    pub base_url: String,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_debrid_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// Host label stored on newly submitted torrents (default: "real-debrid.com")
    #[serde(default = "default_debrid_host")]
    pub host: String,
}

impl Default for DebridConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_debrid_base_url(),
            timeout: default_debrid_timeout(),
            host: default_debrid_host(),
        }
    }
}

/// Mirror (rclone HTTP server) settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Base URL of the mirror service (default: "http://rclone:8080")
    #[serde(default = "default_mirror_base_url")]
    pub base_url: String,

    /// Directory under the base URL holding one folder per torrent (default: "torrents")
    #[serde(default = "default_mirror_root")]
    pub root: String,

    /// Timeout for the availability probe (default: 5 seconds)
    #[serde(default = "default_probe_timeout", with = "duration_serde")]
    pub probe_timeout: Duration,

    /// Timeout for directory listings (default: 10 seconds)
    #[serde(default = "default_listing_timeout", with = "duration_serde")]
    pub listing_timeout: Duration,

    /// Timeout for establishing a stream (default: 30 seconds)
    #[serde(default = "default_stream_timeout", with = "duration_serde")]
    pub stream_timeout: Duration,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            base_url: default_mirror_base_url(),
            root: default_mirror_root(),
            probe_timeout: default_probe_timeout(),
            listing_timeout: default_listing_timeout(),
            stream_timeout: default_stream_timeout(),
        }
    }
}

/// Fixed-delay retry configuration for rate-limited calls
///
/// The same delay is slept between every pair of attempts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one (default: 10)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between attempts (default: 5 seconds)
    #[serde(default = "default_retry_delay", with = "duration_serde")]
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay: default_retry_delay(),
        }
    }
}

/// Reconciliation loop settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Pause between sweeps (default: 15 seconds)
    #[serde(default = "default_reconcile_interval", with = "duration_serde")]
    pub interval: Duration,

    /// Retry policy for `selectFiles` when the debrid API answers 429
    #[serde(default)]
    pub select_files_retry: RetryConfig,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            interval: default_reconcile_interval(),
            select_files_retry: RetryConfig::default(),
        }
    }
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Database path (default: "./torrents.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// API and external server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["http://localhost:5173"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Main configuration for the tracker
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Debrid API access
    #[serde(default)]
    pub debrid: DebridConfig,

    /// Mirror service access
    #[serde(default)]
    pub mirror: MirrorConfig,

    /// Reconciliation loop behavior
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    /// Data storage
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// API server
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Build a configuration from process environment variables.
    ///
    /// Unset variables keep their defaults. See [`Config::from_lookup`] for
    /// the recognised names.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Recognised keys:
    /// - `REAL_DEBRID_API_KEY`, `REAL_DEBRID_BASE_URL`
    /// - `MIRROR_BASE_URL`, `MIRROR_ROOT`
    /// - `DATABASE_PATH`
    /// - `BIND_ADDRESS`, `CORS_ORIGINS` (comma separated)
    /// - `RECONCILE_INTERVAL_SECS`, `SELECT_FILES_MAX_ATTEMPTS`, `SELECT_FILES_RETRY_DELAY_SECS`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        config.debrid.api_key = get("REAL_DEBRID_API_KEY");
        if let Some(base_url) = get("REAL_DEBRID_BASE_URL") {
            config.debrid.base_url = base_url;
        }
        if let Some(base_url) = get("MIRROR_BASE_URL") {
            config.mirror.base_url = base_url;
        }
        if let Some(root) = get("MIRROR_ROOT") {
            config.mirror.root = root;
        }
        if let Some(path) = get("DATABASE_PATH") {
            config.persistence.database_path = PathBuf::from(path);
        }
        if let Some(addr) = get("BIND_ADDRESS") {
            config.server.api.bind_address = parse_value("BIND_ADDRESS", &addr)?;
        }
        if let Some(origins) = get("CORS_ORIGINS") {
            config.server.api.cors_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        if let Some(secs) = get("RECONCILE_INTERVAL_SECS") {
            config.reconcile.interval =
                Duration::from_secs(parse_value("RECONCILE_INTERVAL_SECS", &secs)?);
        }
        if let Some(attempts) = get("SELECT_FILES_MAX_ATTEMPTS") {
            config.reconcile.select_files_retry.max_attempts =
                parse_value("SELECT_FILES_MAX_ATTEMPTS", &attempts)?;
        }
        if let Some(secs) = get("SELECT_FILES_RETRY_DELAY_SECS") {
            config.reconcile.select_files_retry.delay =
                Duration::from_secs(parse_value("SELECT_FILES_RETRY_DELAY_SECS", &secs)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check values that cannot be expressed through types alone
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("REAL_DEBRID_BASE_URL", &self.debrid.base_url),
            ("MIRROR_BASE_URL", &self.mirror.base_url),
        ] {
            url::Url::parse(value).map_err(|e| Error::Config {
                message: format!("invalid URL {:?}: {}", value, e),
                key: Some(key.to_string()),
            })?;
        }

        if self.reconcile.select_files_retry.max_attempts == 0 {
            return Err(Error::Config {
                message: "max attempts must be at least 1".to_string(),
                key: Some("SELECT_FILES_MAX_ATTEMPTS".to_string()),
            });
        }

        if self.reconcile.interval.is_zero() {
            return Err(Error::Config {
                message: "reconcile interval must be greater than zero".to_string(),
                key: Some("RECONCILE_INTERVAL_SECS".to_string()),
            });
        }

        Ok(())
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| Error::Config {
        message: format!("invalid value {:?}: {}", raw, e),
        key: Some(key.to_string()),
    })
}

// Default value functions
fn default_debrid_base_url() -> String {
    "https://api.real-debrid.com/rest/1.0".to_string()
}

fn default_debrid_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_debrid_host() -> String {
    "real-debrid.com".to_string()
}

fn default_mirror_base_url() -> String {
    "http://rclone:8080".to_string()
}

fn default_mirror_root() -> String {
    "torrents".to_string()
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_listing_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_stream_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_attempts() -> u32 {
    10
}

fn default_retry_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_reconcile_interval() -> Duration {
    Duration::from_secs(15)
}

fn default_database_path() -> PathBuf {
    PathBuf::from("torrents.db")
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:5173".into()]
}

fn default_true() -> bool {
    true
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
