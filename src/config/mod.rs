//! Configuration module for the supply monitor

mod template;

use crate::engine::PersistPolicy;
use crate::utils::error::{Error, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub use template::generate_commented_config_template;

/// Default file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "tetherwatch.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Configuration file version
    pub version: String,

    /// The tracked asset
    pub asset: AssetConfig,

    /// Market data endpoints
    pub market: MarketConfig,

    /// Optional report metrics
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Notification target
    pub notify: NotifyConfig,

    /// Snapshot storage
    pub snapshot: SnapshotConfig,

    /// Report formatting
    #[serde(default)]
    pub report: ReportConfig,
}

/// Asset identity used in API calls and in the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    /// CoinGecko coin id, e.g. "tether"
    pub coin_id: String,
    /// Display name
    pub name: String,
    /// Ticker symbol
    pub symbol: String,
    /// Quote currency for prices, e.g. "nzd"
    pub vs_currency: String,
}

/// Market data source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// CoinGecko API base URL
    pub api_url: String,

    /// Optional CoinGecko demo/pro API key
    #[serde(default)]
    pub api_key: Option<String>,

    /// Fear & Greed index endpoint
    #[serde(default = "default_sentiment_url")]
    pub sentiment_url: String,

    /// Length of the price window used for the lowest-value comparison
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// Timeout for HTTP requests in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Which optional metrics are fetched and reported
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Include the Fear & Greed index
    #[serde(default = "default_true")]
    pub sentiment: bool,

    /// Secondary index read from a JSON endpoint (disabled when absent)
    #[serde(default)]
    pub secondary_index: Option<SecondaryIndexConfig>,
}

/// A numeric value extracted from an arbitrary JSON endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecondaryIndexConfig {
    /// Label shown in the report
    pub label: String,
    /// Endpoint returning JSON
    pub url: String,
    /// JSON pointer (RFC 6901) to the value, e.g. "/data/0/value"
    pub json_pointer: String,
}

/// Notification channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Slack chat.postMessage endpoint
    pub api_url: String,
    /// Target channel
    pub channel: String,
    /// Bot token; normally supplied through SLACK_BOT_TOKEN
    #[serde(default)]
    pub token: Option<String>,
}

/// Snapshot storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// JSON file holding the supply snapshot
    pub path: String,

    /// Run lock file (defaults to `<path>.lock`)
    #[serde(default)]
    pub lock_path: Option<String>,

    /// When to write the snapshot back
    #[serde(default)]
    pub persist_policy: PersistPolicy,

    /// Maximum number of periods kept in the snapshot
    #[serde(default = "default_retain_periods")]
    pub retain_periods: usize,

    /// Age after which a leftover run lock is considered stale
    #[serde(default = "default_lock_stale_after_secs")]
    pub lock_stale_after_secs: u64,

    /// IANA time zone deciding which month "now" falls in
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

/// Report formatting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Decimal places for grouped supply figures (0-2)
    #[serde(default)]
    pub supply_decimals: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            asset: AssetConfig::default(),
            market: MarketConfig::default(),
            metrics: MetricsConfig::default(),
            notify: NotifyConfig::default(),
            snapshot: SnapshotConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            coin_id: "tether".to_string(),
            name: "Tether".to_string(),
            symbol: "USDT".to_string(),
            vs_currency: "nzd".to_string(),
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.coingecko.com/api/v3".to_string(),
            api_key: None,
            sentiment_url: default_sentiment_url(),
            window_days: default_window_days(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { sentiment: true, secondary_index: None }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            api_url: "https://slack.com/api/chat.postMessage".to_string(),
            channel: "#general".to_string(),
            token: None,
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: "supply_snapshot.json".to_string(),
            lock_path: None,
            persist_policy: PersistPolicy::default(),
            retain_periods: default_retain_periods(),
            lock_stale_after_secs: default_lock_stale_after_secs(),
            timezone: default_timezone(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { supply_decimals: 0 }
    }
}

// --------- Helper default functions for serde ---------
fn default_sentiment_url() -> String {
    "https://api.alternative.me/fng/".to_string()
}
fn default_window_days() -> u32 {
    30
}
fn default_timeout_seconds() -> u64 {
    30
}
fn default_true() -> bool {
    true
}
fn default_retain_periods() -> usize {
    24
}
fn default_lock_stale_after_secs() -> u64 {
    6 * 60 * 60
}
fn default_timezone() -> String {
    "UTC".to_string()
}

impl Config {
    /// Serialize default config to TOML string
    pub fn default_toml() -> String {
        // The default config only holds strings, numbers and booleans.
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    /// Load configuration from a specific file path
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::ConfigError(format!("Failed to read config file {:?}: {}", path.as_ref(), e))
        })?;
        let mut cfg: Self = toml::from_str(&content)?;
        cfg.merge_env()?;
        Ok(cfg)
    }

    /// Save the configuration to a file
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::ConfigError(format!("Failed to create directory {:?}: {}", parent, e))
            })?;
        }
        std::fs::write(path, content).map_err(|e| {
            Error::ConfigError(format!("Failed to write config file {:?}: {}", path, e))
        })?;
        Ok(())
    }

    /// Validate the configuration for required fields and reasonable values
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(Error::ConfigError("Config version must be set (e.g., '0.1.0')".to_string()));
        }
        if self.asset.coin_id.trim().is_empty() {
            return Err(Error::ConfigError("asset.coin_id must be set".to_string()));
        }
        if self.asset.vs_currency.trim().is_empty() {
            return Err(Error::ConfigError("asset.vs_currency must be set".to_string()));
        }
        check_url("market.api_url", &self.market.api_url)?;
        if self.metrics.sentiment {
            check_url("market.sentiment_url", &self.market.sentiment_url)?;
        }
        if let Some(ref idx) = self.metrics.secondary_index {
            check_url("metrics.secondary_index.url", &idx.url)?;
            if !idx.json_pointer.is_empty() && !idx.json_pointer.starts_with('/') {
                return Err(Error::ConfigError(
                    "metrics.secondary_index.json_pointer must start with '/'".to_string(),
                ));
            }
        }
        if self.market.window_days == 0 {
            return Err(Error::ConfigError("market.window_days must be > 0".to_string()));
        }
        if self.market.timeout_seconds == 0 {
            return Err(Error::ConfigError("market.timeout_seconds must be > 0".to_string()));
        }
        check_url("notify.api_url", &self.notify.api_url)?;
        if self.notify.channel.trim().is_empty() {
            return Err(Error::ConfigError("notify.channel must be set".to_string()));
        }
        if self.snapshot.path.trim().is_empty() {
            return Err(Error::ConfigError("snapshot.path must be set".to_string()));
        }
        if self.snapshot.retain_periods < 2 {
            return Err(Error::ConfigError("snapshot.retain_periods must be >= 2".to_string()));
        }
        self.timezone()?;
        if self.report.supply_decimals > 2 {
            return Err(Error::ConfigError("report.supply_decimals cannot exceed 2".to_string()));
        }
        Ok(())
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        // Try to load from current directory
        if std::path::Path::new(CONFIG_FILE_NAME).exists() {
            return Self::from_file(CONFIG_FILE_NAME);
        }

        // Try to load from user config directory
        if let Some(dir) = crate::utils::config_dir() {
            let path = dir.join(CONFIG_FILE_NAME);
            if path.exists() {
                return Self::from_file(path);
            }
        }

        // Return default config if no config file found
        let mut config = Self::default();
        config.merge_env()?;
        Ok(config)
    }

    /// Merge environment variables into the configuration
    pub fn merge_env(&mut self) -> Result<()> {
        if let Ok(token) = env::var("SLACK_BOT_TOKEN") {
            self.notify.token = Some(token);
        }

        if let Ok(channel) = env::var("SLACK_CHANNEL") {
            self.notify.channel = channel;
        }

        if let Ok(api_url) = env::var("COINGECKO_API_URL") {
            self.market.api_url = api_url;
        }

        if let Ok(api_key) = env::var("COINGECKO_API_KEY") {
            self.market.api_key = Some(api_key);
        }

        if let Ok(path) = env::var("TETHERWATCH_SNAPSHOT_PATH") {
            self.snapshot.path = path;
        }

        Ok(())
    }

    /// Time zone used to decide the current period
    pub fn timezone(&self) -> Result<Tz> {
        self.snapshot.timezone.parse::<Tz>().map_err(|e| {
            Error::ConfigError(format!("Invalid snapshot.timezone {:?}: {}", self.snapshot.timezone, e))
        })
    }

    pub fn snapshot_path(&self) -> PathBuf {
        PathBuf::from(&self.snapshot.path)
    }

    pub fn lock_path(&self) -> PathBuf {
        match self.snapshot.lock_path {
            Some(ref p) => PathBuf::from(p),
            None => PathBuf::from(format!("{}.lock", self.snapshot.path)),
        }
    }

    pub fn lock_stale_after(&self) -> Duration {
        Duration::from_secs(self.snapshot.lock_stale_after_secs)
    }
}

fn check_url(field: &str, value: &str) -> Result<()> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| Error::ConfigError(format!("{} is not a valid URL ({}): {}", field, value, e)))
}
