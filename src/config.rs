use crate::registry::Category;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Hostname the engine runs under; scopes cookie purging.
    #[serde(default = "default_hostname")]
    pub hostname: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Site identifier for the remote configuration fetch. Without it the
    /// built-in service defaults stay authoritative.
    #[serde(default)]
    pub site_id: Option<String>,

    #[serde(default)]
    pub refresh: RefreshConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub purge: PurgeConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RefreshConfig {
    #[serde(default = "default_refresh_enable")]
    pub enable: bool,
    /// Bound on the remote fetch; on expiry the defaults stay in force.
    #[serde(default = "default_refresh_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_expiry_days")]
    pub expiry_days: u64,
}

/// Site-specific additions to the built-in purge rules.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PurgeConfig {
    #[serde(default)]
    pub extra: Vec<ExtraPurgeRule>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtraPurgeRule {
    pub category: Category,
    #[serde(default)]
    pub cookies: Vec<String>,
    #[serde(default)]
    pub cookie_prefixes: Vec<String>,
    #[serde(default)]
    pub storage_keys: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_enable")]
    pub enable: bool,
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_blocked")]
    pub log_blocked: bool,
    #[serde(default = "default_log_restored")]
    pub log_restored: bool,
}

// Defaults
fn default_hostname() -> String {
    "localhost".to_string()
}
fn default_api_base_url() -> String {
    "https://api.consent-gate.dev".to_string()
}
fn default_refresh_enable() -> bool {
    true
}
fn default_refresh_timeout_ms() -> u64 {
    3000
}
fn default_cookie_name() -> String {
    "consent_decision".to_string()
}
fn default_expiry_days() -> u64 {
    365
}
fn default_log_enable() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_blocked() -> bool {
    true
}
fn default_log_restored() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            api_base_url: default_api_base_url(),
            site_id: None,
            refresh: RefreshConfig::default(),
            storage: StorageConfig::default(),
            purge: PurgeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            enable: default_refresh_enable(),
            timeout_ms: default_refresh_timeout_ms(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            expiry_days: default_expiry_days(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable: default_log_enable(),
            level: default_log_level(),
            log_blocked: default_log_blocked(),
            log_restored: default_log_restored(),
        }
    }
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .context("Failed to read config file")?;
        let config: Config = toml::from_str(&contents).context("Failed to parse config TOML")?;
        Ok(config)
    }
}
