//! Configuration module for the storefront API.
//!
//! Loads configuration from YAML files and environment variables.

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub store_api: StoreApiConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    /// Seed a demo sales channel reachable with this access key on startup.
    #[serde(default)]
    pub demo_access_key: Option<String>,
}

/// Store API behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreApiConfig {
    /// Accepted values for the `v{version}` path segment.
    #[serde(default = "default_supported_versions")]
    pub supported_versions: Vec<u32>,
    /// Upper bound for the `limit` criteria parameter.
    #[serde(default = "default_max_limit")]
    pub max_limit: u32,
    /// Context tokens unused for this many days are purged on startup.
    #[serde(default = "default_context_token_ttl_days")]
    pub context_token_ttl_days: i64,
}

fn default_supported_versions() -> Vec<u32> {
    vec![1, 2, 3]
}

fn default_max_limit() -> u32 {
    500
}

fn default_context_token_ttl_days() -> i64 {
    30
}

impl StoreApiConfig {
    pub fn supports_version(&self, version: u32) -> bool {
        self.supported_versions.contains(&version)
    }
}

impl Config {
    /// Load configuration from files and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (STOREFRONT__*)
    /// 2. config/local.yaml (if exists)
    /// 3. config/default.yaml
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("STOREFRONT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for StoreApiConfig {
    fn default() -> Self {
        Self {
            supported_versions: default_supported_versions(),
            max_limit: default_max_limit(),
            context_token_ttl_days: default_context_token_ttl_days(),
        }
    }
}
