//! Server settings
//!
//! Precedence: built-in defaults, then an optional `catalog.{toml,yaml,json}`
//! in the working directory, then `CATALOG_*` environment variables.

use crate::services::catalog::DEFAULT_BOOKS_CACHE_TTL;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

const CONFIG_BASENAME: &str = "catalog";
const ENV_PREFIX: &str = "CATALOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bind_address: String,
    pub database_path: String,
    pub max_connections: u32,
    pub cache_backend: CacheBackend,
    #[serde(default)]
    pub redis_url: Option<String>,
    pub books_cache_ttl_secs: u64,
    pub log_level: String,
    /// Drop and recreate the schema at startup. Administrative use only.
    #[serde(default)]
    pub reset_on_start: bool,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl SettingsError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

impl Settings {
    /// Load from the working directory and process environment.
    pub fn load() -> Result<Self, SettingsError> {
        let builder = Self::defaults()?
            .add_source(File::with_name(CONFIG_BASENAME).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        Self::from_builder(builder)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, SettingsError> {
        Ok(config::Config::builder()
            .set_default("bind_address", "0.0.0.0:8000")?
            .set_default("database_path", "./data/catalog.db")?
            .set_default("max_connections", 5_i64)?
            .set_default("cache_backend", "memory")?
            .set_default(
                "books_cache_ttl_secs",
                DEFAULT_BOOKS_CACHE_TTL.as_secs() as i64,
            )?
            .set_default("log_level", "info")?
            .set_default("reset_on_start", false)?)
    }

    fn from_builder(
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<Self, SettingsError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        self.bind_address
            .parse::<SocketAddr>()
            .map_err(|e| SettingsError::invalid("bind_address", e.to_string()))?;

        if self.max_connections == 0 {
            return Err(SettingsError::invalid(
                "max_connections",
                "must be at least 1",
            ));
        }

        if self.books_cache_ttl_secs == 0 {
            return Err(SettingsError::invalid(
                "books_cache_ttl_secs",
                "must be at least 1 second",
            ));
        }

        if self.cache_backend == CacheBackend::Redis && self.redis_url.is_none() {
            return Err(SettingsError::invalid(
                "redis_url",
                "required when cache_backend = redis",
            ));
        }

        Ok(())
    }

    pub fn books_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.books_cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_overrides(pairs: &[(&str, &str)]) -> Result<Settings, SettingsError> {
        let mut builder = Settings::defaults()?;
        for (key, value) in pairs {
            builder = builder.set_override(*key, *value)?;
        }
        Settings::from_builder(builder)
    }

    #[test]
    fn test_defaults() {
        let settings = with_overrides(&[]).unwrap();
        assert_eq!(settings.bind_address, "0.0.0.0:8000");
        assert_eq!(settings.cache_backend, CacheBackend::Memory);
        assert_eq!(settings.books_cache_ttl(), Duration::from_secs(300));
        assert_eq!(settings.max_connections, 5);
        assert!(settings.redis_url.is_none());
        assert!(!settings.reset_on_start);
    }

    #[test]
    fn test_redis_requires_url() {
        let err = with_overrides(&[("cache_backend", "redis")]).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { key: "redis_url", .. }));

        let settings = with_overrides(&[
            ("cache_backend", "redis"),
            ("redis_url", "redis://127.0.0.1:6379"),
        ])
        .unwrap();
        assert_eq!(settings.cache_backend, CacheBackend::Redis);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            with_overrides(&[("bind_address", "not an address")]),
            Err(SettingsError::Invalid { key: "bind_address", .. })
        ));
        assert!(matches!(
            with_overrides(&[("books_cache_ttl_secs", "0")]),
            Err(SettingsError::Invalid { key: "books_cache_ttl_secs", .. })
        ));
        assert!(with_overrides(&[("cache_backend", "memcached")]).is_err());
    }
}
