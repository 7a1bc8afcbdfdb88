use std::env;
use std::str::FromStr;
use std::time::Duration;

use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} has invalid value {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StoreBackend {
    Mysql,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CacheBackend {
    Memory,
    Redis,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub api_prefix: String,

    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,

    pub cache_backend: CacheBackend,
    pub redis_url: Option<String>,
    pub cache_max_capacity: u64,

    pub prewarm_enabled: bool,
    pub prewarm_interval: Duration,

    // Rate limiting, 0 disables
    pub rate_protected_per_min: u32,

    pub log_dir: String,
    pub log_level: tracing::Level,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let store_backend: StoreBackend = vars.parse("STORE_BACKEND", "mysql")?;
        let cache_backend: CacheBackend = vars.parse("CACHE_BACKEND", "memory")?;

        let database_url = vars.get("DATABASE_URL");
        if store_backend == StoreBackend::Mysql && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let redis_url = vars.get("REDIS_URL");
        if cache_backend == CacheBackend::Redis && redis_url.is_none() {
            return Err(ConfigError::Missing("REDIS_URL"));
        }

        Ok(Self {
            server_addr: vars.text("SERVER_ADDR", "0.0.0.0:8080"),
            api_prefix: vars.text("API_PREFIX", "/api"),
            store_backend,
            database_url,
            database_max_connections: vars.parse("DATABASE_MAX_CONNECTIONS", "10")?,
            cache_backend,
            redis_url,
            cache_max_capacity: vars.parse("CACHE_MAX_CAPACITY", "100000")?,
            prewarm_enabled: vars.parse("PREWARM_ENABLED", "true")?,
            prewarm_interval: Duration::from_secs(vars.positive("PREWARM_INTERVAL_SECS", "1800")?),
            rate_protected_per_min: vars.parse("RATE_PROTECTED_PER_MIN", "1000")?,
            log_dir: vars.text("LOG_DIR", "logs"),
            log_level: vars.parse("LOG_LEVEL", "debug")?,
        })
    }
}

/// Blank values count as unset.
struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get(&self, var: &str) -> Option<String> {
        (self.0)(var).filter(|v| !v.trim().is_empty())
    }

    fn text(&self, var: &str, default: &str) -> String {
        self.get(var).unwrap_or_else(|| default.to_string())
    }

    fn parse<T: FromStr>(&self, var: &'static str, default: &str) -> Result<T, ConfigError> {
        let value = self.text(var, default);
        value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value })
    }

    fn positive(&self, var: &'static str, default: &str) -> Result<u64, ConfigError> {
        match self.parse(var, default)? {
            0 => Err(ConfigError::Invalid {
                var,
                value: self.text(var, default),
            }),
            n => Ok(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_memory_backends() {
        let cfg = config(&[("STORE_BACKEND", "memory")]).unwrap();

        assert_eq!(cfg.server_addr, "0.0.0.0:8080");
        assert_eq!(cfg.api_prefix, "/api");
        assert_eq!(cfg.store_backend, StoreBackend::Memory);
        assert_eq!(cfg.cache_backend, CacheBackend::Memory);
        assert_eq!(cfg.database_max_connections, 10);
        assert_eq!(cfg.cache_max_capacity, 100_000);
        assert!(cfg.prewarm_enabled);
        assert_eq!(cfg.prewarm_interval, Duration::from_secs(1800));
        assert_eq!(cfg.rate_protected_per_min, 1000);
        assert_eq!(cfg.log_dir, "logs");
        assert_eq!(cfg.log_level, tracing::Level::DEBUG);
    }

    #[test]
    fn test_backends_require_their_urls() {
        assert_eq!(
            config(&[]).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
        assert_eq!(
            config(&[("STORE_BACKEND", "memory"), ("CACHE_BACKEND", "redis")]).unwrap_err(),
            ConfigError::Missing("REDIS_URL")
        );

        let cfg = config(&[
            ("DATABASE_URL", "mysql://root@localhost/hrm"),
            ("CACHE_BACKEND", "Redis"),
            ("REDIS_URL", "redis://127.0.0.1/"),
        ])
        .unwrap();
        assert_eq!(cfg.store_backend, StoreBackend::Mysql);
        assert_eq!(cfg.cache_backend, CacheBackend::Redis);
    }

    #[test]
    fn test_malformed_values_name_the_variable() {
        assert_eq!(
            config(&[("STORE_BACKEND", "memory"), ("PREWARM_INTERVAL_SECS", "soon")])
                .unwrap_err(),
            ConfigError::Invalid {
                var: "PREWARM_INTERVAL_SECS",
                value: "soon".to_string()
            }
        );
        assert!(matches!(
            config(&[("STORE_BACKEND", "postgres")]),
            Err(ConfigError::Invalid { var: "STORE_BACKEND", .. })
        ));
        assert!(matches!(
            config(&[("STORE_BACKEND", "memory"), ("PREWARM_ENABLED", "maybe")]),
            Err(ConfigError::Invalid { var: "PREWARM_ENABLED", .. })
        ));
    }

    #[test]
    fn test_zero_prewarm_interval_is_rejected() {
        assert_eq!(
            config(&[("STORE_BACKEND", "memory"), ("PREWARM_INTERVAL_SECS", "0")]).unwrap_err(),
            ConfigError::Invalid {
                var: "PREWARM_INTERVAL_SECS",
                value: "0".to_string()
            }
        );
        let cfg = config(&[("STORE_BACKEND", "memory"), ("PREWARM_INTERVAL_SECS", "1")]).unwrap();
        assert_eq!(cfg.prewarm_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("STORE_BACKEND", "memory"),
            ("SERVER_ADDR", "127.0.0.1:3000"),
            ("PREWARM_ENABLED", "false"),
            ("RATE_PROTECTED_PER_MIN", "0"),
            ("LOG_LEVEL", "info"),
        ])
        .unwrap();
        assert_eq!(cfg.server_addr, "127.0.0.1:3000");
        assert!(!cfg.prewarm_enabled);
        assert_eq!(cfg.rate_protected_per_min, 0);
        assert_eq!(cfg.log_level, tracing::Level::INFO);
    }
}
