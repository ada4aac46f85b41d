//! Server configuration, read from `CLINIC_*` environment variables.

use std::time::Duration;

use clinic_auth::AuthConfig;
use clinic_db::{DbConfig, LedgerConfig};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Credentials of the platform admin created on first start.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub db: DbConfig,
    pub auth: AuthConfig,
    pub ledger: LedgerConfig,
    /// Capacity of each background writer queue.
    pub queue_capacity: usize,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".into(),
            db: DbConfig::default(),
            auth: AuthConfig::default(),
            ledger: LedgerConfig::default(),
            queue_capacity: 1024,
            bootstrap_admin: None,
        }
    }
}

impl ServerConfig {
    /// Read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from any variable source. Unset variables keep
    /// their defaults; `CLINIC_JWT_SECRET` has none.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(addr) = get("CLINIC_BIND_ADDR") {
            config.bind_addr = addr;
        }

        if let Some(url) = get("CLINIC_DB_URL") {
            config.db.url = url;
        }
        if let Some(ns) = get("CLINIC_DB_NAMESPACE") {
            config.db.namespace = ns;
        }
        if let Some(db) = get("CLINIC_DB_DATABASE") {
            config.db.database = db;
        }
        if let Some(user) = get("CLINIC_DB_USERNAME") {
            config.db.username = user;
        }
        if let Some(pass) = get("CLINIC_DB_PASSWORD") {
            config.db.password = pass;
        }

        config.auth.jwt_secret =
            get("CLINIC_JWT_SECRET").ok_or(ConfigError::Missing("CLINIC_JWT_SECRET"))?;
        if let Some(secs) = get("CLINIC_TOKEN_LIFETIME_SECS") {
            config.auth.token_lifetime_secs = parse("CLINIC_TOKEN_LIFETIME_SECS", secs)?;
        }
        config.auth.pepper = get("CLINIC_PASSWORD_PEPPER");

        if let Some(ms) = get("CLINIC_SALE_DEADLINE_MS") {
            config.ledger.deadline = Duration::from_millis(parse("CLINIC_SALE_DEADLINE_MS", ms)?);
        }
        if let Some(ms) = get("CLINIC_LOCK_TIMEOUT_MS") {
            config.ledger.lock_timeout =
                Duration::from_millis(parse("CLINIC_LOCK_TIMEOUT_MS", ms)?);
        }
        if let Some(cap) = get("CLINIC_EVENT_QUEUE_CAPACITY") {
            config.queue_capacity = parse("CLINIC_EVENT_QUEUE_CAPACITY", cap)?;
        }

        config.bootstrap_admin = match (
            get("CLINIC_BOOTSTRAP_ADMIN_EMAIL"),
            get("CLINIC_BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("CLINIC_BOOTSTRAP_ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("CLINIC_BOOTSTRAP_ADMIN_EMAIL")),
        };

        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_only_the_secret_is_set() {
        let config = ServerConfig::from_lookup(lookup(&[("CLINIC_JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.db.url, "ws://127.0.0.1:8000");
        assert_eq!(config.auth.token_lifetime_secs, 86_400);
        assert_eq!(config.ledger.deadline, Duration::from_millis(5_000));
        assert_eq!(config.ledger.lock_timeout, Duration::from_millis(2_000));
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = ServerConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("CLINIC_JWT_SECRET")));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("CLINIC_JWT_SECRET", "s3cret"),
            ("CLINIC_DB_URL", "mem://"),
            ("CLINIC_SALE_DEADLINE_MS", "750"),
            ("CLINIC_LOCK_TIMEOUT_MS", "100"),
            ("CLINIC_BOOTSTRAP_ADMIN_EMAIL", "root@example.com"),
            ("CLINIC_BOOTSTRAP_ADMIN_PASSWORD", "Admin@2024"),
        ]))
        .unwrap();
        assert!(config.db.is_embedded());
        assert_eq!(config.ledger.deadline, Duration::from_millis(750));
        assert_eq!(config.ledger.lock_timeout, Duration::from_millis(100));
        assert_eq!(config.bootstrap_admin.unwrap().email, "root@example.com");
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = ServerConfig::from_lookup(lookup(&[
            ("CLINIC_JWT_SECRET", "s3cret"),
            ("CLINIC_LOCK_TIMEOUT_MS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "CLINIC_LOCK_TIMEOUT_MS",
                ..
            }
        ));
    }

    #[test]
    fn half_configured_bootstrap_is_rejected() {
        let err = ServerConfig::from_lookup(lookup(&[
            ("CLINIC_JWT_SECRET", "s3cret"),
            ("CLINIC_BOOTSTRAP_ADMIN_EMAIL", "root@example.com"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }
}
