//! SurrealDB connection management.

use surrealdb::Surreal;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use tracing::info;

/// Configuration for connecting to SurrealDB.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Engine URL (e.g., `ws://127.0.0.1:8000` or `mem://`).
    pub url: String,
    /// SurrealDB namespace.
    pub namespace: String,
    /// SurrealDB database name.
    pub database: String,
    /// Root username. Ignored by embedded engines.
    pub username: String,
    /// Root password. Ignored by embedded engines.
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8000".into(),
            namespace: "clinic".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

impl DbConfig {
    /// Whether the URL names an in-process engine that has no root user.
    pub fn is_embedded(&self) -> bool {
        self.url.starts_with("mem://")
    }
}

/// Manages a connection to SurrealDB.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Any>,
}

impl DbManager {
    /// Connect to SurrealDB using the provided configuration.
    ///
    /// Signs in as root for remote engines, selects the configured
    /// namespace and database, and returns a ready-to-use manager.
    pub async fn connect(config: &DbConfig) -> Result<Self, surrealdb::Error> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let db = any::connect(config.url.as_str()).await?;

        if !config.is_embedded() {
            db.signin(Root {
                username: config.username.clone(),
                password: config.password.clone(),
            })
            .await?;
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        info!("Successfully connected to SurrealDB");

        Ok(Self { db })
    }

    /// Returns a reference to the underlying SurrealDB client.
    pub fn client(&self) -> &Surreal<Any> {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_urls_are_embedded() {
        let config = DbConfig {
            url: "mem://".into(),
            ..Default::default()
        };
        assert!(config.is_embedded());
        assert!(!DbConfig::default().is_embedded());
    }
}
