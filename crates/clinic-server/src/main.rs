//! Clinic Server — application entry point.

use anyhow::Context;
use clinic_db::DbManager;
use clinic_db::repository::SurrealUserRepository;
use clinic_server::bootstrap::ensure_platform_admin;
use clinic_server::{AppState, ServerConfig, router};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("clinic=info".parse()?))
        .json()
        .init();

    let config = ServerConfig::from_env()?;
    info!(bind_addr = %config.bind_addr, "starting clinic server");

    let db = DbManager::connect(&config.db)
        .await
        .context("connecting to SurrealDB")?;
    clinic_db::run_migrations(db.client())
        .await
        .context("running schema migrations")?;

    if let Some(admin) = &config.bootstrap_admin {
        let users = match &config.auth.pepper {
            Some(pepper) => SurrealUserRepository::with_pepper(db.client().clone(), pepper.clone()),
            None => SurrealUserRepository::new(db.client().clone()),
        };
        ensure_platform_admin(&users, admin)
            .await
            .context("creating bootstrap admin")?;
    }

    let (state, workers) = AppState::build(db.client().clone(), &config)?;
    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    workers.drain().await;
    info!("clinic server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
