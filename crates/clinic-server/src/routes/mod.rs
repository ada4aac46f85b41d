//! HTTP routes.

mod auth;
mod bills;
mod health;

use axum::Router;
use axum::routing::{get, post};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/pharmacist/medicine-bills", post(bills::create))
        .with_state(state)
}
