//! Login and identity lookup.

use axum::Json;
use axum::extract::State;
use clinic_auth::LoginInput;
use clinic_core::models::identity::Identity;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::extract::{ApiJson, Authenticated};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub identity: Identity,
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let output = state
        .login()
        .login(LoginInput {
            email: body.email,
            password: body.password,
        })
        .await
        .map_err(ApiError::login)?;

    Ok(Json(LoginResponse {
        access_token: output.access_token,
        token_type: "Bearer",
        expires_in: output.expires_in,
        identity: output.identity,
    }))
}

pub async fn me(Authenticated(identity): Authenticated) -> Json<Identity> {
    Json(identity)
}
