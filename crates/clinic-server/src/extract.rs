//! Request extractors.

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use clinic_core::error::ClinicError;
use clinic_core::models::identity::Identity;

use crate::error::ApiError;
use crate::state::AppState;

/// A JSON request body. Malformed bodies are rejected with the same
/// JSON error shape as every other failure.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// The caller's live identity, resolved from the bearer token.
///
/// Rejects with 401 before the handler runs.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

#[axum::async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = bearer_token(&parts.headers).ok_or_else(|| {
            ApiError::from(ClinicError::AuthenticationFailed {
                reason: "missing bearer token".into(),
            })
        })?;
        let identity = state.resolver().resolve(token).await?;
        Ok(Self(identity))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// Client address as reported by the first proxy hop.
pub fn client_origin(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}
