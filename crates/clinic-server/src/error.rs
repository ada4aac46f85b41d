//! Mapping of domain errors onto HTTP responses.
//!
//! Authentication and authorization failures collapse to a fixed message;
//! their reasons are logged, never returned.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use clinic_core::error::ClinicError;
use serde_json::{Value, json};
use tracing::{debug, error};

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: Value,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    /// Login failures all look the same, whatever the cause.
    pub fn login(err: ClinicError) -> Self {
        match err {
            ClinicError::AuthenticationFailed { reason } => {
                debug!(%reason, "login rejected");
                Self::new(
                    StatusCode::UNAUTHORIZED,
                    json!({ "error": "invalid credentials" }),
                )
            }
            other => other.into(),
        }
    }
}

impl From<ClinicError> for ApiError {
    fn from(err: ClinicError) -> Self {
        match err {
            ClinicError::AuthenticationFailed { reason } => {
                debug!(%reason, "request not authenticated");
                Self::new(
                    StatusCode::UNAUTHORIZED,
                    json!({ "error": "not authenticated" }),
                )
            }
            ClinicError::AuthorizationDenied { reason } => {
                debug!(%reason, "request denied");
                Self::new(StatusCode::FORBIDDEN, json!({ "error": "access denied" }))
            }
            ClinicError::ItemNotFound { item_id } => Self::new(
                StatusCode::NOT_FOUND,
                json!({ "error": "item not found", "item_id": item_id }),
            ),
            ClinicError::InsufficientStock {
                item_id,
                requested,
                available,
            } => Self::new(
                StatusCode::CONFLICT,
                json!({
                    "error": "insufficient stock",
                    "item_id": item_id,
                    "requested": requested,
                    "available": available,
                }),
            ),
            ClinicError::TenantMismatch { party, id, .. } => Self::new(
                StatusCode::CONFLICT,
                json!({ "error": "tenant mismatch", "party": party, "id": id }),
            ),
            ClinicError::NotFound { entity, .. } => Self::new(
                StatusCode::NOT_FOUND,
                json!({ "error": format!("{entity} not found") }),
            ),
            ClinicError::AlreadyExists { entity } => Self::new(
                StatusCode::CONFLICT,
                json!({ "error": format!("{entity} already exists") }),
            ),
            ClinicError::Validation { message } => {
                Self::new(StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            ClinicError::TransactionAborted { reason } => {
                debug!(%reason, "transaction aborted");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({ "error": "transaction aborted", "retryable": true }),
                )
            }
            ClinicError::Database(_) | ClinicError::Crypto(_) | ClinicError::Internal(_) => {
                error!(error = %err, "request failed");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal error" }),
                )
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(reason = %rejection.body_text(), "request body rejected");
        Self::new(rejection.status(), json!({ "error": rejection.body_text() }))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn auth_failures_hide_their_reason() {
        let err = ApiError::from(ClinicError::AuthorizationDenied {
            reason: "cross-tenant access".into(),
        });
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.body, json!({ "error": "access denied" }));
    }

    #[test]
    fn stock_errors_name_the_item() {
        let item_id = Uuid::new_v4();
        let err = ApiError::from(ClinicError::InsufficientStock {
            item_id,
            requested: 2,
            available: 0,
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.body["item_id"], json!(item_id));
        assert_eq!(err.body["available"], 0);
    }

    #[test]
    fn aborts_are_marked_retryable() {
        let err = ApiError::from(ClinicError::TransactionAborted {
            reason: "lock wait timeout".into(),
        });
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.body["retryable"], true);
    }

    #[test]
    fn login_failures_are_uniform() {
        let err = ApiError::login(ClinicError::AuthenticationFailed {
            reason: "account is inactive".into(),
        });
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.body, json!({ "error": "invalid credentials" }));
    }
}
