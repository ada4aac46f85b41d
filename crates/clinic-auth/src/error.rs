//! Authentication error types.

use clinic_core::error::ClinicError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is inactive")]
    AccountInactive,

    #[error("unknown subject")]
    UnknownSubject,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    /// The signing secret is missing or unusable.
    #[error("token encoding failed: {0}")]
    Encoding(String),

    #[error("cryptography error: {0}")]
    Crypto(String),

    #[error("invalid auth configuration: {0}")]
    Config(String),
}

impl From<AuthError> for ClinicError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::AccountInactive
            | AuthError::UnknownSubject
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_) => ClinicError::AuthenticationFailed {
                reason: err.to_string(),
            },
            AuthError::Encoding(msg) | AuthError::Crypto(msg) => ClinicError::Crypto(msg),
            AuthError::Config(msg) => ClinicError::Internal(msg),
        }
    }
}
