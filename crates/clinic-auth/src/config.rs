//! Authentication configuration.

/// Configuration for token issuance and password verification.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared HS256 secret used to sign and verify bearer tokens.
    pub jwt_secret: String,
    /// Bearer token lifetime in seconds (default: 86_400 = 24 hours).
    pub token_lifetime_secs: u64,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Optional pepper prepended to passwords before Argon2id verification.
    pub pepper: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_lifetime_secs: 86_400,
            jwt_issuer: "clinic".into(),
            pepper: None,
        }
    }
}
