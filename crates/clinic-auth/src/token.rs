//! Bearer token issuance and verification (HS256 JWT).
//!
//! Tokens are stateless. The role and clinic they carry are advisory: the
//! identity resolver only trusts `sub`.

use chrono::{DateTime, Utc};
use clinic_core::models::role::Role;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// JWT claims embedded in every bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject — user ID (UUID string).
    pub sub: String,
    /// Role at issuance time. Advisory only.
    pub role: Role,
    /// Clinic at issuance time (UUID string). Advisory only.
    pub clinic_id: Option<String>,
    /// Issuer.
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token ID (UUID string).
    pub jti: String,
}

impl TokenClaims {
    pub fn subject_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|e| AuthError::TokenInvalid(format!("bad subject: {e}")))
    }
}

/// Issues and verifies bearer tokens with the configured secret.
///
/// Pure: no I/O, the only inputs are the secret, the lifetime and the
/// clock.
#[derive(Clone)]
pub struct TokenCodec {
    secret: Vec<u8>,
    issuer: String,
    lifetime_secs: i64,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("issuer", &self.issuer)
            .field("lifetime_secs", &self.lifetime_secs)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Build a codec from `config`. Fails when the lifetime does not fit a
    /// Unix timestamp offset.
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        let lifetime_secs = i64::try_from(config.token_lifetime_secs).map_err(|_| {
            AuthError::Config(format!(
                "token lifetime out of range: {}s",
                config.token_lifetime_secs
            ))
        })?;

        Ok(Self {
            secret: config.jwt_secret.as_bytes().to_vec(),
            issuer: config.jwt_issuer.clone(),
            lifetime_secs,
        })
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    /// Issue a token for `subject_id`, expiring one lifetime from now.
    pub fn issue(
        &self,
        subject_id: Uuid,
        role: Role,
        clinic_id: Option<Uuid>,
    ) -> Result<String, AuthError> {
        self.issue_at(subject_id, role, clinic_id, Utc::now())
    }

    /// Issue a token as if the clock read `now`.
    pub fn issue_at(
        &self,
        subject_id: Uuid,
        role: Role,
        clinic_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        if self.secret.is_empty() {
            return Err(AuthError::Encoding("signing secret is not configured".into()));
        }

        let iat = now.timestamp();
        let exp = iat
            .checked_add(self.lifetime_secs)
            .ok_or_else(|| AuthError::Encoding("token expiry overflows".into()))?;
        let claims = TokenClaims {
            sub: subject_id.to_string(),
            role,
            clinic_id: clinic_id.map(|id| id.to_string()),
            iss: self.issuer.clone(),
            iat,
            exp,
            jti: Uuid::new_v4().to_string(),
        };

        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|e| AuthError::Encoding(format!("JWT encode: {e}")))
    }

    /// Check signature, issuer and expiry and return the claims.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        if self.secret.is_empty() {
            return Err(AuthError::TokenInvalid("no verification secret".into()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);
        validation.leeway = 0;

        jsonwebtoken::decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid(e.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn codec_with(secret: &str) -> TokenCodec {
        TokenCodec::new(&AuthConfig {
            jwt_secret: secret.into(),
            token_lifetime_secs: 900,
            jwt_issuer: "clinic-test".into(),
            pepper: None,
        })
        .unwrap()
    }

    fn codec() -> TokenCodec {
        codec_with("test-secret-which-is-long-enough")
    }

    #[test]
    fn verify_returns_issued_claims() {
        let codec = codec();
        let user_id = Uuid::new_v4();
        let clinic_id = Uuid::new_v4();

        let token = codec.issue(user_id, Role::Pharmacist, Some(clinic_id)).unwrap();
        let claims = codec.verify(&token).unwrap();

        assert_eq!(claims.subject_id().unwrap(), user_id);
        assert_eq!(claims.role, Role::Pharmacist);
        assert_eq!(claims.clinic_id, Some(clinic_id.to_string()));
        assert_eq!(claims.iss, "clinic-test");
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn platform_admin_token_has_no_clinic() {
        let codec = codec();
        let token = codec.issue(Uuid::new_v4(), Role::PlatformAdmin, None).unwrap();
        assert_eq!(codec.verify(&token).unwrap().clinic_id, None);
    }

    #[test]
    fn token_is_expired_after_lifetime() {
        let codec = codec();
        let issued = Utc::now() - Duration::seconds(901);
        let token = codec
            .issue_at(Uuid::new_v4(), Role::Doctor, Some(Uuid::new_v4()), issued)
            .unwrap();

        assert!(matches!(codec.verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn token_is_valid_just_before_expiry() {
        let codec = codec();
        let issued = Utc::now() - Duration::seconds(890);
        let token = codec
            .issue_at(Uuid::new_v4(), Role::Doctor, Some(Uuid::new_v4()), issued)
            .unwrap();

        assert!(codec.verify(&token).is_ok());
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let token = codec_with("some-other-secret")
            .issue(Uuid::new_v4(), Role::Patient, Some(Uuid::new_v4()))
            .unwrap();

        assert!(matches!(codec().verify(&token), Err(AuthError::TokenInvalid(_))));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let codec = codec();
        let token = codec.issue(Uuid::new_v4(), Role::Patient, Some(Uuid::new_v4())).unwrap();
        let mut parts: Vec<String> = token.split('.').map(str::to_owned).collect();
        parts[1].push_str("fQ");

        assert!(codec.verify(&parts.join(".")).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            codec().verify("not.a.token"),
            Err(AuthError::TokenInvalid(_))
        ));
    }

    #[test]
    fn missing_secret_fails_to_encode() {
        let err = codec_with("")
            .issue(Uuid::new_v4(), Role::Patient, Some(Uuid::new_v4()))
            .unwrap_err();
        assert!(matches!(err, AuthError::Encoding(_)));
    }

    #[test]
    fn oversized_lifetime_is_rejected() {
        let err = TokenCodec::new(&AuthConfig {
            jwt_secret: "s".into(),
            token_lifetime_secs: u64::MAX,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, AuthError::Config(_)));
    }

    #[test]
    fn expiry_past_the_timestamp_range_fails_to_encode() {
        let codec = TokenCodec::new(&AuthConfig {
            jwt_secret: "s".into(),
            token_lifetime_secs: i64::MAX as u64,
            ..Default::default()
        })
        .unwrap();
        let err = codec
            .issue(Uuid::new_v4(), Role::Patient, Some(Uuid::new_v4()))
            .unwrap_err();
        assert!(matches!(err, AuthError::Encoding(_)));
    }

    #[test]
    fn jti_is_unique() {
        let codec = codec();
        let uid = Uuid::new_v4();
        let t1 = codec.issue(uid, Role::Accountant, Some(Uuid::new_v4())).unwrap();
        let t2 = codec.issue(uid, Role::Accountant, Some(Uuid::new_v4())).unwrap();
        assert_ne!(codec.verify(&t1).unwrap().jti, codec.verify(&t2).unwrap().jti);
    }
}
