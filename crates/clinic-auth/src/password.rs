//! Password verification using Argon2id.
//!
//! Hashing happens in the credential store when a user is created; this
//! module only checks a presented password against a stored PHC string.

use std::borrow::Cow;
use std::sync::OnceLock;

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use crate::error::AuthError;

fn peppered<'a>(password: &'a str, pepper: Option<&str>) -> Cow<'a, [u8]> {
    match pepper {
        Some(p) => Cow::Owned(format!("{p}{password}").into_bytes()),
        None => Cow::Borrowed(password.as_bytes()),
    }
}

/// Verify a plaintext password against an Argon2id PHC-format hash.
///
/// Returns `Ok(false)` on mismatch and `Err(AuthError::Crypto)` if the
/// stored hash is malformed.
pub fn verify_password(
    password: &str,
    hash: &str,
    pepper: Option<&str>,
) -> Result<bool, AuthError> {
    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;

    match Argon2::default().verify_password(&peppered(password, pepper), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}

/// Spend one verification on a throwaway hash.
///
/// Called when the login email is unknown so that the response time does
/// not reveal whether an account exists.
pub fn burn_verification(password: &str) {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();
    let dummy = DUMMY_HASH.get_or_init(|| {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(b"no-such-account", &salt)
            .ok()
            .map(|h| h.to_string())
    });
    if let Some(hash) = dummy {
        let _ = verify_password(password, hash, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(password: &str, pepper: Option<&str>) -> String {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(&peppered(password, pepper), &salt)
            .expect("hashing failed")
            .to_string()
    }

    #[test]
    fn correct_password_matches() {
        let stored = hash("Pharmacy@2024", None);
        assert!(verify_password("Pharmacy@2024", &stored, None).unwrap());
    }

    #[test]
    fn wrong_password_does_not_match() {
        let stored = hash("Pharmacy@2024", None);
        assert!(!verify_password("pharmacy@2024", &stored, None).unwrap());
    }

    #[test]
    fn pepper_must_match() {
        let stored = hash("Pharmacy@2024", Some("clinic-pepper"));
        assert!(verify_password("Pharmacy@2024", &stored, Some("clinic-pepper")).unwrap());
        assert!(!verify_password("Pharmacy@2024", &stored, None).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("pw", "plaintext-in-the-db", None).is_err());
    }

    #[test]
    fn burning_a_verification_does_not_panic() {
        burn_verification("anything");
    }
}
