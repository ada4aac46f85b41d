//! Identity resolution: bearer token → live identity.

use clinic_core::error::{ClinicError, ClinicResult};
use clinic_core::models::identity::Identity;
use clinic_core::repository::UserRepository;
use tracing::debug;

use crate::error::AuthError;
use crate::token::TokenCodec;

/// Turns a bearer token into the caller's current identity.
///
/// The token is only a subject-id carrier. Role, clinic and the active flag
/// are read from the credential store on every call, so a role change or a
/// deactivation takes effect on the next request even while old tokens are
/// still unexpired.
pub struct IdentityResolver<U: UserRepository> {
    users: U,
    codec: TokenCodec,
}

impl<U: UserRepository> IdentityResolver<U> {
    pub fn new(users: U, codec: TokenCodec) -> Self {
        Self { users, codec }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Resolve `raw_token` (without the `Bearer ` prefix).
    ///
    /// Every failure is reported as `AuthenticationFailed`; the reason is
    /// for logs only and must not reach the caller.
    pub async fn resolve(&self, raw_token: &str) -> ClinicResult<Identity> {
        let claims = self.codec.verify(raw_token)?;
        let subject_id = claims.subject_id()?;

        let user = match self.users.get_by_id(subject_id).await {
            Ok(user) => user,
            Err(ClinicError::NotFound { .. }) => {
                debug!(%subject_id, "token subject no longer exists");
                return Err(AuthError::UnknownSubject.into());
            }
            Err(e) => return Err(e),
        };

        if !user.active {
            debug!(%subject_id, "token subject is inactive");
            return Err(AuthError::AccountInactive.into());
        }

        if user.role != claims.role {
            debug!(
                %subject_id,
                token_role = %claims.role,
                stored_role = %user.role,
                "token role is stale; using stored role"
            );
        }

        Ok(user.identity())
    }
}
