//! Login: email + password in, bearer token out.

use clinic_core::error::{ClinicError, ClinicResult};
use clinic_core::models::identity::Identity;
use clinic_core::repository::UserRepository;
use tracing::{debug, info};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token::TokenCodec;

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed bearer token.
    pub access_token: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
    pub identity: Identity,
}

/// Password login.
///
/// Generic over the credential store so that the auth layer has no
/// dependency on the database crate.
pub struct LoginService<U: UserRepository> {
    users: U,
    codec: TokenCodec,
    config: AuthConfig,
}

impl<U: UserRepository> LoginService<U> {
    pub fn new(users: U, config: AuthConfig) -> Result<Self, AuthError> {
        Ok(Self {
            users,
            codec: TokenCodec::new(&config)?,
            config,
        })
    }

    /// Verify credentials and issue a token.
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, input: LoginInput) -> ClinicResult<LoginOutput> {
        let email = input.email.trim().to_lowercase();

        let user = match self.users.get_by_email(&email).await {
            Ok(user) => user,
            Err(ClinicError::NotFound { .. }) => {
                password::burn_verification(&input.password);
                debug!("login for unknown email");
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };

        let valid = password::verify_password(
            &input.password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            debug!(user_id = %user.id, "login with wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        if !user.active {
            return Err(AuthError::AccountInactive.into());
        }

        let access_token = self.codec.issue(user.id, user.role, user.clinic_id)?;
        info!(user_id = %user.id, role = %user.role, "user logged in");

        Ok(LoginOutput {
            access_token,
            expires_in: self.config.token_lifetime_secs,
            identity: user.identity(),
        })
    }
}
