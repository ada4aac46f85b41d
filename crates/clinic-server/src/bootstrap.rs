//! First-start platform admin.

use clinic_core::error::{ClinicError, ClinicResult};
use clinic_core::models::role::Role;
use clinic_core::models::user::{CreateUser, User};
use clinic_core::repository::UserRepository;
use tracing::info;

use crate::config::BootstrapAdmin;

/// Create the platform admin unless a user with that email already
/// exists. Returns the created user, or `None` when nothing was done.
pub async fn ensure_platform_admin<U: UserRepository>(
    users: &U,
    admin: &BootstrapAdmin,
) -> ClinicResult<Option<User>> {
    match users.get_by_email(&admin.email).await {
        Ok(existing) => {
            info!(user_id = %existing.id, "bootstrap admin already present");
            return Ok(None);
        }
        Err(ClinicError::NotFound { .. }) => {}
        Err(e) => return Err(e),
    }

    let user = users
        .create(CreateUser {
            clinic_id: None,
            email: admin.email.clone(),
            full_name: "Platform Administrator".into(),
            role: Role::PlatformAdmin,
            password: admin.password.clone(),
        })
        .await?;
    info!(user_id = %user.id, "bootstrap platform admin created");
    Ok(Some(user))
}
