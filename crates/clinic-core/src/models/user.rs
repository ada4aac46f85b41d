//! User domain model (credential store record).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::identity::Identity;
use super::role::Role;
use crate::error::{ClinicError, ClinicResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Fixed at creation. `None` only for platform admins.
    pub clinic_id: Option<Uuid>,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub password_hash: String,
    /// Soft-deactivation flag; users are never deleted.
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            role: self.role,
            clinic_id: self.clinic_id,
            active: self.active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub clinic_id: Option<Uuid>,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    /// Raw password (will be hashed with Argon2id before storage).
    pub password: String,
}

impl CreateUser {
    /// Enforce the role/clinic pairing: platform admins have no clinic,
    /// everyone else has exactly one.
    pub fn validate(&self) -> ClinicResult<()> {
        match (self.role.is_platform(), self.clinic_id) {
            (true, Some(_)) => Err(ClinicError::Validation {
                message: "platform admins cannot belong to a clinic".into(),
            }),
            (false, None) => Err(ClinicError::Validation {
                message: format!("role {} requires a clinic", self.role),
            }),
            _ if self.email.trim().is_empty() => Err(ClinicError::Validation {
                message: "email must not be empty".into(),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(role: Role, clinic_id: Option<Uuid>) -> CreateUser {
        CreateUser {
            clinic_id,
            email: "someone@example.com".into(),
            full_name: "Someone".into(),
            role,
            password: "irrelevant".into(),
        }
    }

    #[test]
    fn platform_admin_without_clinic_is_valid() {
        assert!(input(Role::PlatformAdmin, None).validate().is_ok());
    }

    #[test]
    fn platform_admin_with_clinic_is_rejected() {
        assert!(
            input(Role::PlatformAdmin, Some(Uuid::new_v4()))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn clinic_roles_require_a_clinic() {
        for role in Role::ALL.into_iter().filter(|r| !r.is_platform()) {
            assert!(input(role, None).validate().is_err(), "{role}");
            assert!(input(role, Some(Uuid::new_v4())).validate().is_ok());
        }
    }
}
