//! Role and tenant authorization.

use clinic_core::error::{ClinicError, ClinicResult};
use clinic_core::models::identity::{ClinicScope, Identity};
use clinic_core::models::role::Role;
use uuid::Uuid;

/// Decide whether `identity` may run an operation whitelisted for
/// `allowed_roles`, optionally against `requested_clinic`.
///
/// On success, returns the scope every downstream read and write must be
/// filtered by. A platform admin may target any clinic; everyone else is
/// pinned to their own. Pure: the same arguments always give the same
/// answer.
pub fn authorize(
    identity: &Identity,
    allowed_roles: &[Role],
    requested_clinic: Option<Uuid>,
) -> ClinicResult<ClinicScope> {
    if !identity.active {
        return Err(denied("inactive account"));
    }

    if !allowed_roles.contains(&identity.role) {
        return Err(denied("role not permitted"));
    }

    if identity.role.is_platform() {
        return Ok(requested_clinic.map_or(ClinicScope::Global, ClinicScope::Clinic));
    }

    let own_clinic = identity
        .clinic_id
        .ok_or_else(|| denied("identity has no clinic"))?;

    match requested_clinic {
        Some(requested) if requested != own_clinic => Err(denied("cross-tenant access")),
        _ => Ok(ClinicScope::Clinic(own_clinic)),
    }
}

fn denied(reason: &str) -> ClinicError {
    ClinicError::AuthorizationDenied {
        reason: reason.into(),
    }
}
