//! Resolved caller identity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;

/// The authoritative view of a caller, as read from the credential store on
/// the current request.
///
/// Never built from token claims: the resolver copies role and clinic from
/// the stored user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
    /// `None` only for platform admins.
    pub clinic_id: Option<Uuid>,
    pub active: bool,
}

/// Data-access scope granted by the authorization gate.
///
/// Handlers filter every read and write by this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClinicScope {
    /// Platform-wide access; only a platform admin can hold it.
    Global,
    Clinic(Uuid),
}

impl ClinicScope {
    /// The clinic to filter by, if the scope is clinic-bound.
    pub fn clinic_id(&self) -> Option<Uuid> {
        match self {
            ClinicScope::Global => None,
            ClinicScope::Clinic(id) => Some(*id),
        }
    }
}
