//! Role domain model.
//!
//! The eight roles are fixed; there is no role table. A user holds exactly
//! one role for its whole lifetime unless an administrator changes it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClinicError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    PlatformAdmin,
    ClinicAdmin,
    Doctor,
    Receptionist,
    Patient,
    Pharmacist,
    Accountant,
    LabTechnician,
}

impl Role {
    pub const ALL: [Role; 8] = [
        Role::PlatformAdmin,
        Role::ClinicAdmin,
        Role::Doctor,
        Role::Receptionist,
        Role::Patient,
        Role::Pharmacist,
        Role::Accountant,
        Role::LabTechnician,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::PlatformAdmin => "platform_admin",
            Role::ClinicAdmin => "clinic_admin",
            Role::Doctor => "doctor",
            Role::Receptionist => "receptionist",
            Role::Patient => "patient",
            Role::Pharmacist => "pharmacist",
            Role::Accountant => "accountant",
            Role::LabTechnician => "lab_technician",
        }
    }

    /// Platform admins are the only role that lives outside any clinic.
    pub fn is_platform(&self) -> bool {
        matches!(self, Role::PlatformAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ClinicError::Validation {
                message: format!("unknown role: {s}"),
            })
    }
}

/// Role whitelists for the operations guarded by the core.
///
/// Each gated operation names one of these constants; the whitelist is part
/// of the operation, not of the caller.
pub mod allow {
    use super::Role;

    pub const SELL_MEDICINE: &[Role] = &[Role::Pharmacist];
    pub const MANAGE_MEDICINES: &[Role] = &[Role::Pharmacist];
    pub const MANAGE_STAFF: &[Role] = &[Role::ClinicAdmin];
    pub const MANAGE_CLINICS: &[Role] = &[Role::PlatformAdmin];
    pub const DECIDE_APPOINTMENTS: &[Role] = &[Role::Doctor];
    pub const BOOK_APPOINTMENTS: &[Role] = &[Role::Receptionist];
    pub const ISSUE_TREATMENT_BILLS: &[Role] = &[Role::Accountant];
    pub const UPLOAD_LAB_REPORTS: &[Role] = &[Role::LabTechnician];
    pub const ANY: &[Role] = &Role::ALL;
}
