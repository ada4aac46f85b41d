//! Audit log domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "Create",
            AuditAction::Update => "Update",
            AuditAction::Delete => "Delete",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    /// `None` when the action was not performed by an authenticated user.
    pub actor_id: Option<Uuid>,
    pub clinic_id: Option<Uuid>,
    pub action: AuditAction,
    /// Kind of record touched (e.g., `medicine_bill`).
    pub resource_kind: String,
    pub resource_id: Option<Uuid>,
    /// Snapshot of the request body at call time.
    pub payload: serde_json::Value,
    /// Network origin of the request, when known.
    pub origin: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditEntry {
    pub actor_id: Option<Uuid>,
    pub clinic_id: Option<Uuid>,
    pub action: AuditAction,
    pub resource_kind: String,
    pub resource_id: Option<Uuid>,
    pub payload: serde_json::Value,
    pub origin: Option<String>,
}
