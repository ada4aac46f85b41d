//! Clinic domain model.
//!
//! Clinics are the tenants of the deployment. Every user except a platform
//! admin, and every medicine and bill, is scoped to one clinic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clinic {
    pub id: Uuid,
    pub name: String,
    /// URL-safe unique identifier (e.g., `riverside`).
    pub slug: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClinic {
    pub name: String,
    pub slug: String,
}
