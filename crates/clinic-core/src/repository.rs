//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Clinic-scoped repositories
//! require a `clinic_id` parameter to enforce data isolation.

use uuid::Uuid;

use crate::error::ClinicResult;
use crate::models::{
    audit::{AuditAction, AuditEntry, CreateAuditEntry},
    bill::{MedicineBill, SaleRequest},
    clinic::{Clinic, CreateClinic},
    medicine::{CreateMedicine, Medicine},
    notification::{CreateNotification, Notification},
    role::Role,
    user::{CreateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Clinics (global scope)
// ---------------------------------------------------------------------------

pub trait ClinicRepository: Send + Sync {
    fn create(&self, input: CreateClinic) -> impl Future<Output = ClinicResult<Clinic>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ClinicResult<Clinic>> + Send;
}

// ---------------------------------------------------------------------------
// Credential store
// ---------------------------------------------------------------------------

/// The credential store.
///
/// Lookups by id and email are global: the caller does not know the clinic
/// yet when authenticating. Every read goes to the store; implementations
/// must not cache.
pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = ClinicResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ClinicResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = ClinicResult<User>> + Send;
    /// Soft (de)activation. Takes effect on the very next resolve.
    fn set_active(
        &self,
        id: Uuid,
        active: bool,
    ) -> impl Future<Output = ClinicResult<User>> + Send;
    fn set_role(&self, id: Uuid, role: Role) -> impl Future<Output = ClinicResult<User>> + Send;
}

// ---------------------------------------------------------------------------
// Inventory (clinic-scoped)
// ---------------------------------------------------------------------------

pub trait MedicineRepository: Send + Sync {
    fn create(&self, input: CreateMedicine)
    -> impl Future<Output = ClinicResult<Medicine>> + Send;
    fn get_by_id(
        &self,
        clinic_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = ClinicResult<Medicine>> + Send;
}

/// The only entry point that may change stock.
pub trait InventoryLedger: Send + Sync {
    /// Price, decrement and bill a sale as one unit: either every line is
    /// applied and the bill exists, or nothing changed.
    fn sell(&self, request: SaleRequest) -> impl Future<Output = ClinicResult<MedicineBill>> + Send;
}

pub trait BillRepository: Send + Sync {
    fn get_by_id(
        &self,
        clinic_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = ClinicResult<MedicineBill>> + Send;
    fn list(
        &self,
        clinic_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = ClinicResult<PaginatedResult<MedicineBill>>> + Send;
}

// ---------------------------------------------------------------------------
// Audit (append-only)
// ---------------------------------------------------------------------------

/// Query filters for audit log entries.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub actor_id: Option<Uuid>,
    pub clinic_id: Option<Uuid>,
    pub action: Option<AuditAction>,
    pub resource_kind: Option<String>,
}

pub trait AuditRepository: Send + Sync {
    /// Append a new audit entry. No update or delete operations exist.
    fn append(
        &self,
        input: CreateAuditEntry,
    ) -> impl Future<Output = ClinicResult<AuditEntry>> + Send;
    fn list(
        &self,
        filter: AuditFilter,
        pagination: Pagination,
    ) -> impl Future<Output = ClinicResult<PaginatedResult<AuditEntry>>> + Send;
}

// ---------------------------------------------------------------------------
// Notifications (per recipient)
// ---------------------------------------------------------------------------

pub trait NotificationRepository: Send + Sync {
    fn create(
        &self,
        input: CreateNotification,
    ) -> impl Future<Output = ClinicResult<Notification>> + Send;
    fn list_for_recipient(
        &self,
        recipient_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = ClinicResult<PaginatedResult<Notification>>> + Send;
}
