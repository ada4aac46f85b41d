//! Error types for the clinic operations core.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ClinicError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// A sale line names an item that does not exist in the sale's clinic.
    #[error("Item not found: {item_id}")]
    ItemNotFound { item_id: Uuid },

    #[error("Insufficient stock for item {item_id}: requested {requested}, available {available}")]
    InsufficientStock {
        item_id: Uuid,
        requested: u32,
        available: u32,
    },

    /// A party to a sale (buyer or seller) is not a member of the sale's
    /// clinic.
    #[error("Tenant mismatch: {party} {id} does not belong to clinic {clinic_id}")]
    TenantMismatch {
        party: String,
        id: Uuid,
        clinic_id: Uuid,
    },

    /// Infrastructure-level abort. Nothing was persisted; the same input may
    /// be retried.
    #[error("Transaction aborted: {reason}")]
    TransactionAborted { reason: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClinicError {
    /// Whether the failed operation can be retried with the same input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClinicError::TransactionAborted { .. })
    }
}

pub type ClinicResult<T> = Result<T, ClinicError>;
