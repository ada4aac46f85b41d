//! SurrealDB repository implementations.

mod audit;
mod bill;
mod clinic;
mod medicine;
mod notification;
mod user;

pub use audit::SurrealAuditRepository;
pub use bill::SurrealBillRepository;
pub use clinic::SurrealClinicRepository;
pub use medicine::SurrealMedicineRepository;
pub use notification::SurrealNotificationRepository;
pub use user::SurrealUserRepository;

use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub(crate) total: u64,
}

pub(crate) fn parse_uuid(field: &str, value: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::InvalidRecord(format!("{field}: {e}")))
}

pub(crate) fn parse_opt_uuid(field: &str, value: Option<&str>) -> Result<Option<Uuid>, DbError> {
    value.map(|v| parse_uuid(field, v)).transpose()
}

/// Stored integers are guarded non-negative by the schema.
pub(crate) fn to_u32(field: &str, value: i64) -> Result<u32, DbError> {
    u32::try_from(value).map_err(|_| DbError::InvalidRecord(format!("{field}: {value}")))
}
