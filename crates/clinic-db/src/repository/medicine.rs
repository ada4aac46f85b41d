//! SurrealDB implementation of [`MedicineRepository`].
//!
//! Creation only. Stock is changed exclusively by the inventory ledger.

use chrono::{DateTime, Utc};
use clinic_core::error::{ClinicError, ClinicResult};
use clinic_core::models::medicine::{CreateMedicine, Medicine};
use clinic_core::models::money::{from_minor_units, to_minor_units};
use clinic_core::repository::MedicineRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{parse_uuid, to_u32};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
pub(crate) struct MedicineRow {
    pub(crate) clinic_id: String,
    pub(crate) name: String,
    pub(crate) unit_price_minor: i64,
    pub(crate) stock_quantity: i64,
    pub(crate) reorder_level: i64,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl MedicineRow {
    pub(crate) fn into_medicine(self, id: Uuid) -> Result<Medicine, DbError> {
        Ok(Medicine {
            id,
            clinic_id: parse_uuid("clinic_id", &self.clinic_id)?,
            name: self.name,
            unit_price: from_minor_units(self.unit_price_minor),
            stock_quantity: to_u32("stock_quantity", self.stock_quantity)?,
            reorder_level: to_u32("reorder_level", self.reorder_level)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct SurrealMedicineRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealMedicineRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> MedicineRepository for SurrealMedicineRepository<C> {
    async fn create(&self, input: CreateMedicine) -> ClinicResult<Medicine> {
        if input.name.trim().is_empty() {
            return Err(ClinicError::Validation {
                message: "medicine name must not be empty".into(),
            });
        }
        let unit_price_minor = to_minor_units(input.unit_price)?;

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('medicine', $id) SET \
                 clinic_id = $clinic_id, name = $name, \
                 unit_price_minor = $unit_price_minor, \
                 stock_quantity = $stock_quantity, \
                 reorder_level = $reorder_level",
            )
            .bind(("id", id_str.clone()))
            .bind(("clinic_id", input.clinic_id.to_string()))
            .bind(("name", input.name))
            .bind(("unit_price_minor", unit_price_minor))
            .bind(("stock_quantity", i64::from(input.stock_quantity)))
            .bind(("reorder_level", i64::from(input.reorder_level)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("medicine", e))?;

        let rows: Vec<MedicineRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "medicine".into(),
            id: id_str,
        })?;

        Ok(row.into_medicine(id)?)
    }

    async fn get_by_id(&self, clinic_id: Uuid, id: Uuid) -> ClinicResult<Medicine> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('medicine', $id) \
                 WHERE clinic_id = $clinic_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("clinic_id", clinic_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MedicineRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "medicine".into(),
            id: id_str,
        })?;

        Ok(row.into_medicine(id)?)
    }
}
