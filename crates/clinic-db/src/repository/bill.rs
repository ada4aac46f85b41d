//! SurrealDB read side of medicine bills.
//!
//! Bills are only ever written by the inventory ledger; this repository
//! reads them back together with their line items.

use chrono::{DateTime, Utc};
use clinic_core::error::ClinicResult;
use clinic_core::models::bill::{BillStatus, MedicineBill, MedicineBillItem};
use clinic_core::models::money::from_minor_units;
use clinic_core::repository::{BillRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_uuid, to_u32};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct BillRowWithId {
    record_id: String,
    clinic_id: String,
    bill_number: String,
    buyer_id: String,
    seller_id: String,
    total_minor: i64,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct BillItemRowWithId {
    record_id: String,
    medicine_id: String,
    quantity: i64,
    unit_price_minor: i64,
    line_total_minor: i64,
}

fn parse_status(s: &str) -> Result<BillStatus, DbError> {
    match s {
        "pending" => Ok(BillStatus::Pending),
        "paid" => Ok(BillStatus::Paid),
        "cancelled" => Ok(BillStatus::Cancelled),
        other => Err(DbError::InvalidRecord(format!("unknown bill status: {other}"))),
    }
}

impl BillItemRowWithId {
    fn try_into_item(self) -> Result<MedicineBillItem, DbError> {
        Ok(MedicineBillItem {
            id: parse_uuid("id", &self.record_id)?,
            medicine_id: parse_uuid("medicine_id", &self.medicine_id)?,
            quantity: to_u32("quantity", self.quantity)?,
            unit_price: from_minor_units(self.unit_price_minor),
            line_total: from_minor_units(self.line_total_minor),
        })
    }
}

impl BillRowWithId {
    fn try_into_bill(self, items: Vec<MedicineBillItem>) -> Result<MedicineBill, DbError> {
        Ok(MedicineBill {
            id: parse_uuid("id", &self.record_id)?,
            clinic_id: parse_uuid("clinic_id", &self.clinic_id)?,
            bill_number: self.bill_number,
            buyer_id: parse_uuid("buyer_id", &self.buyer_id)?,
            seller_id: parse_uuid("seller_id", &self.seller_id)?,
            total_amount: from_minor_units(self.total_minor),
            status: parse_status(&self.status)?,
            items,
            created_at: self.created_at,
        })
    }
}

#[derive(Clone)]
pub struct SurrealBillRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealBillRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn items_of(&self, bill_id: &str) -> Result<Vec<MedicineBillItem>, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM medicine_bill_item \
                 WHERE bill_id = $bill_id ORDER BY position ASC",
            )
            .bind(("bill_id", bill_id.to_string()))
            .await?;

        let rows: Vec<BillItemRowWithId> = result.take(0)?;
        rows.into_iter().map(BillItemRowWithId::try_into_item).collect()
    }
}

impl<C: Connection> BillRepository for SurrealBillRepository<C> {
    async fn get_by_id(&self, clinic_id: Uuid, id: Uuid) -> ClinicResult<MedicineBill> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('medicine_bill', $id) \
                 WHERE clinic_id = $clinic_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("clinic_id", clinic_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BillRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "medicine_bill".into(),
            id: id_str.clone(),
        })?;

        let items = self.items_of(&id_str).await?;
        Ok(row.try_into_bill(items)?)
    }

    async fn list(
        &self,
        clinic_id: Uuid,
        pagination: Pagination,
    ) -> ClinicResult<PaginatedResult<MedicineBill>> {
        let clinic_id_str = clinic_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM medicine_bill \
                 WHERE clinic_id = $clinic_id GROUP ALL",
            )
            .bind(("clinic_id", clinic_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM medicine_bill \
                 WHERE clinic_id = $clinic_id \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("clinic_id", clinic_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BillRowWithId> = result.take(0).map_err(DbError::from)?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let lines = self.items_of(&row.record_id).await?;
            items.push(row.try_into_bill(lines)?);
        }

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
