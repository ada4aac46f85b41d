//! Medicine bill (sale) domain model.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    Pending,
    Paid,
    Cancelled,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Pending => "pending",
            BillStatus::Paid => "paid",
            BillStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted sale: the bill header plus its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicineBill {
    pub id: Uuid,
    pub clinic_id: Uuid,
    /// Human-facing number, unique across the deployment.
    pub bill_number: String,
    /// The patient the medicines were sold to.
    pub buyer_id: Uuid,
    /// The pharmacist who made the sale.
    pub seller_id: Uuid,
    /// Always equal to the sum of the items' `line_total`.
    pub total_amount: Decimal,
    pub status: BillStatus,
    pub items: Vec<MedicineBillItem>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicineBillItem {
    pub id: Uuid,
    pub medicine_id: Uuid,
    pub quantity: u32,
    /// Price read from the locked inventory row, never from the client.
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// One requested line of a sale. Carries no price on purpose.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaleLine {
    pub medicine_id: Uuid,
    pub quantity: u32,
}

/// Input of the sale transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRequest {
    pub clinic_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    /// Processed in the given order; may name the same medicine twice.
    pub lines: Vec<SaleLine>,
}

/// Build the bill number for a bill id.
///
/// Bill ids are unique, so the numbers are too; no clock is involved.
pub fn bill_number_for(bill_id: Uuid) -> String {
    format!("MED-{}", bill_id.simple().to_string().to_uppercase())
}
