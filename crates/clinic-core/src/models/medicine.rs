//! Medicine (inventory item) domain model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medicine {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    /// Never negative. Decremented only by the sale transaction.
    pub stock_quantity: u32,
    pub reorder_level: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Medicine {
    pub fn needs_reorder(&self) -> bool {
        self.stock_quantity <= self.reorder_level
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMedicine {
    pub clinic_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub stock_quantity: u32,
    pub reorder_level: u32,
}
