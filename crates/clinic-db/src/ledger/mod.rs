//! The inventory ledger: the only code path that changes stock.
//!
//! A sale runs in four steps:
//!
//! 1. lock every touched medicine row, in ascending id order, within the
//!    lock-wait timeout;
//! 2. read the locked rows and price each line from the stored unit
//!    price, checking stock against a running remainder so that a
//!    medicine named twice is counted twice;
//! 3. check the sale deadline;
//! 4. send one SurrealQL transaction that decrements stock (guarded by
//!    `stock_quantity >= quantity` and the priced `unit_price_minor`),
//!    creates the bill header and creates every line item.
//!
//! The row locks only cover this process. When another writer changes a
//! row between steps 2 and 4 the guard rejects the transaction; the rows
//! are then read and priced again, so a sale that lost its stock to
//! another process fails with `InsufficientStock`, and one that still
//! fits is retried.
//!
//! Anything infrastructural that goes wrong surfaces as
//! `TransactionAborted` and leaves no trace in the database.

mod locks;

pub use locks::{RowLockSet, RowLocks};

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use clinic_core::error::{ClinicError, ClinicResult};
use clinic_core::models::bill::{
    BillStatus, MedicineBill, MedicineBillItem, SaleLine, SaleRequest, bill_number_for,
};
use clinic_core::models::money::{from_minor_units, to_minor_units};
use clinic_core::repository::InventoryLedger;
use rust_decimal::Decimal;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tokio::time::{Instant, timeout};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Commit attempts per sale before giving up with `TransactionAborted`.
const MAX_COMMIT_ATTEMPTS: u32 = 8;

/// Time limits for one sale.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Upper bound on the whole sale, from entry to commit.
    pub deadline: Duration,
    /// Upper bound on waiting for row locks held by other sales.
    pub lock_timeout: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            deadline: Duration::from_millis(5_000),
            lock_timeout: Duration::from_millis(2_000),
        }
    }
}

#[derive(Debug, SurrealValue)]
struct LockedRow {
    unit_price_minor: i64,
    stock_quantity: i64,
}

#[derive(Debug, SurrealValue)]
struct PartyRow {
    clinic_id: Option<String>,
}

/// A medicine row as seen under its lock.
#[derive(Debug, Clone, Copy)]
struct StockSnapshot {
    unit_price: Decimal,
    stock_quantity: u32,
}

fn aborted(reason: impl Into<String>) -> ClinicError {
    ClinicError::TransactionAborted {
        reason: reason.into(),
    }
}

fn validate_lines(lines: &[SaleLine]) -> ClinicResult<()> {
    if lines.is_empty() {
        return Err(ClinicError::Validation {
            message: "a sale needs at least one line".into(),
        });
    }
    if let Some(line) = lines.iter().find(|l| l.quantity == 0) {
        return Err(ClinicError::Validation {
            message: format!("quantity for medicine {} must be positive", line.medicine_id),
        });
    }
    Ok(())
}

/// Price the lines in request order against the locked snapshots.
fn price_lines(
    lines: &[SaleLine],
    snapshots: &HashMap<Uuid, StockSnapshot>,
) -> ClinicResult<Vec<MedicineBillItem>> {
    let mut remaining: HashMap<Uuid, u32> = HashMap::new();
    let mut items = Vec::with_capacity(lines.len());

    for line in lines {
        let snapshot = snapshots
            .get(&line.medicine_id)
            .ok_or(ClinicError::ItemNotFound {
                item_id: line.medicine_id,
            })?;

        let available = remaining
            .entry(line.medicine_id)
            .or_insert(snapshot.stock_quantity);
        if *available < line.quantity {
            return Err(ClinicError::InsufficientStock {
                item_id: line.medicine_id,
                requested: line.quantity,
                available: *available,
            });
        }
        *available -= line.quantity;

        items.push(MedicineBillItem {
            id: Uuid::now_v7(),
            medicine_id: line.medicine_id,
            quantity: line.quantity,
            unit_price: snapshot.unit_price,
            line_total: snapshot.unit_price * Decimal::from(line.quantity),
        });
    }

    Ok(items)
}

/// Share of `remaining` given to each timed statement of the script.
///
/// The script runs `2 * line_count + 1` timed statements, so the sum of
/// their timeouts never exceeds what is left of the deadline.
fn statement_timeout(remaining: Duration, line_count: usize) -> u128 {
    let statements = 2 * line_count as u128 + 1;
    (remaining.as_millis() / statements).max(1)
}

/// The transaction script for `line_count` lines.
///
/// Line `i` reads its parameters from index `i` of the bound arrays.
fn sale_script(line_count: usize, timeout_ms: u128) -> String {
    let mut script = String::from("BEGIN TRANSACTION;\n");

    for i in 0..line_count {
        script.push_str(&format!(
            "LET $stock_{i} = (UPDATE type::record('medicine', $medicine_ids[{i}]) \
             SET stock_quantity -= $quantities[{i}], updated_at = time::now() \
             WHERE clinic_id = $clinic_id \
             AND stock_quantity >= $quantities[{i}] \
             AND unit_price_minor = $unit_prices[{i}] \
             RETURN AFTER TIMEOUT {timeout_ms}ms);\n\
             IF array::len($stock_{i}) = 0 {{ THROW 'stock guard rejected line {i}' }};\n"
        ));
    }

    script.push_str(&format!(
        "CREATE type::record('medicine_bill', $bill_id) SET \
         clinic_id = $clinic_id, bill_number = $bill_number, \
         buyer_id = $buyer_id, seller_id = $seller_id, \
         total_minor = $total_minor, status = $status, \
         created_at = $created_at \
         RETURN NONE TIMEOUT {timeout_ms}ms;\n"
    ));

    for i in 0..line_count {
        script.push_str(&format!(
            "CREATE type::record('medicine_bill_item', $line_ids[{i}]) SET \
             bill_id = $bill_id, clinic_id = $clinic_id, \
             medicine_id = $medicine_ids[{i}], position = {i}, \
             quantity = $quantities[{i}], \
             unit_price_minor = $unit_prices[{i}], \
             line_total_minor = $line_totals[{i}] \
             RETURN NONE TIMEOUT {timeout_ms}ms;\n"
        ));
    }

    script.push_str("COMMIT TRANSACTION;");
    script
}

/// SurrealDB-backed [`InventoryLedger`].
///
/// Row locks live in this process. Every clone shares the same lock
/// table, so one ledger (or clones of it) must serve all sales of the
/// process. The stock guard and the schema assertion keep stock
/// non-negative even against writers outside the lock table.
#[derive(Clone)]
pub struct SurrealInventoryLedger<C: Connection> {
    db: Surreal<C>,
    locks: RowLocks,
    config: LedgerConfig,
}

impl<C: Connection> SurrealInventoryLedger<C> {
    pub fn new(db: Surreal<C>, config: LedgerConfig) -> Self {
        Self::with_locks(db, config, RowLocks::new())
    }

    pub fn with_locks(db: Surreal<C>, config: LedgerConfig, locks: RowLocks) -> Self {
        Self { db, locks, config }
    }

    pub fn locks(&self) -> &RowLocks {
        &self.locks
    }

    async fn check_party(&self, party: &str, id: Uuid, clinic_id: Uuid) -> ClinicResult<()> {
        let mut result = self
            .db
            .query("SELECT clinic_id FROM type::record('user', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(|e| aborted(format!("reading {party}: {e}")))?;
        let rows: Vec<PartyRow> = result
            .take(0)
            .map_err(|e| aborted(format!("reading {party}: {e}")))?;

        let clinic_str = clinic_id.to_string();
        let member = rows
            .first()
            .and_then(|row| row.clinic_id.as_deref())
            .is_some_and(|c| c == clinic_str);

        if member {
            Ok(())
        } else {
            Err(ClinicError::TenantMismatch {
                party: party.into(),
                id,
                clinic_id,
            })
        }
    }

    /// Read every distinct medicine of the sale. Must run under the locks.
    async fn snapshot(
        &self,
        clinic_id: Uuid,
        lines: &[SaleLine],
    ) -> ClinicResult<HashMap<Uuid, StockSnapshot>> {
        let mut snapshots = HashMap::new();
        let clinic_str = clinic_id.to_string();

        for line in lines {
            if snapshots.contains_key(&line.medicine_id) {
                continue;
            }

            let mut result = self
                .db
                .query(
                    "SELECT unit_price_minor, stock_quantity \
                     FROM type::record('medicine', $id) \
                     WHERE clinic_id = $clinic_id",
                )
                .bind(("id", line.medicine_id.to_string()))
                .bind(("clinic_id", clinic_str.clone()))
                .await
                .map_err(|e| aborted(format!("reading medicine: {e}")))?;
            let rows: Vec<LockedRow> = result
                .take(0)
                .map_err(|e| aborted(format!("reading medicine: {e}")))?;

            // Absent rows stay out of the map and surface as ItemNotFound
            // when their line is priced.
            if let Some(row) = rows.into_iter().next() {
                let stock_quantity = u32::try_from(row.stock_quantity)
                    .map_err(|_| aborted(format!("stored stock out of range: {}", row.stock_quantity)))?;
                snapshots.insert(
                    line.medicine_id,
                    StockSnapshot {
                        unit_price: from_minor_units(row.unit_price_minor),
                        stock_quantity,
                    },
                );
            }
        }

        Ok(snapshots)
    }

    async fn commit(
        &self,
        request: &SaleRequest,
        items: Vec<MedicineBillItem>,
        remaining: Duration,
    ) -> ClinicResult<MedicineBill> {
        let bill_id = Uuid::now_v7();
        let bill_number = bill_number_for(bill_id);
        let created_at = Utc::now();
        let total_amount: Decimal = items.iter().map(|item| item.line_total).sum();

        let mut unit_prices = Vec::with_capacity(items.len());
        let mut line_totals = Vec::with_capacity(items.len());
        for item in &items {
            unit_prices.push(to_minor_units(item.unit_price)?);
            line_totals.push(to_minor_units(item.line_total)?);
        }
        let total_minor = to_minor_units(total_amount)?;

        let script = sale_script(items.len(), statement_timeout(remaining, items.len()));

        let response = self
            .db
            .query(&script)
            .bind(("clinic_id", request.clinic_id.to_string()))
            .bind(("bill_id", bill_id.to_string()))
            .bind(("bill_number", bill_number.clone()))
            .bind(("buyer_id", request.buyer_id.to_string()))
            .bind(("seller_id", request.seller_id.to_string()))
            .bind(("total_minor", total_minor))
            .bind(("status", BillStatus::Pending.as_str().to_string()))
            .bind(("created_at", created_at))
            .bind((
                "medicine_ids",
                items
                    .iter()
                    .map(|i| i.medicine_id.to_string())
                    .collect::<Vec<_>>(),
            ))
            .bind((
                "line_ids",
                items.iter().map(|i| i.id.to_string()).collect::<Vec<_>>(),
            ))
            .bind((
                "quantities",
                items
                    .iter()
                    .map(|i| i64::from(i.quantity))
                    .collect::<Vec<_>>(),
            ))
            .bind(("unit_prices", unit_prices))
            .bind(("line_totals", line_totals))
            .await
            .map_err(|e| {
                warn!(error = %e, "sale transaction failed to execute");
                aborted(e.to_string())
            })?;

        response.check().map_err(|e| {
            debug!(error = %e, "sale transaction rolled back");
            aborted(e.to_string())
        })?;

        Ok(MedicineBill {
            id: bill_id,
            clinic_id: request.clinic_id,
            bill_number,
            buyer_id: request.buyer_id,
            seller_id: request.seller_id,
            total_amount,
            status: BillStatus::Pending,
            items,
            created_at,
        })
    }
}

impl<C: Connection> InventoryLedger for SurrealInventoryLedger<C> {
    async fn sell(&self, request: SaleRequest) -> ClinicResult<MedicineBill> {
        let started = Instant::now();
        let deadline = started + self.config.deadline;

        validate_lines(&request.lines)?;
        self.check_party("buyer", request.buyer_id, request.clinic_id)
            .await?;
        self.check_party("seller", request.seller_id, request.clinic_id)
            .await?;

        let ids: Vec<Uuid> = request.lines.iter().map(|l| l.medicine_id).collect();
        let wait = self
            .config
            .lock_timeout
            .min(deadline.saturating_duration_since(Instant::now()));
        let _locks = timeout(wait, self.locks.acquire(request.clinic_id, &ids))
            .await
            .map_err(|_| {
                warn!(clinic_id = %request.clinic_id, ?wait, "row lock wait timed out");
                aborted("lock wait timeout")
            })?;

        let mut attempt = 1;
        loop {
            let snapshots = self.snapshot(request.clinic_id, &request.lines).await?;
            let items = price_lines(&request.lines, &snapshots)?;

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!(clinic_id = %request.clinic_id, "sale deadline exceeded before commit");
                return Err(aborted("sale deadline exceeded"));
            }

            match self.commit(&request, items, remaining).await {
                Ok(bill) => {
                    info!(
                        bill_id = %bill.id,
                        bill_number = %bill.bill_number,
                        clinic_id = %bill.clinic_id,
                        lines = bill.items.len(),
                        total = %bill.total_amount,
                        attempt,
                        "medicine sale committed"
                    );
                    return Ok(bill);
                }
                Err(e @ ClinicError::TransactionAborted { .. })
                    if attempt >= MAX_COMMIT_ATTEMPTS =>
                {
                    warn!(clinic_id = %request.clinic_id, attempt, error = %e, "sale gave up");
                    return Err(e);
                }
                Err(ClinicError::TransactionAborted { reason }) => {
                    debug!(
                        clinic_id = %request.clinic_id,
                        attempt,
                        %reason,
                        "re-reading rows after rejected commit"
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
