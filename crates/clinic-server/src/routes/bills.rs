//! Pharmacist medicine sales.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use clinic_auth::authorize;
use clinic_core::error::ClinicError;
use clinic_core::models::audit::AuditAction;
use clinic_core::models::bill::{MedicineBill, SaleLine, SaleRequest};
use clinic_core::models::notification::NotificationCategory;
use clinic_core::models::role::allow;
use clinic_core::repository::InventoryLedger;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::{ApiJson, Authenticated, client_origin};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBillRequest {
    pub patient_id: Uuid,
    pub items: Vec<SaleLine>,
}

/// Sell medicines to a patient of the caller's clinic.
///
/// The audit entry and the buyer's notification are queued only after
/// the sale has committed.
pub async fn create(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    headers: HeaderMap,
    ApiJson(body): ApiJson<CreateBillRequest>,
) -> Result<(StatusCode, Json<MedicineBill>), ApiError> {
    let scope = authorize(&identity, allow::SELL_MEDICINE, None)?;
    let clinic_id = scope.clinic_id().ok_or_else(|| ClinicError::AuthorizationDenied {
        reason: "sale requires a clinic scope".into(),
    })?;

    let payload = json!({ "patient_id": body.patient_id, "items": body.items });

    let bill = state
        .ledger()
        .sell(SaleRequest {
            clinic_id,
            buyer_id: body.patient_id,
            seller_id: identity.id,
            lines: body.items,
        })
        .await?;

    info!(
        bill_id = %bill.id,
        bill_number = %bill.bill_number,
        %clinic_id,
        total = %bill.total_amount,
        "medicine bill created"
    );

    state.audit().record(
        Some(&identity),
        AuditAction::Create,
        "medicine_bill",
        Some(bill.id),
        payload,
        client_origin(&headers),
    );
    state.notifier().notify(
        bill.buyer_id,
        NotificationCategory::Bill,
        "New medicine bill",
        format!(
            "Bill {} has been issued for {}.",
            bill.bill_number, bill.total_amount
        ),
        Some(bill.id),
    );

    Ok((StatusCode::CREATED, Json(bill)))
}
