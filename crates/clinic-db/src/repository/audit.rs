//! SurrealDB implementation of [`AuditRepository`].
//!
//! Append and read only. The table permissions reject updates and deletes.

use chrono::{DateTime, Utc};
use clinic_core::error::ClinicResult;
use clinic_core::models::audit::{AuditAction, AuditEntry, CreateAuditEntry};
use clinic_core::repository::{AuditFilter, AuditRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_opt_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AuditRow {
    actor_id: Option<String>,
    clinic_id: Option<String>,
    action: String,
    resource_kind: String,
    resource_id: Option<String>,
    payload: serde_json::Value,
    origin: Option<String>,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct AuditRowWithId {
    record_id: String,
    actor_id: Option<String>,
    clinic_id: Option<String>,
    action: String,
    resource_kind: String,
    resource_id: Option<String>,
    payload: serde_json::Value,
    origin: Option<String>,
    timestamp: DateTime<Utc>,
}

fn parse_action(s: &str) -> Result<AuditAction, DbError> {
    match s {
        "Create" => Ok(AuditAction::Create),
        "Update" => Ok(AuditAction::Update),
        "Delete" => Ok(AuditAction::Delete),
        other => Err(DbError::InvalidRecord(format!("unknown audit action: {other}"))),
    }
}

impl AuditRow {
    fn into_entry(self, id: Uuid) -> Result<AuditEntry, DbError> {
        Ok(AuditEntry {
            id,
            actor_id: parse_opt_uuid("actor_id", self.actor_id.as_deref())?,
            clinic_id: parse_opt_uuid("clinic_id", self.clinic_id.as_deref())?,
            action: parse_action(&self.action)?,
            resource_kind: self.resource_kind,
            resource_id: parse_opt_uuid("resource_id", self.resource_id.as_deref())?,
            payload: self.payload,
            origin: self.origin,
            timestamp: self.timestamp,
        })
    }
}

impl AuditRowWithId {
    fn try_into_entry(self) -> Result<AuditEntry, DbError> {
        let id = super::parse_uuid("id", &self.record_id)?;
        AuditRow {
            actor_id: self.actor_id,
            clinic_id: self.clinic_id,
            action: self.action,
            resource_kind: self.resource_kind,
            resource_id: self.resource_id,
            payload: self.payload,
            origin: self.origin,
            timestamp: self.timestamp,
        }
        .into_entry(id)
    }
}

/// The payload column is an object; other JSON values are wrapped.
fn payload_object(payload: serde_json::Value) -> serde_json::Value {
    match payload {
        serde_json::Value::Object(_) => payload,
        serde_json::Value::Null => serde_json::Value::Object(Default::default()),
        other => serde_json::json!({ "value": other }),
    }
}

#[derive(Clone)]
pub struct SurrealAuditRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAuditRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AuditRepository for SurrealAuditRepository<C> {
    async fn append(&self, input: CreateAuditEntry) -> ClinicResult<AuditEntry> {
        let id = Uuid::now_v7();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('audit_log', $id) SET \
                 actor_id = $actor_id, clinic_id = $clinic_id, \
                 action = $action, resource_kind = $resource_kind, \
                 resource_id = $resource_id, payload = $payload, \
                 origin = $origin",
            )
            .bind(("id", id_str.clone()))
            .bind(("actor_id", input.actor_id.map(|a| a.to_string())))
            .bind(("clinic_id", input.clinic_id.map(|c| c.to_string())))
            .bind(("action", input.action.as_str().to_string()))
            .bind(("resource_kind", input.resource_kind))
            .bind(("resource_id", input.resource_id.map(|r| r.to_string())))
            .bind(("payload", payload_object(input.payload)))
            .bind(("origin", input.origin))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("audit_log", e))?;

        let rows: Vec<AuditRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "audit_log".into(),
            id: id_str,
        })?;

        Ok(row.into_entry(id)?)
    }

    async fn list(
        &self,
        filter: AuditFilter,
        pagination: Pagination,
    ) -> ClinicResult<PaginatedResult<AuditEntry>> {
        let mut conditions = Vec::new();
        if filter.actor_id.is_some() {
            conditions.push("actor_id = $actor_id");
        }
        if filter.clinic_id.is_some() {
            conditions.push("clinic_id = $clinic_id");
        }
        if filter.action.is_some() {
            conditions.push("action = $action");
        }
        if filter.resource_kind.is_some() {
            conditions.push("resource_kind = $resource_kind");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT count() AS total FROM audit_log{where_clause} GROUP ALL; \
             SELECT meta::id(id) AS record_id, * FROM audit_log{where_clause} \
             ORDER BY timestamp ASC LIMIT $limit START $offset;"
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));

        if let Some(actor_id) = filter.actor_id {
            builder = builder.bind(("actor_id", actor_id.to_string()));
        }
        if let Some(clinic_id) = filter.clinic_id {
            builder = builder.bind(("clinic_id", clinic_id.to_string()));
        }
        if let Some(action) = filter.action {
            builder = builder.bind(("action", action.as_str().to_string()));
        }
        if let Some(resource_kind) = filter.resource_kind {
            builder = builder.bind(("resource_kind", resource_kind));
        }

        let mut result = builder.await.map_err(DbError::from)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let rows: Vec<AuditRowWithId> = result.take(1).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(AuditRowWithId::try_into_entry)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
