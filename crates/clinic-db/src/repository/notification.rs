//! SurrealDB implementation of [`NotificationRepository`].

use chrono::{DateTime, Utc};
use clinic_core::error::ClinicResult;
use clinic_core::models::notification::{
    CreateNotification, Notification, NotificationCategory,
};
use clinic_core::repository::{NotificationRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_opt_uuid, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct NotificationRow {
    recipient_id: String,
    clinic_id: Option<String>,
    category: String,
    title: String,
    body: String,
    related_resource_id: Option<String>,
    read: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct NotificationRowWithId {
    record_id: String,
    recipient_id: String,
    clinic_id: Option<String>,
    category: String,
    title: String,
    body: String,
    related_resource_id: Option<String>,
    read: bool,
    created_at: DateTime<Utc>,
}

fn parse_category(s: &str) -> Result<NotificationCategory, DbError> {
    match s {
        "appointment" => Ok(NotificationCategory::Appointment),
        "bill" => Ok(NotificationCategory::Bill),
        "lab_report" => Ok(NotificationCategory::LabReport),
        other => Err(DbError::InvalidRecord(format!(
            "unknown notification category: {other}"
        ))),
    }
}

impl NotificationRow {
    fn into_notification(self, id: Uuid) -> Result<Notification, DbError> {
        Ok(Notification {
            id,
            recipient_id: parse_uuid("recipient_id", &self.recipient_id)?,
            clinic_id: parse_opt_uuid("clinic_id", self.clinic_id.as_deref())?,
            category: parse_category(&self.category)?,
            title: self.title,
            body: self.body,
            related_resource_id: parse_opt_uuid(
                "related_resource_id",
                self.related_resource_id.as_deref(),
            )?,
            read: self.read,
            created_at: self.created_at,
        })
    }
}

impl NotificationRowWithId {
    fn try_into_notification(self) -> Result<Notification, DbError> {
        let id = parse_uuid("id", &self.record_id)?;
        NotificationRow {
            recipient_id: self.recipient_id,
            clinic_id: self.clinic_id,
            category: self.category,
            title: self.title,
            body: self.body,
            related_resource_id: self.related_resource_id,
            read: self.read,
            created_at: self.created_at,
        }
        .into_notification(id)
    }
}

#[derive(Clone)]
pub struct SurrealNotificationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealNotificationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> NotificationRepository for SurrealNotificationRepository<C> {
    async fn create(&self, input: CreateNotification) -> ClinicResult<Notification> {
        let id = Uuid::now_v7();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('notification', $id) SET \
                 recipient_id = $recipient_id, clinic_id = $clinic_id, \
                 category = $category, title = $title, body = $body, \
                 related_resource_id = $related_resource_id, read = false",
            )
            .bind(("id", id_str.clone()))
            .bind(("recipient_id", input.recipient_id.to_string()))
            .bind(("clinic_id", input.clinic_id.map(|c| c.to_string())))
            .bind(("category", input.category.as_str().to_string()))
            .bind(("title", input.title))
            .bind(("body", input.body))
            .bind((
                "related_resource_id",
                input.related_resource_id.map(|r| r.to_string()),
            ))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("notification", e))?;

        let rows: Vec<NotificationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "notification".into(),
            id: id_str,
        })?;

        Ok(row.into_notification(id)?)
    }

    async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
        pagination: Pagination,
    ) -> ClinicResult<PaginatedResult<Notification>> {
        let recipient_id_str = recipient_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM notification \
                 WHERE recipient_id = $recipient_id GROUP ALL",
            )
            .bind(("recipient_id", recipient_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM notification \
                 WHERE recipient_id = $recipient_id \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("recipient_id", recipient_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NotificationRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(NotificationRowWithId::try_into_notification)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
