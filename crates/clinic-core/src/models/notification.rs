//! Notification domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    Appointment,
    Bill,
    LabReport,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::Appointment => "appointment",
            NotificationCategory::Bill => "bill",
            NotificationCategory::LabReport => "lab_report",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub clinic_id: Option<Uuid>,
    pub category: NotificationCategory,
    pub title: String,
    pub body: String,
    pub related_resource_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotification {
    pub recipient_id: Uuid,
    pub clinic_id: Option<Uuid>,
    pub category: NotificationCategory,
    pub title: String,
    pub body: String,
    pub related_resource_id: Option<Uuid>,
}
