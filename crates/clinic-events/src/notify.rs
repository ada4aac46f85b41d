//! Notification fan-out.
//!
//! Notifications are queued after the triggering operation has
//! committed. The background writer re-reads the recipient from the
//! credential store and only writes for a recipient that exists and is
//! active.

use clinic_core::error::ClinicError;
use clinic_core::models::notification::{CreateNotification, NotificationCategory};
use clinic_core::repository::{NotificationRepository, UserRepository};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::sink::Sink;

/// Handle for queueing notifications. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Notifier {
    sink: Sink<CreateNotification>,
}

impl Notifier {
    /// Start the background writer.
    pub fn spawn<U, N>(users: U, notifications: N, capacity: usize) -> (Self, JoinHandle<()>)
    where
        U: UserRepository + 'static,
        N: NotificationRepository + 'static,
    {
        let (sink, mut rx) = Sink::<CreateNotification>::channel("notification", capacity);

        let handle = tokio::spawn(async move {
            while let Some(mut request) = rx.recv().await {
                let recipient_id = request.recipient_id;

                let recipient = match users.get_by_id(recipient_id).await {
                    Ok(user) => user,
                    Err(ClinicError::NotFound { .. }) => {
                        info!(%recipient_id, "notification recipient unknown; dropped");
                        continue;
                    }
                    Err(e) => {
                        warn!(error = %e, %recipient_id, "recipient lookup failed; notification dropped");
                        continue;
                    }
                };
                if !recipient.active {
                    info!(%recipient_id, "notification recipient inactive; dropped");
                    continue;
                }

                request.clinic_id = recipient.clinic_id;
                let category = request.category;
                if let Err(e) = notifications.create(request).await {
                    warn!(
                        error = %e,
                        %recipient_id,
                        category = category.as_str(),
                        "notification write failed"
                    );
                }
            }
            debug!("notification writer stopped");
        });

        (Self { sink }, handle)
    }

    /// Queue a notification for `recipient_id`. Returns immediately.
    pub fn notify(
        &self,
        recipient_id: Uuid,
        category: NotificationCategory,
        title: impl Into<String>,
        body: impl Into<String>,
        related_id: Option<Uuid>,
    ) {
        self.sink.offer(CreateNotification {
            recipient_id,
            clinic_id: None,
            category,
            title: title.into(),
            body: body.into(),
            related_resource_id: related_id,
        });
    }
}
