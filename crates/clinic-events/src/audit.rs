//! Audit recorder.
//!
//! Handlers call [`AuditRecorder::record`] after a gated operation has
//! succeeded. The entry is queued and appended by a background task;
//! append failures are logged and otherwise ignored.

use clinic_core::models::audit::{AuditAction, CreateAuditEntry};
use clinic_core::models::identity::Identity;
use clinic_core::repository::AuditRepository;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::sink::Sink;

/// Handle for queueing audit entries. Cheap to clone.
///
/// The background writer stops once every handle is dropped and the
/// queue is drained.
#[derive(Debug, Clone)]
pub struct AuditRecorder {
    sink: Sink<CreateAuditEntry>,
}

impl AuditRecorder {
    /// Start the background writer over `repo`.
    ///
    /// At most `capacity` entries wait in the queue; further entries are
    /// dropped until the writer catches up.
    pub fn spawn<A>(repo: A, capacity: usize) -> (Self, JoinHandle<()>)
    where
        A: AuditRepository + 'static,
    {
        let (sink, mut rx) = Sink::<CreateAuditEntry>::channel("audit", capacity);

        let handle = tokio::spawn(async move {
            while let Some(entry) = rx.recv().await {
                let action = entry.action;
                let resource_kind = entry.resource_kind.clone();
                if let Err(e) = repo.append(entry).await {
                    warn!(
                        error = %e,
                        action = action.as_str(),
                        %resource_kind,
                        "audit append failed; entry lost"
                    );
                }
            }
            debug!("audit writer stopped");
        });

        (Self { sink }, handle)
    }

    /// Queue one audit entry.
    ///
    /// `actor` is `None` for unauthenticated operations. The clinic is
    /// taken from the actor. Returns immediately.
    pub fn record(
        &self,
        actor: Option<&Identity>,
        action: AuditAction,
        resource_kind: &str,
        resource_id: Option<Uuid>,
        payload: serde_json::Value,
        origin: Option<String>,
    ) {
        self.sink.offer(CreateAuditEntry {
            actor_id: actor.map(|a| a.id),
            clinic_id: actor.and_then(|a| a.clinic_id),
            action,
            resource_kind: resource_kind.to_string(),
            resource_id,
            payload,
            origin,
        });
    }
}
