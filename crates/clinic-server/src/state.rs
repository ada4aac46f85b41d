//! Shared request state and the background writers behind it.

use std::sync::Arc;

use clinic_auth::{IdentityResolver, LoginService, TokenCodec};
use clinic_core::error::ClinicResult;
use clinic_db::SurrealInventoryLedger;
use clinic_db::repository::{
    SurrealAuditRepository, SurrealNotificationRepository, SurrealUserRepository,
};
use clinic_events::{AuditRecorder, Notifier};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::ServerConfig;

type Users = SurrealUserRepository<Any>;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    resolver: IdentityResolver<Users>,
    login: LoginService<Users>,
    ledger: SurrealInventoryLedger<Any>,
    audit: AuditRecorder,
    notifier: Notifier,
}

/// Join handles of the background writers.
///
/// The writers stop once every [`AppState`] clone is dropped; `drain`
/// waits for the queued events to be written.
pub struct Workers {
    audit: JoinHandle<()>,
    notifier: JoinHandle<()>,
}

impl Workers {
    pub async fn drain(self) {
        for (name, handle) in [("audit", self.audit), ("notification", self.notifier)] {
            if let Err(e) = handle.await {
                warn!(writer = name, error = %e, "background writer panicked");
            }
        }
        info!("background writers drained");
    }
}

impl AppState {
    /// Wire repositories, services and background writers over `db`.
    ///
    /// Must be called inside a tokio runtime. Fails on an unusable auth
    /// configuration, before any writer is started.
    pub fn build(db: Surreal<Any>, config: &ServerConfig) -> ClinicResult<(Self, Workers)> {
        let users = match &config.auth.pepper {
            Some(pepper) => SurrealUserRepository::with_pepper(db.clone(), pepper.clone()),
            None => SurrealUserRepository::new(db.clone()),
        };
        let resolver = IdentityResolver::new(users.clone(), TokenCodec::new(&config.auth)?);
        let login = LoginService::new(users.clone(), config.auth.clone())?;

        let (audit, audit_handle) = AuditRecorder::spawn(
            SurrealAuditRepository::new(db.clone()),
            config.queue_capacity,
        );
        let (notifier, notifier_handle) = Notifier::spawn(
            users,
            SurrealNotificationRepository::new(db.clone()),
            config.queue_capacity,
        );

        let inner = Inner {
            resolver,
            login,
            ledger: SurrealInventoryLedger::new(db, config.ledger.clone()),
            audit,
            notifier,
        };

        Ok((
            Self {
                inner: Arc::new(inner),
            },
            Workers {
                audit: audit_handle,
                notifier: notifier_handle,
            },
        ))
    }

    pub fn resolver(&self) -> &IdentityResolver<Users> {
        &self.inner.resolver
    }

    pub fn login(&self) -> &LoginService<Users> {
        &self.inner.login
    }

    pub fn ledger(&self) -> &SurrealInventoryLedger<Any> {
        &self.inner.ledger
    }

    pub fn audit(&self) -> &AuditRecorder {
        &self.inner.audit
    }

    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }
}
