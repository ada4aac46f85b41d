//! Clinic Events — side channels that run after a request has succeeded.
//!
//! Both the [`AuditRecorder`] and the [`Notifier`] hand their work to a
//! background task through a bounded queue. Callers never wait on the
//! write and never see its failure.

pub mod audit;
pub mod notify;
mod sink;

pub use audit::AuditRecorder;
pub use notify::Notifier;
