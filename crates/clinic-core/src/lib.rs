//! Clinic Core — domain models, error types and repository traits shared
//! by every crate of the clinic operations backend.

pub mod error;
pub mod models;
pub mod repository;

pub use error::{ClinicError, ClinicResult};
