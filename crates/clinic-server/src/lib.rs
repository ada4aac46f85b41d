//! Clinic Server — HTTP surface over the clinic operations core.
//!
//! Every protected route resolves the caller's identity from the
//! credential store and passes it through the authorization gate before
//! any data access.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use config::{BootstrapAdmin, ConfigError, ServerConfig};
pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, Workers};
