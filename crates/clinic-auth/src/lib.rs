//! Clinic Auth — bearer token codec, identity resolution, role/tenant
//! authorization and password login.
//!
//! Every inbound request passes through [`IdentityResolver::resolve`] and
//! then [`gate::authorize`] before any business logic runs.

pub mod config;
pub mod error;
pub mod gate;
pub mod password;
pub mod resolver;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use gate::authorize;
pub use resolver::IdentityResolver;
pub use service::{LoginInput, LoginOutput, LoginService};
pub use token::{TokenClaims, TokenCodec};
