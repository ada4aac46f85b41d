//! Domain models for the clinic operations core.
//!
//! These are the core types shared across all crates.

pub mod audit;
pub mod bill;
pub mod clinic;
pub mod identity;
pub mod medicine;
pub mod money;
pub mod notification;
pub mod role;
pub mod user;
