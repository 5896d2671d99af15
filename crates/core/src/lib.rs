//! `jivapay-core` — shared domain primitives for the JivaPay permission model.
//!
//! This crate contains **pure domain** types (no IO, no async).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::UserId;
