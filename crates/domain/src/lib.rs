//! Domain layer for the guest registry backend.
//!
//! This crate contains:
//! - Domain models (phone identity, guests, import rows, event confirmations)
//! - Business logic services (phone canonicalization, deduplication,
//!   bulk import, confirmation reconciliation, dashboard summaries)
//! - Storage ports and their in-memory implementations
//! - Domain error types
//!
//! Nothing in here performs I/O; storage access goes through the traits in
//! [`services::store`].

pub mod error;
pub mod models;
pub mod services;

pub use error::{ConflictError, DependencyError, DomainError, ReconcileError, ValidationError};
