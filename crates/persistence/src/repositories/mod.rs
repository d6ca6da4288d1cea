//! Repository implementations for database operations.
//!
//! Each repository exposes plain query methods returning `sqlx::Error` and
//! implements the matching domain storage port on top of them.

pub mod confirmation;
pub mod guest;

pub use confirmation::ConfirmationRepository;
pub use guest::GuestRepository;

use domain::{DependencyError, ValidationError};

/// Maps a database failure onto the domain's dependency error.
pub(crate) fn storage_error(err: sqlx::Error) -> DependencyError {
    tracing::error!(error = %err, "Database operation failed");
    DependencyError::new(format!("database error: {}", err))
}

/// Converts a count to the `INTEGER` column type, refusing values it cannot hold.
pub(crate) fn int_column(value: u32) -> Result<i32, sqlx::Error> {
    i32::try_from(value).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

/// Whether `err` is a violation of the named unique index.
pub(crate) fn violates(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db) => db.is_unique_violation() && db.constraint() == Some(constraint),
        _ => false,
    }
}

/// A stored row no longer satisfies the domain invariants.
pub(crate) fn corrupt_row(
    table: &str,
    id: impl std::fmt::Display,
    err: ValidationError,
) -> DependencyError {
    tracing::error!(table = %table, id = %id, error = %err, "Stored row failed validation");
    DependencyError::new(format!("corrupt {} row {}: {}", table, id, err))
}
