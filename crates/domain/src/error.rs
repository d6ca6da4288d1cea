//! Domain error types.
//!
//! Three failure families leave the core:
//! - [`ValidationError`]: malformed or missing input, reported per item.
//! - [`ConflictError`]: a finalized confirmation was written by a source that
//!   may not override it.
//! - [`DependencyError`]: a storage collaborator failed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::models::{ConfirmationSource, ConfirmationStatus};

/// A field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        fields
            .into_iter()
            .find_map(|(field, errs)| {
                errs.first().map(|e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    ValidationError::new(field.to_string(), message)
                })
            })
            .unwrap_or_else(|| ValidationError::new("request", "invalid request"))
    }
}

/// A confirmation write was rejected because the stored decision is final
/// for the incoming source.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error(
    "confirmation for guest {guest_ref} at event {event_ref} is already '{current_status}' \
     since {confirmed_at} (set by {current_source}); source '{rejected_source}' cannot change it, \
     only '{allowed_source}' may"
)]
pub struct ConflictError {
    pub guest_ref: String,
    pub event_ref: String,
    pub current_status: ConfirmationStatus,
    pub confirmed_at: DateTime<Utc>,
    pub current_source: ConfirmationSource,
    pub rejected_source: ConfirmationSource,
    pub allowed_source: ConfirmationSource,
}

/// A storage collaborator failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DependencyError {
    pub message: String,
}

impl DependencyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure of the pure confirmation reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Conflict(#[from] ConflictError),
}

/// Failure of an operation that goes through a storage port.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Conflict(#[from] ConflictError),

    #[error("dependency failed: {0}")]
    Dependency(#[from] DependencyError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
}

impl From<ReconcileError> for DomainError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::Validation(e) => DomainError::Validation(e),
            ReconcileError::Conflict(e) => DomainError::Conflict(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 1, message = "name is required"))]
        name: String,
    }

    fn sample_conflict() -> ConflictError {
        ConflictError {
            guest_ref: "g1".to_string(),
            event_ref: "e1".to_string(),
            current_status: ConfirmationStatus::Yes,
            confirmed_at: DateTime::parse_from_rfc3339("2025-03-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            current_source: ConfirmationSource::Whatsapp,
            rejected_source: ConfirmationSource::Admin,
            allowed_source: ConfirmationSource::App,
        }
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("confirmed", "confirmed field is required");
        assert_eq!(err.to_string(), "confirmed: confirmed field is required");
    }

    #[test]
    fn test_validation_error_from_validator() {
        let errors = Probe {
            name: String::new(),
        }
        .validate()
        .unwrap_err();
        let err = ValidationError::from(errors);
        assert_eq!(err.field, "name");
        assert_eq!(err.message, "name is required");
    }

    #[test]
    fn test_conflict_error_message_names_allowed_source() {
        let msg = sample_conflict().to_string();
        assert!(msg.contains("already 'yes'"));
        assert!(msg.contains("source 'admin'"));
        assert!(msg.contains("only 'app' may"));
    }

    #[test]
    fn test_conflict_error_serializes_camel_case() {
        let json = serde_json::to_value(sample_conflict()).unwrap();
        assert_eq!(json["currentStatus"], "yes");
        assert_eq!(json["allowedSource"], "app");
        assert_eq!(json["rejectedSource"], "admin");
    }

    #[test]
    fn test_domain_error_from_reconcile_error() {
        let err: DomainError = ReconcileError::Conflict(sample_conflict()).into();
        assert!(matches!(err, DomainError::Conflict(_)));

        let err: DomainError =
            ReconcileError::Validation(ValidationError::new("confirmed", "bad")).into();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_domain_error_not_found_display() {
        let err = DomainError::NotFound {
            entity: "confirmation",
            id: "g1/e1".to_string(),
        };
        assert_eq!(err.to_string(), "confirmation not found: g1/e1");
    }
}
