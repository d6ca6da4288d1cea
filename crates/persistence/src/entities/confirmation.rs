//! Event confirmation entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{ConfirmationRecord, ConfirmationSource, ConfirmationStatus};
use domain::ValidationError;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the event_confirmations table.
#[derive(Debug, Clone, FromRow)]
pub struct ConfirmationEntity {
    pub id: i64,
    pub guest_id: Uuid,
    pub event_id: String,
    pub status: String,
    pub confirmed_guests: i32,
    pub notes: String,
    pub source: String,
    pub confirmed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConfirmationEntity {
    /// Convert to domain model.
    pub fn into_domain(self) -> Result<ConfirmationRecord, ValidationError> {
        let status = self.status.parse::<ConfirmationStatus>()?;

        Ok(ConfirmationRecord {
            guest_ref: self.guest_id.to_string(),
            event_ref: self.event_id,
            status,
            confirmed_guests: u32::try_from(self.confirmed_guests).unwrap_or(0),
            notes: self.notes,
            source: ConfirmationSource::from(self.source),
            confirmed_at: self.confirmed_at,
        })
    }
}
