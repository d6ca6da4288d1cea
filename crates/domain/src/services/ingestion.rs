//! Bulk guest import.
//!
//! Rows are processed one at a time and each lands in exactly one bucket of
//! the [`ImportOutcome`]: created, duplicate or error. A failing row never
//! stops the batch.

use validator::Validate;

use crate::error::ValidationError;
use crate::models::{
    DuplicateRow, GuestRecord, ImportField, ImportOutcome, ImportRow, InvitedBy,
    NewGuest, RowError, RowErrorKind,
};

use super::{GuestDeduplicator, GuestStore, PhoneCanonicalizer};

/// Turns tabulated import rows into guests.
#[derive(Debug, Clone, Copy)]
pub struct CsvIngestionPipeline<'a> {
    canonicalizer: &'a PhoneCanonicalizer,
}

impl<'a> CsvIngestionPipeline<'a> {
    pub fn new(canonicalizer: &'a PhoneCanonicalizer) -> Self {
        Self { canonicalizer }
    }

    /// Imports `rows`, deduplicating against `existing` and against the
    /// guests created earlier in the same run.
    pub async fn ingest<S>(&self, rows: Vec<ImportRow>, existing: &[GuestRecord], store: &S) -> ImportOutcome
    where
        S: GuestStore + ?Sized,
    {
        let dedup = GuestDeduplicator::new(self.canonicalizer);
        let mut known = dedup.index(existing);
        let mut outcome = ImportOutcome::new();

        for (index, row) in rows.into_iter().enumerate() {
            let row_number = index + 1;

            let guest = match self.build_guest(&row) {
                Ok(guest) => guest,
                Err(err) => {
                    tracing::debug!(row = row_number, reason = %err.message, "Import row rejected");
                    outcome.record_error(RowError {
                        row: row_number,
                        name: row.field(ImportField::Name),
                        kind: RowErrorKind::Validation,
                        reason: err.message,
                    });
                    continue;
                }
            };

            if let Some(matched) = dedup.lookup(&known, &guest.phone_identity) {
                tracing::debug!(
                    row = row_number,
                    existing_guest = %matched.id,
                    "Import row duplicates an existing guest"
                );
                outcome.record_duplicate(DuplicateRow {
                    row: row_number,
                    name: guest.name,
                    phone: guest.phone_identity.combined(),
                    existing: matched.clone(),
                });
                continue;
            }

            match store.create_guest(guest.clone()).await {
                Ok(id) => {
                    tracing::debug!(row = row_number, guest_id = %id, "Guest created from import row");
                    dedup.remember(&mut known, &guest.into_record(id.clone()));
                    outcome.record_created(id);
                }
                Err(err) => {
                    tracing::warn!(row = row_number, error = %err, "Failed to create guest from import row");
                    outcome.record_error(RowError {
                        row: row_number,
                        name: Some(guest.name),
                        kind: RowErrorKind::Dependency,
                        reason: err.message,
                    });
                }
            }
        }

        tracing::info!(
            total = outcome.total,
            created = outcome.created,
            duplicates = outcome.duplicates.len(),
            errors = outcome.errors.len(),
            "Guest import finished"
        );

        outcome
    }

    /// Maps one row to a guest proposal.
    fn build_guest(&self, row: &ImportRow) -> Result<NewGuest, ValidationError> {
        let name = row.field(ImportField::Name);
        let name = shared::text::non_blank(name.as_deref())
            .ok_or_else(|| ValidationError::new("name", "missing name"))?
            .to_string();

        let phone_raw = row.field(ImportField::Phone);
        let phone_identity = self.canonicalizer.normalize(phone_raw.as_deref());

        let invitation_name = row.field(ImportField::InvitationName);
        let invitation_name = shared::text::non_blank(invitation_name.as_deref()).map(str::to_string);

        let guest = NewGuest {
            name,
            invitation_name,
            phone_raw,
            phone_identity,
            max_guests: parse_max_guests(row.field(ImportField::MaxGuests).as_deref()),
            invited_by: parse_invited_by(row.field(ImportField::InvitedBy).as_deref()),
            times_sent: parse_times_sent(row.field(ImportField::TimesSent).as_deref()),
        };
        guest.validate()?;
        Ok(guest)
    }
}

/// Party size; absent, unparseable or non-positive values become 1.
///
/// Huge values saturate so that validation rejects the row.
fn parse_max_guests(value: Option<&str>) -> u32 {
    value
        .and_then(shared::text::parse_leading_int)
        .filter(|n| *n >= 1)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(1)
}

/// Send counter; absent, unparseable or negative values become 0.
fn parse_times_sent(value: Option<&str>) -> u32 {
    value
        .and_then(shared::text::parse_leading_int)
        .filter(|n| *n >= 0)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

fn parse_invited_by(value: Option<&str>) -> Option<InvitedBy> {
    let value = shared::text::non_blank(value)?;
    match value.parse() {
        Ok(side) => Some(side),
        Err(err) => {
            tracing::warn!(value = %value, error = %err, "Ignoring unrecognized invitedBy");
            None
        }
    }
}
