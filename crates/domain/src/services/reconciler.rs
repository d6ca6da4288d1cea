//! Confirmation (RSVP) reconciliation.
//!
//! Per (guest, event) pair the state starts as `unknown`, which is also what
//! an absent record means. While the pair is `unknown` any source may write.
//! Once it is `yes` or `no`, only the authoritative source may change it and
//! every other source gets a [`ConflictError`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{ConflictError, ReconcileError, ValidationError};
use crate::models::{
    ConfirmationKey, ConfirmationRecord, ConfirmationRequest, ConfirmationSource,
    ConfirmationStatus, ConfirmationWrite, ExistingConfirmation,
};

/// Write-authority settings of the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ReconcilerConfig {
    /// The only source allowed to change a decided confirmation.
    pub authoritative_source: ConfirmationSource,
    /// Source assumed when a write does not name one.
    pub default_source: ConfirmationSource,
    /// Party size stored when a new confirmation omits it.
    pub default_confirmed_guests: u32,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            authoritative_source: ConfirmationSource::App,
            default_source: ConfirmationSource::Admin,
            default_confirmed_guests: 1,
        }
    }
}

/// Decides whether a confirmation write is accepted.
///
/// Pure: the current record and the clock are passed in, the resulting
/// record is returned. Callers must run lookup, reconcile and store under a
/// lock scoped to the key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmationReconciler {
    config: ReconcilerConfig,
}

impl ConfirmationReconciler {
    pub fn new(config: ReconcilerConfig) -> Self {
        Self { config }
    }

    /// Checks an incoming write without looking at any stored state.
    pub fn validate(&self, request: &ConfirmationRequest) -> Result<ConfirmationWrite, ValidationError> {
        let confirmed = shared::text::non_blank(request.confirmed.as_deref())
            .ok_or_else(|| ValidationError::new("confirmed", "confirmed field is required"))?;
        let status: ConfirmationStatus = confirmed.parse()?;

        request.validate().map_err(ValidationError::from)?;

        let confirmed_guests = request
            .confirmed_guests
            .map(|count| {
                u32::try_from(count).map_err(|_| {
                    ValidationError::new("confirmed_guests", "confirmedGuests is out of range")
                })
            })
            .transpose()?;

        let source = shared::text::non_blank(request.source.as_deref())
            .map(ConfirmationSource::from)
            .unwrap_or_else(|| self.config.default_source.clone());

        Ok(ConfirmationWrite {
            status,
            confirmed_guests,
            notes: request.notes.clone(),
            source,
        })
    }

    /// Validates `request` and applies it to `existing`.
    pub fn reconcile(
        &self,
        key: &ConfirmationKey,
        existing: ExistingConfirmation,
        request: &ConfirmationRequest,
        now: DateTime<Utc>,
    ) -> Result<ConfirmationRecord, ReconcileError> {
        let write = self.validate(request)?;
        self.apply(key, existing, write, now)
    }

    /// Applies an already validated write to `existing`.
    pub fn apply(
        &self,
        key: &ConfirmationKey,
        existing: ExistingConfirmation,
        write: ConfirmationWrite,
        now: DateTime<Utc>,
    ) -> Result<ConfirmationRecord, ReconcileError> {
        let record = match existing {
            ExistingConfirmation::Absent => ConfirmationRecord {
                guest_ref: key.guest_ref.clone(),
                event_ref: key.event_ref.clone(),
                status: write.status,
                confirmed_guests: write
                    .confirmed_guests
                    .unwrap_or(self.config.default_confirmed_guests),
                notes: write.notes.unwrap_or_default(),
                source: write.source,
                confirmed_at: now,
            },
            ExistingConfirmation::Present(current) => {
                if current.status.is_decided() && write.source != self.config.authoritative_source {
                    tracing::warn!(
                        confirmation = %key,
                        current_status = %current.status,
                        current_source = %current.source,
                        rejected_source = %write.source,
                        "Confirmation write rejected"
                    );
                    return Err(ConflictError {
                        guest_ref: key.guest_ref.clone(),
                        event_ref: key.event_ref.clone(),
                        current_status: current.status,
                        confirmed_at: current.confirmed_at,
                        current_source: current.source,
                        rejected_source: write.source,
                        allowed_source: self.config.authoritative_source.clone(),
                    }
                    .into());
                }

                ConfirmationRecord {
                    guest_ref: current.guest_ref,
                    event_ref: current.event_ref,
                    status: write.status,
                    confirmed_guests: write.confirmed_guests.unwrap_or(current.confirmed_guests),
                    notes: write.notes.unwrap_or(current.notes),
                    source: write.source,
                    confirmed_at: now,
                }
            }
        };

        tracing::info!(
            confirmation = %key,
            status = %record.status,
            source = %record.source,
            confirmed_guests = record.confirmed_guests,
            "Confirmation write accepted"
        );

        Ok(record)
    }
}
