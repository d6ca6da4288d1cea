//! Re-normalization of stored guest phones.
//!
//! Guests imported under older rules may carry identities that no longer
//! match what the canonicalizer produces today. This recomputes every stored
//! identity from the phone as it was entered and rewrites the ones that
//! changed.

use serde::Serialize;

use crate::error::DomainError;
use crate::models::{GuestRef, PhoneIdentity};

use super::{GuestStore, PhoneCanonicalizer};

/// A guest's phone as held by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredGuestPhone {
    pub guest_ref: GuestRef,
    /// Phone exactly as entered, when known.
    pub phone_raw: Option<String>,
    /// Identity currently stored.
    pub current: PhoneIdentity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoPhone,
    AlreadyCanonical,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneUpdate {
    pub guest_ref: GuestRef,
    pub from: PhoneIdentity,
    pub to: PhoneIdentity,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenormalizationPlan {
    pub updates: Vec<PhoneUpdate>,
    pub skipped: Vec<(GuestRef, SkipReason)>,
}

impl RenormalizationPlan {
    pub fn len(&self) -> usize {
        self.updates.len() + self.skipped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenormalizationFailure {
    pub guest_ref: GuestRef,
    pub reason: String,
}

/// Result of a re-normalization run.
///
/// `total == updated + skipped + errors.len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenormalizationReport {
    pub total: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: Vec<RenormalizationFailure>,
}

/// Works out which stored phones need rewriting.
///
/// The raw phone wins when present. Without it, the stored identity is
/// canonicalized in place.
pub fn plan_phone_renormalization(
    guests: &[StoredGuestPhone],
    canonicalizer: &PhoneCanonicalizer,
) -> RenormalizationPlan {
    let mut plan = RenormalizationPlan::default();

    for guest in guests {
        let target = match shared::text::non_blank(guest.phone_raw.as_deref()) {
            Some(raw) => canonicalizer.normalize(Some(raw)),
            None if guest.current.has_local_number() => canonicalizer.canonicalize(&guest.current),
            None => {
                plan.skipped.push((guest.guest_ref.clone(), SkipReason::NoPhone));
                continue;
            }
        };

        if target == guest.current {
            plan.skipped
                .push((guest.guest_ref.clone(), SkipReason::AlreadyCanonical));
        } else {
            plan.updates.push(PhoneUpdate {
                guest_ref: guest.guest_ref.clone(),
                from: guest.current.clone(),
                to: target,
            });
        }
    }

    plan
}

/// Recomputes every stored phone and writes back the ones that changed.
///
/// Only the initial listing can fail the run; individual update failures are
/// reported per guest.
pub async fn renormalize_guest_phones<S>(
    store: &S,
    canonicalizer: &PhoneCanonicalizer,
) -> Result<RenormalizationReport, DomainError>
where
    S: GuestStore + ?Sized,
{
    let guests = store.list_guest_phones().await?;
    let plan = plan_phone_renormalization(&guests, canonicalizer);

    let mut report = RenormalizationReport {
        total: plan.len(),
        skipped: plan.skipped.len(),
        ..Default::default()
    };

    for update in plan.updates {
        match store.update_phone(&update.guest_ref, &update.to).await {
            Ok(()) => {
                tracing::debug!(
                    guest_id = %update.guest_ref,
                    from = %update.from,
                    to = %update.to,
                    "Guest phone re-normalized"
                );
                report.updated += 1;
            }
            Err(err) => {
                tracing::warn!(guest_id = %update.guest_ref, error = %err, "Failed to update guest phone");
                report.errors.push(RenormalizationFailure {
                    guest_ref: update.guest_ref,
                    reason: err.message,
                });
            }
        }
    }

    tracing::info!(
        total = report.total,
        updated = report.updated,
        skipped = report.skipped,
        errors = report.errors.len(),
        "Phone re-normalization finished"
    );

    Ok(report)
}
