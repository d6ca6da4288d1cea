//! Event confirmation summary.

use std::collections::HashMap;

use crate::models::{
    ConfirmationRecord, ConfirmationStatus, ConfirmationSummary, GuestRecord, InvitedBy,
    InviterBreakdown, StatusCounts,
};

/// Rounded integer percentage; 0 when there is nothing to divide by.
fn percentage(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    let rounded = part.saturating_mul(100).saturating_add(whole / 2) / whole;
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

/// Aggregates the answers of every guest for one event.
///
/// Guests without a record count as unknown. Records for other events, or
/// for guests not in `guests`, are ignored.
pub fn summarize_confirmations(
    event_ref: &str,
    guests: &[GuestRecord],
    confirmations: &[ConfirmationRecord],
) -> ConfirmationSummary {
    let by_guest: HashMap<&str, &ConfirmationRecord> = confirmations
        .iter()
        .filter(|c| c.event_ref == event_ref)
        .map(|c| (c.guest_ref.as_str(), c))
        .collect();

    let mut counts = StatusCounts::default();
    let mut by_inviter = InviterBreakdown::default();

    for guest in guests {
        let (status, confirmed_guests) = by_guest
            .get(guest.id.as_str())
            .map(|c| (c.status, c.confirmed_guests))
            .unwrap_or((ConfirmationStatus::Unknown, 0));

        counts.add(status, confirmed_guests, guest.max_guests);
        let side = match guest.invited_by {
            Some(InvitedBy::Bride) => &mut by_inviter.bride,
            Some(InvitedBy::Groom) => &mut by_inviter.groom,
            None => &mut by_inviter.unset,
        };
        side.add(status, confirmed_guests, guest.max_guests);
    }

    ConfirmationSummary {
        event_ref: event_ref.to_string(),
        confirmed_percentage: percentage(counts.confirmed.into(), counts.total.into()),
        declined_percentage: percentage(counts.declined.into(), counts.total.into()),
        unknown_percentage: percentage(counts.unknown.into(), counts.total.into()),
        attendance_percentage: percentage(counts.confirmed_guests, counts.max_guests),
        counts,
        by_inviter,
    }
}
