//! Confirmation summary models for the event dashboard.

use serde::Serialize;

use super::ConfirmationStatus;

/// Head counts per answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub total: u32,
    pub confirmed: u32,
    pub declined: u32,
    pub unknown: u32,
    /// People covered by "yes" answers.
    pub confirmed_guests: u64,
    /// People covered by all invitations.
    pub max_guests: u64,
}

impl StatusCounts {
    /// Seat totals are summed in `u64`, so no realistic guest list can
    /// overflow them; head counts saturate.
    pub(crate) fn add(&mut self, status: ConfirmationStatus, confirmed_guests: u32, max_guests: u32) {
        self.total = self.total.saturating_add(1);
        self.max_guests = self.max_guests.saturating_add(u64::from(max_guests));
        match status {
            ConfirmationStatus::Yes => {
                self.confirmed = self.confirmed.saturating_add(1);
                self.confirmed_guests = self
                    .confirmed_guests
                    .saturating_add(u64::from(confirmed_guests));
            }
            ConfirmationStatus::No => self.declined = self.declined.saturating_add(1),
            ConfirmationStatus::Unknown => self.unknown = self.unknown.saturating_add(1),
        }
    }
}

/// Counts split by who invited the guest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviterBreakdown {
    pub bride: StatusCounts,
    pub groom: StatusCounts,
    pub unset: StatusCounts,
}

/// Dashboard summary of the answers for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationSummary {
    pub event_ref: String,
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub confirmed_percentage: u32,
    pub declined_percentage: u32,
    pub unknown_percentage: u32,
    /// Share of invited seats taken by "yes" answers.
    pub attendance_percentage: u32,
    pub by_inviter: InviterBreakdown,
}
