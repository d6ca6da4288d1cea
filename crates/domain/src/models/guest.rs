//! Guest domain model.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::PhoneIdentity;

/// Document identifier of a stored guest.
pub type GuestRef = String;

/// Document identifier of an event (ceremony, reception, ...).
pub type EventRef = String;

/// Side of the couple that invited a guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvitedBy {
    Bride,
    Groom,
}

impl InvitedBy {
    /// Convert to database string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bride => "Bride",
            Self::Groom => "Groom",
        }
    }
}

impl std::fmt::Display for InvitedBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for InvitedBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bride" => Ok(Self::Bride),
            "groom" => Ok(Self::Groom),
            other => Err(format!("unknown inviter: {}", other)),
        }
    }
}

/// A stored guest as seen by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestRecord {
    pub id: GuestRef,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitation_name: Option<String>,
    pub phone_identity: PhoneIdentity,
    pub max_guests: u32,
    pub invited_by: Option<InvitedBy>,
    pub times_sent: u32,
}

/// A guest proposed for creation; the storage collaborator assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewGuest {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub name: String,

    pub invitation_name: Option<String>,

    /// Phone exactly as it arrived, kept so it can be re-normalized later.
    pub phone_raw: Option<String>,

    #[validate(nested)]
    pub phone_identity: PhoneIdentity,

    #[validate(range(min = 1, max = 100, message = "maxGuests must be between 1 and 100"))]
    pub max_guests: u32,

    pub invited_by: Option<InvitedBy>,

    #[validate(range(max = 10000, message = "timesSent must be at most 10000"))]
    pub times_sent: u32,
}

impl NewGuest {
    /// Combines the proposal with the id the store assigned.
    pub fn into_record(self, id: GuestRef) -> GuestRecord {
        GuestRecord {
            id,
            name: self.name,
            invitation_name: self.invitation_name,
            phone_identity: self.phone_identity,
            max_guests: self.max_guests,
            invited_by: self.invited_by,
            times_sent: self.times_sent,
        }
    }
}

/// Short reference to an existing guest, used in duplicate reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestSummary {
    pub id: GuestRef,
    pub name: String,
    pub phone: String,
}

impl From<&GuestRecord> for GuestSummary {
    fn from(guest: &GuestRecord) -> Self {
        Self {
            id: guest.id.clone(),
            name: guest.name.clone(),
            phone: guest.phone_identity.combined(),
        }
    }
}
