//! Event confirmation (RSVP) models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{EventRef, GuestRef};
use crate::error::ValidationError;

/// Attendance answer of a guest for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationStatus {
    Unknown,
    Yes,
    No,
}

impl ConfirmationStatus {
    /// Convert to database string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Yes => "yes",
            Self::No => "no",
        }
    }

    /// Whether the answer is final for every source but the authoritative one.
    pub fn is_decided(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl std::fmt::Display for ConfirmationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ConfirmationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unknown" => Ok(Self::Unknown),
            "yes" => Ok(Self::Yes),
            "no" => Ok(Self::No),
            _ => Err(ValidationError::new(
                "confirmed",
                format!("confirmed must be one of unknown, yes, no (got '{}')", s),
            )),
        }
    }
}

/// Claimed origin of a confirmation write.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConfirmationSource {
    /// The guest's own mobile app.
    App,
    /// The bulk messaging webhook.
    Whatsapp,
    /// The admin panel.
    Admin,
    /// Any other caller-supplied origin, lowercased.
    Other(String),
}

impl ConfirmationSource {
    pub fn as_str(&self) -> &str {
        match self {
            Self::App => "app",
            Self::Whatsapp => "whatsapp",
            Self::Admin => "admin",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for ConfirmationSource {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "app" => Self::App,
            "whatsapp" => Self::Whatsapp,
            "admin" => Self::Admin,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ConfirmationSource {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<ConfirmationSource> for String {
    fn from(source: ConfirmationSource) -> Self {
        source.as_str().to_string()
    }
}

impl std::fmt::Display for ConfirmationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The (guest, event) pair a confirmation belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationKey {
    pub guest_ref: GuestRef,
    pub event_ref: EventRef,
}

impl ConfirmationKey {
    pub fn new(guest_ref: impl Into<GuestRef>, event_ref: impl Into<EventRef>) -> Self {
        Self {
            guest_ref: guest_ref.into(),
            event_ref: event_ref.into(),
        }
    }
}

impl std::fmt::Display for ConfirmationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.guest_ref, self.event_ref)
    }
}

/// Stored confirmation; at most one exists per [`ConfirmationKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationRecord {
    pub guest_ref: GuestRef,
    pub event_ref: EventRef,
    pub status: ConfirmationStatus,
    pub confirmed_guests: u32,
    pub notes: String,
    pub source: ConfirmationSource,
    pub confirmed_at: DateTime<Utc>,
}

impl ConfirmationRecord {
    pub fn key(&self) -> ConfirmationKey {
        ConfirmationKey::new(self.guest_ref.clone(), self.event_ref.clone())
    }
}

/// What the store holds for a key before a write is reconciled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExistingConfirmation {
    Absent,
    Present(ConfirmationRecord),
}

impl From<Option<ConfirmationRecord>> for ExistingConfirmation {
    fn from(record: Option<ConfirmationRecord>) -> Self {
        match record {
            Some(record) => Self::Present(record),
            None => Self::Absent,
        }
    }
}

/// Incoming confirmation write, as sent by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationRequest {
    /// One of `unknown`, `yes`, `no`.
    #[serde(alias = "status")]
    pub confirmed: Option<String>,

    #[validate(range(min = 0, max = 100, message = "confirmedGuests must be between 0 and 100"))]
    pub confirmed_guests: Option<i64>,

    #[validate(length(max = 1000, message = "notes must be at most 1000 characters"))]
    pub notes: Option<String>,

    pub source: Option<String>,
}

impl ConfirmationRequest {
    pub fn new(confirmed: impl Into<String>) -> Self {
        Self {
            confirmed: Some(confirmed.into()),
            ..Default::default()
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_confirmed_guests(mut self, count: i64) -> Self {
        self.confirmed_guests = Some(count);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// A confirmation write that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationWrite {
    pub status: ConfirmationStatus,
    pub confirmed_guests: Option<u32>,
    pub notes: Option<String>,
    pub source: ConfirmationSource,
}
