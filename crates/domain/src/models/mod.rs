//! Domain models for the guest registry.

pub mod confirmation;
pub mod guest;
pub mod import;
pub mod phone;
pub mod summary;

pub use confirmation::{
    ConfirmationKey, ConfirmationRecord, ConfirmationRequest, ConfirmationSource,
    ConfirmationStatus, ConfirmationWrite, ExistingConfirmation,
};
pub use guest::{EventRef, GuestRecord, GuestRef, GuestSummary, InvitedBy, NewGuest};
pub use import::{
    DuplicateRow, ImportField, ImportMeta, ImportOutcome, ImportRequest, ImportResponse,
    ImportRow, RowError, RowErrorKind,
};
pub use phone::PhoneIdentity;
pub use summary::{ConfirmationSummary, InviterBreakdown, StatusCounts};
