//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod confirmation;
pub mod guest;

pub use confirmation::ConfirmationEntity;
pub use guest::{GuestEntity, GuestPhoneEntity};
