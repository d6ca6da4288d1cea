//! Domain services for the guest registry.
//!
//! Everything here is deterministic given its inputs. Storage is reached only
//! through the ports in [`store`].

pub mod deduplicator;
pub mod ingestion;
pub mod phone_canonicalizer;
pub mod reconciler;
pub mod renormalization;
pub mod store;
pub mod summary;

pub use deduplicator::{GuestDeduplicator, PhoneIndex};
pub use ingestion::CsvIngestionPipeline;
pub use phone_canonicalizer::{DialingPlan, PhoneCanonicalizer};
pub use reconciler::{ConfirmationReconciler, ReconcilerConfig};
pub use renormalization::{
    plan_phone_renormalization, renormalize_guest_phones, PhoneUpdate, RenormalizationFailure,
    RenormalizationPlan, RenormalizationReport, SkipReason, StoredGuestPhone,
};
pub use store::{ConfirmationStore, GuestStore, InMemoryConfirmationStore, InMemoryGuestStore};
pub use summary::summarize_confirmations;
