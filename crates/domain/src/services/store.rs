//! Storage ports used by the domain services.
//!
//! The services never query storage themselves. They receive these traits and
//! call them at the boundaries. The in-memory implementations back the test
//! suites and local development without a database.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::error::{DependencyError, DomainError};
use crate::models::{
    ConfirmationKey, ConfirmationRecord, ConfirmationRequest, GuestRecord, GuestRef, NewGuest,
    PhoneIdentity,
};

use super::{ConfirmationReconciler, StoredGuestPhone};

/// Guest persistence port.
#[async_trait::async_trait]
pub trait GuestStore: Send + Sync {
    /// Checks that the backing store answers.
    async fn ping(&self) -> Result<(), DependencyError>;

    /// Snapshot of all guests, used as the deduplication pool.
    async fn list_guests(&self) -> Result<Vec<GuestRecord>, DomainError>;

    async fn find_guest(&self, id: &str) -> Result<Option<GuestRecord>, DomainError>;

    /// Stores a new guest and returns the id assigned to it.
    async fn create_guest(&self, guest: NewGuest) -> Result<GuestRef, DependencyError>;

    /// Raw and stored phones of every guest.
    async fn list_guest_phones(&self) -> Result<Vec<StoredGuestPhone>, DomainError>;

    /// Replaces the stored canonical phone of a guest.
    async fn update_phone(&self, id: &str, identity: &PhoneIdentity) -> Result<(), DependencyError>;
}

/// Confirmation persistence port.
#[async_trait::async_trait]
pub trait ConfirmationStore: Send + Sync {
    async fn find(&self, key: &ConfirmationKey) -> Result<Option<ConfirmationRecord>, DomainError>;

    async fn list_by_guest(&self, guest_ref: &str) -> Result<Vec<ConfirmationRecord>, DomainError>;

    async fn list_by_event(&self, event_ref: &str) -> Result<Vec<ConfirmationRecord>, DomainError>;

    /// Looks up the current record, reconciles `request` against it and
    /// stores the result, all under one lock scoped to `key`.
    async fn apply(
        &self,
        key: &ConfirmationKey,
        request: &ConfirmationRequest,
        reconciler: &ConfirmationReconciler,
        now: DateTime<Utc>,
    ) -> Result<ConfirmationRecord, DomainError>;
}

fn poisoned<T>(_: T) -> DependencyError {
    DependencyError::new("in-memory store lock poisoned")
}

#[derive(Debug, Clone)]
struct StoredGuest {
    record: GuestRecord,
    phone_raw: Option<String>,
}

#[derive(Debug, Default)]
struct GuestTable {
    guests: Vec<StoredGuest>,
    next_id: u64,
}

impl GuestTable {
    /// Rejects a phone already stored for another guest, like the unique
    /// phone index of the database. Phoneless guests never collide.
    fn check_phone_free(&self, identity: &PhoneIdentity, except: Option<&str>) -> Result<(), DependencyError> {
        if !identity.has_local_number() {
            return Ok(());
        }
        let taken = self.guests.iter().any(|g| {
            Some(g.record.id.as_str()) != except && g.record.phone_identity == *identity
        });
        if taken {
            return Err(DependencyError::new(format!(
                "phone {} is already registered to another guest",
                identity.combined()
            )));
        }
        Ok(())
    }
}

/// In-memory guest store.
#[derive(Debug, Default)]
pub struct InMemoryGuestStore {
    table: Mutex<GuestTable>,
    failing_names: HashSet<String>,
    unavailable: bool,
}

impl InMemoryGuestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store. Seeded guests have no raw phone on record.
    pub fn with_guests(guests: Vec<GuestRecord>) -> Self {
        let guests = guests
            .into_iter()
            .map(|record| StoredGuest {
                record,
                phone_raw: None,
            })
            .collect();
        Self {
            table: Mutex::new(GuestTable { guests, next_id: 0 }),
            ..Self::default()
        }
    }

    /// Makes `create_guest` fail for the given names.
    pub fn failing_for<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failing_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Makes every operation fail, as if the backend were down.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Stores a guest together with the phone as it was entered.
    pub fn insert_with_raw_phone(
        &self,
        record: GuestRecord,
        phone_raw: Option<String>,
    ) -> Result<(), DependencyError> {
        let mut table = self.table.lock().map_err(poisoned)?;
        table.guests.push(StoredGuest { record, phone_raw });
        Ok(())
    }

    fn check_available(&self) -> Result<(), DependencyError> {
        if self.unavailable {
            return Err(DependencyError::new("guest store unavailable"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl GuestStore for InMemoryGuestStore {
    async fn ping(&self) -> Result<(), DependencyError> {
        self.check_available()
    }

    async fn list_guests(&self) -> Result<Vec<GuestRecord>, DomainError> {
        self.check_available()?;
        let table = self.table.lock().map_err(poisoned)?;
        Ok(table.guests.iter().map(|g| g.record.clone()).collect())
    }

    async fn find_guest(&self, id: &str) -> Result<Option<GuestRecord>, DomainError> {
        self.check_available()?;
        let table = self.table.lock().map_err(poisoned)?;
        Ok(table
            .guests
            .iter()
            .find(|g| g.record.id == id)
            .map(|g| g.record.clone()))
    }

    async fn create_guest(&self, guest: NewGuest) -> Result<GuestRef, DependencyError> {
        self.check_available()?;
        if self.failing_names.contains(&guest.name) {
            return Err(DependencyError::new(format!(
                "simulated failure creating guest '{}'",
                guest.name
            )));
        }

        let mut table = self.table.lock().map_err(poisoned)?;
        table.check_phone_free(&guest.phone_identity, None)?;
        table.next_id += 1;
        let id = format!("guest-{}", table.next_id);
        let phone_raw = guest.phone_raw.clone();
        table.guests.push(StoredGuest {
            record: guest.into_record(id.clone()),
            phone_raw,
        });
        Ok(id)
    }

    async fn list_guest_phones(&self) -> Result<Vec<StoredGuestPhone>, DomainError> {
        self.check_available()?;
        let table = self.table.lock().map_err(poisoned)?;
        Ok(table
            .guests
            .iter()
            .map(|g| StoredGuestPhone {
                guest_ref: g.record.id.clone(),
                phone_raw: g.phone_raw.clone(),
                current: g.record.phone_identity.clone(),
            })
            .collect())
    }

    async fn update_phone(&self, id: &str, identity: &PhoneIdentity) -> Result<(), DependencyError> {
        self.check_available()?;
        let mut table = self.table.lock().map_err(poisoned)?;
        table.check_phone_free(identity, Some(id))?;
        let guest = table
            .guests
            .iter_mut()
            .find(|g| g.record.id == id)
            .ok_or_else(|| DependencyError::new(format!("guest {} disappeared", id)))?;
        guest.record.phone_identity = identity.clone();
        Ok(())
    }
}

/// In-memory confirmation store.
///
/// The map lock is held from lookup to insert in [`ConfirmationStore::apply`],
/// which serializes concurrent writes for every key.
#[derive(Debug, Default)]
pub struct InMemoryConfirmationStore {
    records: Mutex<HashMap<ConfirmationKey, ConfirmationRecord>>,
}

impl InMemoryConfirmationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn collect_sorted<F, K>(&self, filter: F, sort_key: K) -> Result<Vec<ConfirmationRecord>, DomainError>
    where
        F: Fn(&ConfirmationRecord) -> bool,
        K: Fn(&ConfirmationRecord) -> String,
    {
        let records = self.records.lock().map_err(poisoned)?;
        let mut matching: Vec<_> = records.values().filter(|r| filter(r)).cloned().collect();
        matching.sort_by_key(|r| sort_key(r));
        Ok(matching)
    }
}

#[async_trait::async_trait]
impl ConfirmationStore for InMemoryConfirmationStore {
    async fn find(&self, key: &ConfirmationKey) -> Result<Option<ConfirmationRecord>, DomainError> {
        let records = self.records.lock().map_err(poisoned)?;
        Ok(records.get(key).cloned())
    }

    async fn list_by_guest(&self, guest_ref: &str) -> Result<Vec<ConfirmationRecord>, DomainError> {
        self.collect_sorted(|r| r.guest_ref == guest_ref, |r| r.event_ref.clone())
    }

    async fn list_by_event(&self, event_ref: &str) -> Result<Vec<ConfirmationRecord>, DomainError> {
        self.collect_sorted(|r| r.event_ref == event_ref, |r| r.guest_ref.clone())
    }

    async fn apply(
        &self,
        key: &ConfirmationKey,
        request: &ConfirmationRequest,
        reconciler: &ConfirmationReconciler,
        now: DateTime<Utc>,
    ) -> Result<ConfirmationRecord, DomainError> {
        let mut records = self.records.lock().map_err(poisoned)?;
        let existing = records.get(key).cloned().into();
        let record = reconciler.reconcile(key, existing, request, now)?;
        records.insert(key.clone(), record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConfirmationStatus, InvitedBy};
    use std::sync::Arc;

    fn new_guest(name: &str, local: &str) -> NewGuest {
        NewGuest {
            name: name.to_string(),
            invitation_name: None,
            phone_raw: Some(local.to_string()),
            phone_identity: PhoneIdentity::from_parts("521", local).unwrap(),
            max_guests: 1,
            invited_by: Some(InvitedBy::Bride),
            times_sent: 0,
        }
    }

    #[tokio::test]
    async fn test_guest_store_assigns_sequential_ids() {
        let store = InMemoryGuestStore::new();
        let first = store.create_guest(new_guest("Ana", "5511111111")).await.unwrap();
        let second = store.create_guest(new_guest("Luis", "5522222222")).await.unwrap();

        assert_eq!(first, "guest-1");
        assert_eq!(second, "guest-2");
        assert_eq!(store.list_guests().await.unwrap().len(), 2);
        assert_eq!(
            store.find_guest("guest-2").await.unwrap().map(|g| g.name),
            Some("Luis".to_string())
        );
        assert!(store.find_guest("guest-9").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_guest_store_failing_names() {
        let store = InMemoryGuestStore::new().failing_for(["Broken"]);
        assert!(store.create_guest(new_guest("Broken", "5511111111")).await.is_err());
        assert!(store.create_guest(new_guest("Fine", "5511111111")).await.is_ok());
    }

    #[tokio::test]
    async fn test_guest_store_rejects_taken_phone() {
        let store = InMemoryGuestStore::new();
        store.create_guest(new_guest("Ana", "5511111111")).await.unwrap();

        let err = store
            .create_guest(new_guest("Ana Again", "5511111111"))
            .await
            .unwrap_err();
        assert_eq!(err.message, "phone 5215511111111 is already registered to another guest");
        assert_eq!(store.list_guests().await.unwrap().len(), 1);

        let mut phoneless = new_guest("Tía Rosa", "");
        phoneless.phone_raw = None;
        store.create_guest(phoneless.clone()).await.unwrap();
        phoneless.name = "Tío Pepe".to_string();
        store.create_guest(phoneless).await.unwrap();
        assert_eq!(store.list_guests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_phone_update_cannot_take_another_guests_phone() {
        let store = InMemoryGuestStore::new();
        let ana = store.create_guest(new_guest("Ana", "5511111111")).await.unwrap();
        store.create_guest(new_guest("Luis", "5522222222")).await.unwrap();

        let luis_phone = PhoneIdentity::from_parts("521", "5522222222").unwrap();
        assert!(store.update_phone(&ana, &luis_phone).await.is_err());

        let own_phone = PhoneIdentity::from_parts("521", "5511111111").unwrap();
        assert!(store.update_phone(&ana, &own_phone).await.is_ok());
    }

    #[tokio::test]
    async fn test_unavailable_guest_store() {
        let store = InMemoryGuestStore::unavailable();
        assert!(store.ping().await.is_err());
        assert!(matches!(
            store.list_guests().await,
            Err(DomainError::Dependency(_))
        ));
    }

    #[tokio::test]
    async fn test_guest_store_phone_update() {
        let store = InMemoryGuestStore::new();
        let id = store.create_guest(new_guest("Ana", "5511111111")).await.unwrap();
        let replacement = PhoneIdentity::from_parts("521", "5599999999").unwrap();

        store.update_phone(&id, &replacement).await.unwrap();

        let phones = store.list_guest_phones().await.unwrap();
        assert_eq!(phones[0].current, replacement);
        assert_eq!(phones[0].phone_raw.as_deref(), Some("5511111111"));
        assert!(store.update_phone("missing", &replacement).await.is_err());
    }

    #[tokio::test]
    async fn test_confirmation_store_apply_and_lookup() {
        let store = InMemoryConfirmationStore::new();
        let reconciler = ConfirmationReconciler::default();
        let key = ConfirmationKey::new("guest-1", "ceremony");

        let record = store
            .apply(&key, &ConfirmationRequest::new("yes").with_source("whatsapp"), &reconciler, Utc::now())
            .await
            .unwrap();
        assert_eq!(record.status, ConfirmationStatus::Yes);

        let rejected = store
            .apply(&key, &ConfirmationRequest::new("no").with_source("admin"), &reconciler, Utc::now())
            .await;
        assert!(matches!(rejected, Err(DomainError::Conflict(_))));

        let found = store.find(&key).await.unwrap().unwrap();
        assert_eq!(found.status, ConfirmationStatus::Yes);
        assert_eq!(store.list_by_guest("guest-1").await.unwrap().len(), 1);
        assert_eq!(store.list_by_event("ceremony").await.unwrap().len(), 1);
        assert!(store.list_by_event("reception").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_first_writes_yield_one_winner() {
        let store = Arc::new(InMemoryConfirmationStore::new());
        let reconciler = Arc::new(ConfirmationReconciler::default());
        let key = ConfirmationKey::new("guest-1", "reception");

        let mut handles = Vec::new();
        for (i, status) in ["yes", "no"].iter().cycle().take(16).enumerate() {
            let store = Arc::clone(&store);
            let reconciler = Arc::clone(&reconciler);
            let key = key.clone();
            let request = ConfirmationRequest::new(*status).with_source(if i % 2 == 0 {
                "whatsapp"
            } else {
                "admin"
            });
            handles.push(tokio::spawn(async move {
                store.apply(&key, &request, &reconciler, Utc::now()).await
            }));
        }

        let mut accepted = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(DomainError::Conflict(_)) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(conflicts, 15);
        assert_eq!(store.list_by_event("reception").await.unwrap().len(), 1);
    }
}
