//! Event confirmation repository for database operations.

use chrono::{DateTime, Utc};
use domain::models::{ConfirmationKey, ConfirmationRecord, ConfirmationRequest};
use domain::services::{ConfirmationReconciler, ConfirmationStore};
use domain::DomainError;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{corrupt_row, int_column, storage_error};
use crate::entities::ConfirmationEntity;
use crate::metrics::QueryTimer;

const CONFIRMATION_COLUMNS: &str = "id, guest_id, event_id, status, confirmed_guests, notes, \
     source, confirmed_at, created_at, updated_at";

/// Repository for event confirmation database operations.
#[derive(Clone)]
pub struct ConfirmationRepository {
    pool: PgPool,
}

impl ConfirmationRepository {
    /// Creates a new ConfirmationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the confirmation of a guest for an event.
    pub async fn find_by_key(
        &self,
        guest_id: Uuid,
        event_id: &str,
    ) -> Result<Option<ConfirmationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_confirmation_by_key");
        let query = format!(
            "SELECT {CONFIRMATION_COLUMNS} FROM event_confirmations WHERE guest_id = $1 AND event_id = $2"
        );
        let result = sqlx::query_as::<_, ConfirmationEntity>(&query)
            .bind(guest_id)
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// All confirmations of a guest, ordered by event.
    pub async fn find_by_guest(&self, guest_id: Uuid) -> Result<Vec<ConfirmationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_confirmations_by_guest");
        let query = format!(
            "SELECT {CONFIRMATION_COLUMNS} FROM event_confirmations WHERE guest_id = $1 ORDER BY event_id"
        );
        let result = sqlx::query_as::<_, ConfirmationEntity>(&query)
            .bind(guest_id)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// All confirmations for an event, ordered by guest.
    pub async fn find_by_event(&self, event_id: &str) -> Result<Vec<ConfirmationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_confirmations_by_event");
        let query = format!(
            "SELECT {CONFIRMATION_COLUMNS} FROM event_confirmations WHERE event_id = $1 ORDER BY guest_id"
        );
        let result = sqlx::query_as::<_, ConfirmationEntity>(&query)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Serializes writers of one (guest, event) pair until the transaction ends.
    async fn lock_key(
        tx: &mut Transaction<'_, Postgres>,
        guest_id: Uuid,
        event_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(format!("event_confirmation:{}:{}", guest_id, event_id))
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn upsert(
        tx: &mut Transaction<'_, Postgres>,
        guest_id: Uuid,
        record: &ConfirmationRecord,
    ) -> Result<ConfirmationEntity, sqlx::Error> {
        let confirmed_guests = int_column(record.confirmed_guests)?;
        let query = format!(
            r#"
            INSERT INTO event_confirmations (guest_id, event_id, status, confirmed_guests, notes, source, confirmed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (guest_id, event_id) DO UPDATE SET
                status = EXCLUDED.status,
                confirmed_guests = EXCLUDED.confirmed_guests,
                notes = EXCLUDED.notes,
                source = EXCLUDED.source,
                confirmed_at = EXCLUDED.confirmed_at,
                updated_at = NOW()
            RETURNING {CONFIRMATION_COLUMNS}
            "#
        );
        sqlx::query_as::<_, ConfirmationEntity>(&query)
            .bind(guest_id)
            .bind(&record.event_ref)
            .bind(record.status.as_str())
            .bind(confirmed_guests)
            .bind(&record.notes)
            .bind(record.source.as_str())
            .bind(record.confirmed_at)
            .fetch_one(&mut **tx)
            .await
    }

    fn to_records(rows: Vec<ConfirmationEntity>) -> Result<Vec<ConfirmationRecord>, DomainError> {
        rows.into_iter()
            .map(|row| {
                let id = row.id;
                row.into_domain()
                    .map_err(|e| corrupt_row("event confirmation", id, e).into())
            })
            .collect()
    }
}

fn parse_guest_id(guest_ref: &str) -> Option<Uuid> {
    Uuid::parse_str(guest_ref).ok()
}

#[async_trait::async_trait]
impl ConfirmationStore for ConfirmationRepository {
    async fn find(&self, key: &ConfirmationKey) -> Result<Option<ConfirmationRecord>, DomainError> {
        let Some(guest_id) = parse_guest_id(&key.guest_ref) else {
            return Ok(None);
        };
        let row = self
            .find_by_key(guest_id, &key.event_ref)
            .await
            .map_err(storage_error)?;
        Ok(Self::to_records(row.into_iter().collect())?.pop())
    }

    async fn list_by_guest(&self, guest_ref: &str) -> Result<Vec<ConfirmationRecord>, DomainError> {
        let Some(guest_id) = parse_guest_id(guest_ref) else {
            return Ok(Vec::new());
        };
        let rows = self.find_by_guest(guest_id).await.map_err(storage_error)?;
        Self::to_records(rows)
    }

    async fn list_by_event(&self, event_ref: &str) -> Result<Vec<ConfirmationRecord>, DomainError> {
        let rows = self.find_by_event(event_ref).await.map_err(storage_error)?;
        Self::to_records(rows)
    }

    async fn apply(
        &self,
        key: &ConfirmationKey,
        request: &ConfirmationRequest,
        reconciler: &ConfirmationReconciler,
        now: DateTime<Utc>,
    ) -> Result<ConfirmationRecord, DomainError> {
        // Malformed writes never open a transaction.
        let write = reconciler.validate(request)?;

        let guest_id = parse_guest_id(&key.guest_ref).ok_or_else(|| DomainError::NotFound {
            entity: "guest",
            id: key.guest_ref.clone(),
        })?;

        let timer = QueryTimer::new("apply_confirmation");
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        Self::lock_key(&mut tx, guest_id, &key.event_ref)
            .await
            .map_err(storage_error)?;

        let query = format!(
            "SELECT {CONFIRMATION_COLUMNS} FROM event_confirmations WHERE guest_id = $1 AND event_id = $2"
        );
        let current = sqlx::query_as::<_, ConfirmationEntity>(&query)
            .bind(guest_id)
            .bind(&key.event_ref)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage_error)?;
        let current = Self::to_records(current.into_iter().collect())?.pop();

        // Dropping the transaction on rejection rolls it back and releases the lock.
        let record = reconciler.apply(key, current.into(), write, now)?;

        let stored = Self::upsert(&mut tx, guest_id, &record)
            .await
            .map_err(storage_error)?;
        tx.commit().await.map_err(storage_error)?;
        timer.record();

        let stored = stored
            .into_domain()
            .map_err(|e| corrupt_row("event confirmation", guest_id, e))?;
        Ok(stored)
    }
}
