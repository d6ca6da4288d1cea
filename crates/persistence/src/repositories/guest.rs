//! Guest repository for database operations.

use domain::models::{GuestRecord, GuestRef, NewGuest, PhoneIdentity};
use domain::services::{GuestStore, StoredGuestPhone};
use domain::{DependencyError, DomainError};
use sqlx::PgPool;
use uuid::Uuid;

use super::{corrupt_row, int_column, storage_error, violates};
use crate::entities::{GuestEntity, GuestPhoneEntity};
use crate::metrics::QueryTimer;

/// Partial unique index over the combined phone of guests that have one.
const PHONE_INDEX: &str = "uq_guests_phone";

const GUEST_COLUMNS: &str = "id, name, invitation_name, phone_raw, phone_country_code, \
     phone_local_number, max_guests, invited_by, times_sent, created_at, updated_at";

/// Repository for guest-related database operations.
#[derive(Clone)]
pub struct GuestRepository {
    pool: PgPool,
}

impl GuestRepository {
    /// Creates a new GuestRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a guest and return its row.
    pub async fn insert(&self, guest: &NewGuest) -> Result<GuestEntity, sqlx::Error> {
        let max_guests = int_column(guest.max_guests)?;
        let times_sent = int_column(guest.times_sent)?;
        let timer = QueryTimer::new("insert_guest");
        let query = format!(
            r#"
            INSERT INTO guests (name, invitation_name, phone_raw, phone_country_code,
                                phone_local_number, max_guests, invited_by, times_sent)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {GUEST_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, GuestEntity>(&query)
            .bind(&guest.name)
            .bind(&guest.invitation_name)
            .bind(&guest.phone_raw)
            .bind(guest.phone_identity.country_code())
            .bind(guest.phone_identity.local_number())
            .bind(max_guests)
            .bind(guest.invited_by.map(|side| side.as_str()))
            .bind(times_sent)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Find a guest by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<GuestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_guest_by_id");
        let query = format!("SELECT {GUEST_COLUMNS} FROM guests WHERE id = $1");
        let result = sqlx::query_as::<_, GuestEntity>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// All guests in creation order.
    pub async fn find_all(&self) -> Result<Vec<GuestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_all_guests");
        let query = format!("SELECT {GUEST_COLUMNS} FROM guests ORDER BY created_at, id");
        let result = sqlx::query_as::<_, GuestEntity>(&query)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Phone columns of all guests.
    pub async fn find_all_phones(&self) -> Result<Vec<GuestPhoneEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_all_guest_phones");
        let result = sqlx::query_as::<_, GuestPhoneEntity>(
            r#"
            SELECT id, phone_raw, phone_country_code, phone_local_number
            FROM guests
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Overwrite the canonical phone of a guest. Returns false when no row matched.
    pub async fn set_phone(&self, id: Uuid, identity: &PhoneIdentity) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("update_guest_phone");
        let result = sqlx::query(
            r#"
            UPDATE guests
            SET phone_country_code = $2, phone_local_number = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(identity.country_code())
        .bind(identity.local_number())
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Maps a failed guest write, reporting a taken phone by number.
fn write_error(err: sqlx::Error, identity: &PhoneIdentity) -> DependencyError {
    if violates(&err, PHONE_INDEX) {
        tracing::debug!(phone = %identity.combined(), "Phone already registered");
        return DependencyError::new(format!(
            "phone {} is already registered to another guest",
            identity.combined()
        ));
    }
    storage_error(err)
}

#[async_trait::async_trait]
impl GuestStore for GuestRepository {
    async fn ping(&self) -> Result<(), DependencyError> {
        GuestRepository::ping(self).await.map_err(storage_error)
    }

    async fn list_guests(&self) -> Result<Vec<GuestRecord>, DomainError> {
        let rows = self.find_all().await.map_err(storage_error)?;
        rows.into_iter()
            .map(|row| {
                let id = row.id;
                row.into_domain().map_err(|e| corrupt_row("guest", id, e).into())
            })
            .collect()
    }

    async fn find_guest(&self, id: &str) -> Result<Option<GuestRecord>, DomainError> {
        let Ok(id) = Uuid::parse_str(id) else {
            return Ok(None);
        };
        match self.find_by_id(id).await.map_err(storage_error)? {
            Some(row) => row
                .into_domain()
                .map(Some)
                .map_err(|e| corrupt_row("guest", id, e).into()),
            None => Ok(None),
        }
    }

    async fn create_guest(&self, guest: NewGuest) -> Result<GuestRef, DependencyError> {
        let row = self
            .insert(&guest)
            .await
            .map_err(|e| write_error(e, &guest.phone_identity))?;
        tracing::debug!(guest_id = %row.id, "Guest inserted");
        Ok(row.id.to_string())
    }

    async fn list_guest_phones(&self) -> Result<Vec<StoredGuestPhone>, DomainError> {
        let rows = self.find_all_phones().await.map_err(storage_error)?;
        rows.into_iter()
            .map(|row| {
                let id = row.id;
                row.into_domain().map_err(|e| corrupt_row("guest", id, e).into())
            })
            .collect()
    }

    async fn update_phone(&self, id: &str, identity: &PhoneIdentity) -> Result<(), DependencyError> {
        let uuid = Uuid::parse_str(id)
            .map_err(|_| DependencyError::new(format!("invalid guest id: {}", id)))?;
        if self
            .set_phone(uuid, identity)
            .await
            .map_err(|e| write_error(e, identity))?
        {
            Ok(())
        } else {
            Err(DependencyError::new(format!("guest {} disappeared", id)))
        }
    }
}
