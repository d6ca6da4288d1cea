//! Guest entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{GuestRecord, InvitedBy, PhoneIdentity};
use domain::services::StoredGuestPhone;
use domain::ValidationError;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the guests table.
#[derive(Debug, Clone, FromRow)]
pub struct GuestEntity {
    pub id: Uuid,
    pub name: String,
    pub invitation_name: Option<String>,
    pub phone_raw: Option<String>,
    pub phone_country_code: String,
    pub phone_local_number: String,
    pub max_guests: i32,
    pub invited_by: Option<String>,
    pub times_sent: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GuestEntity {
    fn phone_identity(&self) -> Result<PhoneIdentity, ValidationError> {
        PhoneIdentity::from_parts(self.phone_country_code.clone(), self.phone_local_number.clone())
    }

    /// Convert to domain model.
    ///
    /// Fails only when the stored phone parts are not digit strings.
    pub fn into_domain(self) -> Result<GuestRecord, ValidationError> {
        let phone_identity = self.phone_identity()?;
        let invited_by = self
            .invited_by
            .as_deref()
            .and_then(|value| value.parse::<InvitedBy>().ok());

        Ok(GuestRecord {
            id: self.id.to_string(),
            name: self.name,
            invitation_name: self.invitation_name,
            phone_identity,
            max_guests: u32::try_from(self.max_guests).unwrap_or(1).max(1),
            invited_by,
            times_sent: u32::try_from(self.times_sent).unwrap_or(0),
        })
    }
}

/// Phone columns of a guest row, read for re-normalization.
#[derive(Debug, Clone, FromRow)]
pub struct GuestPhoneEntity {
    pub id: Uuid,
    pub phone_raw: Option<String>,
    pub phone_country_code: String,
    pub phone_local_number: String,
}

impl GuestPhoneEntity {
    pub fn into_domain(self) -> Result<StoredGuestPhone, ValidationError> {
        Ok(StoredGuestPhone {
            guest_ref: self.id.to_string(),
            current: PhoneIdentity::from_parts(self.phone_country_code, self.phone_local_number)?,
            phone_raw: self.phone_raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::name::en::Name;
    use fake::Fake;

    fn create_test_entity() -> GuestEntity {
        GuestEntity {
            id: Uuid::new_v4(),
            name: Name().fake(),
            invitation_name: Some("Familia Pérez".to_string()),
            phone_raw: Some("55 1234-5678".to_string()),
            phone_country_code: "521".to_string(),
            phone_local_number: "5512345678".to_string(),
            max_guests: 2,
            invited_by: Some("Groom".to_string()),
            times_sent: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_entity_to_domain() {
        let entity = create_test_entity();
        let guest = entity.clone().into_domain().unwrap();

        assert_eq!(guest.id, entity.id.to_string());
        assert_eq!(guest.name, entity.name);
        assert_eq!(guest.invitation_name, entity.invitation_name);
        assert_eq!(guest.phone_identity.combined(), "5215512345678");
        assert_eq!(guest.max_guests, 2);
        assert_eq!(guest.invited_by, Some(InvitedBy::Groom));
        assert_eq!(guest.times_sent, 1);
    }

    #[test]
    fn test_entity_with_unknown_inviter_is_unset() {
        let mut entity = create_test_entity();
        entity.invited_by = Some("Neighbour".to_string());
        assert_eq!(entity.into_domain().unwrap().invited_by, None);
    }

    #[test]
    fn test_entity_with_out_of_range_counts() {
        let mut entity = create_test_entity();
        entity.max_guests = 0;
        entity.times_sent = -3;

        let guest = entity.into_domain().unwrap();
        assert_eq!(guest.max_guests, 1);
        assert_eq!(guest.times_sent, 0);
    }

    #[test]
    fn test_entity_with_corrupt_phone_fails() {
        let mut entity = create_test_entity();
        entity.phone_local_number = "55-1234".to_string();
        assert!(entity.into_domain().is_err());
    }

    #[test]
    fn test_phone_entity_to_domain() {
        let id = Uuid::new_v4();
        let phone = GuestPhoneEntity {
            id,
            phone_raw: None,
            phone_country_code: "52".to_string(),
            phone_local_number: "5512345678".to_string(),
        }
        .into_domain()
        .unwrap();

        assert_eq!(phone.guest_ref, id.to_string());
        assert_eq!(phone.phone_raw, None);
        assert_eq!(phone.current.country_code(), "52");
    }
}
