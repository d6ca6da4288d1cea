//! Canonical phone identity.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ValidationError;

/// A telephone number split into a country/mobile prefix and a national part.
///
/// Both parts hold only decimal digits. `local_number` is empty only when the
/// source phone was absent. Values are produced by
/// [`PhoneCanonicalizer`](crate::services::PhoneCanonicalizer) or rebuilt from
/// storage through [`PhoneIdentity::from_parts`], which checks the digit rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", try_from = "PhoneIdentityParts")]
pub struct PhoneIdentity {
    #[validate(custom(function = "shared::validation::validate_digits"))]
    country_code: String,

    #[validate(custom(function = "shared::validation::validate_optional_digits"))]
    local_number: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhoneIdentityParts {
    country_code: String,
    #[serde(default)]
    local_number: String,
}

impl TryFrom<PhoneIdentityParts> for PhoneIdentity {
    type Error = ValidationError;

    fn try_from(parts: PhoneIdentityParts) -> Result<Self, Self::Error> {
        PhoneIdentity::from_parts(parts.country_code, parts.local_number)
    }
}

impl PhoneIdentity {
    /// Builds an identity from parts the caller already trusts to be digits.
    pub(crate) fn new_unchecked(country_code: String, local_number: String) -> Self {
        Self {
            country_code,
            local_number,
        }
    }

    /// Rebuilds an identity from stored parts, checking that both are digits.
    pub fn from_parts(
        country_code: impl Into<String>,
        local_number: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let identity = Self {
            country_code: country_code.into(),
            local_number: local_number.into(),
        };
        identity.validate().map_err(ValidationError::from)?;
        Ok(identity)
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    pub fn local_number(&self) -> &str {
        &self.local_number
    }

    /// Whether a national number is present.
    pub fn has_local_number(&self) -> bool {
        !self.local_number.is_empty()
    }

    /// Country code and national number with no separator.
    ///
    /// This is the deduplication key and the dialable address handed to the
    /// messaging service.
    pub fn combined(&self) -> String {
        let mut combined = String::with_capacity(self.country_code.len() + self.local_number.len());
        combined.push_str(&self.country_code);
        combined.push_str(&self.local_number);
        combined
    }
}

impl std::fmt::Display for PhoneIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "+{} {}", self.country_code, self.local_number)
    }
}
