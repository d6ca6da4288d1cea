//! Phone canonicalization.
//!
//! Turns free-form phone strings (manual entry, spreadsheet cells, webhook
//! payloads, app submissions) into a [`PhoneIdentity`] that can be compared
//! across sources. The rules are driven by a [`DialingPlan`]; the default
//! plan is Mexican mobile numbering in the WhatsApp "521" form.
//!
//! Rules, first match wins, applied to the digits of the input:
//! 1. no input, or an empty string: mobile prefix with an empty local number
//! 2. mobile prefix + national number: prefix split off
//! 3. country prefix + national number: promoted to the mobile prefix
//! 4. bare national number: mobile prefix added
//! 5. "1" + national number (when enabled): the leading 1 is dropped
//! 6. anything else: mobile prefix with the digits unchanged
//!
//! The function is total: it never fails, it only degrades to rule 6.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::PhoneIdentity;

lazy_static::lazy_static! {
    static ref NON_DIGIT_REGEX: regex::Regex = regex::Regex::new(r"[^0-9]").unwrap();
}

/// Numbering rules used to canonicalize phones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct DialingPlan {
    /// Prefix stored on every canonical identity (WhatsApp form).
    pub mobile_prefix: String,
    /// International country prefix that is promoted to `mobile_prefix`.
    pub country_prefix: String,
    /// Digits in a national subscriber number.
    pub national_length: usize,
    /// Treat a leading "1" in front of a national number as noise.
    pub strip_leading_one: bool,
}

impl Default for DialingPlan {
    fn default() -> Self {
        Self {
            mobile_prefix: "521".to_string(),
            country_prefix: "52".to_string(),
            national_length: 10,
            strip_leading_one: true,
        }
    }
}

impl DialingPlan {
    /// Checks that the plan can produce digit-only identities.
    pub fn validate(&self) -> Result<(), ValidationError> {
        shared::validation::validate_digits(&self.mobile_prefix)
            .map_err(|_| ValidationError::new("mobile_prefix", "must contain only digits"))?;
        shared::validation::validate_digits(&self.country_prefix)
            .map_err(|_| ValidationError::new("country_prefix", "must contain only digits"))?;

        if !self.mobile_prefix.starts_with(&self.country_prefix) {
            return Err(ValidationError::new(
                "mobile_prefix",
                "must start with the country prefix",
            ));
        }
        if self.national_length == 0 {
            return Err(ValidationError::new(
                "national_length",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Canonicalizes phone strings according to a [`DialingPlan`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhoneCanonicalizer {
    plan: DialingPlan,
}

impl PhoneCanonicalizer {
    /// Creates a canonicalizer after checking the plan.
    pub fn new(plan: DialingPlan) -> Result<Self, ValidationError> {
        plan.validate()?;
        Ok(Self { plan })
    }

    /// Normalizes a raw phone into its canonical identity.
    pub fn normalize(&self, raw: Option<&str>) -> PhoneIdentity {
        let plan = &self.plan;
        let identity = |local: &str| {
            PhoneIdentity::new_unchecked(plan.mobile_prefix.clone(), local.to_string())
        };

        let raw = match raw {
            Some(raw) if !raw.is_empty() => raw,
            _ => return identity(""),
        };

        let digits = NON_DIGIT_REGEX.replace_all(raw, "");
        let digits = digits.as_ref();
        let national = plan.national_length;

        if let Some(local) = strip_prefix_with_len(digits, &plan.mobile_prefix, national) {
            return identity(local);
        }
        if let Some(local) = strip_prefix_with_len(digits, &plan.country_prefix, national) {
            return identity(local);
        }
        if digits.len() == national {
            return identity(digits);
        }
        if plan.strip_leading_one {
            if let Some(local) = strip_prefix_with_len(digits, "1", national) {
                return identity(local);
            }
        }

        tracing::debug!(
            digits_len = digits.len(),
            "Phone does not match a known shape, keeping digits as-is"
        );
        identity(digits)
    }

    /// Normalizes an identity that may have been stored under older rules.
    ///
    /// Identities already carrying the mobile prefix are re-derived from their
    /// local number, anything else from the combined digits. The result is a
    /// fixed point: canonicalizing it again returns it unchanged.
    pub fn canonicalize(&self, identity: &PhoneIdentity) -> PhoneIdentity {
        if identity.country_code() == self.plan.mobile_prefix {
            self.normalize(Some(identity.local_number()))
        } else {
            self.normalize(Some(&identity.combined()))
        }
    }

    /// Dialable address for the messaging service.
    pub fn combine(identity: &PhoneIdentity) -> String {
        identity.combined()
    }
}

/// Returns the remainder of `digits` when it starts with `prefix` and the
/// remainder is exactly `len` digits long.
fn strip_prefix_with_len<'a>(digits: &'a str, prefix: &str, len: usize) -> Option<&'a str> {
    digits
        .strip_prefix(prefix)
        .filter(|rest| rest.len() == len)
}
