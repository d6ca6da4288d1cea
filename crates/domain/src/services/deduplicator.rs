//! Guest deduplication by canonical phone.

use std::collections::HashMap;

use crate::models::{GuestRecord, GuestSummary, PhoneIdentity};

use super::PhoneCanonicalizer;

/// Finds the guest that already owns a phone.
///
/// Both sides are put through the canonicalizer before comparison, so a
/// guest stored under older normalization rules still matches. Identities
/// without a local number never match anything.
#[derive(Debug, Clone, Copy)]
pub struct GuestDeduplicator<'a> {
    canonicalizer: &'a PhoneCanonicalizer,
}

/// Owners of canonical phone keys, built once for a pool of guests.
///
/// The first guest inserted under a key keeps it, so lookups agree with the
/// traversal order of [`GuestDeduplicator::find_match`].
#[derive(Debug, Clone, Default)]
pub struct PhoneIndex {
    owners: HashMap<String, GuestSummary>,
}

impl<'a> GuestDeduplicator<'a> {
    pub fn new(canonicalizer: &'a PhoneCanonicalizer) -> Self {
        Self { canonicalizer }
    }

    /// Canonical combined phone, or `None` when there is no local number.
    fn key(&self, identity: &PhoneIdentity) -> Option<String> {
        let canonical = self.canonicalizer.canonicalize(identity);
        canonical.has_local_number().then(|| canonical.combined())
    }

    /// Returns the first candidate whose canonical phone equals `identity`'s.
    pub fn find_match<'g, I>(&self, identity: &PhoneIdentity, candidates: I) -> Option<&'g GuestRecord>
    where
        I: IntoIterator<Item = &'g GuestRecord>,
    {
        let key = self.key(identity)?;
        candidates
            .into_iter()
            .find(|candidate| self.key(&candidate.phone_identity).as_deref() == Some(key.as_str()))
    }

    /// Canonicalizes every guest of `pool` once.
    pub fn index<'g, I>(&self, pool: I) -> PhoneIndex
    where
        I: IntoIterator<Item = &'g GuestRecord>,
    {
        let mut index = PhoneIndex::default();
        for guest in pool {
            self.remember(&mut index, guest);
        }
        index
    }

    /// Adds `guest` to `index` unless its phone is already owned.
    pub fn remember(&self, index: &mut PhoneIndex, guest: &GuestRecord) {
        if let Some(key) = self.key(&guest.phone_identity) {
            index
                .owners
                .entry(key)
                .or_insert_with(|| GuestSummary::from(guest));
        }
    }

    /// Owner of `identity`'s canonical phone in `index`.
    pub fn lookup<'i>(&self, index: &'i PhoneIndex, identity: &PhoneIdentity) -> Option<&'i GuestSummary> {
        index.owners.get(&self.key(identity)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InvitedBy;

    fn find_match_raw<'g>(
        c: &PhoneCanonicalizer,
        raw: Option<&str>,
        pool: &'g [GuestRecord],
    ) -> Option<&'g GuestRecord> {
        GuestDeduplicator::new(c).find_match(&c.normalize(raw), pool)
    }

    fn guest(id: &str, identity: PhoneIdentity) -> GuestRecord {
        GuestRecord {
            id: id.to_string(),
            name: format!("Guest {}", id),
            invitation_name: None,
            phone_identity: identity,
            max_guests: 1,
            invited_by: Some(InvitedBy::Bride),
            times_sent: 0,
        }
    }

    #[test]
    fn test_matches_across_formatting() {
        let c = PhoneCanonicalizer::default();
        let pool = vec![guest("g1", c.normalize(Some("55 1234 5678")))];

        for raw in [
            "5512345678",
            "+52 55 1234-5678",
            "521 55 1234 5678",
            "1-551-234-5678",
            "(55) 1234.5678",
        ] {
            let found = find_match_raw(&c, Some(raw), &pool);
            assert_eq!(found.map(|g| g.id.as_str()), Some("g1"), "input {raw}");
        }
    }

    #[test]
    fn test_no_match_for_different_number() {
        let c = PhoneCanonicalizer::default();
        let pool = vec![guest("g1", c.normalize(Some("5512345678")))];
        assert!(find_match_raw(&c, Some("5512345679"), &pool).is_none());
    }

    #[test]
    fn test_phoneless_identities_never_match() {
        let c = PhoneCanonicalizer::default();
        let pool = vec![guest("g1", c.normalize(None)), guest("g2", c.normalize(Some("")))];

        assert!(find_match_raw(&c, None, &pool).is_none());
        assert!(find_match_raw(&c, Some("n/a"), &pool).is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let c = PhoneCanonicalizer::default();
        let pool = vec![
            guest("g1", c.normalize(Some("5511111111"))),
            guest("g2", c.normalize(Some("5512345678"))),
            guest("g3", c.normalize(Some("+52 55 1234 5678"))),
        ];
        let found = find_match_raw(&c, Some("5512345678"), &pool);
        assert_eq!(found.map(|g| g.id.as_str()), Some("g2"));
    }

    #[test]
    fn test_legacy_stored_identity_is_canonicalized() {
        let c = PhoneCanonicalizer::default();
        let pool = vec![guest(
            "legacy",
            PhoneIdentity::from_parts("52", "5512345678").unwrap(),
        )];
        let found = find_match_raw(&c, Some("5512345678"), &pool);
        assert_eq!(found.map(|g| g.id.as_str()), Some("legacy"));
    }

    #[test]
    fn test_unrecognized_shapes_match_each_other() {
        let c = PhoneCanonicalizer::default();
        let pool = vec![guest("short", c.normalize(Some("123-456-789")))];
        let found = find_match_raw(&c, Some("123 456 789"), &pool);
        assert_eq!(found.map(|g| g.id.as_str()), Some("short"));
    }

    #[test]
    fn test_empty_pool() {
        let c = PhoneCanonicalizer::default();
        let pool: Vec<GuestRecord> = Vec::new();
        assert!(find_match_raw(&c, Some("5512345678"), &pool).is_none());
    }

    #[test]
    fn test_index_keeps_first_owner() {
        let c = PhoneCanonicalizer::default();
        let dedup = GuestDeduplicator::new(&c);
        let pool = vec![
            guest("g1", c.normalize(Some("5511111111"))),
            guest("legacy", PhoneIdentity::from_parts("52", "5512345678").unwrap()),
            guest("g3", c.normalize(Some("+52 55 1234 5678"))),
            guest("phoneless", c.normalize(None)),
        ];
        let index = dedup.index(&pool);

        let identity = c.normalize(Some("55-1234-5678"));
        let owner = dedup.lookup(&index, &identity).map(|g| g.id.as_str());
        assert_eq!(owner, Some("legacy"));
        assert_eq!(owner, dedup.find_match(&identity, &pool).map(|g| g.id.as_str()));

        assert!(dedup.lookup(&index, &c.normalize(None)).is_none());
        assert!(dedup.lookup(&index, &c.normalize(Some("5599999999"))).is_none());
    }

    #[test]
    fn test_remember_extends_index() {
        let c = PhoneCanonicalizer::default();
        let dedup = GuestDeduplicator::new(&c);
        let mut index = PhoneIndex::default();
        let identity = c.normalize(Some("5512345678"));
        assert!(dedup.lookup(&index, &identity).is_none());

        dedup.remember(&mut index, &guest("new", identity.clone()));
        dedup.remember(&mut index, &guest("later", identity.clone()));
        assert_eq!(dedup.lookup(&index, &identity).map(|g| g.id.as_str()), Some("new"));
    }
}
