use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::fmt;
use tracing::debug;

/// Tracks token identifiers that were logged out before their natural
/// expiry.
///
/// Entries expire together with the credential they shadow: once
/// `revoked_until` passes, the token is rejected by signature validation
/// anyway, so the entry is dropped either lazily on lookup or during the
/// sweep that accompanies every new revocation. Both operations are total
/// and safe under concurrent use from many request handlers.
pub struct RevocationCache {
    /// Revoked token id -> instant the revocation stops mattering
    entries: DashMap<String, DateTime<Utc>>,
}

impl fmt::Debug for RevocationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevocationCache")
            .field("entry_count", &self.entries.len())
            .finish()
    }
}

impl RevocationCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Revoke a token id until its natural expiry.
    ///
    /// Overwrites any prior revocation of the same id. As a side effect,
    /// sweeps every entry whose revocation window has already passed.
    pub fn revoke(&self, token_id: &str, revoked_until: DateTime<Utc>) {
        self.revoke_at(token_id, revoked_until, Utc::now());
    }

    /// Report whether a token id is currently revoked.
    ///
    /// An entry whose window has passed is removed before answering, so
    /// the cache never accumulates revocations of naturally expired
    /// credentials.
    pub fn is_revoked(&self, token_id: &str) -> bool {
        self.is_revoked_at(token_id, Utc::now())
    }

    /// Number of live revocation entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn revoke_at(&self, token_id: &str, revoked_until: DateTime<Utc>, now: DateTime<Utc>) {
        self.entries.insert(token_id.to_owned(), revoked_until);

        let before = self.entries.len();
        self.entries.retain(|_, until| *until > now);
        let swept = before - self.entries.len();
        if swept > 0 {
            debug!(swept, remaining = self.entries.len(), "swept expired revocations");
        }
    }

    fn is_revoked_at(&self, token_id: &str, now: DateTime<Utc>) -> bool {
        // remove_if makes the expiry check and the removal one atomic step,
        // so a concurrent re-revocation of the same id is never clobbered.
        self.entries.remove_if(token_id, |_, until| *until <= now);

        self.entries
            .get(token_id)
            .map(|entry| *entry.value() > now)
            .unwrap_or(false)
    }
}

impl Default for RevocationCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn revoked_token_is_reported_until_expiry() {
        let cache = RevocationCache::new();
        let now = Utc::now();

        cache.revoke_at("tok1", now + Duration::seconds(10), now);
        assert!(cache.is_revoked_at("tok1", now));

        // Still inside the window
        assert!(cache.is_revoked_at("tok1", now + Duration::seconds(9)));

        // Window passed: reported clean and the entry is gone
        assert!(!cache.is_revoked_at("tok1", now + Duration::seconds(11)));
        assert!(cache.is_empty());
    }

    #[test]
    fn unknown_token_is_not_revoked() {
        let cache = RevocationCache::new();
        assert!(!cache.is_revoked("never-seen"));
    }

    #[test]
    fn revoking_twice_keeps_the_latest_window() {
        let cache = RevocationCache::new();
        let now = Utc::now();

        cache.revoke_at("tok1", now + Duration::seconds(5), now);
        cache.revoke_at("tok1", now + Duration::seconds(30), now);

        assert!(cache.is_revoked_at("tok1", now + Duration::seconds(10)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn revocation_cannot_outlive_its_window() {
        let cache = RevocationCache::new();
        let now = Utc::now();

        // Logging out an already-expired credential leaves nothing behind
        cache.revoke_at("stale", now - Duration::seconds(1), now);
        assert!(!cache.is_revoked_at("stale", now));
        assert!(cache.is_empty());
    }

    #[test]
    fn sweep_bounds_growth_under_churn() {
        let cache = RevocationCache::new();
        let now = Utc::now();

        for i in 0..100 {
            cache.revoke_at(&format!("tok{i}"), now + Duration::seconds(1), now);
        }
        assert_eq!(cache.len(), 100);

        // The next revocation, a minute later, sweeps the whole batch
        let later = now + Duration::seconds(60);
        cache.revoke_at("fresh", later + Duration::seconds(10), later);
        assert_eq!(cache.len(), 1);
        assert!(cache.is_revoked_at("fresh", later));
    }

    #[test]
    fn concurrent_revokes_and_lookups_stay_consistent() {
        use std::sync::Arc;

        let cache = Arc::new(RevocationCache::new());
        let until = Utc::now() + Duration::seconds(60);

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        let id = format!("tok{}", i % 50);
                        if worker % 2 == 0 {
                            cache.revoke(&id, until);
                        } else {
                            cache.is_revoked(&id);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // All windows are in the future, so every written id must be visible
        for i in 0..50 {
            assert!(cache.is_revoked(&format!("tok{i}")));
        }
        assert_eq!(cache.len(), 50);
    }
}
