//! In-memory cache of per-token download secrets.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use ulid::Ulid;

struct StoredSecret {
    secret: Vec<u8>,
    expires_at: DateTime<Utc>,
}

/// Holds each outstanding download token's signing secret until expiry.
///
/// A secret is present iff its token is still redeemable: insertion
/// schedules deletion at `expires_at`, and lookups evict anything the timer
/// has not reached yet. Deleting an entry revokes that single token.
#[derive(Clone, Default)]
pub struct DownloadSecretCache {
    secrets: Arc<Mutex<HashMap<String, StoredSecret>>>,
}

impl DownloadSecretCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retain a token's secret until it expires.
    ///
    /// Already-expired tokens are not stored. Requires a Tokio runtime for
    /// the eviction timer.
    pub fn store(&self, token_id: Ulid, secret: &[u8], expires_at: DateTime<Utc>) {
        if secret.is_empty() {
            return;
        }

        let ttl = match (expires_at - Utc::now()).to_std() {
            Ok(ttl) => ttl,
            Err(_) => return,
        };

        let key = token_id.to_string();

        self.secrets
            .lock()
            .expect("download secret lock poisoned")
            .insert(
                key.clone(),
                StoredSecret {
                    secret: secret.to_vec(),
                    expires_at,
                },
            );

        let secrets = Arc::clone(&self.secrets);
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            secrets
                .lock()
                .expect("download secret lock poisoned")
                .remove(&key);
        });
    }

    /// The secret for a token, if that token is still live.
    pub fn lookup(&self, token_id: Ulid) -> Option<Vec<u8>> {
        let key = token_id.to_string();
        let mut secrets = self.secrets.lock().expect("download secret lock poisoned");

        match secrets.get(&key) {
            Some(stored) if Utc::now() < stored.expires_at => Some(stored.secret.clone()),
            Some(_) => {
                secrets.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Revoke one token immediately.
    pub fn remove(&self, token_id: Ulid) {
        self.secrets
            .lock()
            .expect("download secret lock poisoned")
            .remove(&token_id.to_string());
    }

    pub fn len(&self) -> usize {
        self.secrets
            .lock()
            .expect("download secret lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[tokio::test]
    async fn test_store_and_lookup() {
        let cache = DownloadSecretCache::new();
        let id = Ulid::new();

        cache.store(id, b"secret-bytes", Utc::now() + ChronoDuration::seconds(60));

        assert_eq!(cache.lookup(id), Some(b"secret-bytes".to_vec()));
        assert_eq!(cache.lookup(Ulid::new()), None);
    }

    #[tokio::test]
    async fn test_expired_secret_not_returned() {
        let cache = DownloadSecretCache::new();
        let id = Ulid::new();

        cache.store(id, b"secret", Utc::now() + ChronoDuration::milliseconds(20));
        tokio::time::sleep(std::time::Duration::from_millis(40)).await;

        assert_eq!(cache.lookup(id), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_already_expired_not_stored() {
        let cache = DownloadSecretCache::new();
        let id = Ulid::new();

        cache.store(id, b"secret", Utc::now() - ChronoDuration::seconds(1));

        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_remove_revokes_token() {
        let cache = DownloadSecretCache::new();
        let id = Ulid::new();

        cache.store(id, b"secret", Utc::now() + ChronoDuration::seconds(60));
        cache.remove(id);

        assert_eq!(cache.lookup(id), None);
    }
}
