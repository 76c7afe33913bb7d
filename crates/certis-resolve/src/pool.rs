//! TTL-bounded client pool.

use crate::key::ClientCacheKey;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// A cached client plus its expiry.
#[derive(Debug, Clone)]
pub struct ClientEntry<T> {
    pub client: T,
    pub expires_at: Instant,
}

/// Thread-safe map from cache key to client with TTL expiration.
///
/// Lookups and stores hold the lock only briefly; building clients happens
/// outside the pool. There is no cardinality-based eviction: callers are
/// expected to keep tenants x providers bounded. A purged client may still
/// be held by in-flight operations and must remain safe to call.
pub struct ClientPool<T> {
    clients: RwLock<HashMap<String, ClientEntry<T>>>,
    ttl: Duration,
}

impl<T: Clone> ClientPool<T> {
    pub fn new(ttl: Duration) -> Self {
        ClientPool {
            clients: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Retrieve a client if it exists and has not expired.
    pub fn get(&self, key: &ClientCacheKey) -> Option<T> {
        let clients = self.clients.read().expect("client pool lock poisoned");

        clients
            .get(&key.to_string())
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.client.clone())
    }

    /// Store a client with a fresh TTL, replacing any existing entry.
    pub fn set(&self, key: &ClientCacheKey, client: T) {
        let entry = ClientEntry {
            client,
            expires_at: Instant::now() + self.ttl,
        };

        let mut clients = self.clients.write().expect("client pool lock poisoned");
        clients.insert(key.to_string(), entry);
    }

    /// Drop a client, forcing the next lookup to rebuild.
    pub fn remove(&self, key: &ClientCacheKey) {
        let mut clients = self.clients.write().expect("client pool lock poisoned");
        clients.remove(&key.to_string());
    }

    /// Sweep expired entries; returns how many were removed.
    pub fn clean_expired(&self) -> usize {
        let now = Instant::now();
        let mut clients = self.clients.write().expect("client pool lock poisoned");

        let before = clients.len();
        clients.retain(|_, entry| now < entry.expires_at);
        before - clients.len()
    }

    /// Number of entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.clients.read().expect("client pool lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certis_core::ProviderType;

    fn key(tenant: &str) -> ClientCacheKey {
        ClientCacheKey::new(tenant, ProviderType::S3)
    }

    #[test]
    fn test_get_returns_unexpired_client() {
        let pool = ClientPool::new(Duration::from_secs(60));
        pool.set(&key("org-1"), "client-a".to_string());

        assert_eq!(pool.get(&key("org-1")), Some("client-a".to_string()));
        assert_eq!(pool.get(&key("org-2")), None);
    }

    #[test]
    fn test_get_refuses_expired_client() {
        let pool = ClientPool::new(Duration::from_millis(0));
        pool.set(&key("org-1"), "client-a".to_string());

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(pool.get(&key("org-1")), None);
    }

    #[test]
    fn test_set_overwrites_existing_entry() {
        let pool = ClientPool::new(Duration::from_secs(60));
        pool.set(&key("org-1"), "old".to_string());
        pool.set(&key("org-1"), "new".to_string());

        assert_eq!(pool.get(&key("org-1")), Some("new".to_string()));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_remove_forces_rebuild() {
        let pool = ClientPool::new(Duration::from_secs(60));
        pool.set(&key("org-1"), "client-a".to_string());
        pool.remove(&key("org-1"));

        assert_eq!(pool.get(&key("org-1")), None);
    }

    #[test]
    fn test_clean_expired_counts_removals() {
        let pool = ClientPool::new(Duration::from_millis(0));
        pool.set(&key("org-1"), "a".to_string());
        pool.set(&key("org-2"), "b".to_string());

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(pool.clean_expired(), 2);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_concurrent_access() {
        use std::sync::Arc;

        let pool = Arc::new(ClientPool::new(Duration::from_secs(60)));
        let mut handles = Vec::new();

        for i in 0..8 {
            let pool = Arc::clone(&pool);
            handles.push(std::thread::spawn(move || {
                let k = key(&format!("org-{}", i % 4));
                pool.set(&k, format!("client-{}", i));
                pool.get(&k);
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(pool.len(), 4);
    }
}
