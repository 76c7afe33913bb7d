//! Client service: cache lookup with build-on-miss.

use crate::key::ClientCacheKey;
use crate::pool::ClientPool;
use async_trait::async_trait;
use certis_core::ProviderType;
use std::sync::Arc;

/// A stateless factory bound to a single provider type.
///
/// Builders are reused across rules; a rule owns the resolution logic, not
/// client construction. `build` may block on I/O (dial a socket, read a
/// credentials file) and must never be called while the pool lock is held.
#[async_trait]
pub trait ClientBuilder<T, Creds, Conf>: Send + Sync {
    async fn build(&self, credentials: Creds, config: Conf) -> anyhow::Result<T>;

    /// Provider type identifier used for cache-key construction.
    fn provider_type(&self) -> ProviderType;
}

/// Thin composition over the pool that adds defensive copying.
///
/// Credentials and configuration are cloned before they reach a builder, so
/// a caller mutating its copies after the handoff can never change what a
/// cached client observed. Value semantics stand in for the injected clone
/// functions a shared-reference design would need; `Conf` types with interior
/// maps must deep-copy in their `Clone`.
pub struct ClientService<T> {
    pool: Arc<ClientPool<T>>,
}

impl<T: Clone + Send + Sync> ClientService<T> {
    pub fn new(pool: Arc<ClientPool<T>>) -> Self {
        ClientService { pool }
    }

    /// Fetch a cached client or build and cache a new one.
    ///
    /// Build failures are logged and yield `None`; negative results are not
    /// cached. Concurrent misses for the same key may each invoke the
    /// builder; the last store wins and later lookups see a single client.
    pub async fn get_or_build<Creds, Conf>(
        &self,
        key: &ClientCacheKey,
        builder: &dyn ClientBuilder<T, Creds, Conf>,
        credentials: &Creds,
        config: &Conf,
    ) -> Option<T>
    where
        Creds: Clone + Send + Sync,
        Conf: Clone + Send + Sync,
    {
        if let Some(cached) = self.pool.get(key) {
            return Some(cached);
        }

        match builder.build(credentials.clone(), config.clone()).await {
            Ok(client) => {
                self.pool.set(key, client.clone());
                Some(client)
            }
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    tenant_id = %key.tenant_id,
                    provider = %builder.provider_type(),
                    "client build failed"
                );
                None
            }
        }
    }

    /// The underlying pool, for rotation and sweeps.
    pub fn pool(&self) -> &Arc<ClientPool<T>> {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Clone, Default)]
    struct FakeConf {
        tag: String,
    }

    struct FakeBuilder {
        builds: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ClientBuilder<String, String, FakeConf> for FakeBuilder {
        async fn build(&self, credentials: String, config: FakeConf) -> anyhow::Result<String> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("boom");
            }
            Ok(format!("{}/{}", credentials, config.tag))
        }

        fn provider_type(&self) -> ProviderType {
            ProviderType::S3
        }
    }

    fn service() -> ClientService<String> {
        ClientService::new(Arc::new(ClientPool::new(Duration::from_secs(60))))
    }

    #[tokio::test]
    async fn test_miss_builds_and_caches() {
        let svc = service();
        let builder = FakeBuilder {
            builds: AtomicUsize::new(0),
            fail: false,
        };
        let key = ClientCacheKey::new("org-1", ProviderType::S3);

        let first = svc
            .get_or_build(&key, &builder, &"creds".to_string(), &FakeConf::default())
            .await;
        let second = svc
            .get_or_build(&key, &builder, &"creds".to_string(), &FakeConf::default())
            .await;

        assert_eq!(first, second);
        assert_eq!(builder.builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_build_failure_not_cached() {
        let svc = service();
        let builder = FakeBuilder {
            builds: AtomicUsize::new(0),
            fail: true,
        };
        let key = ClientCacheKey::new("org-1", ProviderType::S3);

        for _ in 0..2 {
            let got = svc
                .get_or_build(&key, &builder, &"creds".to_string(), &FakeConf::default())
                .await;
            assert!(got.is_none());
        }

        // every attempt reached the builder: no negative caching
        assert_eq!(builder.builds.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_mutating_inputs_after_handoff_is_invisible() {
        let svc = service();
        let builder = FakeBuilder {
            builds: AtomicUsize::new(0),
            fail: false,
        };
        let key = ClientCacheKey::new("org-1", ProviderType::S3);

        let mut creds = "creds-v1".to_string();
        let mut conf = FakeConf {
            tag: "conf-v1".to_string(),
        };

        let built = svc.get_or_build(&key, &builder, &creds, &conf).await.unwrap();

        creds.push_str("-mutated");
        conf.tag.push_str("-mutated");

        let cached = svc.get_or_build(&key, &builder, &creds, &conf).await.unwrap();
        assert_eq!(built, cached);
        assert_eq!(cached, "creds-v1/conf-v1");
    }
}
