//! Rule engine for provider resolution.

use crate::context::ResolveContext;
use crate::service::ClientBuilder;
use async_trait::async_trait;
use certis_core::ProviderType;
use std::sync::Arc;

/// Output of a successful rule evaluation: everything the client service
/// needs to produce a working client.
pub struct Resolution<T, Creds, Conf> {
    pub builder: Arc<dyn ClientBuilder<T, Creds, Conf>>,
    pub credentials: Creds,
    pub config: Conf,
}

impl<T, Creds, Conf> Resolution<T, Creds, Conf> {
    pub fn provider_type(&self) -> ProviderType {
        self.builder.provider_type()
    }
}

impl<T, Creds: Clone, Conf: Clone> Clone for Resolution<T, Creds, Conf> {
    fn clone(&self) -> Self {
        Resolution {
            builder: Arc::clone(&self.builder),
            credentials: self.credentials.clone(),
            config: self.config.clone(),
        }
    }
}

/// One matcher-plus-resolver pair in the chain.
///
/// Evaluation may touch the database (system-integration lookup), hence
/// async. Returning `None` means "not my request"; the resolver moves on.
#[async_trait]
pub trait ResolutionRule<T, Creds, Conf>: Send + Sync {
    async fn evaluate(&self, ctx: &ResolveContext) -> Option<Resolution<T, Creds, Conf>>;
}

/// Ordered rule chain. Built once at startup, immutable afterwards, so
/// concurrent resolution needs no synchronization.
pub struct Resolver<T, Creds, Conf> {
    rules: Vec<Box<dyn ResolutionRule<T, Creds, Conf>>>,
}

impl<T, Creds, Conf> Default for Resolver<T, Creds, Conf> {
    fn default() -> Self {
        Resolver { rules: Vec::new() }
    }
}

impl<T, Creds, Conf> Resolver<T, Creds, Conf> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(&mut self, rule: Box<dyn ResolutionRule<T, Creds, Conf>>) -> &mut Self {
        self.rules.push(rule);
        self
    }

    /// Evaluate rules in insertion order; the first match wins.
    pub async fn resolve(&self, ctx: &ResolveContext) -> Option<Resolution<T, Creds, Conf>> {
        for (index, rule) in self.rules.iter().enumerate() {
            if let Some(resolution) = rule.evaluate(ctx).await {
                tracing::debug!(
                    rule_index = index,
                    provider = %resolution.provider_type(),
                    "resolution rule matched"
                );
                return Some(resolution);
            }
        }

        None
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticBuilder(ProviderType);

    #[async_trait]
    impl ClientBuilder<String, (), ()> for StaticBuilder {
        async fn build(&self, _credentials: (), _config: ()) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }

        fn provider_type(&self) -> ProviderType {
            self.0
        }
    }

    struct MatchIf {
        matches: bool,
        provider: ProviderType,
    }

    #[async_trait]
    impl ResolutionRule<String, (), ()> for MatchIf {
        async fn evaluate(&self, _ctx: &ResolveContext) -> Option<Resolution<String, (), ()>> {
            if !self.matches {
                return None;
            }

            Some(Resolution {
                builder: Arc::new(StaticBuilder(self.provider)),
                credentials: (),
                config: (),
            })
        }
    }

    #[tokio::test]
    async fn test_first_matching_rule_wins() {
        let mut resolver = Resolver::new();
        resolver
            .add_rule(Box::new(MatchIf {
                matches: false,
                provider: ProviderType::S3,
            }))
            .add_rule(Box::new(MatchIf {
                matches: true,
                provider: ProviderType::R2,
            }))
            .add_rule(Box::new(MatchIf {
                matches: true,
                provider: ProviderType::Disk,
            }));

        let resolution = resolver.resolve(&ResolveContext::new()).await.unwrap();
        assert_eq!(resolution.provider_type(), ProviderType::R2);
    }

    #[tokio::test]
    async fn test_no_match_returns_none() {
        let mut resolver = Resolver::new();
        resolver.add_rule(Box::new(MatchIf {
            matches: false,
            provider: ProviderType::S3,
        }));

        assert!(resolver.resolve(&ResolveContext::new()).await.is_none());
    }
}
