//! Typed value carrier for provider resolution.

use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Type-keyed carrier of resolution hints and request identity.
///
/// Rules are the core's extensibility point: a rule can consume any hint
/// type without every call signature growing a parameter for it. Each type
/// occupies one slot, so distinct hints are distinct newtypes (a preferred
/// provider and a known provider are different types even though both wrap
/// the provider enum).
#[derive(Default)]
pub struct ResolveContext {
    values: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl ResolveContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a typed value, replacing any previous value of the same type.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) -> &mut Self {
        self.values.insert(TypeId::of::<T>(), Box::new(value));
        self
    }

    /// Chained form of [`insert`](Self::insert) for building contexts inline.
    pub fn with<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    /// Borrow a previously stored value of type `T`.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }
}

impl std::fmt::Debug for ResolveContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolveContext")
            .field("values", &self.values.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct TenantId(String);

    #[derive(Debug, PartialEq)]
    struct SizeBytes(i64);

    #[test]
    fn test_insert_and_get_typed_values() {
        let ctx = ResolveContext::new()
            .with(TenantId("org-1".to_string()))
            .with(SizeBytes(42));

        assert_eq!(ctx.get::<TenantId>(), Some(&TenantId("org-1".to_string())));
        assert_eq!(ctx.get::<SizeBytes>(), Some(&SizeBytes(42)));
    }

    #[test]
    fn test_insert_replaces_same_type() {
        let mut ctx = ResolveContext::new();
        ctx.insert(SizeBytes(1));
        ctx.insert(SizeBytes(2));

        assert_eq!(ctx.get::<SizeBytes>(), Some(&SizeBytes(2)));
    }

    #[test]
    fn test_missing_type_is_none() {
        let ctx = ResolveContext::new();
        assert!(ctx.get::<TenantId>().is_none());
        assert!(!ctx.contains::<TenantId>());
    }
}
