//! Certis Resolve Library
//!
//! Rule-driven client resolution with a TTL-bounded client pool. The pieces
//! compose as: a [`Resolver`] evaluates [`ResolutionRule`]s in insertion
//! order against a [`ResolveContext`] of typed hints; the first match yields
//! a [`Resolution`] carrying a builder plus credentials and configuration;
//! the [`ClientService`] turns that into a cached client via the
//! [`ClientPool`].
//!
//! The engine is generic over the client type so the same machinery can pool
//! storage providers today and other per-tenant SDK clients later.

pub mod context;
pub mod key;
pub mod pool;
pub mod resolver;
pub mod service;

pub use context::ResolveContext;
pub use key::ClientCacheKey;
pub use pool::{ClientEntry, ClientPool};
pub use resolver::{Resolution, ResolutionRule, Resolver};
pub use service::{ClientBuilder, ClientService};
