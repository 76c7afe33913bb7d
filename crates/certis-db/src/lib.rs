//! Certis DB Library
//!
//! The storage core's persistence surface. The core consumes the
//! [`IntegrationStore`] and [`FileStore`] traits (plus the blob-store port
//! defined in `certis-storage`); this crate provides the Postgres
//! repositories and in-memory implementations used by dev mode and tests.

pub mod memory;
pub mod models;
pub mod postgres;
pub mod stores;

pub use memory::{MemoryBlobStore, MemoryFileStore, MemoryIntegrationStore};
pub use models::{FileRecord, Hush, NewFileRecord, NewSystemIntegration, SystemIntegration};
pub use postgres::{PgBlobStore, PgFileStore, PgIntegrationStore};
pub use stores::{FileStore, IntegrationStore};
