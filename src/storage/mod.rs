//! Persistence boundary for monitoring results and alerts
//!
//! Backends implement [`StorageBackend`]; the default deployment uses
//! SQLite, tests and no-persistence deployments use [`MemoryBackend`].

pub mod backend;
pub mod error;
pub mod memory;

#[cfg(feature = "storage-sqlite")]
pub mod sqlite;

pub use backend::{HealthStatus, StorageBackend};
pub use error::{StorageError, StorageResult};
pub use memory::MemoryBackend;

#[cfg(feature = "storage-sqlite")]
pub use sqlite::SqliteBackend;
