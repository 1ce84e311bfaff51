//! Storage backend trait definition
//!
//! This module defines the core `StorageBackend` trait that all
//! storage implementations must implement.

use async_trait::async_trait;

use super::error::StorageResult;
use crate::{Alert, DeviceId, MonitoringResult, NewAlert};

/// Health status of the storage backend
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Is the backend operational?
    pub healthy: bool,

    /// Human-readable status message
    pub message: String,

    /// Additional backend-specific metadata
    pub metadata: std::collections::HashMap<String, String>,
}

/// Trait for persistent storage backends
///
/// The check pipeline writes monitoring results and alerts through this
/// trait; operator tooling reads through it. Implementations must be
/// `Send + Sync` as they are shared across concurrently running device
/// checks.
///
/// Monitoring results are append-only: there is deliberately no update
/// or delete operation for them. Alerts are mutable only through
/// `update_alert` (refresh by the deduplicator, acknowledge/resolve by
/// external operators).
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Append one monitoring result. A result is persisted whole or not
    /// at all; partial rows must never become visible.
    async fn insert_result(&self, result: MonitoringResult) -> StorageResult<()>;

    /// The N most recent results for a device, newest first.
    async fn latest_results(
        &self,
        device_id: DeviceId,
        limit: usize,
    ) -> StorageResult<Vec<MonitoringResult>>;

    /// Alerts for (device, title) in status `new` or `acknowledged`,
    /// most recent first.
    async fn open_alerts(&self, device_id: DeviceId, title: &str) -> StorageResult<Vec<Alert>>;

    /// Create an alert in status `new`; the backend assigns the id and
    /// `created_at`. Returns the stored record.
    async fn create_alert(&self, alert: NewAlert) -> StorageResult<Alert>;

    /// Overwrite an existing alert record (matched by id).
    async fn update_alert(&self, alert: &Alert) -> StorageResult<()>;

    /// Check backend health
    ///
    /// Performs a lightweight operation to verify the backend
    /// is operational (e.g., ping database, check file access).
    async fn health_check(&self) -> StorageResult<HealthStatus>;

    /// Close the backend and release resources
    async fn close(&self) -> StorageResult<()>;
}
