//! In-memory storage backend (no persistence)
//!
//! Keeps a bounded per-device ring buffer of monitoring results and a
//! flat alert table. Useful for:
//! - Testing without database dependencies
//! - Deployments that only care about live alerting
//!
//! All data is lost on restart.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::backend::{HealthStatus, StorageBackend};
use super::error::StorageResult;
use crate::{Alert, AlertStatus, DeviceId, MonitoringResult, NewAlert};

/// Maximum results to keep in memory per device
const MAX_RESULTS_PER_DEVICE: usize = 1000;

#[derive(Default)]
struct Inner {
    results: HashMap<DeviceId, VecDeque<MonitoringResult>>,
    alerts: Vec<Alert>,
    next_alert_id: i64,
}

/// In-memory storage backend
pub struct MemoryBackend {
    inner: Mutex<Inner>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_alert_id: 1,
                ..Inner::default()
            }),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn insert_result(&self, result: MonitoringResult) -> StorageResult<()> {
        let mut inner = self.inner.lock().expect("memory backend lock poisoned");

        let buffer = inner.results.entry(result.device_id).or_default();
        if buffer.len() >= MAX_RESULTS_PER_DEVICE {
            buffer.pop_front();
        }
        buffer.push_back(result);

        Ok(())
    }

    async fn latest_results(
        &self,
        device_id: DeviceId,
        limit: usize,
    ) -> StorageResult<Vec<MonitoringResult>> {
        let inner = self.inner.lock().expect("memory backend lock poisoned");

        Ok(inner
            .results
            .get(&device_id)
            .map(|buffer| buffer.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn open_alerts(&self, device_id: DeviceId, title: &str) -> StorageResult<Vec<Alert>> {
        let inner = self.inner.lock().expect("memory backend lock poisoned");

        let mut matching: Vec<Alert> = inner
            .alerts
            .iter()
            .filter(|a| a.device_id == device_id && a.title == title && a.status.is_open())
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(matching)
    }

    async fn create_alert(&self, alert: NewAlert) -> StorageResult<Alert> {
        let mut inner = self.inner.lock().expect("memory backend lock poisoned");

        let id = inner.next_alert_id;
        inner.next_alert_id += 1;

        let stored = Alert {
            id,
            device_id: alert.device_id,
            title: alert.title,
            message: alert.message,
            severity: alert.severity,
            status: AlertStatus::New,
            created_at: Utc::now(),
            acknowledged_at: None,
            resolved_at: None,
        };
        inner.alerts.push(stored.clone());

        Ok(stored)
    }

    async fn update_alert(&self, alert: &Alert) -> StorageResult<()> {
        let mut inner = self.inner.lock().expect("memory backend lock poisoned");

        if let Some(existing) = inner.alerts.iter_mut().find(|a| a.id == alert.id) {
            *existing = alert.clone();
        }

        Ok(())
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        let inner = self.inner.lock().expect("memory backend lock poisoned");

        Ok(HealthStatus {
            healthy: true,
            message: "In-memory storage operational".to_string(),
            metadata: HashMap::from([
                ("backend".to_string(), "memory".to_string()),
                ("alerts".to_string(), inner.alerts.len().to_string()),
                ("devices".to_string(), inner.results.len().to_string()),
            ]),
        })
    }

    async fn close(&self) -> StorageResult<()> {
        debug!("closing in-memory backend (no-op)");
        Ok(())
    }
}
