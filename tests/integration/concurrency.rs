//! Concurrency and failure-isolation behavior of the check pipeline

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use fleetwatch::alerts::AlertEngine;
use fleetwatch::checker::DeviceChecker;
use fleetwatch::registry::StaticRegistry;
use fleetwatch::storage::{
    HealthStatus, MemoryBackend, StorageBackend, StorageError, StorageResult,
};
use fleetwatch::{Alert, DeviceId, MonitoringResult, NewAlert};

use super::helpers::{build_pipeline, down, make_device, ScriptedMetrics, ScriptedReachability};

fn addr(s: &str) -> IpAddr {
    s.parse().unwrap()
}

#[tokio::test]
async fn test_concurrent_checks_of_one_device_create_one_alert() {
    let device = make_device(1, "core-switch", "10.2.0.1");
    let pipeline = build_pipeline(
        vec![device],
        HashMap::from([(addr("10.2.0.1"), down())]),
        HashMap::new(),
    );

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let checker = pipeline.checker.clone();
        tasks.push(tokio::spawn(async move { checker.check_device(1).await }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let alerts = pipeline
        .store
        .open_alerts(1, "Device core-switch is down")
        .await
        .unwrap();
    assert_eq!(alerts.len(), 1);
}

/// Delegates to an in-memory backend but fails result inserts for one
/// device, simulating a persistence fault scoped to a single row.
struct FailingStore {
    inner: MemoryBackend,
    fail_device: DeviceId,
}

#[async_trait]
impl StorageBackend for FailingStore {
    async fn insert_result(&self, result: MonitoringResult) -> StorageResult<()> {
        if result.device_id == self.fail_device {
            return Err(StorageError::QueryFailed("disk full".to_string()));
        }
        self.inner.insert_result(result).await
    }

    async fn latest_results(
        &self,
        device_id: DeviceId,
        limit: usize,
    ) -> StorageResult<Vec<MonitoringResult>> {
        self.inner.latest_results(device_id, limit).await
    }

    async fn open_alerts(&self, device_id: DeviceId, title: &str) -> StorageResult<Vec<Alert>> {
        self.inner.open_alerts(device_id, title).await
    }

    async fn create_alert(&self, alert: NewAlert) -> StorageResult<Alert> {
        self.inner.create_alert(alert).await
    }

    async fn update_alert(&self, alert: &Alert) -> StorageResult<()> {
        self.inner.update_alert(alert).await
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        self.inner.health_check().await
    }

    async fn close(&self) -> StorageResult<()> {
        self.inner.close().await
    }
}

#[tokio::test]
async fn test_persistence_failure_is_scoped_to_one_device() {
    let devices = vec![
        make_device(1, "healthy-a", "10.2.1.1"),
        make_device(2, "cursed", "10.2.1.2"),
        make_device(3, "healthy-b", "10.2.1.3"),
    ];

    let store = Arc::new(FailingStore {
        inner: MemoryBackend::new(),
        fail_device: 2,
    });
    let reachability = Arc::new(ScriptedReachability::new(HashMap::from([
        (addr("10.2.1.1"), down()),
        (addr("10.2.1.2"), down()),
        (addr("10.2.1.3"), down()),
    ])));

    let checker = DeviceChecker::new(
        Arc::new(StaticRegistry::new(devices)),
        store.clone(),
        Arc::new(AlertEngine::new(store.clone())),
        reachability,
        Arc::new(ScriptedMetrics::new(HashMap::new())),
    );

    let mut tasks = Vec::new();
    for id in [1, 2, 3] {
        let checker = checker.clone();
        tasks.push(tokio::spawn(async move { (id, checker.check_device(id).await) }));
    }

    for task in tasks {
        let (id, outcome) = task.await.unwrap();
        if id == 2 {
            assert!(outcome.is_err());
        } else {
            assert!(outcome.is_ok());
        }
    }

    // The failing device lost its result, the others kept theirs.
    assert_eq!(store.latest_results(1, 10).await.unwrap().len(), 1);
    assert_eq!(store.latest_results(2, 10).await.unwrap().len(), 0);
    assert_eq!(store.latest_results(3, 10).await.unwrap().len(), 1);

    // Alerts are raised before the insert, so even the failing device's
    // outage is visible.
    for (id, name) in [(1, "healthy-a"), (2, "cursed"), (3, "healthy-b")] {
        let alerts = store
            .open_alerts(id, &format!("Device {name} is down"))
            .await
            .unwrap();
        assert_eq!(alerts.len(), 1);
    }
}
