//! End-to-end checks of the per-device pipeline

use std::collections::HashMap;
use std::net::IpAddr;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use fleetwatch::checker::CheckOutcome;
use fleetwatch::probes::MetricsReading;
use fleetwatch::storage::StorageBackend;
use fleetwatch::{AlertStatus, ProbeStatus, ResourceMetrics, Severity};

use super::helpers::{build_pipeline, down, make_device, up};

fn addr(s: &str) -> IpAddr {
    s.parse().unwrap()
}

#[tokio::test]
async fn test_ping_only_device_records_latency_and_no_alert() {
    // Device A: ping enabled, SNMP disabled, reachable at 12.5ms.
    let mut device = make_device(1, "device-a", "10.0.0.1");
    device.snmp_check_enabled = false;

    let pipeline = build_pipeline(
        vec![device],
        HashMap::from([(addr("10.0.0.1"), up(12.5))]),
        HashMap::new(),
    );

    let outcome = pipeline.checker.check_device(1).await.unwrap();
    assert_matches!(outcome, CheckOutcome::Completed);

    let results = pipeline.store.latest_results(1, 10).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].ping_status, ProbeStatus::Up);
    assert_eq!(results[0].ping_latency_ms, Some(12.5));
    assert_eq!(results[0].snmp_status, ProbeStatus::Unknown);
    assert!(results[0].metrics.is_empty());

    assert_eq!(pipeline.metrics.call_count(), 0);
    let alerts = pipeline
        .store
        .open_alerts(1, "Device device-a is down")
        .await
        .unwrap();
    assert!(alerts.is_empty());
}

#[tokio::test]
async fn test_unreachable_active_device_raises_critical_alert() {
    // Device B: all ping attempts fail, lifecycle active.
    let device = make_device(2, "device-b", "10.0.0.2");

    let pipeline = build_pipeline(
        vec![device],
        HashMap::from([(addr("10.0.0.2"), down())]),
        HashMap::new(),
    );

    pipeline.checker.check_device(2).await.unwrap();

    let results = pipeline.store.latest_results(2, 10).await.unwrap();
    assert_eq!(results[0].ping_status, ProbeStatus::Down);
    assert_eq!(results[0].ping_latency_ms, None);

    let alerts = pipeline
        .store
        .open_alerts(2, "Device device-b is down")
        .await
        .unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, Severity::Critical);
    assert_eq!(alerts[0].status, AlertStatus::New);
    assert_eq!(
        alerts[0].message,
        "Ping check failed for device-b (10.0.0.2)"
    );
}

#[tokio::test]
async fn test_snmp_liveness_failure_records_unreachable_without_alert() {
    // Device C: reachable but the SNMP liveness query errors.
    let device = make_device(3, "device-c", "10.0.0.3");

    let pipeline = build_pipeline(
        vec![device],
        HashMap::from([(addr("10.0.0.3"), up(3.0))]),
        HashMap::from([(
            addr("10.0.0.3"),
            MetricsReading::status_only(ProbeStatus::Unreachable),
        )]),
    );

    pipeline.checker.check_device(3).await.unwrap();

    let results = pipeline.store.latest_results(3, 10).await.unwrap();
    assert_eq!(results[0].snmp_status, ProbeStatus::Unreachable);
    assert!(results[0].metrics.is_empty());

    for title in [
        "High CPU usage on device-c",
        "High memory usage on device-c",
        "High disk usage on device-c",
    ] {
        assert!(pipeline.store.open_alerts(3, title).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_high_cpu_alerts_only_for_available_metric() {
    // Device D: CPU at 95%, memory and disk unavailable this cycle.
    let device = make_device(4, "device-d", "10.0.0.4");

    let pipeline = build_pipeline(
        vec![device],
        HashMap::from([(addr("10.0.0.4"), up(1.0))]),
        HashMap::from([(
            addr("10.0.0.4"),
            MetricsReading {
                status: ProbeStatus::Up,
                metrics: ResourceMetrics {
                    cpu_load: Some(95.0),
                    memory_used: None,
                    disk_used: None,
                },
            },
        )]),
    );

    pipeline.checker.check_device(4).await.unwrap();

    let cpu = pipeline
        .store
        .open_alerts(4, "High CPU usage on device-d")
        .await
        .unwrap();
    assert_eq!(cpu.len(), 1);
    assert_eq!(cpu[0].severity, Severity::Warning);
    assert_eq!(cpu[0].message, "CPU usage is at 95%");

    for title in ["High memory usage on device-d", "High disk usage on device-d"] {
        assert!(pipeline.store.open_alerts(4, title).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_ping_disabled_device_is_never_probed() {
    let mut device = make_device(5, "device-e", "10.0.0.5");
    device.ping_check_enabled = false;

    let pipeline = build_pipeline(
        vec![device],
        HashMap::from([(addr("10.0.0.5"), up(1.0))]),
        HashMap::new(),
    );

    pipeline.checker.check_device(5).await.unwrap();

    assert_eq!(pipeline.reachability.call_count(), 0);
    // SNMP is also skipped: reachability never resolved to up.
    assert_eq!(pipeline.metrics.call_count(), 0);

    let results = pipeline.store.latest_results(5, 10).await.unwrap();
    assert_eq!(results[0].ping_status, ProbeStatus::Unknown);
}

#[tokio::test]
async fn test_down_device_short_circuits_snmp() {
    let device = make_device(6, "device-f", "10.0.0.6");

    let pipeline = build_pipeline(
        vec![device],
        HashMap::from([(addr("10.0.0.6"), down())]),
        HashMap::from([(
            addr("10.0.0.6"),
            MetricsReading::status_only(ProbeStatus::Up),
        )]),
    );

    pipeline.checker.check_device(6).await.unwrap();

    assert_eq!(pipeline.reachability.call_count(), 1);
    assert_eq!(pipeline.metrics.call_count(), 0);

    let results = pipeline.store.latest_results(6, 10).await.unwrap();
    assert_eq!(results[0].snmp_status, ProbeStatus::Unknown);
}

#[tokio::test]
async fn test_vanished_device_has_no_side_effects() {
    let pipeline = build_pipeline(vec![], HashMap::new(), HashMap::new());

    let outcome = pipeline.checker.check_device(99).await.unwrap();

    assert_matches!(outcome, CheckOutcome::DeviceNotFound);
    assert_eq!(pipeline.reachability.call_count(), 0);
    assert!(pipeline.store.latest_results(99, 10).await.unwrap().is_empty());
}
