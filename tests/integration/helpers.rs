//! Helper functions for integration tests

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use fleetwatch::alerts::AlertEngine;
use fleetwatch::checker::DeviceChecker;
use fleetwatch::probes::{MetricsProbe, MetricsReading, ReachabilityProbe, ReachabilityReading};
use fleetwatch::registry::StaticRegistry;
use fleetwatch::storage::MemoryBackend;
use fleetwatch::{Device, DeviceStatus, ProbeStatus};

/// Reachability probe answering from a fixed per-address table and
/// counting invocations. Unlisted addresses read as `unknown`.
pub struct ScriptedReachability {
    readings: HashMap<IpAddr, ReachabilityReading>,
    pub calls: AtomicUsize,
}

impl ScriptedReachability {
    pub fn new(readings: HashMap<IpAddr, ReachabilityReading>) -> Self {
        Self {
            readings,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReachabilityProbe for ScriptedReachability {
    async fn probe(&self, address: IpAddr) -> ReachabilityReading {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.readings
            .get(&address)
            .copied()
            .unwrap_or(ReachabilityReading {
                status: ProbeStatus::Unknown,
                latency_ms: None,
            })
    }
}

/// Metrics probe answering from a fixed per-address table and counting
/// invocations. Unlisted addresses read as `unknown`.
pub struct ScriptedMetrics {
    readings: HashMap<IpAddr, MetricsReading>,
    pub calls: AtomicUsize,
}

impl ScriptedMetrics {
    pub fn new(readings: HashMap<IpAddr, MetricsReading>) -> Self {
        Self {
            readings,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricsProbe for ScriptedMetrics {
    async fn probe(&self, address: IpAddr, _community: &str, _port: u16) -> MetricsReading {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.readings
            .get(&address)
            .copied()
            .unwrap_or(MetricsReading::status_only(ProbeStatus::Unknown))
    }
}

pub fn make_device(id: i64, name: &str, address: &str) -> Device {
    Device {
        id,
        name: name.to_string(),
        address: address.parse().unwrap(),
        status: DeviceStatus::Active,
        monitoring_enabled: true,
        ping_check_enabled: true,
        snmp_check_enabled: true,
        snmp_community: "public".to_string(),
        snmp_port: 161,
    }
}

pub fn up(latency_ms: f64) -> ReachabilityReading {
    ReachabilityReading {
        status: ProbeStatus::Up,
        latency_ms: Some(latency_ms),
    }
}

pub fn down() -> ReachabilityReading {
    ReachabilityReading {
        status: ProbeStatus::Down,
        latency_ms: None,
    }
}

/// Fully wired pipeline over the in-memory backend and scripted probes.
pub struct Pipeline {
    pub store: Arc<MemoryBackend>,
    pub checker: DeviceChecker,
    pub reachability: Arc<ScriptedReachability>,
    pub metrics: Arc<ScriptedMetrics>,
}

pub fn build_pipeline(
    devices: Vec<Device>,
    reachability: HashMap<IpAddr, ReachabilityReading>,
    metrics: HashMap<IpAddr, MetricsReading>,
) -> Pipeline {
    let store = Arc::new(MemoryBackend::new());
    let reachability = Arc::new(ScriptedReachability::new(reachability));
    let metrics = Arc::new(ScriptedMetrics::new(metrics));

    let checker = DeviceChecker::new(
        Arc::new(StaticRegistry::new(devices)),
        store.clone(),
        Arc::new(AlertEngine::new(store.clone())),
        reachability.clone(),
        metrics.clone(),
    );

    Pipeline {
        store,
        checker,
        reachability,
        metrics,
    }
}
