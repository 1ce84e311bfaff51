//! Probe seams for the check pipeline
//!
//! The orchestrator talks to both probes through traits so that checks
//! can be exercised without network access. Production implementations
//! live in [`ping`] and [`snmp`].
//!
//! Probe failures never escape these traits: every failure mode is
//! folded into a [`ProbeStatus`] on the returned reading (see the error
//! taxonomy notes on each implementation).

pub mod ping;
pub mod snmp;

use std::net::IpAddr;

use async_trait::async_trait;

use crate::{ProbeStatus, ResourceMetrics};

/// Result of one reachability probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReachabilityReading {
    pub status: ProbeStatus,
    /// Round-trip latency in milliseconds; only set when `status` is `Up`.
    pub latency_ms: Option<f64>,
}

/// Result of one metrics probe.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricsReading {
    pub status: ProbeStatus,
    pub metrics: ResourceMetrics,
}

impl MetricsReading {
    pub fn status_only(status: ProbeStatus) -> Self {
        Self {
            status,
            metrics: ResourceMetrics::default(),
        }
    }
}

/// ICMP-style liveness and latency measurement for one address.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn probe(&self, address: IpAddr) -> ReachabilityReading;
}

/// SNMP-style resource query sequence against one address.
#[async_trait]
pub trait MetricsProbe: Send + Sync {
    async fn probe(&self, address: IpAddr, community: &str, port: u16) -> MetricsReading;
}
