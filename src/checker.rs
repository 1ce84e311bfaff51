//! Per-device check orchestration
//!
//! `DeviceChecker::check_device` runs one complete health check for one
//! device: reachability probe, conditional metrics probe, threshold
//! evaluation, and persistence of exactly one merged result.
//!
//! The metrics probe is skipped unless the reachability probe resolved
//! to `up` — no point spending SNMP round-trips on a host already known
//! unreachable.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::alerts::AlertEngine;
use crate::probes::{MetricsProbe, ReachabilityProbe};
use crate::registry::DeviceRegistry;
use crate::storage::StorageBackend;
use crate::{Device, DeviceId, DeviceStatus, MonitoringResult, ProbeStatus, Severity};

/// Utilization percentage above which a warning alert is raised.
pub const RESOURCE_ALERT_THRESHOLD: f64 = 90.0;

/// Strict greater-than: exactly 90% does not alert.
pub fn exceeds_threshold(value: f64) -> bool {
    value > RESOURCE_ALERT_THRESHOLD
}

/// Outcome of one check invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// A result was persisted (alerts raised as applicable).
    Completed,

    /// The device no longer exists; nothing was persisted or raised.
    DeviceNotFound,
}

#[derive(Clone)]
pub struct DeviceChecker {
    registry: Arc<dyn DeviceRegistry>,
    store: Arc<dyn StorageBackend>,
    alerts: Arc<AlertEngine>,
    reachability: Arc<dyn ReachabilityProbe>,
    metrics: Arc<dyn MetricsProbe>,
}

impl DeviceChecker {
    pub fn new(
        registry: Arc<dyn DeviceRegistry>,
        store: Arc<dyn StorageBackend>,
        alerts: Arc<AlertEngine>,
        reachability: Arc<dyn ReachabilityProbe>,
        metrics: Arc<dyn MetricsProbe>,
    ) -> Self {
        Self {
            registry,
            store,
            alerts,
            reachability,
            metrics,
        }
    }

    /// Run one check for one device and persist the merged result.
    ///
    /// Probe failures are folded into the result's status fields; only
    /// a persistence failure is an error, and it affects this device
    /// alone.
    #[instrument(skip(self))]
    pub async fn check_device(&self, device_id: DeviceId) -> Result<CheckOutcome> {
        let Some(device) = self.registry.get_device(device_id).await else {
            debug!("device not found, skipping check");
            return Ok(CheckOutcome::DeviceNotFound);
        };

        let mut result = MonitoringResult::new(device.id);

        if device.ping_check_enabled {
            let reading = self.reachability.probe(device.address).await;
            result.ping_status = reading.status;
            result.ping_latency_ms = reading.latency_ms;

            if reading.status == ProbeStatus::Down && device.status == DeviceStatus::Active {
                self.alerts
                    .raise_or_refresh(
                        &device,
                        format!("Device {} is down", device.name),
                        format!("Ping check failed for {} ({})", device.name, device.address),
                        Severity::Critical,
                    )
                    .await
                    .context("failed to raise device-down alert")?;
            }
        }

        if device.snmp_check_enabled && result.ping_status == ProbeStatus::Up {
            let reading = self
                .metrics
                .probe(device.address, &device.snmp_community, device.snmp_port)
                .await;
            result.snmp_status = reading.status;
            result.metrics = reading.metrics;

            self.evaluate_thresholds(&device, &result).await?;
        }

        self.store
            .insert_result(result)
            .await
            .context("failed to persist monitoring result")?;

        Ok(CheckOutcome::Completed)
    }

    /// Raise a warning per resource kind whose utilization exceeds the
    /// fixed threshold. Each kind is evaluated independently.
    async fn evaluate_thresholds(&self, device: &Device, result: &MonitoringResult) -> Result<()> {
        let conditions = [
            (
                result.metrics.cpu_load,
                format!("High CPU usage on {}", device.name),
                "CPU",
            ),
            (
                result.metrics.memory_used,
                format!("High memory usage on {}", device.name),
                "Memory",
            ),
            (
                result.metrics.disk_used,
                format!("High disk usage on {}", device.name),
                "Disk",
            ),
        ];

        for (value, title, kind) in conditions {
            let Some(value) = value else { continue };
            if !exceeds_threshold(value) {
                continue;
            }

            self.alerts
                .raise_or_refresh(
                    device,
                    title,
                    format!("{kind} usage is at {value}%"),
                    Severity::Warning,
                )
                .await
                .with_context(|| format!("failed to raise high-{kind} alert"))?;
        }

        Ok(())
    }
}
