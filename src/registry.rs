//! Read-only view over device configuration
//!
//! The registry is an external collaborator from the check pipeline's
//! perspective: the pipeline only reads devices, never writes them.
//! `StaticRegistry` serves a fixed inventory (loaded from the config
//! file); deployments with a real device database implement
//! `DeviceRegistry` against it.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::{Device, DeviceId, DeviceStatus};

/// Contract consumed by the scheduler and the orchestrator.
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Devices with monitoring enabled and lifecycle status `active`.
    /// Ordering is not significant.
    async fn list_eligible_devices(&self) -> Vec<Device>;

    /// Look up a single device. `None` if it no longer exists.
    async fn get_device(&self, id: DeviceId) -> Option<Device>;
}

/// Registry over a fixed in-memory inventory.
pub struct StaticRegistry {
    devices: HashMap<DeviceId, Device>,
}

impl StaticRegistry {
    pub fn new(devices: Vec<Device>) -> Self {
        Self {
            devices: devices.into_iter().map(|d| (d.id, d)).collect(),
        }
    }
}

#[async_trait]
impl DeviceRegistry for StaticRegistry {
    async fn list_eligible_devices(&self) -> Vec<Device> {
        self.devices
            .values()
            .filter(|d| d.monitoring_enabled && d.status == DeviceStatus::Active)
            .cloned()
            .collect()
    }

    async fn get_device(&self, id: DeviceId) -> Option<Device> {
        self.devices.get(&id).cloned()
    }
}
