pub mod alerts;
pub mod checker;
pub mod config;
pub mod probes;
pub mod registry;
pub mod scheduler;
pub mod storage;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier for a device in the registry.
pub type DeviceId = i64;

/// Outcome of a single protocol probe against a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    Up,
    Down,
    Unreachable,
    #[default]
    Unknown,
}

impl ProbeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeStatus::Up => "up",
            ProbeStatus::Down => "down",
            ProbeStatus::Unreachable => "unreachable",
            ProbeStatus::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> ProbeStatus {
        match s {
            "up" => ProbeStatus::Up,
            "down" => ProbeStatus::Down,
            "unreachable" => ProbeStatus::Unreachable,
            _ => ProbeStatus::Unknown,
        }
    }
}

impl std::fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a device. Only `Active` devices are eligible for
/// monitoring cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Active,
    Inactive,
    Maintenance,
    Decommissioned,
}

/// A monitored device as exposed by the registry.
///
/// This is a read-only view for the check pipeline; ownership of the
/// record (and its CRUD surface) lives outside this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub address: std::net::IpAddr,

    #[serde(default = "default_device_status")]
    pub status: DeviceStatus,

    #[serde(default = "default_true")]
    pub monitoring_enabled: bool,
    #[serde(default = "default_true")]
    pub ping_check_enabled: bool,
    #[serde(default = "default_true")]
    pub snmp_check_enabled: bool,

    #[serde(default = "default_snmp_community")]
    pub snmp_community: String,
    #[serde(default = "default_snmp_port")]
    pub snmp_port: u16,
}

fn default_device_status() -> DeviceStatus {
    DeviceStatus::Active
}

fn default_true() -> bool {
    true
}

fn default_snmp_community() -> String {
    String::from("public")
}

fn default_snmp_port() -> u16 {
    161
}

/// Resource utilization percentages extracted by the metrics probe.
///
/// Each field is independently optional: any SNMP sub-query may fail
/// without affecting the others.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceMetrics {
    pub cpu_load: Option<f64>,
    pub memory_used: Option<f64>,
    pub disk_used: Option<f64>,
}

impl ResourceMetrics {
    pub fn is_empty(&self) -> bool {
        self.cpu_load.is_none() && self.memory_used.is_none() && self.disk_used.is_none()
    }
}

/// One record per check execution. Immutable once created; the store
/// keeps these as an append-only time series per device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringResult {
    pub device_id: DeviceId,
    pub check_time: DateTime<Utc>,

    pub ping_status: ProbeStatus,
    /// Round-trip latency in milliseconds, present only when the
    /// reachability probe succeeded.
    pub ping_latency_ms: Option<f64>,

    pub snmp_status: ProbeStatus,
    pub metrics: ResourceMetrics,
}

impl MonitoringResult {
    /// A fresh result with both sub-checks defaulted to `unknown`.
    pub fn new(device_id: DeviceId) -> Self {
        Self {
            device_id,
            check_time: Utc::now(),
            ping_status: ProbeStatus::Unknown,
            ping_latency_ms: None,
            snmp_status: ProbeStatus::Unknown,
            metrics: ResourceMetrics::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Severity {
        match s {
            "info" => Severity::Info,
            "critical" => Severity::Critical,
            _ => Severity::Warning,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    New,
    Acknowledged,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::New => "new",
            AlertStatus::Acknowledged => "acknowledged",
            AlertStatus::Resolved => "resolved",
        }
    }

    pub fn parse(s: &str) -> AlertStatus {
        match s {
            "acknowledged" => AlertStatus::Acknowledged,
            "resolved" => AlertStatus::Resolved,
            _ => AlertStatus::New,
        }
    }

    /// Open alerts participate in deduplication; resolved ones do not.
    pub fn is_open(&self) -> bool {
        matches!(self, AlertStatus::New | AlertStatus::Acknowledged)
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An ongoing or past anomalous condition for one device.
///
/// The check pipeline only ever creates alerts or refreshes open ones;
/// acknowledgement and resolution are operator actions outside this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub device_id: DeviceId,
    /// Dedup key together with `device_id`.
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Payload for creating an alert; the backend assigns id, status `new`
/// and `created_at`.
#[derive(Debug, Clone)]
pub struct NewAlert {
    pub device_id: DeviceId,
    pub title: String,
    pub message: String,
    pub severity: Severity,
}
