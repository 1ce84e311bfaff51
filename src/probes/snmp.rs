//! Metrics prober speaking SNMP v2c
//!
//! The probe sequence follows the classic UCD-SNMP layout: a liveness
//! GET on sysDescr, then three independent sub-queries for CPU load,
//! memory and disk. Each sub-query returns a typed result; a failed one
//! simply leaves its metric unset instead of aborting the rest.
//!
//! ## Error taxonomy
//!
//! - liveness GET fails at the protocol level (timeout, error status) →
//!   `Unreachable`, empty metrics, no further queries
//! - the query mechanism itself errors (socket bind, malformed OID) →
//!   `Unknown`, empty metrics
//! - a sub-query fails → that metric is omitted, status stays `Up`

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use csnmp::{ObjectIdentifier, ObjectValue, Snmp2cClient};
use tracing::{debug, instrument};

use super::{MetricsProbe, MetricsReading};
use crate::{ProbeStatus, ResourceMetrics};

/// SNMPv2-MIB sysDescr.0 - liveness query target.
pub const OID_SYS_DESCR: &str = "1.3.6.1.2.1.1.1.0";
/// UCD-SNMP-MIB laLoad.1 - 1-minute load average.
pub const OID_LA_LOAD_1: &str = "1.3.6.1.4.1.2021.10.1.3.1";
/// UCD-SNMP-MIB memTotalReal.0.
pub const OID_MEM_TOTAL_REAL: &str = "1.3.6.1.4.1.2021.4.5.0";
/// UCD-SNMP-MIB memAvailReal.0.
pub const OID_MEM_AVAIL_REAL: &str = "1.3.6.1.4.1.2021.4.6.0";
/// UCD-SNMP-MIB dskPercent.1.
pub const OID_DSK_PERCENT_1: &str = "1.3.6.1.4.1.2021.9.1.9.1";

/// Target of one SNMP query sequence.
#[derive(Debug, Clone)]
pub struct SnmpTarget {
    pub address: IpAddr,
    pub community: String,
    pub port: u16,
}

/// A value returned by an SNMP GET, reduced to what the metric
/// extraction needs.
#[derive(Debug, Clone, PartialEq)]
pub enum SnmpValue {
    Integer(i64),
    Unsigned(u64),
    /// DisplayString payloads; UCD laLoad reports the load average this way.
    Text(String),
    Other,
}

impl SnmpValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SnmpValue::Integer(i) => Some(*i as f64),
            SnmpValue::Unsigned(u) => Some(*u as f64),
            SnmpValue::Text(s) => s.trim().parse().ok(),
            SnmpValue::Other => None,
        }
    }
}

/// Errors from one SNMP GET.
#[derive(Debug)]
pub enum SnmpError {
    /// The query mechanism failed before anything went on the wire
    /// (socket setup, malformed OID). Maps to status `Unknown`.
    Mechanism(String),

    /// The protocol exchange failed (timeout, error status in the
    /// response). Maps to status `Unreachable` on the liveness query.
    Protocol(String),
}

impl std::fmt::Display for SnmpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnmpError::Mechanism(msg) => write!(f, "snmp query mechanism failed: {}", msg),
            SnmpError::Protocol(msg) => write!(f, "snmp exchange failed: {}", msg),
        }
    }
}

impl std::error::Error for SnmpError {}

/// Wire seam for the prober; tests substitute a scripted transport.
#[async_trait]
pub trait SnmpTransport: Send + Sync {
    async fn get(&self, target: &SnmpTarget, oid: &str) -> Result<SnmpValue, SnmpError>;
}

/// Production transport: one community-string (v2c) GET per call.
///
/// A fresh client per query keeps the transport stateless; the per-query
/// timeout is mandatory so a silent agent cannot stall a cycle slot.
pub struct CommunityTransport {
    timeout: Duration,
}

impl CommunityTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for CommunityTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

#[async_trait]
impl SnmpTransport for CommunityTransport {
    async fn get(&self, target: &SnmpTarget, oid: &str) -> Result<SnmpValue, SnmpError> {
        let oid: ObjectIdentifier = oid
            .parse()
            .map_err(|_| SnmpError::Mechanism(format!("invalid OID {oid}")))?;

        let socket = SocketAddr::new(target.address, target.port);
        let client = Snmp2cClient::new(
            socket,
            target.community.as_bytes().to_vec(),
            None,
            Some(self.timeout),
        )
        .await
        .map_err(|e| SnmpError::Mechanism(e.to_string()))?;

        let value = client
            .get(oid)
            .await
            .map_err(|e| SnmpError::Protocol(e.to_string()))?;

        Ok(match value {
            ObjectValue::Integer(i) => SnmpValue::Integer(i64::from(i)),
            ObjectValue::Counter32(v) | ObjectValue::Unsigned32(v) | ObjectValue::TimeTicks(v) => {
                SnmpValue::Unsigned(u64::from(v))
            }
            ObjectValue::Counter64(v) => SnmpValue::Unsigned(v),
            ObjectValue::String(bytes) => {
                SnmpValue::Text(String::from_utf8_lossy(&bytes).into_owned())
            }
            _ => SnmpValue::Other,
        })
    }
}

/// Metrics prober running the liveness + sub-query sequence.
pub struct SnmpProber {
    transport: Arc<dyn SnmpTransport>,
}

impl SnmpProber {
    pub fn new(timeout: Duration) -> Self {
        Self::with_transport(Arc::new(CommunityTransport::new(timeout)))
    }

    pub fn with_transport(transport: Arc<dyn SnmpTransport>) -> Self {
        Self { transport }
    }

    async fn fetch_f64(&self, target: &SnmpTarget, oid: &str, what: &str) -> Option<f64> {
        match self.transport.get(target, oid).await {
            Ok(value) => {
                let parsed = value.as_f64();
                if parsed.is_none() {
                    debug!("{what} query returned non-numeric value: {value:?}");
                }
                parsed
            }
            Err(e) => {
                debug!("{what} query failed: {e}");
                None
            }
        }
    }
}

#[async_trait]
impl MetricsProbe for SnmpProber {
    #[instrument(skip(self, community))]
    async fn probe(&self, address: IpAddr, community: &str, port: u16) -> MetricsReading {
        let target = SnmpTarget {
            address,
            community: community.to_string(),
            port,
        };

        // Liveness first; anything but a clean answer ends the sequence.
        if let Err(e) = self.transport.get(&target, OID_SYS_DESCR).await {
            debug!("snmp liveness query failed: {e}");
            let status = match e {
                SnmpError::Protocol(_) => ProbeStatus::Unreachable,
                SnmpError::Mechanism(_) => ProbeStatus::Unknown,
            };
            return MetricsReading::status_only(status);
        }

        let mut metrics = ResourceMetrics::default();

        // laLoad is a load average; scaled to a percentage.
        if let Some(load) = self.fetch_f64(&target, OID_LA_LOAD_1, "cpu load").await {
            metrics.cpu_load = Some(load * 100.0);
        }

        let total = self
            .fetch_f64(&target, OID_MEM_TOTAL_REAL, "memory total")
            .await;
        let available = self
            .fetch_f64(&target, OID_MEM_AVAIL_REAL, "memory available")
            .await;
        if let (Some(total), Some(available)) = (total, available) {
            if total > 0.0 {
                metrics.memory_used = Some((total - available) / total * 100.0);
            }
        }

        metrics.disk_used = self.fetch_f64(&target, OID_DSK_PERCENT_1, "disk usage").await;

        MetricsReading {
            status: ProbeStatus::Up,
            metrics,
        }
    }
}
