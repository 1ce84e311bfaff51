//! Reachability prober backed by the system `ping` binary
//!
//! Availability is decided by a multi-attempt ping; latency is a
//! deliberate second, single-attempt pass timed on the wall clock rather
//! than a value reused from the availability run.
//!
//! ## Error taxonomy
//!
//! - all attempts fail (non-zero exit) → `Down`, no latency
//! - the probing mechanism itself errors (missing binary, spawn
//!   failure) → `Unknown`, no latency
//!
//! Neither case is propagated to the caller; a stalled ping process is
//! bounded by an overall timeout and counted as `Down`.

use std::net::IpAddr;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use super::{ReachabilityProbe, ReachabilityReading};
use crate::ProbeStatus;

const DEFAULT_PING_BINARY: &str = "ping";

pub struct PingProber {
    binary: String,
    count: u32,
    attempt_timeout: Duration,
}

impl PingProber {
    pub fn new(count: u32, attempt_timeout: Duration) -> Self {
        Self::with_binary(DEFAULT_PING_BINARY, count, attempt_timeout)
    }

    /// Some distributions ship ping under a different path (busybox,
    /// `/usr/sbin/ping`); tests also use this to substitute the binary.
    pub fn with_binary(binary: impl Into<String>, count: u32, attempt_timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            count: count.max(1),
            attempt_timeout,
        }
    }

    /// Per-attempt timeout in whole seconds, as `ping -W` expects.
    fn attempt_timeout_secs(&self) -> u64 {
        self.attempt_timeout.as_secs().max(1)
    }

    /// Upper bound on one ping invocation. `-W` already bounds each
    /// attempt; this catches a wedged process.
    fn overall_timeout(&self, attempts: u32) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs() * u64::from(attempts) + 2)
    }

    fn command(&self, attempts: u32, address: IpAddr) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-c")
            .arg(attempts.to_string())
            .arg("-W")
            .arg(self.attempt_timeout_secs().to_string())
            .arg(address.to_string())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    /// Multi-attempt availability pass. `Ok(true)` if any attempt got a
    /// reply (exit status 0).
    async fn availability(&self, address: IpAddr) -> std::io::Result<bool> {
        let mut cmd = self.command(self.count, address);

        match timeout(self.overall_timeout(self.count), cmd.status()).await {
            Ok(status) => Ok(status?.success()),
            Err(_) => {
                debug!("ping to {address} exceeded overall timeout");
                Ok(false)
            }
        }
    }

    /// Single-attempt timed pass. Reports elapsed wall time regardless
    /// of the attempt's exit status; only a spawn failure is an error.
    async fn measure_latency(&self, address: IpAddr) -> std::io::Result<f64> {
        let mut cmd = self.command(1, address);

        let start = Instant::now();
        if let Ok(status) = timeout(self.overall_timeout(1), cmd.status()).await {
            status?;
        }
        Ok(start.elapsed().as_secs_f64() * 1000.0)
    }
}

#[async_trait]
impl ReachabilityProbe for PingProber {
    #[instrument(skip(self))]
    async fn probe(&self, address: IpAddr) -> ReachabilityReading {
        match self.availability(address).await {
            Ok(true) => {
                let latency_ms = match self.measure_latency(address).await {
                    Ok(ms) => Some(ms),
                    Err(e) => {
                        warn!("latency measurement for {address} failed: {e}");
                        None
                    }
                };
                ReachabilityReading {
                    status: ProbeStatus::Up,
                    latency_ms,
                }
            }
            Ok(false) => ReachabilityReading {
                status: ProbeStatus::Down,
                latency_ms: None,
            },
            Err(e) => {
                warn!("reachability probe for {address} failed: {e}");
                ReachabilityReading {
                    status: ProbeStatus::Unknown,
                    latency_ms: None,
                }
            }
        }
    }
}
