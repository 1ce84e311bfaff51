//! FleetSchedulerActor - dispatches one check per eligible device
//!
//! The actor runs an interval ticker and, on each tick, fans out one
//! `check_device` task per eligible device. Dispatches are independent:
//! a failing or slow device cannot block or fail the others.
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → list eligible devices → spawn check per device → join all
//!     ↑
//!     └─── Commands (RunNow, UpdateInterval, Shutdown)
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tokio::time::interval;
use tracing::{debug, error, info, instrument, warn};

use crate::checker::{CheckOutcome, DeviceChecker};
use crate::registry::DeviceRegistry;

/// Commands that can be sent to the FleetSchedulerActor
#[derive(Debug)]
pub enum SchedulerCommand {
    /// Trigger an immediate fleet cycle (bypassing the interval timer)
    ///
    /// Responds with the number of devices dispatched.
    RunNow {
        respond_to: oneshot::Sender<usize>,
    },

    /// Update the cycle interval
    ///
    /// The new interval takes effect after the current cycle completes.
    UpdateInterval {
        /// New interval in seconds
        interval_secs: u64,
    },

    /// Gracefully shut down the scheduler
    ///
    /// An in-flight cycle finishes its device checks before the actor
    /// exits.
    Shutdown,
}

/// Actor driving the recurring fleet cycle
pub struct FleetSchedulerActor {
    registry: std::sync::Arc<dyn DeviceRegistry>,
    checker: DeviceChecker,
    command_rx: mpsc::Receiver<SchedulerCommand>,
    interval_duration: Duration,
}

impl FleetSchedulerActor {
    pub fn new(
        registry: std::sync::Arc<dyn DeviceRegistry>,
        checker: DeviceChecker,
        command_rx: mpsc::Receiver<SchedulerCommand>,
        interval_duration: Duration,
    ) -> Self {
        Self {
            registry,
            checker,
            command_rx,
            interval_duration,
        }
    }

    /// Run the actor's main loop
    ///
    /// Runs until a Shutdown command is received or the command channel
    /// is closed.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting fleet scheduler actor");

        let mut ticker = interval(self.interval_duration);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        SchedulerCommand::RunNow { respond_to } => {
                            debug!("received RunNow command");
                            let count = self.run_cycle().await;
                            let _ = respond_to.send(count);
                        }

                        SchedulerCommand::UpdateInterval { interval_secs } => {
                            debug!("updating interval to {interval_secs}s");
                            self.interval_duration = Duration::from_secs(interval_secs);
                            ticker = interval(self.interval_duration);
                        }

                        SchedulerCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                else => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }

        debug!("fleet scheduler actor stopped");
    }

    /// Run one fleet cycle: one independent check task per eligible
    /// device. Returns the number of devices dispatched.
    ///
    /// Errors in individual checks are logged and never abort the
    /// cycle; all tasks are awaited so a cycle's results are complete
    /// before the next tick.
    #[instrument(skip(self))]
    async fn run_cycle(&self) -> usize {
        let devices = self.registry.list_eligible_devices().await;
        let count = devices.len();

        let mut checks = JoinSet::new();
        for device in devices {
            let checker = self.checker.clone();
            let device_id = device.id;
            let device_name = device.name;

            checks.spawn(async move {
                match checker.check_device(device_id).await {
                    Ok(CheckOutcome::Completed) => {
                        debug!("check complete for {device_name}");
                    }
                    Ok(CheckOutcome::DeviceNotFound) => {
                        warn!("device {device_name} ({device_id}) vanished before its check");
                    }
                    Err(e) => {
                        error!("check for {device_name} ({device_id}) failed: {e:#}");
                    }
                }
            });
        }

        while checks.join_next().await.is_some() {}

        info!("scheduled monitoring for {count} devices");
        count
    }
}

/// Handle for controlling a FleetSchedulerActor
///
/// Can be cloned and shared across tasks.
#[derive(Clone)]
pub struct SchedulerHandle {
    sender: mpsc::Sender<SchedulerCommand>,
}

impl SchedulerHandle {
    /// Spawn a new scheduler actor and return its handle.
    pub fn spawn(
        registry: std::sync::Arc<dyn DeviceRegistry>,
        checker: DeviceChecker,
        interval_duration: Duration,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = FleetSchedulerActor::new(registry, checker, cmd_rx, interval_duration);
        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Trigger an immediate fleet cycle and return the number of
    /// devices dispatched.
    pub async fn run_now(&self) -> Result<usize> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SchedulerCommand::RunNow { respond_to: tx })
            .await
            .context("failed to send RunNow command")?;

        rx.await.context("failed to receive cycle count")
    }

    /// Update the cycle interval
    pub async fn update_interval(&self, interval_secs: u64) -> Result<()> {
        self.sender
            .send(SchedulerCommand::UpdateInterval { interval_secs })
            .await
            .context("failed to send UpdateInterval command")?;
        Ok(())
    }

    /// Gracefully shut down the scheduler
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(SchedulerCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}
