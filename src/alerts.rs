//! Alert creation with deduplication
//!
//! Repeated check cycles would otherwise raise the same condition every
//! interval. `AlertEngine::raise_or_refresh` is the single entry point:
//! a condition either creates a new alert, refreshes a stale open one,
//! or is suppressed inside the dedup window.
//!
//! The query-then-write against the alert store runs under a lock keyed
//! by (device, title), so concurrent cycles can never create two open
//! alerts for the same condition.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::storage::{StorageBackend, StorageResult};
use crate::{Device, DeviceId, NewAlert, Severity};

/// Window within which a repeated condition is suppressed instead of
/// refreshed.
pub const DEDUP_WINDOW_SECS: i64 = 3600;

type DedupKey = (DeviceId, String);

pub struct AlertEngine {
    store: Arc<dyn StorageBackend>,

    /// Per-key locks serializing the query-then-write. The map grows
    /// with the number of distinct (device, title) conditions, which is
    /// bounded by the fleet size times the handful of alert titles.
    locks: std::sync::Mutex<HashMap<DedupKey, Arc<Mutex<()>>>>,
}

impl AlertEngine {
    pub fn new(store: Arc<dyn StorageBackend>) -> Self {
        Self {
            store,
            locks: std::sync::Mutex::new(HashMap::new()),
        }
    }

    fn key_lock(&self, key: DedupKey) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("alert lock map poisoned");
        locks.entry(key).or_default().clone()
    }

    /// Raise a condition for a device.
    ///
    /// - no open alert for (device, title): create one, status `new`
    /// - open alert older than the dedup window: refresh it in place,
    ///   updating `created_at` and `message` only (severity and status
    ///   are deliberately left as they are)
    /// - open alert within the window: suppressed
    #[instrument(skip(self, device, message), fields(device = %device.name, title = %title))]
    pub async fn raise_or_refresh(
        &self,
        device: &Device,
        title: String,
        message: String,
        severity: Severity,
    ) -> StorageResult<()> {
        let lock = self.key_lock((device.id, title.clone()));
        let _guard = lock.lock().await;

        let existing = self.store.open_alerts(device.id, &title).await?;

        let Some(latest) = existing.first() else {
            self.store
                .create_alert(NewAlert {
                    device_id: device.id,
                    title,
                    message,
                    severity,
                })
                .await?;
            info!("alert created");
            return Ok(());
        };

        let elapsed = Utc::now() - latest.created_at;
        if elapsed.num_seconds() > DEDUP_WINDOW_SECS {
            let mut refreshed = latest.clone();
            refreshed.created_at = Utc::now();
            refreshed.message = message;
            self.store.update_alert(&refreshed).await?;
            info!(alert_id = refreshed.id, "stale alert refreshed");
        } else {
            debug!(alert_id = latest.id, "alert suppressed inside dedup window");
        }

        Ok(())
    }
}
