//! SQLite storage backend implementation
//!
//! Embedded single-file database, WAL mode for concurrent reads during
//! writes, schema versioning via sqlx migrations. Suitable for a single
//! worker watching up to a few hundred devices.
//!
//! Timestamps are stored as Unix milliseconds; status and severity
//! enums are stored as their string form.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info, instrument, warn};

use super::backend::{HealthStatus, StorageBackend};
use super::error::{StorageError, StorageResult};
use crate::{
    Alert, AlertStatus, DeviceId, MonitoringResult, NewAlert, ProbeStatus, ResourceMetrics,
    Severity,
};

/// SQLite storage backend
pub struct SqliteBackend {
    pool: Pool<Sqlite>,
    db_path: String,
}

impl SqliteBackend {
    /// Create the database file if missing, run migrations and open a
    /// connection pool.
    #[instrument(skip_all)]
    pub async fn new(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let db_path_str = db_path.as_ref().to_string_lossy().to_string();

        info!("initializing SQLite backend at: {}", db_path_str);

        let options = SqliteConnectOptions::new()
            .filename(&db_path_str)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        debug!("running database migrations");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))?;

        info!("database migrations complete");

        Ok(Self {
            pool,
            db_path: db_path_str,
        })
    }

    fn timestamp_to_millis(dt: &DateTime<Utc>) -> i64 {
        dt.timestamp_millis()
    }

    fn millis_to_timestamp(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
    }

    fn alert_from_row(row: &sqlx::sqlite::SqliteRow) -> Alert {
        let severity: String = row.get("severity");
        let status: String = row.get("status");

        Alert {
            id: row.get("id"),
            device_id: row.get("device_id"),
            title: row.get("title"),
            message: row.get("message"),
            severity: Severity::parse(&severity),
            status: AlertStatus::parse(&status),
            created_at: Self::millis_to_timestamp(row.get("created_at")),
            acknowledged_at: row
                .get::<Option<i64>, _>("acknowledged_at")
                .map(Self::millis_to_timestamp),
            resolved_at: row
                .get::<Option<i64>, _>("resolved_at")
                .map(Self::millis_to_timestamp),
        }
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    #[instrument(skip(self, result), fields(device_id = result.device_id))]
    async fn insert_result(&self, result: MonitoringResult) -> StorageResult<()> {
        let check_time = Self::timestamp_to_millis(&result.check_time);

        // A result is immutable once created; a duplicate (device,
        // check_time) insert is dropped rather than overwritten.
        sqlx::query(
            r#"
            INSERT INTO monitoring_results (
                device_id, check_time, ping_status, ping_latency_ms,
                snmp_status, cpu_load, memory_used, disk_used
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (device_id, check_time) DO NOTHING
            "#,
        )
        .bind(result.device_id)
        .bind(check_time)
        .bind(result.ping_status.as_str())
        .bind(result.ping_latency_ms)
        .bind(result.snmp_status.as_str())
        .bind(result.metrics.cpu_load)
        .bind(result.metrics.memory_used)
        .bind(result.metrics.disk_used)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        debug!("monitoring result persisted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn latest_results(
        &self,
        device_id: DeviceId,
        limit: usize,
    ) -> StorageResult<Vec<MonitoringResult>> {
        let rows = sqlx::query(
            r#"
            SELECT device_id, check_time, ping_status, ping_latency_ms,
                   snmp_status, cpu_load, memory_used, disk_used
            FROM monitoring_results
            WHERE device_id = ?
            ORDER BY check_time DESC
            LIMIT ?
            "#,
        )
        .bind(device_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        let results = rows
            .into_iter()
            .map(|row| {
                let ping_status: String = row.get("ping_status");
                let snmp_status: String = row.get("snmp_status");

                MonitoringResult {
                    device_id: row.get("device_id"),
                    check_time: Self::millis_to_timestamp(row.get("check_time")),
                    ping_status: ProbeStatus::parse(&ping_status),
                    ping_latency_ms: row.get("ping_latency_ms"),
                    snmp_status: ProbeStatus::parse(&snmp_status),
                    metrics: ResourceMetrics {
                        cpu_load: row.get("cpu_load"),
                        memory_used: row.get("memory_used"),
                        disk_used: row.get("disk_used"),
                    },
                }
            })
            .collect();

        Ok(results)
    }

    #[instrument(skip(self))]
    async fn open_alerts(&self, device_id: DeviceId, title: &str) -> StorageResult<Vec<Alert>> {
        let rows = sqlx::query(
            r#"
            SELECT id, device_id, title, message, severity, status,
                   created_at, acknowledged_at, resolved_at
            FROM alerts
            WHERE device_id = ? AND title = ? AND status IN ('new', 'acknowledged')
            ORDER BY created_at DESC
            "#,
        )
        .bind(device_id)
        .bind(title)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        Ok(rows.iter().map(Self::alert_from_row).collect())
    }

    #[instrument(skip(self, alert), fields(device_id = alert.device_id, title = %alert.title))]
    async fn create_alert(&self, alert: NewAlert) -> StorageResult<Alert> {
        let created_at = Utc::now();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO alerts (device_id, title, message, severity, status, created_at)
            VALUES (?, ?, ?, ?, 'new', ?)
            "#,
        )
        .bind(alert.device_id)
        .bind(&alert.title)
        .bind(&alert.message)
        .bind(alert.severity.as_str())
        .bind(Self::timestamp_to_millis(&created_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        Ok(Alert {
            id: result.last_insert_rowid(),
            device_id: alert.device_id,
            title: alert.title,
            message: alert.message,
            severity: alert.severity,
            status: AlertStatus::New,
            created_at,
            acknowledged_at: None,
            resolved_at: None,
        })
    }

    #[instrument(skip(self, alert), fields(alert_id = alert.id))]
    async fn update_alert(&self, alert: &Alert) -> StorageResult<()> {
        sqlx::query(
            r#"
            UPDATE alerts
            SET message = ?, severity = ?, status = ?,
                created_at = ?, acknowledged_at = ?, resolved_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&alert.message)
        .bind(alert.severity.as_str())
        .bind(alert.status.as_str())
        .bind(Self::timestamp_to_millis(&alert.created_at))
        .bind(alert.acknowledged_at.as_ref().map(Self::timestamp_to_millis))
        .bind(alert.resolved_at.as_ref().map(Self::timestamp_to_millis))
        .bind(alert.id)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> StorageResult<HealthStatus> {
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => {
                let mut metadata = HashMap::new();
                metadata.insert("backend".to_string(), "sqlite".to_string());
                metadata.insert("db_path".to_string(), self.db_path.clone());

                Ok(HealthStatus {
                    healthy: true,
                    message: "SQLite backend operational".to_string(),
                    metadata,
                })
            }
            Err(e) => {
                warn!("health check failed: {}", e);
                Ok(HealthStatus {
                    healthy: false,
                    message: format!("health check failed: {}", e),
                    metadata: HashMap::new(),
                })
            }
        }
    }

    async fn close(&self) -> StorageResult<()> {
        info!("closing SQLite backend");
        self.pool.close().await;
        Ok(())
    }
}
