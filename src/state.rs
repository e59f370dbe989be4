use std::future::Future;
use std::time::Duration;

use sqlx::SqlitePool;

use crate::dates::LocalCalendar;
use crate::engine::locks::TruckLocks;
use crate::error::AppError;
use crate::observability::metrics::Metrics;

pub struct AppState {
    pub pool: SqlitePool,
    pub calendar: LocalCalendar,
    pub truck_locks: TruckLocks,
    pub metrics: Metrics,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(pool: SqlitePool, calendar: LocalCalendar, request_timeout: Duration) -> Self {
        Self {
            pool,
            calendar,
            truck_locks: TruckLocks::new(),
            metrics: Metrics::new(),
            request_timeout,
        }
    }

    /// Runs `work` under the request deadline. On expiry the future is
    /// dropped, which aborts the in-flight statement and rolls back any open
    /// transaction.
    pub async fn within_deadline<T, F>(&self, work: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        match tokio::time::timeout(self.request_timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                self.metrics.request_timeouts_total.inc();
                tracing::warn!(
                    timeout_ms = self.request_timeout.as_millis() as u64,
                    "request deadline exceeded"
                );
                Err(AppError::Timeout(self.request_timeout))
            }
        }
    }
}
