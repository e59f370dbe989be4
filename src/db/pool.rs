use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tokio::time::{sleep, timeout};
use tracing::{info, warn};

const PING_TIMEOUT: Duration = Duration::from_secs(5);
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime: Duration,
    pub idle_timeout: Duration,
    pub connect_attempts: u32,
    pub retry_delay: Duration,
}

impl PoolSettings {
    /// Defaults for everything except the URL; a single connect attempt.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 1,
            max_lifetime: Duration::from_secs(180),
            idle_timeout: Duration::from_secs(60),
            connect_attempts: 1,
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// Opens the pool, retrying connect and ping until the store answers or the
/// attempt budget runs out.
pub async fn connect(settings: &PoolSettings) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&settings.url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let attempts = settings.connect_attempts.max(1);
    let mut attempt = 1;

    loop {
        match try_connect(settings, options.clone()).await {
            Ok(pool) => {
                info!(
                    attempt,
                    max_connections = settings.max_connections,
                    "connected to database"
                );
                return Ok(pool);
            }
            Err(err) if attempt < attempts => {
                warn!(attempt, attempts, error = %err, "database connection attempt failed, retrying");
                sleep(settings.retry_delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

async fn try_connect(
    settings: &PoolSettings,
    options: SqliteConnectOptions,
) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections.min(settings.max_connections))
        .max_lifetime(Some(settings.max_lifetime))
        .idle_timeout(Some(settings.idle_timeout))
        .acquire_timeout(PING_TIMEOUT)
        .connect_with(options)
        .await?;

    ping(&pool).await?;
    Ok(pool)
}

pub async fn ping(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    timeout(PING_TIMEOUT, sqlx::query("SELECT 1").execute(pool))
        .await
        .map_err(|_| sqlx::Error::PoolTimedOut)??;
    Ok(())
}
