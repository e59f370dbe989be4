use std::env;
use std::time::Duration;

use chrono_tz::Tz;

use crate::db::pool::PoolSettings;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database: PoolSettings,
    pub request_timeout: Duration,
    pub timezone: Tz,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") | Err(_) => LogFormat::Compact,
            Ok(other) => {
                return Err(AppError::Internal(format!(
                    "invalid LOG_FORMAT: {other} (expected compact or json)"
                )));
            }
        };

        let database = PoolSettings {
            url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://fleet_safety.db".to_string()),
            max_connections: parse_or_default("DB_MAX_CONNECTIONS", 10)?,
            min_connections: parse_or_default("DB_MIN_CONNECTIONS", 1)?,
            max_lifetime: Duration::from_secs(parse_or_default("DB_MAX_LIFETIME_SECS", 180)?),
            idle_timeout: Duration::from_secs(parse_or_default("DB_IDLE_TIMEOUT_SECS", 60)?),
            connect_attempts: parse_or_default("DB_CONNECT_ATTEMPTS", 20)?,
            retry_delay: Duration::from_millis(parse_or_default(
                "DB_CONNECT_RETRY_DELAY_MS",
                2000,
            )?),
        };

        if database.max_connections == 0 {
            return Err(AppError::Internal(
                "invalid DB_MAX_CONNECTIONS: must be > 0".to_string(),
            ));
        }

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 8080)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format,
            database,
            request_timeout: Duration::from_secs(parse_or_default("REQUEST_TIMEOUT_SECS", 5)?),
            timezone: parse_or_default("TIMEZONE", chrono_tz::America::Winnipeg)?,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|err| AppError::Internal(format!("invalid {key}: {err}")))
}
