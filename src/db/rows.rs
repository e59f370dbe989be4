use std::str::FromStr;

use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use thiserror::Error;
use tracing::warn;

use crate::dates::DateError;

#[derive(Debug, Error)]
pub enum RowError {
    #[error("{0}")]
    Column(#[from] sqlx::Error),

    #[error("{0}")]
    Date(#[from] DateError),

    #[error("column {column}: {message}")]
    Value {
        column: &'static str,
        message: String,
    },
}

/// Maps every row it can and skips the rest, so one malformed row does not
/// fail a whole listing.
pub fn collect_rows<T, F>(entity: &'static str, rows: Vec<SqliteRow>, map: F) -> Vec<T>
where
    F: Fn(&SqliteRow) -> Result<T, RowError>,
{
    let total = rows.len();
    let items: Vec<T> = rows
        .iter()
        .filter_map(|row| match map(row) {
            Ok(item) => Some(item),
            Err(err) => {
                warn!(entity, error = %err, "skipping unreadable row");
                None
            }
        })
        .collect();

    if items.len() < total {
        warn!(entity, skipped = total - items.len(), total, "listing returned partial rows");
    }

    items
}

/// Reads a text column holding one of a fixed set of labels.
pub fn label<T>(row: &SqliteRow, column: &'static str) -> Result<T, RowError>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.try_get(column)?;
    raw.parse()
        .map_err(|message| RowError::Value { column, message })
}
