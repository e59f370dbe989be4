use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor};

use crate::dates::{LocalCalendar, stamp_for_storage};
use crate::db::rows::{RowError, collect_rows, label};
use crate::error::AppError;
use crate::models::truck_history::{NewHistoryEntry, TruckHistoryEvent};

fn entry_from_row(row: &SqliteRow, calendar: &LocalCalendar) -> Result<TruckHistoryEvent, RowError> {
    let date: String = row.try_get("date")?;

    Ok(TruckHistoryEvent {
        truck_history_id: row.try_get("truck_history_id")?,
        truck_id: row.try_get("truck_id")?,
        driver_id: row.try_get("driver_id")?,
        date: calendar.timestamp_from_stored(&date)?,
        kind: label(row, "type")?,
        notes: row.try_get("notes")?,
    })
}

/// A truck's audit trail, newest first.
pub async fn list_for_truck<'e, E>(
    executor: E,
    truck_id: i64,
    calendar: &LocalCalendar,
) -> Result<Vec<TruckHistoryEvent>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query(
        "SELECT truck_history_id, truck_id, driver_id, date, type, notes FROM truck_history \
         WHERE truck_id = ? ORDER BY date DESC, truck_history_id DESC",
    )
    .bind(truck_id)
    .fetch_all(executor)
    .await?;
    Ok(collect_rows("truck_history", rows, |row| {
        entry_from_row(row, calendar)
    }))
}

/// Appends one audit row. History rows are never updated or deleted.
pub async fn append<'e, E>(executor: E, entry: &NewHistoryEntry) -> Result<i64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "INSERT INTO truck_history (truck_id, driver_id, date, type, notes) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(entry.truck_id)
    .bind(entry.driver_id)
    .bind(stamp_for_storage(entry.at))
    .bind(entry.kind.as_str())
    .bind(entry.notes.as_deref())
    .execute(executor)
    .await?;
    Ok(result.last_insert_rowid())
}
