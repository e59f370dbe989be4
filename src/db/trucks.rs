use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor};

use crate::db::rows::{RowError, collect_rows, label};
use crate::error::AppError;
use crate::models::truck::{Truck, TruckFields, TruckStatus};

const SELECT_TRUCKS: &str = "SELECT truck_id, unit_number, year, status FROM trucks";

pub fn truck_from_row(row: &SqliteRow) -> Result<Truck, RowError> {
    Ok(Truck {
        truck_id: row.try_get("truck_id")?,
        unit_number: row.try_get("unit_number")?,
        year: row.try_get("year")?,
        status: label(row, "status")?,
    })
}

pub async fn list<'e, E>(executor: E) -> Result<Vec<Truck>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query(SELECT_TRUCKS).fetch_all(executor).await?;
    Ok(collect_rows("truck", rows, truck_from_row))
}

pub async fn fetch<'e, E>(executor: E, truck_id: i64) -> Result<Option<Truck>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query(&format!("{SELECT_TRUCKS} WHERE truck_id = ?"))
        .bind(truck_id)
        .fetch_optional(executor)
        .await?;

    Ok(row.as_ref().map(truck_from_row).transpose()?)
}

pub async fn exists<'e, E>(executor: E, truck_id: i64) -> Result<bool, AppError>
where
    E: SqliteExecutor<'e>,
{
    let found: Option<i64> = sqlx::query_scalar("SELECT truck_id FROM trucks WHERE truck_id = ?")
        .bind(truck_id)
        .fetch_optional(executor)
        .await?;
    Ok(found.is_some())
}

pub async fn insert<'e, E>(executor: E, fields: &TruckFields) -> Result<i64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("INSERT INTO trucks (unit_number, year, status) VALUES (?, ?, ?)")
        .bind(fields.unit_number.as_str())
        .bind(fields.year)
        .bind(fields.status.as_str())
        .execute(executor)
        .await?;
    Ok(result.last_insert_rowid())
}

/// Writes everything except status, which depends on assignment state.
pub async fn update_details<'e, E>(
    executor: E,
    truck_id: i64,
    fields: &TruckFields,
) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("UPDATE trucks SET unit_number = ?, year = ? WHERE truck_id = ?")
        .bind(fields.unit_number.as_str())
        .bind(fields.year)
        .bind(truck_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn set_status<'e, E>(
    executor: E,
    truck_id: i64,
    status: TruckStatus,
) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("UPDATE trucks SET status = ? WHERE truck_id = ?")
        .bind(status.as_str())
        .bind(truck_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Flips an `assigned` truck back to `available`; other states are kept.
/// Returns whether the status changed.
pub async fn release_if_assigned<'e, E>(executor: E, truck_id: i64) -> Result<bool, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result =
        sqlx::query("UPDATE trucks SET status = 'available' WHERE truck_id = ? AND status = 'assigned'")
            .bind(truck_id)
            .execute(executor)
            .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete<'e, E>(executor: E, truck_id: i64) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM trucks WHERE truck_id = ?")
        .bind(truck_id)
        .execute(executor)
        .await?;
    Ok(())
}
