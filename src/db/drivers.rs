use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor};

use crate::dates::{LocalCalendar, format_day};
use crate::db::rows::{RowError, collect_rows};
use crate::error::AppError;
use crate::models::driver::{Driver, DriverFields};

const SELECT_DRIVERS: &str = "SELECT driver_id, driver_code, first_name, last_name, start_date, \
     truck_id, driver_type_id, profile_pic FROM drivers";

pub fn driver_from_row(row: &SqliteRow, calendar: &LocalCalendar) -> Result<Driver, RowError> {
    let start_date: Option<String> = row.try_get("start_date")?;
    let start_date = match start_date.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(calendar.day_from_stored(raw)?),
        _ => None,
    };

    Ok(Driver {
        driver_id: row.try_get("driver_id")?,
        driver_code: row.try_get("driver_code")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        start_date,
        truck_id: row.try_get("truck_id")?,
        driver_type_id: row.try_get("driver_type_id")?,
        profile_pic: row.try_get("profile_pic")?,
    })
}

pub async fn list<'e, E>(executor: E, calendar: &LocalCalendar) -> Result<Vec<Driver>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query(SELECT_DRIVERS).fetch_all(executor).await?;
    Ok(collect_rows("driver", rows, |row| {
        driver_from_row(row, calendar)
    }))
}

pub async fn fetch<'e, E>(
    executor: E,
    driver_id: i64,
    calendar: &LocalCalendar,
) -> Result<Option<Driver>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query(&format!("{SELECT_DRIVERS} WHERE driver_id = ?"))
        .bind(driver_id)
        .fetch_optional(executor)
        .await?;

    Ok(row
        .as_ref()
        .map(|row| driver_from_row(row, calendar))
        .transpose()?)
}

/// Inserts the profile with no truck; the truck reference is set by the
/// assignment coordinator.
pub async fn insert<'e, E>(executor: E, fields: &DriverFields) -> Result<i64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "INSERT INTO drivers (driver_code, first_name, last_name, start_date, truck_id, driver_type_id, profile_pic) \
         VALUES (?, ?, ?, ?, NULL, ?, ?)",
    )
    .bind(fields.driver_code.as_str())
    .bind(fields.first_name.as_str())
    .bind(fields.last_name.as_str())
    .bind(fields.start_date.map(format_day))
    .bind(fields.driver_type_id)
    .bind(fields.profile_pic.as_deref())
    .execute(executor)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Writes every profile column except `truck_id`.
pub async fn update_profile<'e, E>(
    executor: E,
    driver_id: i64,
    fields: &DriverFields,
) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "UPDATE drivers SET driver_code = ?, first_name = ?, last_name = ?, start_date = ?, \
         driver_type_id = ?, profile_pic = ? WHERE driver_id = ?",
    )
    .bind(fields.driver_code.as_str())
    .bind(fields.first_name.as_str())
    .bind(fields.last_name.as_str())
    .bind(fields.start_date.map(format_day))
    .bind(fields.driver_type_id)
    .bind(fields.profile_pic.as_deref())
    .bind(driver_id)
    .execute(executor)
    .await?;
    Ok(())
}

/// `None` when the driver does not exist, otherwise the truck it holds.
pub async fn current_truck<'e, E>(executor: E, driver_id: i64) -> Result<Option<Option<i64>>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let truck: Option<Option<i64>> =
        sqlx::query_scalar("SELECT truck_id FROM drivers WHERE driver_id = ?")
            .bind(driver_id)
            .fetch_optional(executor)
            .await?;
    Ok(truck)
}

pub async fn set_truck<'e, E>(executor: E, driver_id: i64, truck_id: Option<i64>) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("UPDATE drivers SET truck_id = ? WHERE driver_id = ?")
        .bind(truck_id)
        .bind(driver_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Clears the truck reference on every driver holding `truck_id` and returns
/// the ids that were holding it.
pub async fn detach_truck<'e, E>(executor: E, truck_id: i64) -> Result<Vec<i64>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let released: Vec<i64> =
        sqlx::query_scalar("UPDATE drivers SET truck_id = NULL WHERE truck_id = ? RETURNING driver_id")
            .bind(truck_id)
            .fetch_all(executor)
            .await?;
    Ok(released)
}

/// Clears the driver's truck only while it still points at `truck_id`.
pub async fn detach_if_holding<'e, E>(executor: E, driver_id: i64, truck_id: i64) -> Result<bool, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("UPDATE drivers SET truck_id = NULL WHERE driver_id = ? AND truck_id = ?")
        .bind(driver_id)
        .bind(truck_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn holder_of<'e, E>(executor: E, truck_id: i64) -> Result<Option<i64>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let holder: Option<i64> =
        sqlx::query_scalar("SELECT driver_id FROM drivers WHERE truck_id = ? LIMIT 1")
            .bind(truck_id)
            .fetch_optional(executor)
            .await?;
    Ok(holder)
}

pub async fn detach_driver_type<'e, E>(executor: E, driver_type_id: i64) -> Result<u64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("UPDATE drivers SET driver_type_id = NULL WHERE driver_type_id = ?")
        .bind(driver_type_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Deletes the driver. `None` when there was no such driver, otherwise the
/// truck it held at deletion time.
pub async fn delete_returning_truck<'e, E>(
    executor: E,
    driver_id: i64,
) -> Result<Option<Option<i64>>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let truck: Option<Option<i64>> =
        sqlx::query_scalar("DELETE FROM drivers WHERE driver_id = ? RETURNING truck_id")
            .bind(driver_id)
            .fetch_optional(executor)
            .await?;
    Ok(truck)
}
