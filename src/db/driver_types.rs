use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor};

use crate::db::rows::{RowError, collect_rows};
use crate::error::AppError;
use crate::models::driver_type::{DriverType, DriverTypeFields};

fn driver_type_from_row(row: &SqliteRow) -> Result<DriverType, RowError> {
    Ok(DriverType {
        driver_type_id: row.try_get("driver_type_id")?,
        driver_type: row.try_get("driver_type")?,
    })
}

pub async fn list<'e, E>(executor: E) -> Result<Vec<DriverType>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query("SELECT driver_type_id, driver_type FROM driver_type")
        .fetch_all(executor)
        .await?;
    Ok(collect_rows("driver_type", rows, driver_type_from_row))
}

pub async fn insert<'e, E>(executor: E, fields: &DriverTypeFields) -> Result<i64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("INSERT INTO driver_type (driver_type) VALUES (?)")
        .bind(fields.driver_type.as_str())
        .execute(executor)
        .await?;
    Ok(result.last_insert_rowid())
}

pub async fn update<'e, E>(executor: E, id: i64, fields: &DriverTypeFields) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("UPDATE driver_type SET driver_type = ? WHERE driver_type_id = ?")
        .bind(fields.driver_type.as_str())
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn delete<'e, E>(executor: E, id: i64) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM driver_type WHERE driver_type_id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
