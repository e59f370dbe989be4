use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor};

use crate::db::rows::{RowError, collect_rows, label};
use crate::error::AppError;
use crate::models::scorecard::{ScoreCardItem, ScoreCardItemFields};

fn item_from_row(row: &SqliteRow) -> Result<ScoreCardItem, RowError> {
    Ok(ScoreCardItem {
        sc_category_id: row.try_get("sc_category_id")?,
        sc_category: label(row, "sc_category")?,
        sc_description: row.try_get("sc_description")?,
        driver_type_id: row.try_get("driver_type_id")?,
    })
}

pub async fn list<'e, E>(executor: E) -> Result<Vec<ScoreCardItem>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query(
        "SELECT sc_category_id, sc_category, sc_description, driver_type_id FROM scorecard_metrics",
    )
    .fetch_all(executor)
    .await?;
    Ok(collect_rows("scorecard_metric", rows, item_from_row))
}

/// Ids of every metric carrying the given category label.
pub async fn ids_for_label<'e, E>(executor: E, category: &str) -> Result<Vec<i64>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let ids: Vec<i64> =
        sqlx::query_scalar("SELECT sc_category_id FROM scorecard_metrics WHERE sc_category = ?")
            .bind(category)
            .fetch_all(executor)
            .await?;
    Ok(ids)
}

pub async fn insert<'e, E>(executor: E, fields: &ScoreCardItemFields) -> Result<i64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "INSERT INTO scorecard_metrics (sc_category, sc_description, driver_type_id) VALUES (?, ?, ?)",
    )
    .bind(fields.sc_category.as_str())
    .bind(fields.sc_description.as_str())
    .bind(fields.driver_type_id)
    .execute(executor)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn update<'e, E>(executor: E, id: i64, fields: &ScoreCardItemFields) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "UPDATE scorecard_metrics SET sc_category = ?, sc_description = ?, driver_type_id = ? \
         WHERE sc_category_id = ?",
    )
    .bind(fields.sc_category.as_str())
    .bind(fields.sc_description.as_str())
    .bind(fields.driver_type_id)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn detach_driver_type<'e, E>(executor: E, driver_type_id: i64) -> Result<u64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result =
        sqlx::query("UPDATE scorecard_metrics SET driver_type_id = NULL WHERE driver_type_id = ?")
            .bind(driver_type_id)
            .execute(executor)
            .await?;
    Ok(result.rows_affected())
}

pub async fn delete<'e, E>(executor: E, id: i64) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM scorecard_metrics WHERE sc_category_id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
