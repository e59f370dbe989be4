use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor};

use crate::db::rows::{RowError, collect_rows};
use crate::error::AppError;
use crate::models::safety::{SafetyCategory, SafetyCategoryFields};

fn category_from_row(row: &SqliteRow) -> Result<SafetyCategory, RowError> {
    Ok(SafetyCategory {
        category_id: row.try_get("category_id")?,
        code: row.try_get("code")?,
        description: row.try_get("description")?,
        scoring_system: row.try_get("scoring_system")?,
        p_i_score: row.try_get("p_i_score")?,
    })
}

pub async fn list<'e, E>(executor: E) -> Result<Vec<SafetyCategory>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query(
        "SELECT category_id, code, description, scoring_system, p_i_score FROM safety_categories",
    )
    .fetch_all(executor)
    .await?;
    Ok(collect_rows("safety_category", rows, category_from_row))
}

pub async fn insert<'e, E>(executor: E, fields: &SafetyCategoryFields) -> Result<i64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "INSERT INTO safety_categories (code, description, scoring_system, p_i_score) VALUES (?, ?, ?, ?)",
    )
    .bind(fields.code.as_str())
    .bind(fields.description.as_str())
    .bind(fields.scoring_system)
    .bind(fields.p_i_score)
    .execute(executor)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn update<'e, E>(executor: E, id: i64, fields: &SafetyCategoryFields) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "UPDATE safety_categories SET code = ?, description = ?, scoring_system = ?, p_i_score = ? \
         WHERE category_id = ?",
    )
    .bind(fields.code.as_str())
    .bind(fields.description.as_str())
    .bind(fields.scoring_system)
    .bind(fields.p_i_score)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn delete<'e, E>(executor: E, id: i64) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM safety_categories WHERE category_id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
