use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor};

use crate::dates::{LocalCalendar, format_day};
use crate::db::rows::{RowError, collect_rows};
use crate::error::AppError;
use crate::models::safety::{SafetyEvent, SafetyEventFields, SafetyTotals};

fn event_from_row(row: &SqliteRow, calendar: &LocalCalendar) -> Result<SafetyEvent, RowError> {
    let event_date: String = row.try_get("event_date")?;
    let notes: Option<String> = row.try_get("notes")?;

    Ok(SafetyEvent {
        safety_event_id: row.try_get("safety_event_id")?,
        driver_id: row.try_get("driver_id")?,
        event_date: calendar.day_from_stored(&event_date)?,
        category_id: row.try_get("category_id")?,
        notes: notes.unwrap_or_default(),
        bonus_score: row.try_get("bonus_score")?,
        p_i_score: row.try_get("p_i_score")?,
        bonus_period: row.try_get("bonus_period")?,
    })
}

pub async fn list<'e, E>(executor: E, calendar: &LocalCalendar) -> Result<Vec<SafetyEvent>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query(
        "SELECT safety_event_id, driver_id, event_date, category_id, notes, bonus_score, p_i_score, bonus_period \
         FROM safety_events",
    )
    .fetch_all(executor)
    .await?;
    Ok(collect_rows("safety_event", rows, |row| {
        event_from_row(row, calendar)
    }))
}

pub async fn insert<'e, E>(executor: E, fields: &SafetyEventFields) -> Result<i64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "INSERT INTO safety_events (driver_id, event_date, category_id, notes, bonus_score, p_i_score, bonus_period) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(fields.driver_id)
    .bind(format_day(fields.event_date))
    .bind(fields.category_id)
    .bind(fields.notes.as_str())
    .bind(fields.bonus_score)
    .bind(fields.p_i_score)
    .bind(fields.bonus_period)
    .execute(executor)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn update<'e, E>(executor: E, id: i64, fields: &SafetyEventFields) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "UPDATE safety_events SET driver_id = ?, event_date = ?, category_id = ?, notes = ?, \
         bonus_score = ?, p_i_score = ?, bonus_period = ? WHERE safety_event_id = ?",
    )
    .bind(fields.driver_id)
    .bind(format_day(fields.event_date))
    .bind(fields.category_id)
    .bind(fields.notes.as_str())
    .bind(fields.bonus_score)
    .bind(fields.p_i_score)
    .bind(fields.bonus_period)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn delete<'e, E>(executor: E, id: i64) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM safety_events WHERE safety_event_id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Count and score sums for one driver; absent sums read as zero.
pub async fn totals_for_driver<'e, E>(executor: E, driver_id: i64) -> Result<SafetyTotals, AppError>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query(
        "SELECT COUNT(*) AS event_count, \
                COALESCE(SUM(bonus_score), 0) AS total_bonus, \
                COALESCE(SUM(p_i_score), 0) AS total_pi \
         FROM safety_events WHERE driver_id = ?",
    )
    .bind(driver_id)
    .fetch_one(executor)
    .await?;

    Ok(SafetyTotals {
        event_count: row.try_get("event_count")?,
        total_bonus_score: row.try_get("total_bonus")?,
        total_pi_score: row.try_get("total_pi")?,
    })
}
