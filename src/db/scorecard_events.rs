use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqliteExecutor};

use crate::dates::{DatePrefix, LocalCalendar, format_day};
use crate::db::rows::{RowError, collect_rows};
use crate::error::AppError;
use crate::models::scorecard::{ScoreCardEvent, ScoreCardEventFields};

fn event_from_row(row: &SqliteRow, calendar: &LocalCalendar) -> Result<ScoreCardEvent, RowError> {
    let event_date: String = row.try_get("event_date")?;
    let notes: Option<String> = row.try_get("notes")?;

    Ok(ScoreCardEvent {
        scorecard_event_id: row.try_get("scorecard_event_id")?,
        driver_id: row.try_get("driver_id")?,
        event_date: calendar.day_from_stored(&event_date)?,
        sc_category_id: row.try_get("sc_category_id")?,
        sc_score: row.try_get("sc_score")?,
        notes: notes.unwrap_or_default(),
    })
}

pub async fn list<'e, E>(executor: E, calendar: &LocalCalendar) -> Result<Vec<ScoreCardEvent>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query(
        "SELECT scorecard_event_id, driver_id, event_date, sc_category_id, sc_score, notes FROM scorecard_events",
    )
    .fetch_all(executor)
    .await?;
    Ok(collect_rows("scorecard_event", rows, |row| {
        event_from_row(row, calendar)
    }))
}

pub async fn insert<'e, E>(executor: E, fields: &ScoreCardEventFields) -> Result<i64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "INSERT INTO scorecard_events (driver_id, event_date, sc_category_id, sc_score, notes) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(fields.driver_id)
    .bind(format_day(fields.event_date))
    .bind(fields.sc_category_id)
    .bind(fields.sc_score)
    .bind(fields.notes.as_str())
    .execute(executor)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn update<'e, E>(executor: E, id: i64, fields: &ScoreCardEventFields) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "UPDATE scorecard_events SET driver_id = ?, event_date = ?, sc_category_id = ?, sc_score = ?, notes = ? \
         WHERE scorecard_event_id = ?",
    )
    .bind(fields.driver_id)
    .bind(format_day(fields.event_date))
    .bind(fields.sc_category_id)
    .bind(fields.sc_score)
    .bind(fields.notes.as_str())
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn delete<'e, E>(executor: E, id: i64) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM scorecard_events WHERE scorecard_event_id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Stored values of this shape are already the calendar day.
const PLAIN_DAY_GLOB: &str = "[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]";

/// Deletes a driver's events whose calendar day, as listings report it,
/// starts with `prefix` and whose metric is one of `metric_ids`. Returns the
/// number of rows removed.
///
/// Plain-day rows are matched in SQL. Rows stored as instants are read back,
/// moved into the reference zone and matched on the resulting day.
pub async fn delete_matching(
    conn: &mut SqliteConnection,
    driver_id: i64,
    prefix: &DatePrefix,
    metric_ids: &[i64],
    calendar: &LocalCalendar,
) -> Result<u64, AppError> {
    if metric_ids.is_empty() {
        return Ok(0);
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("DELETE FROM scorecard_events WHERE driver_id = ");
    builder
        .push_bind(driver_id)
        .push(" AND event_date GLOB ")
        .push_bind(PLAIN_DAY_GLOB)
        .push(" AND event_date LIKE ")
        .push_bind(prefix.like_pattern());
    push_id_list(&mut builder, "sc_category_id", metric_ids);
    let mut deleted = builder.build().execute(&mut *conn).await?.rows_affected();

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT scorecard_event_id, event_date FROM scorecard_events WHERE driver_id = ",
    );
    builder
        .push_bind(driver_id)
        .push(" AND event_date NOT GLOB ")
        .push_bind(PLAIN_DAY_GLOB);
    push_id_list(&mut builder, "sc_category_id", metric_ids);
    let rows = builder.build().fetch_all(&mut *conn).await?;

    let mut instant_ids = Vec::new();
    for row in &rows {
        let raw: String = row.try_get("event_date")?;
        let on_prefix = calendar
            .day_from_stored(&raw)
            .is_ok_and(|day| prefix.matches(day));
        if on_prefix {
            instant_ids.push(row.try_get::<i64, _>("scorecard_event_id")?);
        }
    }

    if !instant_ids.is_empty() {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("DELETE FROM scorecard_events WHERE 1 = 1");
        push_id_list(&mut builder, "scorecard_event_id", &instant_ids);
        deleted += builder.build().execute(&mut *conn).await?.rows_affected();
    }

    Ok(deleted)
}

/// Appends ` AND <column> IN (?, ?, ...)`. `ids` must not be empty.
fn push_id_list(builder: &mut QueryBuilder<'_, Sqlite>, column: &str, ids: &[i64]) {
    builder.push(" AND ").push(column).push(" IN (");
    let mut list = builder.separated(", ");
    for id in ids {
        list.push_bind(*id);
    }
    list.push_unseparated(")");
}
