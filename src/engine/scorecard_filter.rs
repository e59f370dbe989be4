use std::time::Instant;

use serde::Deserialize;
use tracing::info;

use crate::dates::DatePrefix;
use crate::db::{scorecard_events, scorecard_metrics};
use crate::error::AppError;
use crate::state::AppState;

/// Raw query parameters of the filtered bulk delete.
#[derive(Debug, Default, Deserialize)]
pub struct ScoreCardEventQuery {
    #[serde(rename = "driverId")]
    pub driver_id: Option<String>,
    #[serde(rename = "datePrefix")]
    pub date_prefix: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreCardEventFilter {
    pub driver_id: i64,
    pub date_prefix: DatePrefix,
    pub category: String,
}

impl ScoreCardEventFilter {
    pub fn from_query(query: ScoreCardEventQuery) -> Result<Self, AppError> {
        let present = |value: Option<String>| {
            value
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let (Some(driver_id), Some(date_prefix), Some(category)) = (
            present(query.driver_id),
            present(query.date_prefix),
            present(query.category),
        ) else {
            return Err(AppError::BadRequest(
                "driverId, datePrefix and category are required".to_string(),
            ));
        };

        let driver_id = driver_id
            .parse::<i64>()
            .map_err(|_| AppError::BadRequest(format!("invalid driverId '{driver_id}'")))?;

        Ok(Self {
            driver_id,
            date_prefix: DatePrefix::parse(&date_prefix)?,
            category: category.to_uppercase(),
        })
    }
}

/// Resolves the category label to metric ids and deletes the driver's
/// matching events. The prefix is compared with the calendar day the listing
/// shows, so instants stored near midnight follow their local day. An
/// unknown or unused label deletes nothing.
pub async fn purge(state: &AppState, filter: &ScoreCardEventFilter) -> Result<u64, AppError> {
    let started = Instant::now();
    let metric_ids = scorecard_metrics::ids_for_label(&state.pool, &filter.category).await?;

    let mut tx = state.pool.begin().await?;
    let deleted = scorecard_events::delete_matching(
        &mut tx,
        filter.driver_id,
        &filter.date_prefix,
        &metric_ids,
        &state.calendar,
    )
    .await?;
    tx.commit().await?;

    state.metrics.scorecard_events_purged_total.inc_by(deleted);
    info!(
        driver_id = filter.driver_id,
        date_prefix = filter.date_prefix.as_str(),
        category = %filter.category,
        metrics = metric_ids.len(),
        deleted,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "scorecard events purged"
    );

    Ok(deleted)
}
