use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};

use super::extractors::{EntityId, ValidJson};
use crate::db::{scorecard_events, scorecard_metrics};
use crate::engine::scorecard_filter::{self, ScoreCardEventFilter, ScoreCardEventQuery};
use crate::error::AppError;
use crate::models::scorecard::{
    ScoreCardEvent, ScoreCardEventFields, ScoreCardItem, ScoreCardItemFields,
};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/scorecard-metrics", get(list_metrics).post(create_metric))
        .route(
            "/scorecard-metrics/:id",
            put(update_metric).delete(delete_metric),
        )
        .route(
            "/scorecard-events",
            get(list_events).post(create_event).delete(purge_events),
        )
        .route("/scorecard-events/:id", put(update_event).delete(delete_event))
}

async fn list_metrics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ScoreCardItem>>, AppError> {
    let metrics = state
        .within_deadline(scorecard_metrics::list(&state.pool))
        .await?;
    Ok(Json(metrics))
}

async fn create_metric(
    State(state): State<Arc<AppState>>,
    ValidJson(fields): ValidJson<ScoreCardItemFields>,
) -> Result<Json<ScoreCardItem>, AppError> {
    let id = state
        .within_deadline(scorecard_metrics::insert(&state.pool, &fields))
        .await?;
    Ok(Json(fields.into_item(id)))
}

async fn update_metric(
    State(state): State<Arc<AppState>>,
    EntityId(id): EntityId,
    ValidJson(fields): ValidJson<ScoreCardItemFields>,
) -> Result<Json<ScoreCardItem>, AppError> {
    state
        .within_deadline(scorecard_metrics::update(&state.pool, id, &fields))
        .await?;
    Ok(Json(fields.into_item(id)))
}

async fn delete_metric(
    State(state): State<Arc<AppState>>,
    EntityId(id): EntityId,
) -> Result<StatusCode, AppError> {
    state
        .within_deadline(scorecard_metrics::delete(&state.pool, id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_events(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ScoreCardEvent>>, AppError> {
    let events = state
        .within_deadline(scorecard_events::list(&state.pool, &state.calendar))
        .await?;
    Ok(Json(events))
}

async fn create_event(
    State(state): State<Arc<AppState>>,
    ValidJson(fields): ValidJson<ScoreCardEventFields>,
) -> Result<Json<ScoreCardEvent>, AppError> {
    let id = state
        .within_deadline(scorecard_events::insert(&state.pool, &fields))
        .await?;
    Ok(Json(fields.into_event(id)))
}

async fn update_event(
    State(state): State<Arc<AppState>>,
    EntityId(id): EntityId,
    ValidJson(fields): ValidJson<ScoreCardEventFields>,
) -> Result<Json<ScoreCardEvent>, AppError> {
    state
        .within_deadline(scorecard_events::update(&state.pool, id, &fields))
        .await?;
    Ok(Json(fields.into_event(id)))
}

async fn delete_event(
    State(state): State<Arc<AppState>>,
    EntityId(id): EntityId,
) -> Result<StatusCode, AppError> {
    state
        .within_deadline(scorecard_events::delete(&state.pool, id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /scorecard-events?driverId=&datePrefix=&category=`. Succeeds with
/// 204 even when nothing matched.
async fn purge_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScoreCardEventQuery>,
) -> Result<StatusCode, AppError> {
    let filter = ScoreCardEventFilter::from_query(query)?;
    state
        .within_deadline(scorecard_filter::purge(&state, &filter))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
