use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, put};

use super::extractors::{EntityId, ValidJson};
use crate::db::{safety_categories, safety_events};
use crate::error::AppError;
use crate::models::safety::{SafetyCategory, SafetyCategoryFields, SafetyEvent, SafetyEventFields};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/safety-categories", get(list_categories).post(create_category))
        .route(
            "/safety-categories/:id",
            put(update_category).delete(delete_category),
        )
        .route("/safety-events", get(list_events).post(create_event))
        .route("/safety-events/:id", put(update_event).delete(delete_event))
}

async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SafetyCategory>>, AppError> {
    let categories = state
        .within_deadline(safety_categories::list(&state.pool))
        .await?;
    Ok(Json(categories))
}

async fn create_category(
    State(state): State<Arc<AppState>>,
    ValidJson(fields): ValidJson<SafetyCategoryFields>,
) -> Result<Json<SafetyCategory>, AppError> {
    let id = state
        .within_deadline(safety_categories::insert(&state.pool, &fields))
        .await?;
    Ok(Json(fields.into_category(id)))
}

async fn update_category(
    State(state): State<Arc<AppState>>,
    EntityId(id): EntityId,
    ValidJson(fields): ValidJson<SafetyCategoryFields>,
) -> Result<Json<SafetyCategory>, AppError> {
    state
        .within_deadline(safety_categories::update(&state.pool, id, &fields))
        .await?;
    Ok(Json(fields.into_category(id)))
}

async fn delete_category(
    State(state): State<Arc<AppState>>,
    EntityId(id): EntityId,
) -> Result<StatusCode, AppError> {
    state
        .within_deadline(safety_categories::delete(&state.pool, id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_events(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SafetyEvent>>, AppError> {
    let events = state
        .within_deadline(safety_events::list(&state.pool, &state.calendar))
        .await?;
    Ok(Json(events))
}

async fn create_event(
    State(state): State<Arc<AppState>>,
    ValidJson(fields): ValidJson<SafetyEventFields>,
) -> Result<Json<SafetyEvent>, AppError> {
    let id = state
        .within_deadline(safety_events::insert(&state.pool, &fields))
        .await?;
    Ok(Json(fields.into_event(id)))
}

async fn update_event(
    State(state): State<Arc<AppState>>,
    EntityId(id): EntityId,
    ValidJson(fields): ValidJson<SafetyEventFields>,
) -> Result<Json<SafetyEvent>, AppError> {
    state
        .within_deadline(safety_events::update(&state.pool, id, &fields))
        .await?;
    Ok(Json(fields.into_event(id)))
}

async fn delete_event(
    State(state): State<Arc<AppState>>,
    EntityId(id): EntityId,
) -> Result<StatusCode, AppError> {
    state
        .within_deadline(safety_events::delete(&state.pool, id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
