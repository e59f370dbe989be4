use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use serde::Deserialize;

use super::extractors::{EntityId, ValidJson};
use crate::db::{drivers, safety_events};
use crate::engine::assignment::{self, DriverAssignment};
use crate::engine::stats::DriverStats;
use crate::error::AppError;
use crate::models::driver::{Driver, DriverFields};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", get(list_drivers).post(create_driver))
        .route("/drivers/:id", put(update_driver).delete(delete_driver))
        .route("/drivers/:id/stats", get(driver_stats))
        .route("/drivers/:id/assign-truck", post(assign_truck))
}

#[derive(Debug, Deserialize)]
pub struct AssignTruckRequest {
    #[serde(rename = "truckId", default)]
    pub truck_id: Option<i64>,
}

async fn list_drivers(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Driver>>, AppError> {
    let drivers = state
        .within_deadline(drivers::list(&state.pool, &state.calendar))
        .await?;
    Ok(Json(drivers))
}

async fn create_driver(
    State(state): State<Arc<AppState>>,
    ValidJson(fields): ValidJson<DriverFields>,
) -> Result<Json<Driver>, AppError> {
    let driver = state
        .within_deadline(assignment::create_driver(&state, fields))
        .await?;
    Ok(Json(driver))
}

async fn update_driver(
    State(state): State<Arc<AppState>>,
    EntityId(driver_id): EntityId,
    ValidJson(fields): ValidJson<DriverFields>,
) -> Result<Json<Driver>, AppError> {
    let driver = state
        .within_deadline(assignment::update_driver(&state, driver_id, fields))
        .await?;
    Ok(Json(driver))
}

async fn delete_driver(
    State(state): State<Arc<AppState>>,
    EntityId(driver_id): EntityId,
) -> Result<StatusCode, AppError> {
    state
        .within_deadline(assignment::delete_driver(&state, driver_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn driver_stats(
    State(state): State<Arc<AppState>>,
    EntityId(driver_id): EntityId,
) -> Result<Json<DriverStats>, AppError> {
    let totals = state
        .within_deadline(safety_events::totals_for_driver(&state.pool, driver_id))
        .await?;
    Ok(Json(DriverStats::from(totals)))
}

async fn assign_truck(
    State(state): State<Arc<AppState>>,
    EntityId(driver_id): EntityId,
    ValidJson(payload): ValidJson<AssignTruckRequest>,
) -> Result<Json<DriverAssignment>, AppError> {
    let outcome = state
        .within_deadline(assignment::assign_truck_to_driver(
            &state,
            driver_id,
            payload.truck_id,
        ))
        .await?;
    Ok(Json(outcome))
}
