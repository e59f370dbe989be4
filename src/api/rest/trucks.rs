use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use serde::Deserialize;
use tracing::info;

use super::extractors::{EntityId, ValidJson};
use crate::db::{truck_history, trucks};
use crate::engine::assignment::{self, AssignmentOutcome};
use crate::error::AppError;
use crate::models::truck::{Truck, TruckFields, TruckStatus};
use crate::models::truck_history::TruckHistoryEvent;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/trucks", get(list_trucks).post(create_truck))
        .route("/trucks/:id", put(update_truck).delete(delete_truck))
        .route("/trucks/:id/history", get(truck_history))
        .route("/trucks/:id/assign-driver", post(assign_driver))
}

#[derive(Debug, Deserialize)]
pub struct AssignDriverRequest {
    #[serde(rename = "driverId", default)]
    pub driver_id: Option<i64>,
}

async fn list_trucks(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Truck>>, AppError> {
    let trucks = state.within_deadline(trucks::list(&state.pool)).await?;
    Ok(Json(trucks))
}

async fn create_truck(
    State(state): State<Arc<AppState>>,
    ValidJson(fields): ValidJson<TruckFields>,
) -> Result<Json<Truck>, AppError> {
    if fields.status == TruckStatus::Assigned {
        return Err(assignment::assigned_status_rejected());
    }

    let truck_id = state.within_deadline(trucks::insert(&state.pool, &fields)).await?;
    info!(truck_id, unit_number = %fields.unit_number, "truck created");
    Ok(Json(fields.into_truck(truck_id)))
}

async fn update_truck(
    State(state): State<Arc<AppState>>,
    EntityId(truck_id): EntityId,
    ValidJson(fields): ValidJson<TruckFields>,
) -> Result<Json<Truck>, AppError> {
    let truck = state
        .within_deadline(assignment::update_truck(&state, truck_id, fields))
        .await?;
    Ok(Json(truck))
}

async fn delete_truck(
    State(state): State<Arc<AppState>>,
    EntityId(truck_id): EntityId,
) -> Result<StatusCode, AppError> {
    state
        .within_deadline(assignment::delete_truck(&state, truck_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Newest first.
async fn truck_history(
    State(state): State<Arc<AppState>>,
    EntityId(truck_id): EntityId,
) -> Result<Json<Vec<TruckHistoryEvent>>, AppError> {
    let events = state
        .within_deadline(truck_history::list_for_truck(
            &state.pool,
            truck_id,
            &state.calendar,
        ))
        .await?;
    Ok(Json(events))
}

async fn assign_driver(
    State(state): State<Arc<AppState>>,
    EntityId(truck_id): EntityId,
    ValidJson(payload): ValidJson<AssignDriverRequest>,
) -> Result<Json<AssignmentOutcome>, AppError> {
    let outcome = state
        .within_deadline(assignment::assign_driver(&state, truck_id, payload.driver_id))
        .await?;
    Ok(Json(outcome))
}
