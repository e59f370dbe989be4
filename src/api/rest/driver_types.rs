use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, put};
use tracing::info;

use super::extractors::{EntityId, ValidJson};
use crate::db::{driver_types, drivers, scorecard_metrics};
use crate::error::AppError;
use crate::models::driver_type::{DriverType, DriverTypeFields};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/driver-types", get(list_driver_types).post(create_driver_type))
        .route(
            "/driver-types/:id",
            put(update_driver_type).delete(delete_driver_type),
        )
}

async fn list_driver_types(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DriverType>>, AppError> {
    let types = state.within_deadline(driver_types::list(&state.pool)).await?;
    Ok(Json(types))
}

async fn create_driver_type(
    State(state): State<Arc<AppState>>,
    ValidJson(fields): ValidJson<DriverTypeFields>,
) -> Result<Json<DriverType>, AppError> {
    let id = state
        .within_deadline(driver_types::insert(&state.pool, &fields))
        .await?;
    Ok(Json(fields.into_driver_type(id)))
}

async fn update_driver_type(
    State(state): State<Arc<AppState>>,
    EntityId(id): EntityId,
    ValidJson(fields): ValidJson<DriverTypeFields>,
) -> Result<Json<DriverType>, AppError> {
    state
        .within_deadline(driver_types::update(&state.pool, id, &fields))
        .await?;
    Ok(Json(fields.into_driver_type(id)))
}

/// Drivers and scorecard metrics of this type are detached first, whether or
/// not any exist.
async fn delete_driver_type(
    State(state): State<Arc<AppState>>,
    EntityId(id): EntityId,
) -> Result<StatusCode, AppError> {
    state
        .within_deadline(async {
            let mut tx = state.pool.begin().await?;
            let detached_drivers = drivers::detach_driver_type(&mut *tx, id).await?;
            let detached_metrics = scorecard_metrics::detach_driver_type(&mut *tx, id).await?;
            driver_types::delete(&mut *tx, id).await?;
            tx.commit().await?;

            info!(
                driver_type_id = id,
                detached_drivers,
                detached_metrics,
                "driver type deleted"
            );
            Ok::<(), AppError>(())
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
