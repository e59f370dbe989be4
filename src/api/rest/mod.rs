pub mod bootstrap;
pub mod docs;
pub mod driver_types;
pub mod drivers;
pub mod extractors;
pub mod safety;
pub mod scorecard;
pub mod trucks;

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::db::pool;
use crate::error::AppError;
use crate::state::AppState;

const HEALTH_PING_TIMEOUT: Duration = Duration::from_secs(2);

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/healthz", get(healthz))
        .merge(bootstrap::router())
        .merge(drivers::router())
        .merge(driver_types::router())
        .merge(trucks::router())
        .merge(safety::router())
        .merge(scorecard::router());

    Router::new()
        .nest("/api", api)
        .route("/metrics", get(metrics))
        .merge(docs::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let checked = tokio::time::timeout(HEALTH_PING_TIMEOUT, pool::ping(&state.pool)).await;

    let failure = match checked {
        Ok(Ok(())) => {
            return (
                StatusCode::OK,
                Json(json!({
                    "status": "ok",
                    "time": state.calendar.now().to_rfc3339(),
                })),
            );
        }
        Ok(Err(err)) => err.to_string(),
        Err(_) => format!("store ping exceeded {}s", HEALTH_PING_TIMEOUT.as_secs()),
    };

    tracing::warn!(error = %failure, "health check failed");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "status": "unhealthy",
            "error": failure,
        })),
    )
}

async fn metrics(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let body = state
        .metrics
        .render()
        .map_err(|err| AppError::Internal(format!("metrics rendering failed: {err}")))?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}
