use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::get;
use serde::Serialize;

use crate::db::{
    driver_types, drivers, safety_categories, safety_events, scorecard_events, scorecard_metrics,
    trucks,
};
use crate::error::AppError;
use crate::models::driver::Driver;
use crate::models::driver_type::DriverType;
use crate::models::safety::{SafetyCategory, SafetyEvent};
use crate::models::scorecard::{ScoreCardEvent, ScoreCardItem};
use crate::models::truck::Truck;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/bootstrap", get(bootstrap))
}

/// Every collection the client needs on first load.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bootstrap {
    pub trucks: Vec<Truck>,
    pub driver_types: Vec<DriverType>,
    pub drivers: Vec<Driver>,
    pub safety_categories: Vec<SafetyCategory>,
    pub score_card: Vec<ScoreCardItem>,
    pub safety_events: Vec<SafetyEvent>,
    pub score_card_events: Vec<ScoreCardEvent>,
}

async fn bootstrap(State(state): State<Arc<AppState>>) -> Result<Json<Bootstrap>, AppError> {
    let pool = &state.pool;
    let calendar = &state.calendar;

    let (
        trucks,
        driver_types,
        drivers,
        safety_categories,
        score_card,
        safety_events,
        score_card_events,
    ) = state
        .within_deadline(async {
            tokio::try_join!(
                trucks::list(pool),
                driver_types::list(pool),
                drivers::list(pool, calendar),
                safety_categories::list(pool),
                scorecard_metrics::list(pool),
                safety_events::list(pool, calendar),
                scorecard_events::list(pool, calendar),
            )
        })
        .await?;

    Ok(Json(Bootstrap {
        trucks,
        driver_types,
        drivers,
        safety_categories,
        score_card,
        safety_events,
        score_card_events,
    }))
}
