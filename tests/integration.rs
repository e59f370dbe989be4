use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use fleet_safety_api::api::rest::router;
use fleet_safety_api::dates::LocalCalendar;
use fleet_safety_api::db::pool::{self, PoolSettings};
use fleet_safety_api::db::schema;
use fleet_safety_api::state::AppState;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

async fn setup() -> (Router, Arc<AppState>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("fleet.db").display());
    let pool = pool::connect(&PoolSettings::new(url)).await.unwrap();
    schema::ensure_schema(&pool).await.unwrap();

    let state = Arc::new(AppState::new(
        pool,
        LocalCalendar::new(chrono_tz::America::Winnipeg),
        Duration::from_secs(5),
    ));
    (router(state.clone()), state, dir)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn delete_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return (status, Value::Null);
    }
    (status, body_json(response).await)
}

async fn create_truck(app: &Router, unit_number: &str) -> i64 {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/trucks",
            json!({ "unit_number": unit_number, "year": 2021, "status": "available" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["truck_id"].as_i64().unwrap()
}

async fn create_driver(app: &Router, code: &str) -> i64 {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/drivers",
            json!({
                "driver_code": code,
                "first_name": "Ada",
                "last_name": "Lovelace",
                "start_date": "2023-04-01"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["driver_id"].as_i64().unwrap()
}

async fn assign(app: &Router, truck_id: i64, driver_id: Option<i64>) -> (StatusCode, Value) {
    send(
        app,
        json_request(
            "POST",
            &format!("/api/trucks/{truck_id}/assign-driver"),
            json!({ "driverId": driver_id }),
        ),
    )
    .await
}

async fn truck(app: &Router, truck_id: i64) -> Value {
    let (_, trucks) = send(app, get_request("/api/trucks")).await;
    trucks
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["truck_id"] == truck_id)
        .cloned()
        .unwrap_or(Value::Null)
}

async fn driver(app: &Router, driver_id: i64) -> Value {
    let (_, drivers) = send(app, get_request("/api/drivers")).await;
    drivers
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["driver_id"] == driver_id)
        .cloned()
        .unwrap_or(Value::Null)
}

async fn history(app: &Router, truck_id: i64) -> Vec<Value> {
    let (status, body) = send(app, get_request(&format!("/api/trucks/{truck_id}/history"))).await;
    assert_eq!(status, StatusCode::OK);
    body.as_array().unwrap().clone()
}

#[tokio::test]
async fn healthz_reports_store_and_local_time() {
    let (app, _state, _dir) = setup().await;
    let (status, body) = send(&app, get_request("/api/healthz")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["time"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn healthz_reports_unhealthy_when_store_is_closed() {
    let (app, state, _dir) = setup().await;
    state.pool.close().await;

    let (status, body) = send(&app, get_request("/api/healthz")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let (app, _state, _dir) = setup().await;
    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(content_type, prometheus::TEXT_FORMAT);

    let body = body_string(response).await;
    assert!(body.contains("scorecard_events_purged_total"));
}

#[tokio::test]
async fn openapi_and_swagger_are_served() {
    let (app, _state, _dir) = setup().await;

    let (status, doc) = send(&app, get_request("/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["servers"][0]["url"], "/api");
    assert!(doc["paths"]["/drivers/{id}/stats"]["get"].is_object());

    let response = app.oneshot(get_request("/swagger")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("swagger-ui"));
}

#[tokio::test]
async fn truck_crud_round() {
    let (app, _state, _dir) = setup().await;
    let truck_id = create_truck(&app, "T-100").await;

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/trucks/{truck_id}"),
            json!({ "unit_number": "T-100B", "year": 2022, "status": "maintenance" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["truck_id"], truck_id);
    assert_eq!(body["status"], "maintenance");

    let stored = truck(&app, truck_id).await;
    assert_eq!(stored["unit_number"], "T-100B");
    assert_eq!(stored["year"], 2022);
    assert_eq!(stored["status"], "maintenance");

    let (status, _) = send(&app, delete_request(&format!("/api/trucks/{truck_id}"))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(truck(&app, truck_id).await, Value::Null);
}

#[tokio::test]
async fn client_errors_are_400_with_message() {
    let (app, _state, _dir) = setup().await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/trucks",
            json!({ "unit_number": "T-1", "year": 2020, "status": "broken" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/trucks",
            json!({ "unit_number": "T-1", "year": 2020, "status": "assigned" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/safety-events",
            json!({ "driver_id": 1, "event_date": "2024-02-30", "category_id": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("2024-02-30"));

    let bad_json = Request::builder()
        .method("POST")
        .uri("/api/driver-types")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, bad_json).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app,
        json_request("PUT", "/api/trucks/abc", json!({ "unit_number": "x", "year": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn calendar_days_round_trip_unchanged() {
    let (app, _state, _dir) = setup().await;

    let (status, created) = send(
        &app,
        json_request(
            "POST",
            "/api/drivers",
            json!({
                "driver_code": "D-1",
                "first_name": "Grace",
                "last_name": "Hopper",
                "start_date": "2024-01-01"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["start_date"], "2024-01-01");
    assert_eq!(created["truck_id"], Value::Null);

    let stored = driver(&app, created["driver_id"].as_i64().unwrap()).await;
    assert_eq!(stored["start_date"], "2024-01-01");

    let (status, blank) = send(
        &app,
        json_request(
            "POST",
            "/api/drivers",
            json!({ "driver_code": "D-2", "first_name": "A", "last_name": "B", "start_date": "" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(blank["start_date"], Value::Null);
}

#[tokio::test]
async fn assignment_sets_status_and_writes_history() {
    let (app, _state, _dir) = setup().await;
    let truck_id = create_truck(&app, "T-1").await;
    let driver_id = create_driver(&app, "D-1").await;

    let (status, body) = assign(&app, truck_id, Some(driver_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["truck"]["status"], "assigned");
    assert_eq!(body["driver"]["truck_id"], truck_id);

    let rows = history(&app, truck_id).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["type"], "assignment");
    assert_eq!(rows[0]["driver_id"], driver_id);
    assert_eq!(rows[0]["notes"], format!("Assigned driver ID {driver_id}"));

    let (status, body) = assign(&app, truck_id, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["truck"]["status"], "available");
    assert_eq!(body["driver"], Value::Null);
    assert_eq!(driver(&app, driver_id).await["truck_id"], Value::Null);

    let rows = history(&app, truck_id).await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["type"], "status_change");
    assert_eq!(rows[0]["driver_id"], Value::Null);
    assert_eq!(rows[1]["type"], "assignment");
}

#[tokio::test]
async fn reassigning_a_truck_moves_it_between_drivers() {
    let (app, _state, _dir) = setup().await;
    let truck_id = create_truck(&app, "T-1").await;
    let first = create_driver(&app, "D-1").await;
    let second = create_driver(&app, "D-2").await;

    assign(&app, truck_id, Some(first)).await;
    let before = history(&app, truck_id).await;

    let (status, _) = assign(&app, truck_id, Some(second)).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(driver(&app, first).await["truck_id"], Value::Null);
    assert_eq!(driver(&app, second).await["truck_id"], truck_id);

    let after = history(&app, truck_id).await;
    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(after[0]["driver_id"], second);
    assert_eq!(after[1], before[0]);
}

#[tokio::test]
async fn moving_a_driver_releases_the_previous_truck() {
    let (app, _state, _dir) = setup().await;
    let old_truck = create_truck(&app, "T-1").await;
    let new_truck = create_truck(&app, "T-2").await;
    let driver_id = create_driver(&app, "D-1").await;

    assign(&app, old_truck, Some(driver_id)).await;
    let (status, _) = assign(&app, new_truck, Some(driver_id)).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(truck(&app, old_truck).await["status"], "available");
    assert_eq!(truck(&app, new_truck).await["status"], "assigned");

    let rows = history(&app, old_truck).await;
    assert_eq!(rows[0]["type"], "status_change");
    assert_eq!(
        rows[0]["notes"],
        format!("Driver ID {driver_id} moved to truck {new_truck}")
    );
}

#[tokio::test]
async fn unknown_ids_are_404_and_change_nothing() {
    let (app, state, _dir) = setup().await;
    let truck_id = create_truck(&app, "T-1").await;
    let driver_id = create_driver(&app, "D-1").await;
    assign(&app, truck_id, Some(driver_id)).await;

    let (status, body) = assign(&app, truck_id, Some(9_999)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("9999"));

    assert_eq!(driver(&app, driver_id).await["truck_id"], truck_id);
    assert_eq!(truck(&app, truck_id).await["status"], "assigned");
    assert_eq!(history(&app, truck_id).await.len(), 1);

    let (status, _) = assign(&app, 9_999, Some(driver_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(driver(&app, driver_id).await["truck_id"], truck_id);

    for unknown in 10_000..10_050 {
        let (status, _) = assign(&app, unknown, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
    assert_eq!(state.truck_locks.tracked(), 0);
}

#[tokio::test]
async fn driver_edits_that_change_trucks_are_audited() {
    let (app, _state, _dir) = setup().await;
    let first_truck = create_truck(&app, "T-1").await;
    let second_truck = create_truck(&app, "T-2").await;

    let (status, created) = send(
        &app,
        json_request(
            "POST",
            "/api/drivers",
            json!({
                "driver_code": "D-1",
                "first_name": "Ada",
                "last_name": "Lovelace",
                "truck_id": first_truck
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let driver_id = created["driver_id"].as_i64().unwrap();
    assert_eq!(truck(&app, first_truck).await["status"], "assigned");
    assert_eq!(history(&app, first_truck).await[0]["type"], "assignment");

    let (status, updated) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/drivers/{driver_id}"),
            json!({
                "driver_code": "D-1",
                "first_name": "Ada",
                "last_name": "King",
                "truck_id": second_truck
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["driver_id"], driver_id);

    assert_eq!(truck(&app, first_truck).await["status"], "available");
    assert_eq!(truck(&app, second_truck).await["status"], "assigned");

    let released = history(&app, first_truck).await;
    assert_eq!(released[0]["type"], "status_change");
    assert_eq!(released[0]["notes"], "Unassigned driver");

    let assigned = history(&app, second_truck).await;
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0]["type"], "assignment");
    assert_eq!(assigned[0]["driver_id"], driver_id);

    let stored = driver(&app, driver_id).await;
    assert_eq!(stored["last_name"], "King");
    assert_eq!(stored["truck_id"], second_truck);
}

#[tokio::test]
async fn driver_side_assignment_endpoint() {
    let (app, _state, _dir) = setup().await;
    let truck_id = create_truck(&app, "T-1").await;
    let driver_id = create_driver(&app, "D-1").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/drivers/{driver_id}/assign-truck"),
            json!({ "truckId": truck_id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["driver"]["truck_id"], truck_id);
    assert_eq!(body["truck"]["status"], "assigned");

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/drivers/{driver_id}/assign-truck"),
            json!({ "truckId": null }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["driver"]["truck_id"], Value::Null);
    assert_eq!(body["truck"]["status"], "available");

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/drivers/9999/assign-truck",
            json!({ "truckId": null }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn truck_status_follows_its_holder() {
    let (app, _state, _dir) = setup().await;
    let held = create_truck(&app, "T-1").await;
    let free = create_truck(&app, "T-2").await;
    let driver_id = create_driver(&app, "D-1").await;
    assign(&app, held, Some(driver_id)).await;

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/trucks/{held}"),
            json!({ "unit_number": "T-1", "year": 2021, "status": "maintenance" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "assigned");

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/trucks/{free}"),
            json!({ "unit_number": "T-2", "year": 2021, "status": "assigned" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(truck(&app, free).await["status"], "available");
}

#[tokio::test]
async fn deleting_a_truck_detaches_its_driver() {
    let (app, _state, _dir) = setup().await;
    let truck_id = create_truck(&app, "T-1").await;
    let driver_id = create_driver(&app, "D-1").await;
    assign(&app, truck_id, Some(driver_id)).await;

    let (status, _) = send(&app, delete_request(&format!("/api/trucks/{truck_id}"))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert_eq!(driver(&app, driver_id).await["truck_id"], Value::Null);
    assert_eq!(truck(&app, truck_id).await, Value::Null);
}

#[tokio::test]
async fn deleting_a_driver_releases_its_truck() {
    let (app, _state, _dir) = setup().await;
    let truck_id = create_truck(&app, "T-1").await;
    let driver_id = create_driver(&app, "D-1").await;
    assign(&app, truck_id, Some(driver_id)).await;

    let (status, _) = send(&app, delete_request(&format!("/api/drivers/{driver_id}"))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert_eq!(truck(&app, truck_id).await["status"], "available");
    let rows = history(&app, truck_id).await;
    assert_eq!(
        rows[0]["notes"],
        format!("Unassigned driver ID {driver_id} (driver deleted)")
    );
}

#[tokio::test]
async fn deleting_a_driver_type_detaches_references() {
    let (app, _state, _dir) = setup().await;

    let (_, driver_type) = send(
        &app,
        json_request("POST", "/api/driver-types", json!({ "driver_type": "Linehaul" })),
    )
    .await;
    let type_id = driver_type["driver_type_id"].as_i64().unwrap();

    let (_, created) = send(
        &app,
        json_request(
            "POST",
            "/api/drivers",
            json!({
                "driver_code": "D-1",
                "first_name": "A",
                "last_name": "B",
                "driver_type_id": type_id
            }),
        ),
    )
    .await;
    let driver_id = created["driver_id"].as_i64().unwrap();

    let (_, metric) = send(
        &app,
        json_request(
            "POST",
            "/api/scorecard-metrics",
            json!({ "sc_category": "SAFETY", "sc_description": "Hard braking", "driver_type_id": type_id }),
        ),
    )
    .await;

    let (status, _) = send(&app, delete_request(&format!("/api/driver-types/{type_id}"))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert_eq!(driver(&app, driver_id).await["driver_type_id"], Value::Null);
    let (_, metrics) = send(&app, get_request("/api/scorecard-metrics")).await;
    let stored = metrics
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["sc_category_id"] == metric["sc_category_id"])
        .unwrap();
    assert_eq!(stored["driver_type_id"], Value::Null);

    let (_, types) = send(&app, get_request("/api/driver-types")).await;
    assert!(types.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn updates_and_deletes_of_missing_ids_succeed() {
    let (app, _state, _dir) = setup().await;

    let (status, body) = send(
        &app,
        json_request("PUT", "/api/driver-types/404", json!({ "driver_type": "Local" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["driver_type_id"], 404);

    let (status, _) = send(&app, delete_request("/api/safety-events/404")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, delete_request("/api/trucks/404")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn safety_and_scorecard_crud() {
    let (app, _state, _dir) = setup().await;

    let (status, category) = send(
        &app,
        json_request(
            "POST",
            "/api/safety-categories",
            json!({ "code": "SPD", "description": "Speeding", "scoring_system": 1, "p_i_score": 3 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let category_id = category["category_id"].as_i64().unwrap();

    let (status, event) = send(
        &app,
        json_request(
            "POST",
            "/api/safety-events",
            json!({
                "driver_id": 7,
                "event_date": "2024-05-06",
                "category_id": category_id,
                "notes": "Highway 1",
                "bonus_score": 2,
                "p_i_score": 3,
                "bonus_period": true
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let event_id = event["safety_event_id"].as_i64().unwrap();

    let (status, updated) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/safety-events/{event_id}"),
            json!({
                "driver_id": 7,
                "event_date": "2024-05-07",
                "category_id": category_id,
                "bonus_score": 1
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["safety_event_id"], event_id);

    let (_, events) = send(&app, get_request("/api/safety-events")).await;
    let stored = &events.as_array().unwrap()[0];
    assert_eq!(stored["event_date"], "2024-05-07");
    assert_eq!(stored["bonus_score"], 1);
    assert_eq!(stored["bonus_period"], false);

    let (status, metric) = send(
        &app,
        json_request(
            "POST",
            "/api/scorecard-metrics",
            json!({ "sc_category": "DISPATCH", "sc_description": "On time" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(metric["driver_type_id"], Value::Null);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/scorecard-metrics",
            json!({ "sc_category": "PAYROLL" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, sc_event) = send(
        &app,
        json_request(
            "POST",
            "/api/scorecard-events",
            json!({
                "driver_id": 7,
                "event_date": "2024-05-06",
                "sc_category_id": metric["sc_category_id"],
                "sc_score": 4
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sc_event["sc_score"], 4);
}

async fn seed_scorecard_events(app: &Router) -> (i64, i64) {
    let mut metric_ids = Vec::new();
    for category in ["SAFETY", "MAINTENANCE"] {
        let (_, metric) = send(
            app,
            json_request(
                "POST",
                "/api/scorecard-metrics",
                json!({ "sc_category": category, "sc_description": category }),
            ),
        )
        .await;
        metric_ids.push(metric["sc_category_id"].as_i64().unwrap());
    }
    let (safety, maintenance) = (metric_ids[0], metric_ids[1]);

    let events = [
        (1, "2023-12-31", safety),
        (1, "2024-01-15", safety),
        (1, "2024-06-30", safety),
        (1, "2025-01-01", safety),
        (1, "2024-03-01", maintenance),
        (2, "2024-05-05", safety),
    ];
    for (driver_id, date, metric_id) in events {
        let (status, _) = send(
            app,
            json_request(
                "POST",
                "/api/scorecard-events",
                json!({
                    "driver_id": driver_id,
                    "event_date": date,
                    "sc_category_id": metric_id,
                    "sc_score": 1
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    (safety, maintenance)
}

async fn scorecard_dates(app: &Router) -> Vec<(i64, String)> {
    let (_, events) = send(app, get_request("/api/scorecard-events")).await;
    let mut dates: Vec<(i64, String)> = events
        .as_array()
        .unwrap()
        .iter()
        .map(|e| {
            (
                e["driver_id"].as_i64().unwrap(),
                e["event_date"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    dates.sort();
    dates
}

#[tokio::test]
async fn bulk_delete_by_year_and_category() {
    let (app, _state, _dir) = setup().await;
    seed_scorecard_events(&app).await;

    let (status, _) = send(
        &app,
        delete_request("/api/scorecard-events?driverId=1&datePrefix=2024&category=safety"),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert_eq!(
        scorecard_dates(&app).await,
        vec![
            (1, "2023-12-31".to_string()),
            (1, "2024-03-01".to_string()),
            (1, "2025-01-01".to_string()),
            (2, "2024-05-05".to_string()),
        ]
    );
}

#[tokio::test]
async fn bulk_delete_by_month_prefix() {
    let (app, _state, _dir) = setup().await;
    seed_scorecard_events(&app).await;

    let (status, _) = send(
        &app,
        delete_request("/api/scorecard-events?driverId=1&datePrefix=2024-06&category=SAFETY"),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let remaining = scorecard_dates(&app).await;
    assert_eq!(remaining.len(), 5);
    assert!(!remaining.contains(&(1, "2024-06-30".to_string())));
}

#[tokio::test]
async fn bulk_delete_matches_the_listed_day_of_stored_instants() {
    let (app, state, _dir) = setup().await;
    let (safety, _) = seed_scorecard_events(&app).await;

    sqlx::query(
        "INSERT INTO scorecard_events (driver_id, event_date, sc_category_id, sc_score) \
         VALUES (1, '2025-01-01T03:00:00Z', ?, 1)",
    )
    .bind(safety)
    .execute(&state.pool)
    .await
    .unwrap();
    let late_evening = (1, "2024-12-31".to_string());
    assert!(scorecard_dates(&app).await.contains(&late_evening));

    let (status, _) = send(
        &app,
        delete_request("/api/scorecard-events?driverId=1&datePrefix=2025&category=SAFETY"),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let remaining = scorecard_dates(&app).await;
    assert!(!remaining.contains(&(1, "2025-01-01".to_string())));
    assert!(remaining.contains(&late_evening));

    let (status, _) = send(
        &app,
        delete_request("/api/scorecard-events?driverId=1&datePrefix=2024-12&category=SAFETY"),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let remaining = scorecard_dates(&app).await;
    assert!(!remaining.contains(&late_evening));
    assert_eq!(remaining.len(), 5);
}

#[tokio::test]
async fn bulk_delete_with_unused_category_deletes_nothing() {
    let (app, _state, _dir) = setup().await;
    seed_scorecard_events(&app).await;

    let (status, _) = send(
        &app,
        delete_request("/api/scorecard-events?driverId=1&datePrefix=2024&category=DISPATCH"),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(scorecard_dates(&app).await.len(), 6);
}

#[tokio::test]
async fn bulk_delete_rejects_bad_parameters() {
    let (app, _state, _dir) = setup().await;
    seed_scorecard_events(&app).await;

    for uri in [
        "/api/scorecard-events?datePrefix=2024&category=SAFETY",
        "/api/scorecard-events?driverId=abc&datePrefix=2024&category=SAFETY",
        "/api/scorecard-events?driverId=1&datePrefix=24&category=SAFETY",
        "/api/scorecard-events?driverId=1&datePrefix=2024&category=",
    ] {
        let (status, body) = send(&app, delete_request(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["error"].is_string());
    }

    assert_eq!(scorecard_dates(&app).await.len(), 6);
}

async fn add_bonus(app: &Router, driver_id: i64, bonus_score: i64) {
    let (status, _) = send(
        app,
        json_request(
            "POST",
            "/api/safety-events",
            json!({
                "driver_id": driver_id,
                "event_date": "2024-08-01",
                "category_id": 1,
                "bonus_score": bonus_score,
                "p_i_score": 1
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn driver_stats_threshold() {
    let (app, _state, _dir) = setup().await;

    let (status, stats) = send(&app, get_request("/api/drivers/3/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        stats,
        json!({ "eventCount": 0, "totalBonusScore": 0, "totalPIScore": 0, "status": "Good" })
    );

    add_bonus(&app, 3, 2).await;
    add_bonus(&app, 3, 3).await;
    let (_, stats) = send(&app, get_request("/api/drivers/3/stats")).await;
    assert_eq!(stats["eventCount"], 2);
    assert_eq!(stats["totalBonusScore"], 5);
    assert_eq!(stats["totalPIScore"], 2);
    assert_eq!(stats["status"], "Good");

    add_bonus(&app, 3, 1).await;
    let (_, stats) = send(&app, get_request("/api/drivers/3/stats")).await;
    assert_eq!(stats["totalBonusScore"], 6);
    assert_eq!(stats["status"], "Warning");
}

#[tokio::test]
async fn listing_skips_corrupt_rows() {
    let (app, state, _dir) = setup().await;
    add_bonus(&app, 1, 1).await;
    add_bonus(&app, 2, 1).await;

    sqlx::query(
        "INSERT INTO safety_events (driver_id, event_date, category_id) VALUES (3, 'garbage', 1)",
    )
    .execute(&state.pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO trucks (unit_number, year, status) VALUES ('T-X', 2020, 'flying')")
        .execute(&state.pool)
        .await
        .unwrap();
    create_truck(&app, "T-OK").await;

    let (status, events) = send(&app, get_request("/api/safety-events")).await;
    assert_eq!(status, StatusCode::OK);
    let drivers: Vec<i64> = events
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["driver_id"].as_i64().unwrap())
        .collect();
    assert_eq!(drivers.len(), 2);
    assert!(!drivers.contains(&3));

    let (_, trucks) = send(&app, get_request("/api/trucks")).await;
    assert_eq!(trucks.as_array().unwrap().len(), 1);
    assert_eq!(trucks[0]["unit_number"], "T-OK");
}

#[tokio::test]
async fn bootstrap_returns_every_collection() {
    let (app, _state, _dir) = setup().await;
    create_truck(&app, "T-1").await;
    create_driver(&app, "D-1").await;

    let (status, body) = send(&app, get_request("/api/bootstrap")).await;
    assert_eq!(status, StatusCode::OK);

    for key in [
        "trucks",
        "driverTypes",
        "drivers",
        "safetyCategories",
        "scoreCard",
        "safetyEvents",
        "scoreCardEvents",
    ] {
        assert!(body[key].is_array(), "missing {key}");
    }
    assert_eq!(body["trucks"].as_array().unwrap().len(), 1);
    assert_eq!(body["drivers"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_assignments_to_one_truck_serialize() {
    let (app, state, _dir) = setup().await;
    let truck_id = create_truck(&app, "T-1").await;

    let mut driver_ids = Vec::new();
    for n in 0..8 {
        driver_ids.push(create_driver(&app, &format!("D-{n}")).await);
    }

    let requests = driver_ids.iter().map(|driver_id| {
        app.clone().oneshot(json_request(
            "POST",
            &format!("/api/trucks/{truck_id}/assign-driver"),
            json!({ "driverId": driver_id }),
        ))
    });
    for response in futures::future::join_all(requests).await {
        assert_eq!(response.unwrap().status(), StatusCode::OK);
    }

    let (_, drivers) = send(&app, get_request("/api/drivers")).await;
    let holders: Vec<i64> = drivers
        .as_array()
        .unwrap()
        .iter()
        .filter(|d| d["truck_id"] == truck_id)
        .map(|d| d["driver_id"].as_i64().unwrap())
        .collect();
    assert_eq!(holders.len(), 1);

    let rows = history(&app, truck_id).await;
    assert_eq!(rows.len(), driver_ids.len());
    assert!(rows.iter().all(|row| row["type"] == "assignment"));
    assert_eq!(rows[0]["driver_id"], holders[0]);
    assert_eq!(truck(&app, truck_id).await["status"], "assigned");

    let metrics = state.metrics.render().unwrap();
    assert!(metrics.contains("truck_assignments_total"));
}

fn driver_edit(driver_id: i64, truck_id: i64) -> Request<Body> {
    json_request(
        "PUT",
        &format!("/api/drivers/{driver_id}"),
        json!({
            "driver_code": "D-1",
            "first_name": "Ada",
            "last_name": "King",
            "truck_id": truck_id
        }),
    )
}

#[tokio::test]
async fn driver_release_leaves_a_truck_reassigned_while_waiting() {
    let (app, state, _dir) = setup().await;
    let truck_id = create_truck(&app, "T-1").await;
    let first = create_driver(&app, "D-1").await;
    let second = create_driver(&app, "D-2").await;
    assign(&app, truck_id, Some(first)).await;

    let held = state.truck_locks.lock(truck_id).await;
    let reassign = tokio::spawn(app.clone().oneshot(json_request(
        "POST",
        &format!("/api/trucks/{truck_id}/assign-driver"),
        json!({ "driverId": second }),
    )));
    tokio::time::sleep(Duration::from_millis(50)).await;
    let release = tokio::spawn(app.clone().oneshot(json_request(
        "POST",
        &format!("/api/drivers/{first}/assign-truck"),
        json!({ "truckId": null }),
    )));
    tokio::time::sleep(Duration::from_millis(50)).await;
    drop(held);

    assert_eq!(reassign.await.unwrap().unwrap().status(), StatusCode::OK);
    let response = release.await.unwrap().unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["truck"].is_null());

    assert_eq!(driver(&app, second).await["truck_id"], truck_id);
    assert!(driver(&app, first).await["truck_id"].is_null());
    assert_eq!(truck(&app, truck_id).await["status"], "assigned");

    let rows = history(&app, truck_id).await;
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row["type"] == "assignment"));
    assert_eq!(rows[0]["driver_id"], second);
}

#[tokio::test]
async fn driver_edit_relocks_when_the_driver_moves_while_waiting() {
    let (app, state, _dir) = setup().await;
    let first_truck = create_truck(&app, "T-1").await;
    let second_truck = create_truck(&app, "T-2").await;
    let third_truck = create_truck(&app, "T-3").await;
    let driver_id = create_driver(&app, "D-1").await;
    assign(&app, first_truck, Some(driver_id)).await;

    let held_first = state.truck_locks.lock(first_truck).await;
    let edit = tokio::spawn(app.clone().oneshot(driver_edit(driver_id, second_truck)));
    tokio::time::sleep(Duration::from_millis(50)).await;

    let (status, _) = assign(&app, third_truck, Some(driver_id)).await;
    assert_eq!(status, StatusCode::OK);

    let held_third = state.truck_locks.lock(third_truck).await;
    drop(held_first);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!edit.is_finished());
    assert_eq!(truck(&app, third_truck).await["status"], "assigned");
    drop(held_third);

    assert_eq!(edit.await.unwrap().unwrap().status(), StatusCode::OK);
    assert_eq!(driver(&app, driver_id).await["truck_id"], second_truck);
    assert_eq!(truck(&app, first_truck).await["status"], "available");
    assert_eq!(truck(&app, second_truck).await["status"], "assigned");
    assert_eq!(truck(&app, third_truck).await["status"], "available");
    assert_eq!(history(&app, third_truck).await[0]["notes"], "Unassigned driver");
    assert_eq!(state.truck_locks.tracked(), 0);
}

#[tokio::test]
async fn driver_delete_relocks_when_the_driver_moves_while_waiting() {
    let (app, state, _dir) = setup().await;
    let first_truck = create_truck(&app, "T-1").await;
    let second_truck = create_truck(&app, "T-2").await;
    let driver_id = create_driver(&app, "D-1").await;
    assign(&app, first_truck, Some(driver_id)).await;

    let held_first = state.truck_locks.lock(first_truck).await;
    let delete = tokio::spawn(app.clone().oneshot(delete_request(&format!("/api/drivers/{driver_id}"))));
    tokio::time::sleep(Duration::from_millis(50)).await;

    let (status, _) = assign(&app, second_truck, Some(driver_id)).await;
    assert_eq!(status, StatusCode::OK);

    let held_second = state.truck_locks.lock(second_truck).await;
    drop(held_first);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!delete.is_finished());
    drop(held_second);

    assert_eq!(delete.await.unwrap().unwrap().status(), StatusCode::NO_CONTENT);
    assert_eq!(driver(&app, driver_id).await, Value::Null);
    assert_eq!(truck(&app, second_truck).await["status"], "available");
    assert_eq!(
        history(&app, second_truck).await[0]["notes"],
        format!("Unassigned driver ID {driver_id} (driver deleted)")
    );
}
