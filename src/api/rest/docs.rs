//! Route summary document and a Swagger UI page that renders it.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use serde_json::{Map, Value, json};

use crate::state::AppState;

const SWAGGER_PAGE: &str = r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8"/>
  <title>Fleet Safety API</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"/>
</head>
<body>
<div id="swagger-ui"></div>
<script src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"></script>
<script>
window.onload = () => {
  SwaggerUIBundle({ url: '/openapi.json', dom_id: '#swagger-ui' });
};
</script>
</body>
</html>
"#;

/// (path, method, summary) for every route under `/api`.
const ROUTES: &[(&str, &str, &str)] = &[
    ("/healthz", "get", "Health check"),
    ("/bootstrap", "get", "All collections in one response"),
    ("/drivers", "get", "List drivers"),
    ("/drivers", "post", "Create driver"),
    ("/drivers/{id}", "put", "Update driver"),
    ("/drivers/{id}", "delete", "Delete driver"),
    ("/drivers/{id}/stats", "get", "Driver safety stats"),
    ("/drivers/{id}/assign-truck", "post", "Assign a truck to a driver"),
    ("/driver-types", "get", "List driver types"),
    ("/driver-types", "post", "Create driver type"),
    ("/driver-types/{id}", "put", "Update driver type"),
    ("/driver-types/{id}", "delete", "Delete driver type"),
    ("/trucks", "get", "List trucks"),
    ("/trucks", "post", "Create truck"),
    ("/trucks/{id}", "put", "Update truck"),
    ("/trucks/{id}", "delete", "Delete truck"),
    ("/trucks/{id}/history", "get", "Truck history, newest first"),
    ("/trucks/{id}/assign-driver", "post", "Assign a driver to a truck"),
    ("/safety-categories", "get", "List safety categories"),
    ("/safety-categories", "post", "Create safety category"),
    ("/safety-categories/{id}", "put", "Update safety category"),
    ("/safety-categories/{id}", "delete", "Delete safety category"),
    ("/scorecard-metrics", "get", "List scorecard metrics"),
    ("/scorecard-metrics", "post", "Create scorecard metric"),
    ("/scorecard-metrics/{id}", "put", "Update scorecard metric"),
    ("/scorecard-metrics/{id}", "delete", "Delete scorecard metric"),
    ("/safety-events", "get", "List safety events"),
    ("/safety-events", "post", "Create safety event"),
    ("/safety-events/{id}", "put", "Update safety event"),
    ("/safety-events/{id}", "delete", "Delete safety event"),
    ("/scorecard-events", "get", "List scorecard events"),
    ("/scorecard-events", "post", "Create scorecard event"),
    ("/scorecard-events", "delete", "Bulk delete scorecard events by filter"),
    ("/scorecard-events/{id}", "put", "Update scorecard event"),
    ("/scorecard-events/{id}", "delete", "Delete scorecard event"),
];

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/openapi.json", get(openapi))
        .route("/swagger", get(swagger))
}

pub fn openapi_document() -> Value {
    let mut paths = Map::new();
    for (path, method, summary) in ROUTES {
        let operations = paths
            .entry(path.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(operations) = operations {
            operations.insert(method.to_string(), json!({ "summary": summary }));
        }
    }

    json!({
        "openapi": "3.0.3",
        "info": { "title": "Fleet Safety API", "version": env!("CARGO_PKG_VERSION") },
        "servers": [{ "url": "/api" }],
        "paths": paths,
    })
}

async fn openapi() -> impl IntoResponse {
    Json(openapi_document())
}

async fn swagger() -> impl IntoResponse {
    ([(header::CACHE_CONTROL, "no-cache")], Html(SWAGGER_PAGE))
}
