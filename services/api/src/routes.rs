use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use flight_risk::workflows::crew::crew_router;
use flight_risk::workflows::frat::{assessment_router, AssessmentLifecycle, AssessmentRepository};
use flight_risk::workflows::fuel::{fuel_router, FuelRequestLifecycle, FuelRequestRepository};
use serde_json::json;

use crate::infra::AppState;

/// Merge the engine routers with the operational endpoints.
pub(crate) fn with_engine_routes<A, F>(
    assessments: Arc<AssessmentLifecycle<A>>,
    fuel: Arc<FuelRequestLifecycle<F>>,
) -> Router
where
    A: AssessmentRepository + 'static,
    F: FuelRequestRepository + 'static,
{
    assessment_router(assessments)
        .merge(crew_router())
        .merge(fuel_router(fuel))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
