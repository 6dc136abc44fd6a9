use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    FuelOrder, FuelRequestId, FuelRequestRecord, FuelRequestStatus, FuelRequestView, TripId,
};
use super::repository::FuelRequestRepository;
use super::service::{FuelRequestError, FuelRequestLifecycle};
use crate::workflows::lifecycle::{LifecycleState, RepositoryError};

/// Router exposing fuel request creation and status changes.
pub fn fuel_router<R>(lifecycle: Arc<FuelRequestLifecycle<R>>) -> Router
where
    R: FuelRequestRepository + 'static,
{
    Router::new()
        .route("/api/v1/fuel/requests", post(create_handler::<R>))
        .route("/api/v1/fuel/requests/:request_id", get(status_handler::<R>))
        .route(
            "/api/v1/fuel/requests/:request_id/status",
            post(advance_handler::<R>),
        )
        .route(
            "/api/v1/fuel/trips/:trip_id/requests",
            get(history_handler::<R>),
        )
        .with_state(lifecycle)
}

#[derive(Debug, Deserialize)]
pub(crate) struct AdvanceRequest {
    pub(crate) status: FuelRequestStatus,
}

pub(crate) async fn create_handler<R>(
    State(lifecycle): State<Arc<FuelRequestLifecycle<R>>>,
    Json(order): Json<FuelOrder>,
) -> Response
where
    R: FuelRequestRepository + 'static,
{
    view_response(StatusCode::CREATED, lifecycle.create(order))
}

pub(crate) async fn status_handler<R>(
    State(lifecycle): State<Arc<FuelRequestLifecycle<R>>>,
    Path(request_id): Path<String>,
) -> Response
where
    R: FuelRequestRepository + 'static,
{
    view_response(StatusCode::OK, lifecycle.get(&FuelRequestId(request_id)))
}

pub(crate) async fn advance_handler<R>(
    State(lifecycle): State<Arc<FuelRequestLifecycle<R>>>,
    Path(request_id): Path<String>,
    Json(request): Json<AdvanceRequest>,
) -> Response
where
    R: FuelRequestRepository + 'static,
{
    view_response(
        StatusCode::OK,
        lifecycle.advance(&FuelRequestId(request_id), request.status),
    )
}

pub(crate) async fn history_handler<R>(
    State(lifecycle): State<Arc<FuelRequestLifecycle<R>>>,
    Path(trip_id): Path<String>,
) -> Response
where
    R: FuelRequestRepository + 'static,
{
    match lifecycle.history_for_trip(&TripId(trip_id)) {
        Ok(records) => {
            let views: Vec<FuelRequestView> = records.iter().map(|record| record.view()).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn view_response(
    status: StatusCode,
    result: Result<FuelRequestRecord, FuelRequestError>,
) -> Response {
    match result {
        Ok(record) => (status, Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: FuelRequestError) -> Response {
    let (status, payload) = match &error {
        FuelRequestError::Validation(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": error.to_string() }),
        ),
        FuelRequestError::InvalidTransition {
            request_id,
            from,
            to,
        } => (
            StatusCode::CONFLICT,
            json!({
                "error": error.to_string(),
                "request_id": request_id,
                "status": from.label(),
                "attempted": to.label(),
            }),
        ),
        FuelRequestError::ActiveRequestExists { trip_id, existing } => (
            StatusCode::CONFLICT,
            json!({
                "error": error.to_string(),
                "trip_id": trip_id,
                "existing_request_id": existing,
            }),
        ),
        FuelRequestError::ConcurrentModification { request_id, .. } => (
            StatusCode::CONFLICT,
            json!({ "error": error.to_string(), "request_id": request_id }),
        ),
        FuelRequestError::NotFound { request_id } => (
            StatusCode::NOT_FOUND,
            json!({ "error": error.to_string(), "request_id": request_id }),
        ),
        FuelRequestError::Repository(
            RepositoryError::Conflict | RepositoryError::ActiveRecordExists,
        ) => (
            StatusCode::CONFLICT,
            json!({ "error": error.to_string() }),
        ),
        FuelRequestError::Repository(RepositoryError::NotFound) => (
            StatusCode::NOT_FOUND,
            json!({ "error": error.to_string() }),
        ),
        FuelRequestError::Repository(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": error.to_string() }),
        ),
    };

    (status, Json(payload)).into_response()
}
