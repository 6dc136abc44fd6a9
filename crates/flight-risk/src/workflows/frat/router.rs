use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    AssessmentRecord, AssessmentStatus, AssessmentView, DepartureEvent, LegId, Selection,
};
use super::repository::AssessmentRepository;
use super::score::ScoreBreakdown;
use super::service::{AssessmentError, AssessmentLifecycle};
use crate::workflows::lifecycle::{LifecycleState, RepositoryError};

/// Router exposing catalog scoring and the assessment lifecycle.
pub fn assessment_router<R>(lifecycle: Arc<AssessmentLifecycle<R>>) -> Router
where
    R: AssessmentRepository + 'static,
{
    Router::new()
        .route("/api/v1/frat/catalog", get(catalog_handler::<R>))
        .route("/api/v1/frat/score", post(score_handler::<R>))
        .route("/api/v1/frat/pending", get(pending_handler::<R>))
        .route(
            "/api/v1/frat/assessments/:leg_id",
            get(status_handler::<R>).post(observe_handler::<R>),
        )
        .route(
            "/api/v1/frat/assessments/:leg_id/selection",
            put(edit_handler::<R>),
        )
        .route(
            "/api/v1/frat/assessments/:leg_id/submit",
            post(submit_handler::<R>),
        )
        .route(
            "/api/v1/frat/assessments/:leg_id/mitigation",
            put(mitigation_handler::<R>),
        )
        .route(
            "/api/v1/frat/assessments/:leg_id/departure",
            post(departure_handler::<R>),
        )
        .with_state(lifecycle)
}

#[derive(Debug, Deserialize)]
pub(crate) struct SelectionRequest {
    pub(crate) selection: Selection,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SubmitRequest {
    #[serde(default)]
    pub(crate) selection: Option<Selection>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MitigationRequest {
    #[serde(default)]
    pub(crate) notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DepartureRequest {
    pub(crate) departed: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScoreResponse {
    #[serde(flatten)]
    pub(crate) breakdown: ScoreBreakdown,
    pub(crate) unrecognized_ids: Vec<String>,
}

pub(crate) async fn catalog_handler<R>(
    State(lifecycle): State<Arc<AssessmentLifecycle<R>>>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    (StatusCode::OK, Json(lifecycle.scorer().catalog().clone())).into_response()
}

pub(crate) async fn score_handler<R>(
    State(lifecycle): State<Arc<AssessmentLifecycle<R>>>,
    Json(request): Json<SelectionRequest>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    let scorer = lifecycle.scorer();
    let response = ScoreResponse {
        breakdown: scorer.score(&request.selection),
        unrecognized_ids: scorer.unrecognized_ids(&request.selection),
    };
    (StatusCode::OK, Json(response)).into_response()
}

pub(crate) async fn pending_handler<R>(
    State(lifecycle): State<Arc<AssessmentLifecycle<R>>>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    match lifecycle.pending() {
        Ok(records) => {
            let views: Vec<AssessmentView> = records.iter().map(|record| record.view()).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R>(
    State(lifecycle): State<Arc<AssessmentLifecycle<R>>>,
    Path(leg_id): Path<String>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    view_response(StatusCode::OK, lifecycle.get(&LegId(leg_id)))
}

pub(crate) async fn observe_handler<R>(
    State(lifecycle): State<Arc<AssessmentLifecycle<R>>>,
    Path(leg_id): Path<String>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    view_response(StatusCode::OK, lifecycle.observe(&LegId(leg_id)))
}

pub(crate) async fn edit_handler<R>(
    State(lifecycle): State<Arc<AssessmentLifecycle<R>>>,
    Path(leg_id): Path<String>,
    Json(request): Json<SelectionRequest>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    view_response(
        StatusCode::OK,
        lifecycle.edit(&LegId(leg_id), request.selection),
    )
}

pub(crate) async fn submit_handler<R>(
    State(lifecycle): State<Arc<AssessmentLifecycle<R>>>,
    Path(leg_id): Path<String>,
    Json(request): Json<SubmitRequest>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    view_response(
        StatusCode::ACCEPTED,
        lifecycle.submit(&LegId(leg_id), request.selection),
    )
}

pub(crate) async fn mitigation_handler<R>(
    State(lifecycle): State<Arc<AssessmentLifecycle<R>>>,
    Path(leg_id): Path<String>,
    Json(request): Json<MitigationRequest>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    view_response(
        StatusCode::OK,
        lifecycle.record_mitigation(&LegId(leg_id), request.notes),
    )
}

pub(crate) async fn departure_handler<R>(
    State(lifecycle): State<Arc<AssessmentLifecycle<R>>>,
    Path(leg_id): Path<String>,
    Json(request): Json<DepartureRequest>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    let event = DepartureEvent {
        leg_id: LegId(leg_id),
        departed: request.departed,
    };
    view_response(StatusCode::OK, lifecycle.record_departure(&event))
}

fn view_response(
    status: StatusCode,
    result: Result<AssessmentRecord, AssessmentError>,
) -> Response {
    match result {
        Ok(record) => (status, Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: AssessmentError) -> Response {
    let (status, payload) = match &error {
        AssessmentError::Validation(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": error.to_string() }),
        ),
        AssessmentError::InvalidTransition {
            leg_id,
            from,
            attempted,
        } => (
            StatusCode::CONFLICT,
            json!({
                "error": error.to_string(),
                "leg_id": leg_id,
                "status": from.label(),
                "attempted": attempted.label(),
            }),
        ),
        AssessmentError::Frozen { leg_id } => (
            StatusCode::CONFLICT,
            json!({
                "error": error.to_string(),
                "leg_id": leg_id,
                "status": AssessmentStatus::Locked.label(),
            }),
        ),
        AssessmentError::ConcurrentModification { leg_id, .. } => (
            StatusCode::CONFLICT,
            json!({ "error": error.to_string(), "leg_id": leg_id }),
        ),
        AssessmentError::NotFound { leg_id } => (
            StatusCode::NOT_FOUND,
            json!({ "error": error.to_string(), "leg_id": leg_id }),
        ),
        AssessmentError::Repository(RepositoryError::NotFound) => (
            StatusCode::NOT_FOUND,
            json!({ "error": error.to_string() }),
        ),
        AssessmentError::Repository(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": error.to_string() }),
        ),
    };

    (status, Json(payload)).into_response()
}
