use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::credentials::{classify_window, CredentialClassification};
use super::duty::{assess_duty, DutyRecord};
use super::report::{CrewComplianceReport, CrewMember};
use crate::workflows::validation::ValidationError;

/// Router exposing the stateless crew classifiers.
pub fn crew_router() -> Router {
    Router::new()
        .route(
            "/api/v1/crew/credentials/classify",
            post(classify_credential_handler),
        )
        .route("/api/v1/crew/duty/classify", post(classify_duty_handler))
        .route("/api/v1/crew/compliance", post(compliance_handler))
}

#[derive(Debug, Deserialize)]
pub(crate) struct CredentialRequest {
    #[serde(default)]
    pub(crate) expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) as_of: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CredentialResponse {
    #[serde(flatten)]
    pub(crate) classification: CredentialClassification,
    pub(crate) status_label: &'static str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ComplianceRequest {
    #[serde(default)]
    pub(crate) as_of: Option<NaiveDate>,
    pub(crate) members: Vec<CrewMember>,
}

pub(crate) async fn classify_credential_handler(
    Json(request): Json<CredentialRequest>,
) -> Response {
    match classify_window(request.expiry_date, request.as_of) {
        Ok(classification) => {
            let body = CredentialResponse {
                classification,
                status_label: classification.status.label(),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(error) => validation_response(error),
    }
}

pub(crate) async fn classify_duty_handler(Json(record): Json<DutyRecord>) -> Response {
    match assess_duty(&record) {
        Ok(assessment) => (StatusCode::OK, Json(assessment)).into_response(),
        Err(error) => validation_response(error),
    }
}

pub(crate) async fn compliance_handler(Json(request): Json<ComplianceRequest>) -> Response {
    let Some(as_of) = request.as_of else {
        return validation_response(ValidationError::MissingField { field: "as_of" });
    };

    let reports: Result<Vec<CrewComplianceReport>, ValidationError> = request
        .members
        .iter()
        .map(|member| CrewComplianceReport::build(member, as_of))
        .collect();

    match reports {
        Ok(reports) => (StatusCode::OK, Json(reports)).into_response(),
        Err(error) => validation_response(error),
    }
}

fn validation_response(error: ValidationError) -> Response {
    let payload = json!({ "error": error.to_string() });
    (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
}
