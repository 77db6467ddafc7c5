use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Serialize;
use validator::Validate;

use crate::{
    error::ApiError,
    extractors::AppJson,
    middlewares::auth::JwtClaims,
    models::{
        assignment::SubmissionSummary, AssignmentView, CreateAssignmentRequest, MessageResponse,
        SubmitAssignmentRequest, UpdateMarksRequest,
    },
    services::{assignment_service::AssignmentService, AppState},
};

#[derive(Debug, Serialize)]
pub struct CreateAssignmentResponse {
    pub message: String,
    pub assignment: AssignmentView,
}

#[derive(Debug, Serialize)]
pub struct SubmitAssignmentResponse {
    pub message: String,
    pub submission: SubmissionSummary,
}

pub async fn create_assignment(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(course_id): Path<String>,
    AppJson(payload): AppJson<CreateAssignmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let service = AssignmentService::new(state.mongo.clone());
    let caller = claims.object_id()?;
    let assignment = service.create(&claims, &course_id, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateAssignmentResponse {
            message: "Assignment created successfully".to_string(),
            assignment: AssignmentView::for_caller(assignment, claims.role, caller),
        }),
    ))
}

pub async fn list_course_assignments(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = AssignmentService::new(state.mongo.clone());
    let assignments = service.list_by_course(&claims, &course_id).await?;
    Ok(Json(assignments))
}

pub async fn submit_assignment(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(assignment_id): Path<String>,
    AppJson(payload): AppJson<SubmitAssignmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = AssignmentService::new(state.mongo.clone());
    let submission = service.submit(&claims, &assignment_id, payload).await?;

    Ok(Json(SubmitAssignmentResponse {
        message: "Assignment submitted successfully".to_string(),
        submission: SubmissionSummary::from(submission),
    }))
}

pub async fn delete_assignment(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(assignment_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = AssignmentService::new(state.mongo.clone());
    service.delete(&claims, &assignment_id).await?;
    Ok(Json(MessageResponse::new("Assignment deleted successfully")))
}

pub async fn list_submissions(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(assignment_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = AssignmentService::new(state.mongo.clone());
    let response = service.list_submissions(&claims, &assignment_id).await?;
    Ok(Json(response))
}

pub async fn update_submission_marks(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path((assignment_id, submission_id)): Path<(String, String)>,
    AppJson(payload): AppJson<UpdateMarksRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = AssignmentService::new(state.mongo.clone());
    service
        .set_marks(&claims, &assignment_id, &submission_id, payload.marks)
        .await?;
    Ok(Json(MessageResponse::new("Marks updated successfully")))
}
