use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use validator::Validate;

use crate::{
    error::ApiError,
    extractors::AppJson,
    middlewares::auth::JwtClaims,
    models::{CreateCourseRequest, MessageResponse, UpdateRoleRequest},
    services::{course_service::CourseService, user_service::UserService, AppState},
};

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let service = CourseService::new(state.mongo.clone());
    let stats = service.stats().await?;
    Ok(Json(stats))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let service = UserService::new(state.mongo.clone());
    let users = service.list(&claims).await?;
    Ok(Json(users))
}

pub async fn update_user_role(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(user_id): Path<String>,
    AppJson(payload): AppJson<UpdateRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = UserService::new(state.mongo.clone());
    service.update_role(&claims, &user_id, payload.role).await?;
    Ok(Json(MessageResponse::new(format!(
        "Role updated to {}",
        payload.role.as_str()
    ))))
}

pub async fn create_course(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<CreateCourseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let service = CourseService::new(state.mongo.clone());
    let course = service.create(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Course created successfully",
            "course": { "id": course.id.to_hex(), "title": course.title }
        })),
    ))
}

pub async fn delete_course(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = CourseService::new(state.mongo.clone());
    service.delete(&course_id).await?;
    Ok(Json(MessageResponse::new("Course deleted")))
}
