use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};

use crate::{
    error::ApiError,
    middlewares::auth::JwtClaims,
    services::{course_service::CourseService, AppState},
};

pub async fn list_course_lectures(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = CourseService::new(state.mongo.clone());
    let lectures = service.lectures_by_course(&claims, &course_id).await?;
    Ok(Json(lectures))
}

pub async fn list_course_students(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = CourseService::new(state.mongo.clone());
    let students = service.students_by_course(&claims, &course_id).await?;
    Ok(Json(students))
}

pub async fn list_instructor_courses(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let service = CourseService::new(state.mongo.clone());
    let courses = service.instructor_courses(&claims).await?;
    Ok(Json(courses))
}
