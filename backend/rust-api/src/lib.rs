use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;

pub use config::Config;
pub use services::AppState;

/// CSP middleware adds Content-Security-Policy header to all responses
async fn csp_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'self'; img-src 'self' data: https:"),
    );
    response
}

pub fn create_router(app_state: std::sync::Arc<services::AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any); // TODO: restrict to the frontend origin in production

    Router::new()
        // Public endpoints (no auth required)
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        // Course and assignment endpoints (require JWT)
        .nest("/api/v1", api_routes(app_state.clone()))
        // Admin endpoints (require JWT + admin role)
        .nest("/api/v1/admin", admin_routes(app_state.clone()))
        .with_state(app_state)
        .layer(cors)
        .layer(middleware::from_fn(csp_middleware))
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(middleware::from_fn(
            middlewares::trace::trace_context_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn api_routes(
    app_state: std::sync::Arc<services::AppState>,
) -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route(
            "/courses/{course_id}/assignments",
            get(handlers::assignments::list_course_assignments)
                .post(handlers::assignments::create_assignment),
        )
        .route(
            "/courses/{course_id}/lectures",
            get(handlers::courses::list_course_lectures),
        )
        .route(
            "/courses/{course_id}/students",
            get(handlers::courses::list_course_students),
        )
        .route(
            "/instructor/courses",
            get(handlers::courses::list_instructor_courses),
        )
        .route(
            "/assignments/{assignment_id}",
            delete(handlers::assignments::delete_assignment),
        )
        .route(
            "/assignments/{assignment_id}/submissions",
            get(handlers::assignments::list_submissions)
                .post(handlers::assignments::submit_assignment),
        )
        .route(
            "/assignments/{assignment_id}/submissions/{submission_id}/marks",
            put(handlers::assignments::update_submission_marks),
        )
        .layer(middleware::from_fn_with_state(
            app_state,
            middlewares::auth::auth_middleware,
        ))
}

fn admin_routes(
    app_state: std::sync::Arc<services::AppState>,
) -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/stats", get(handlers::admin::get_stats))
        .route("/users", get(handlers::admin::list_users))
        .route(
            "/users/{user_id}/role",
            put(handlers::admin::update_user_role),
        )
        .route("/courses", post(handlers::admin::create_course))
        .route(
            "/courses/{course_id}",
            delete(handlers::admin::delete_course),
        )
        .route_layer(middleware::from_fn(
            middlewares::auth::admin_guard_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            app_state,
            middlewares::auth::auth_middleware,
        ))
}
