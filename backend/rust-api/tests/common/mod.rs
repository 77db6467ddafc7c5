#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use mongodb::bson::{doc, oid::ObjectId};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use lms_api::{
    config::Config,
    create_router,
    middlewares::auth::{JwtClaims, JwtService},
    models::UserRole,
    services::AppState,
};

pub struct TestEnv {
    pub app: Router,
    pub mongo: mongodb::Database,
    pub config: Config,
}

pub async fn create_test_env() -> TestEnv {
    // Initialize tracing for tests
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    // Load test environment from .env.test
    dotenvy::from_filename(".env.test").ok();

    let config = Config::load().expect("Failed to load test configuration");

    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri)
        .await
        .expect("Failed to connect to test MongoDB");

    let app_state = Arc::new(
        AppState::new(config.clone(), mongo_client.clone())
            .await
            .expect("Failed to initialize test app state"),
    );

    let mongo = mongo_client.database(&config.mongo_database);

    TestEnv {
        app: create_router(app_state),
        mongo,
        config,
    }
}

impl TestEnv {
    pub fn token_for(&self, user_id: &ObjectId, role: UserRole) -> String {
        let service = JwtService::new(&self.config.jwt_secret);
        let claims = JwtClaims {
            sub: user_id.to_hex(),
            role,
            exp: (Utc::now().timestamp() + 3600) as usize,
            iat: Utc::now().timestamp() as usize,
        };
        service
            .generate_token(claims)
            .expect("Failed to sign test token")
    }

    /// Seeds a user document; each test works with fresh ObjectIds so
    /// parallel test runs never collide.
    pub async fn seed_user(&self, name: &str, role: UserRole) -> ObjectId {
        self.seed_enrolled_user(name, role, &[]).await
    }

    pub async fn seed_enrolled_user(
        &self,
        name: &str,
        role: UserRole,
        subscription: &[ObjectId],
    ) -> ObjectId {
        let id = ObjectId::new();
        self.mongo
            .collection::<mongodb::bson::Document>("users")
            .insert_one(doc! {
                "_id": id,
                "name": name,
                "email": format!("{}-{}@example.com", name, id.to_hex()),
                "role": role.as_str(),
                "subscription": subscription.to_vec(),
            })
            .await
            .expect("Failed to seed user");
        id
    }

    pub async fn seed_course(&self, assigned_to: Option<ObjectId>) -> ObjectId {
        let id = ObjectId::new();
        let mut course = doc! {
            "_id": id,
            "title": "Rust 101",
            "description": "Introductory course",
            "category": "programming",
            "createdBy": "seed",
        };
        if let Some(instructor) = assigned_to {
            course.insert("assignedTo", instructor);
        }
        self.mongo
            .collection::<mongodb::bson::Document>("courses")
            .insert_one(course)
            .await
            .expect("Failed to seed course");
        id
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let body = match body {
            Some(value) => Body::from(serde_json::to_string(&value).unwrap()),
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }
}

/// A well-formed two-question payload used across tests: an mcq worth 2
/// and a true/false worth 1.
pub fn sample_questions() -> Value {
    serde_json::json!([
        {
            "type": "mcq",
            "questionText": "2+2=?",
            "options": [
                { "text": "4", "isCorrect": true },
                { "text": "5", "isCorrect": false }
            ],
            "maxMarks": 2
        },
        {
            "type": "true-false",
            "questionText": "Sky is blue",
            "options": [
                { "text": "True", "isCorrect": true },
                { "text": "False", "isCorrect": false }
            ],
            "maxMarks": 1
        }
    ])
}
