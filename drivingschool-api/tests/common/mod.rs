/// Shared setup for the HTTP integration tests
///
/// Each test gets its own router over a fresh in-memory store, so tests run
/// in parallel without a database. A student is registered up front and its
/// bearer token is ready in `TestContext::token`.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use drivingschool_api::app::{build_router, AppState};
use drivingschool_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use drivingschool_shared::auth::jwt::{create_token, Claims};
use drivingschool_shared::models::student::{CreateStudent, Student};
use drivingschool_shared::services::School;
use drivingschool_shared::store::{MemoryStore, Store};
use serde_json::Value;
use std::sync::Arc;
use tower::Service;
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            expiration_hours: 24,
        },
        seed_demo_data: false,
    }
}

pub struct TestContext {
    pub app: Router,
    pub school: School,
    pub student: Student,
    pub token: String,
}

impl TestContext {
    pub async fn new() -> Self {
        let school = School::new(Arc::new(MemoryStore::new()));
        let student = insert_student(&school, "Test Student").await;
        let token = token_for(student.id);
        let app = build_router(AppState::new(school.clone(), test_config()));

        Self {
            app,
            school,
            student,
            token,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        self.school.store()
    }

    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Authenticated JSON request
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let response = self.raw(method, uri, Some(&self.auth_header()), body).await;
        into_json(response).await
    }

    /// Request without credentials
    pub async fn send_anonymous(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.raw(method, uri, None, body).await;
        into_json(response).await
    }

    pub async fn raw(
        &self,
        method: Method,
        uri: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.app.clone().call(request).await.unwrap()
    }

    /// Creates a tutor through the API and returns its id
    pub async fn create_tutor(&self, name: &str) -> Uuid {
        let (status, body) = self
            .send(
                Method::POST,
                "/tutors",
                Some(serde_json::json!({ "name": name, "specialty": "Category B" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body_id(&body)
    }

    /// Books a lesson for the context student
    pub async fn schedule(&self, tutor_id: Uuid, at: &str, kind: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            &format!("/students/{}/schedule-lesson", self.student.id),
            Some(serde_json::json!({ "tutorId": tutor_id, "scheduledAt": at, "kind": kind })),
        )
        .await
    }
}

/// Inserts a student straight into the store, skipping password hashing
pub async fn insert_student(school: &School, name: &str) -> Student {
    school
        .store()
        .create_student(CreateStudent {
            name: name.to_string(),
            email: format!("{}@example.com", Uuid::new_v4()),
            password_hash: "not-a-real-hash".to_string(),
            phone: None,
        })
        .await
        .unwrap()
}

pub fn token_for(student_id: Uuid) -> String {
    let claims = Claims::new(student_id, chrono::Duration::hours(1));
    create_token(&claims, TEST_SECRET).unwrap()
}

pub fn body_id(body: &Value) -> Uuid {
    body["id"].as_str().unwrap().parse().unwrap()
}

async fn into_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, body)
}
