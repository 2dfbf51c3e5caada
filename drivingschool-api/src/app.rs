/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use drivingschool_api::{app::{build_router, AppState}, config::Config};
/// use drivingschool_shared::{db::pool::create_pool, services::School, store::PgStore};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.pool_config()).await?;
/// let school = School::new(Arc::new(PgStore::new(pool)));
/// let app = build_router(AppState::new(school, config));
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{
        auth::student_auth_layer,
        security::{security_headers, SecurityHeaders},
    },
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use drivingschool_shared::auth::jwt::{self, Claims, JwtError};
use drivingschool_shared::services::School;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use uuid::Uuid;

/// Shared application state
///
/// Cloned per request by axum's `State` extractor; both fields are
/// reference-counted.
#[derive(Clone)]
pub struct AppState {
    /// Business rules over the configured store
    pub school: School,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(school: School, config: Config) -> Self {
        Self {
            school,
            config: Arc::new(config),
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Token lifetime in seconds
    pub fn token_ttl_seconds(&self) -> i64 {
        self.config.jwt.expiration_hours * 3600
    }

    /// Signs an access token for a student
    pub fn issue_token(&self, student_id: Uuid) -> Result<String, JwtError> {
        let claims = Claims::new(
            student_id,
            chrono::Duration::hours(self.config.jwt.expiration_hours),
        );
        jwt::create_token(&claims, self.jwt_secret())
    }
}

/// Builds the router with all routes and middleware
///
/// ```text
/// /health                                   public
/// /students/register, /students/login       public
/// /students[/me|/:id[/lessons|/schedule-lesson|/request-certificate]]
/// /tutors[/:id[/availability]]
/// /tutors/lessons/:id/validate
/// /lessons[/available-slots|/:id]
/// ```
///
/// Everything except the public routes sits behind the bearer-token gate.
///
/// # Middleware Stack
///
/// Outermost first: security headers, CORS, request tracing, then the auth
/// gate on protected routes.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/students/register", post(routes::auth::register))
        .route("/students/login", post(routes::auth::login));

    let student_routes = Router::new()
        .route(
            "/students",
            post(routes::students::create_student).get(routes::students::list_students),
        )
        .route("/students/me", get(routes::students::me))
        .route(
            "/students/:id",
            get(routes::students::get_student)
                .put(routes::students::update_student)
                .delete(routes::students::delete_student),
        )
        .route("/students/:id/lessons", get(routes::students::student_lessons))
        .route(
            "/students/:id/schedule-lesson",
            post(routes::students::schedule_lesson),
        )
        .route(
            "/students/:id/request-certificate",
            post(routes::students::request_certificate),
        );

    let tutor_routes = Router::new()
        .route(
            "/tutors",
            post(routes::tutors::create_tutor).get(routes::tutors::list_tutors),
        )
        .route(
            "/tutors/:id",
            get(routes::tutors::get_tutor)
                .put(routes::tutors::update_tutor)
                .delete(routes::tutors::delete_tutor),
        )
        .route("/tutors/:id/availability", get(routes::tutors::availability))
        .route(
            "/tutors/lessons/:id/validate",
            post(routes::tutors::validate_lesson),
        );

    let lesson_routes = Router::new()
        .route(
            "/lessons",
            post(routes::lessons::create_lesson).get(routes::lessons::list_lessons),
        )
        .route(
            "/lessons/available-slots",
            get(routes::lessons::available_slots),
        )
        .route(
            "/lessons/:id",
            get(routes::lessons::get_lesson)
                .put(routes::lessons::update_lesson)
                .delete(routes::lessons::delete_lesson),
        );

    let protected_routes = Router::new()
        .merge(student_routes)
        .merge(tutor_routes)
        .merge(lesson_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            student_auth_layer,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(middleware::from_fn_with_state(
            SecurityHeaders::new(state.config.api.production),
            security_headers,
        ))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
