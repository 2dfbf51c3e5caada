/// Student registration and login
///
/// # Endpoints
///
/// - `POST /students/register` - Create an account and get a token
/// - `POST /students/login` - Exchange email and password for a token
///
/// Tokens are HS256 JWTs valid for `JWT_EXPIRATION_HOURS`. There is no
/// refresh; clients log in again after expiry.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::ValidatedJson,
    routes::students::trimmed,
};
use axum::{extract::State, http::StatusCode, Json};
use drivingschool_shared::{
    models::student::Student,
    services::students::RegisterStudent,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(max = 32, message = "Phone must be at most 32 characters"))]
    pub phone: Option<String>,
}

impl From<RegisterRequest> for RegisterStudent {
    fn from(req: RegisterRequest) -> Self {
        RegisterStudent {
            name: req.name,
            email: req.email,
            password: req.password,
            phone: req.phone,
        }
    }
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Register and login response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub student: Student,

    pub access_token: String,

    /// Always `Bearer`
    pub token_type: String,

    /// Seconds until `access_token` expires
    pub expires_in: i64,
}

impl TokenResponse {
    fn issue(state: &AppState, student: Student) -> ApiResult<Self> {
        let access_token = state.issue_token(student.id)?;

        Ok(Self {
            student,
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: state.token_ttl_seconds(),
        })
    }
}

/// Register handler
///
/// # Errors
///
/// - 422 if a field fails validation
/// - 409 if the email is already registered
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    let student = state.school.register_student(req.into()).await?;
    let response = TokenResponse::issue(&state, student)?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Login handler
///
/// Unknown email and wrong password give the same 401.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let student = state.school.authenticate(&req.email, &req.password).await?;
    tracing::info!(student_id = %student.id, "Student logged in");

    Ok(Json(TokenResponse::issue(&state, student)?))
}
