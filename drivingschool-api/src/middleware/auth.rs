/// Bearer-token gate for student routes
///
/// Reads `Authorization: Bearer <jwt>`, validates the token and loads the
/// student it names. On success an [`AuthContext`] is stored in the request
/// extensions for handlers to pick up with `Extension<AuthContext>`.
///
/// Every failure is a 401:
///
/// - header missing or not a bearer token
/// - bad signature, wrong issuer, expired or not yet valid
/// - the student has been deleted since the token was issued

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use drivingschool_shared::auth::{
    context::AuthContext,
    jwt::{extract_bearer_token, validate_token},
};
use drivingschool_shared::services::ServiceError;

use crate::{app::AppState, error::ApiError};

pub async fn student_auth_layer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = extract_bearer_token(header_value)
        .ok_or_else(|| ApiError::Unauthorized("Expected a Bearer token".to_string()))?;

    let claims = validate_token(token, state.jwt_secret())?;

    let student = match state.school.get_student(claims.sub).await {
        Ok(student) => student,
        Err(ServiceError::NotFound(_)) => {
            tracing::debug!(student_id = %claims.sub, "Token for unknown student");
            return Err(ApiError::Unauthorized(
                "Student no longer exists".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    request.extensions_mut().insert(AuthContext::new(student));

    Ok(next.run(request).await)
}
