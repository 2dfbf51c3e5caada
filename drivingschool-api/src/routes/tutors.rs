/// Tutor endpoints
///
/// # Endpoints
///
/// - `POST   /tutors`
/// - `GET    /tutors`
/// - `GET    /tutors/:id`
/// - `PUT    /tutors/:id`
/// - `DELETE /tutors/:id` - 409 while any lesson references the tutor
/// - `GET    /tutors/:id/availability?date=YYYY-MM-DD`
/// - `POST   /tutors/lessons/:id/validate` - Complete or cancel a lesson

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiJson, ApiPath, ApiQuery, ValidatedJson},
    routes::students::{nullable, trimmed, trimmed_opt},
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::NaiveDate;
use drivingschool_shared::{
    models::tutor::{CreateTutor, Tutor, UpdateTutor},
    services::{scheduling::TutorAvailability, validation::ValidationOutcome},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTutorRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    pub name: String,

    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 255, message = "Specialty must be 1 to 255 characters"))]
    pub specialty: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTutorRequest {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 255, message = "Specialty must be 1 to 255 characters"))]
    pub specialty: Option<String>,

    /// `null` removes the email
    #[serde(default, deserialize_with = "nullable")]
    pub email: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

/// `completed` or `cancelled`, any case
#[derive(Debug, Deserialize)]
pub struct ValidateLessonRequest {
    pub status: String,
}

pub async fn create_tutor(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateTutorRequest>,
) -> ApiResult<(StatusCode, Json<Tutor>)> {
    let tutor = state
        .school
        .create_tutor(CreateTutor {
            name: req.name,
            specialty: req.specialty,
            email: req.email,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(tutor)))
}

pub async fn list_tutors(State(state): State<AppState>) -> ApiResult<Json<Vec<Tutor>>> {
    Ok(Json(state.school.list_tutors().await?))
}

pub async fn get_tutor(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Tutor>> {
    Ok(Json(state.school.get_tutor(id).await?))
}

pub async fn update_tutor(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateTutorRequest>,
) -> ApiResult<Json<Tutor>> {
    let changes = UpdateTutor {
        name: req.name,
        specialty: req.specialty,
        email: req.email,
    };

    Ok(Json(state.school.update_tutor(id, changes).await?))
}

pub async fn delete_tutor(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.school.delete_tutor(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Busy intervals of the tutor on one UTC day
pub async fn availability(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<AvailabilityQuery>,
) -> ApiResult<Json<TutorAvailability>> {
    Ok(Json(state.school.tutor_availability(id, query.date).await?))
}

/// Marks a scheduled lesson completed or cancelled
///
/// The response carries the student's completed-lesson count and whether
/// this validation left them approved.
///
/// # Errors
///
/// - 400 for an unknown status or a lesson that is no longer scheduled
/// - 404 if the lesson does not exist
pub async fn validate_lesson(
    State(state): State<AppState>,
    ApiPath(lesson_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ValidateLessonRequest>,
) -> ApiResult<Json<ValidationOutcome>> {
    Ok(Json(
        state.school.validate_lesson(lesson_id, &req.status).await?,
    ))
}
