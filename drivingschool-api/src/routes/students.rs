/// Student endpoints
///
/// # Endpoints
///
/// - `POST   /students` - Create a student (no token issued)
/// - `GET    /students?page=&limit=&name=` - Paginated listing
/// - `GET    /students/me` - The authenticated student
/// - `GET    /students/:id`
/// - `PUT    /students/:id`
/// - `DELETE /students/:id` - Also deletes the student's lessons
/// - `GET    /students/:id/lessons`
/// - `POST   /students/:id/schedule-lesson`
/// - `POST   /students/:id/request-certificate`
///
/// Any authenticated student may act on any student record.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiJson, ApiPath, ApiQuery, ValidatedJson},
    routes::auth::RegisterRequest,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use drivingschool_shared::{
    auth::context::AuthContext,
    models::{
        lesson::{Lesson, LessonKind},
        student::Student,
    },
    services::{
        certificate::Certificate,
        scheduling::ScheduleLesson,
        students::{StudentChanges, StudentPage, DEFAULT_PAGE_SIZE},
    },
};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ListStudentsQuery {
    #[validate(range(min = 1, message = "Page starts at 1"))]
    pub page: Option<i64>,

    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<i64>,

    /// Case-insensitive substring of the name
    pub name: Option<String>,
}

/// Partial update; absent fields are left alone
///
/// `phone: null` clears the phone number.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStudentRequest {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,
}

/// Booking request; the student comes from the path
#[derive(Debug, Deserialize)]
pub struct ScheduleLessonRequest {
    #[serde(alias = "tutorId")]
    pub tutor_id: Uuid,

    #[serde(alias = "scheduledAt")]
    pub scheduled_at: DateTime<Utc>,

    #[serde(default = "default_kind")]
    pub kind: LessonKind,
}

pub(crate) fn default_kind() -> LessonKind {
    LessonKind::Theoretical
}

/// Present-but-null becomes `Some(None)`, absent stays `None`
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trims surrounding whitespace before length rules run
pub(crate) fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|s| s.trim().to_string())
}

pub(crate) fn trimmed_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(|s| s.map(|s| s.trim().to_string()))
}

pub async fn create_student(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Student>)> {
    let student = state.school.register_student(req.into()).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

pub async fn list_students(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListStudentsQuery>,
) -> ApiResult<Json<StudentPage>> {
    query.validate()?;

    let page = state
        .school
        .list_students(
            query.page.unwrap_or(1),
            query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            query.name.as_deref(),
        )
        .await?;

    Ok(Json(page))
}

pub async fn me(Extension(auth): Extension<AuthContext>) -> Json<Student> {
    Json(auth.student)
}

pub async fn get_student(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Student>> {
    Ok(Json(state.school.get_student(id).await?))
}

pub async fn update_student(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateStudentRequest>,
) -> ApiResult<Json<Student>> {
    let changes = StudentChanges {
        name: req.name,
        email: req.email,
        password: req.password,
        phone: req.phone,
    };

    Ok(Json(state.school.update_student(id, changes).await?))
}

pub async fn delete_student(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.school.delete_student(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn student_lessons(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<Lesson>>> {
    Ok(Json(state.school.student_lessons(id).await?))
}

/// Books a lesson for the student in the path
///
/// # Errors
///
/// - 404 if the student or tutor does not exist
/// - 403 for a practical lesson before approval
/// - 409 `slot_conflict` with up to three alternative times
pub async fn schedule_lesson(
    State(state): State<AppState>,
    ApiPath(student_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ScheduleLessonRequest>,
) -> ApiResult<(StatusCode, Json<Lesson>)> {
    let lesson = state
        .school
        .schedule_lesson(ScheduleLesson {
            student_id,
            tutor_id: req.tutor_id,
            scheduled_at: req.scheduled_at,
            kind: req.kind,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(lesson)))
}

/// Issues a certificate; 403 until the student is approved
pub async fn request_certificate(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Certificate>> {
    Ok(Json(state.school.issue_certificate(id).await?))
}
