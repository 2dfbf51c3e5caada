/// Lesson endpoints
///
/// # Endpoints
///
/// - `POST   /lessons` - Same rules as `POST /students/:id/schedule-lesson`
/// - `GET    /lessons?student_id=&tutor_id=&status=`
/// - `GET    /lessons/:id`
/// - `PUT    /lessons/:id` - Move or re-kind a scheduled lesson
/// - `DELETE /lessons/:id`
/// - `GET    /lessons/available-slots?tutorId=&date=YYYY-MM-DD`
///
/// Query parameters accept `camelCase` as well as `snake_case`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath, ApiQuery},
    routes::students::default_kind,
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, NaiveDate, Utc};
use drivingschool_shared::{
    models::lesson::{Lesson, LessonFilter, LessonKind, LessonStatus, UpdateLesson},
    services::scheduling::ScheduleLesson,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateLessonRequest {
    #[serde(alias = "studentId")]
    pub student_id: Uuid,

    #[serde(alias = "tutorId")]
    pub tutor_id: Uuid,

    #[serde(alias = "scheduledAt")]
    pub scheduled_at: DateTime<Utc>,

    #[serde(default = "default_kind")]
    pub kind: LessonKind,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLessonRequest {
    #[serde(default, alias = "scheduledAt")]
    pub scheduled_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub kind: Option<LessonKind>,
}

#[derive(Debug, Deserialize)]
pub struct ListLessonsQuery {
    #[serde(alias = "studentId")]
    pub student_id: Option<Uuid>,

    #[serde(alias = "tutorId")]
    pub tutor_id: Option<Uuid>,

    pub status: Option<String>,
}

impl ListLessonsQuery {
    fn into_filter(self) -> ApiResult<LessonFilter> {
        let status = self
            .status
            .as_deref()
            .map(|raw| {
                LessonStatus::parse(raw)
                    .ok_or_else(|| ApiError::BadRequest(format!("Unknown lesson status: {}", raw)))
            })
            .transpose()?;

        Ok(LessonFilter {
            student_id: self.student_id,
            tutor_id: self.tutor_id,
            status,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct AvailableSlotsQuery {
    #[serde(alias = "tutorId")]
    pub tutor_id: Uuid,

    pub date: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AvailableSlotsResponse {
    pub tutor_id: Uuid,
    pub date: NaiveDate,
    pub slots: Vec<DateTime<Utc>>,
}

pub async fn create_lesson(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateLessonRequest>,
) -> ApiResult<(StatusCode, Json<Lesson>)> {
    let lesson = state
        .school
        .schedule_lesson(ScheduleLesson {
            student_id: req.student_id,
            tutor_id: req.tutor_id,
            scheduled_at: req.scheduled_at,
            kind: req.kind,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(lesson)))
}

pub async fn list_lessons(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListLessonsQuery>,
) -> ApiResult<Json<Vec<Lesson>>> {
    let filter = query.into_filter()?;
    Ok(Json(state.school.list_lessons(&filter).await?))
}

pub async fn get_lesson(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Lesson>> {
    Ok(Json(state.school.get_lesson(id).await?))
}

/// # Errors
///
/// - 400 if the lesson is completed or cancelled
/// - 403 when switching to practical before approval
/// - 409 if the new time is taken
pub async fn update_lesson(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateLessonRequest>,
) -> ApiResult<Json<Lesson>> {
    let changes = UpdateLesson {
        scheduled_at: req.scheduled_at,
        kind: req.kind,
    };

    Ok(Json(state.school.update_lesson(id, changes).await?))
}

pub async fn delete_lesson(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.school.delete_lesson(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Free whole-hour slots within opening hours
pub async fn available_slots(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AvailableSlotsQuery>,
) -> ApiResult<Json<AvailableSlotsResponse>> {
    let slots = state
        .school
        .available_slots(query.tutor_id, query.date)
        .await?;

    Ok(Json(AvailableSlotsResponse {
        tutor_id: query.tutor_id,
        date: query.date,
        slots,
    }))
}
