/// Lesson model and database operations
///
/// A lesson is one scheduled session between a student and a tutor.
///
/// # State Machine
///
/// ```text
/// scheduled → completed
/// scheduled → cancelled
/// ```
///
/// Completed and cancelled are terminal.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE lessons (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     student_id UUID NOT NULL REFERENCES students(id) ON DELETE CASCADE,
///     tutor_id UUID NOT NULL REFERENCES tutors(id) ON DELETE RESTRICT,
///     scheduled_at TIMESTAMPTZ NOT NULL,
///     kind VARCHAR(16) NOT NULL,
///     status VARCHAR(16) NOT NULL DEFAULT 'scheduled',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE UNIQUE INDEX lessons_tutor_slot_scheduled_idx
///     ON lessons (tutor_id, scheduled_at) WHERE status = 'scheduled';
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use uuid::Uuid;

const LESSON_COLUMNS: &str =
    "id, student_id, tutor_id, scheduled_at, kind, status, created_at, updated_at";

/// Kind of lesson
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonKind {
    /// Classroom theory
    Theoretical,

    /// Behind the wheel; requires an approved student
    Practical,
}

impl LessonKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LessonKind::Theoretical => "theoretical",
            LessonKind::Practical => "practical",
        }
    }

    /// Parses a kind, ignoring ASCII case
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "theoretical" => Some(LessonKind::Theoretical),
            "practical" => Some(LessonKind::Practical),
            _ => None,
        }
    }
}

impl TryFrom<String> for LessonKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        LessonKind::parse(&value).ok_or_else(|| format!("unknown lesson kind: {}", value))
    }
}

impl fmt::Display for LessonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lesson lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonStatus {
    /// Booked and not yet held
    Scheduled,

    /// Held and confirmed by the tutor
    Completed,

    /// Called off
    Cancelled,
}

impl LessonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LessonStatus::Scheduled => "scheduled",
            LessonStatus::Completed => "completed",
            LessonStatus::Cancelled => "cancelled",
        }
    }

    /// Parses a status, ignoring ASCII case
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "scheduled" => Some(LessonStatus::Scheduled),
            "completed" => Some(LessonStatus::Completed),
            "cancelled" => Some(LessonStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LessonStatus::Completed | LessonStatus::Cancelled)
    }

    /// Checks if transition to target status is valid
    pub fn can_transition_to(&self, target: LessonStatus) -> bool {
        matches!(
            (self, target),
            (LessonStatus::Scheduled, LessonStatus::Completed)
                | (LessonStatus::Scheduled, LessonStatus::Cancelled)
        )
    }
}

impl TryFrom<String> for LessonStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        LessonStatus::parse(&value).ok_or_else(|| format!("unknown lesson status: {}", value))
    }
}

impl fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lesson model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lesson {
    /// Unique lesson ID
    pub id: Uuid,

    /// Student attending the lesson
    pub student_id: Uuid,

    /// Tutor giving the lesson
    pub tutor_id: Uuid,

    /// Slot start (UTC, whole seconds)
    pub scheduled_at: DateTime<Utc>,

    /// Theoretical or practical
    #[sqlx(try_from = "String")]
    pub kind: LessonKind,

    /// Current lifecycle status
    #[sqlx(try_from = "String")]
    pub status: LessonStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a lesson (always created as scheduled)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLesson {
    pub student_id: Uuid,
    pub tutor_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub kind: LessonKind,
}

/// Input for changing a scheduled lesson
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLesson {
    /// New slot
    pub scheduled_at: Option<DateTime<Utc>>,

    /// New kind
    pub kind: Option<LessonKind>,
}

/// Filters for listing lessons; `None` means "any"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LessonFilter {
    pub student_id: Option<Uuid>,
    pub tutor_id: Option<Uuid>,
    pub status: Option<LessonStatus>,
}

impl LessonFilter {
    /// Whether a lesson passes every set filter
    pub fn matches(&self, lesson: &Lesson) -> bool {
        self.student_id.map_or(true, |id| lesson.student_id == id)
            && self.tutor_id.map_or(true, |id| lesson.tutor_id == id)
            && self.status.map_or(true, |status| lesson.status == status)
    }
}

impl Lesson {
    /// Inserts a scheduled lesson unless the tutor already has a scheduled
    /// lesson at exactly the same timestamp.
    ///
    /// The check and the insert are one statement, backed by the partial
    /// unique index on `(tutor_id, scheduled_at)`.
    ///
    /// # Returns
    ///
    /// The created lesson, or `None` if the slot is taken
    pub async fn create_if_free(pool: &PgPool, data: NewLesson) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO lessons (student_id, tutor_id, scheduled_at, kind)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (tutor_id, scheduled_at) WHERE status = 'scheduled' DO NOTHING
            RETURNING {}
            "#,
            LESSON_COLUMNS
        );

        sqlx::query_as::<_, Lesson>(&query)
            .bind(data.student_id)
            .bind(data.tutor_id)
            .bind(data.scheduled_at)
            .bind(data.kind.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Finds a lesson by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM lessons WHERE id = $1", LESSON_COLUMNS);

        sqlx::query_as::<_, Lesson>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists lessons ordered by slot, applying the optional filters
    pub async fn list(pool: &PgPool, filter: &LessonFilter) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {}
            FROM lessons
            WHERE ($1::uuid IS NULL OR student_id = $1)
              AND ($2::uuid IS NULL OR tutor_id = $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY scheduled_at ASC
            "#,
            LESSON_COLUMNS
        );

        sqlx::query_as::<_, Lesson>(&query)
            .bind(filter.student_id)
            .bind(filter.tutor_id)
            .bind(filter.status.map(|s| s.as_str()))
            .fetch_all(pool)
            .await
    }

    /// Whether the tutor has a scheduled lesson at exactly `at`
    pub async fn slot_taken(pool: &PgPool, tutor_id: Uuid, at: DateTime<Utc>) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM lessons
                WHERE tutor_id = $1 AND scheduled_at = $2 AND status = 'scheduled'
            )
            "#,
        )
        .bind(tutor_id)
        .bind(at)
        .fetch_one(pool)
        .await
    }

    /// Scheduled lessons of a tutor with `from <= scheduled_at < to`
    pub async fn scheduled_between(
        pool: &PgPool,
        tutor_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {}
            FROM lessons
            WHERE tutor_id = $1
              AND status = 'scheduled'
              AND scheduled_at >= $2
              AND scheduled_at < $3
            ORDER BY scheduled_at ASC
            "#,
            LESSON_COLUMNS
        );

        sqlx::query_as::<_, Lesson>(&query)
            .bind(tutor_id)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await
    }

    /// Moves a scheduled lesson to `target`
    ///
    /// Returns `None` if the lesson does not exist or is no longer scheduled.
    pub async fn transition_from_scheduled(
        pool: &PgPool,
        id: Uuid,
        target: LessonStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE lessons
            SET status = $2,
                updated_at = NOW()
            WHERE id = $1 AND status = 'scheduled'
            RETURNING {}
            "#,
            LESSON_COLUMNS
        );

        sqlx::query_as::<_, Lesson>(&query)
            .bind(id)
            .bind(target.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Updates slot and/or kind of a scheduled lesson
    ///
    /// A new slot that collides with another scheduled lesson of the same
    /// tutor fails with a unique violation.
    pub async fn update_scheduled(
        pool: &PgPool,
        id: Uuid,
        data: UpdateLesson,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE lessons
            SET scheduled_at = COALESCE($2, scheduled_at),
                kind = COALESCE($3, kind),
                updated_at = NOW()
            WHERE id = $1 AND status = 'scheduled'
            RETURNING {}
            "#,
            LESSON_COLUMNS
        );

        sqlx::query_as::<_, Lesson>(&query)
            .bind(id)
            .bind(data.scheduled_at)
            .bind(data.kind.map(|k| k.as_str()))
            .fetch_optional(pool)
            .await
    }

    /// Deletes a lesson by ID
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM lessons WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts completed lessons of a student, optionally of one kind
    pub async fn count_completed(
        pool: &PgPool,
        student_id: Uuid,
        kind: Option<LessonKind>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM lessons
            WHERE student_id = $1
              AND status = 'completed'
              AND ($2::text IS NULL OR kind = $2)
            "#,
        )
        .bind(student_id)
        .bind(kind.map(|k| k.as_str()))
        .fetch_one(pool)
        .await
    }

    /// Counts lessons of any status that reference a tutor
    pub async fn count_for_tutor(pool: &PgPool, tutor_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM lessons WHERE tutor_id = $1")
            .bind(tutor_id)
            .fetch_one(pool)
            .await
    }
}
