/// Persistence seam for the driving school
///
/// Business rules live in [`crate::services`] and talk to storage only
/// through the [`Store`] trait. Two backends implement it:
///
/// - [`PgStore`]: PostgreSQL via the model functions in [`crate::models`]
/// - [`MemoryStore`]: in-process maps behind a single lock, for tests and demos
///
/// Both backends honor the same contract:
///
/// - Student emails are unique; a duplicate fails with [`StoreError::Conflict`].
/// - [`Store::insert_lesson_if_free`] is atomic: of two concurrent inserts for
///   the same tutor and timestamp, exactly one succeeds.
/// - [`Store::transition_lesson`] only moves lessons that are still
///   `scheduled`.
/// - Deleting a tutor that lessons still reference fails with
///   [`StoreError::Conflict`]; deleting a student removes their lessons.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::lesson::{Lesson, LessonFilter, LessonKind, LessonStatus, NewLesson, UpdateLesson};
use crate::models::student::{CreateStudent, Student, StudentQuery, UpdateStudent};
use crate::models::tutor::{CreateTutor, Tutor, UpdateTutor};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Store error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness or referential rule rejected the write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Maps constraint violations to [`StoreError::Conflict`]
    pub(crate) fn from_constraint(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() || db_err.is_foreign_key_violation() {
                return StoreError::Conflict(message.to_string());
            }
        }
        StoreError::Database(err)
    }
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage operations the services rely on
#[async_trait]
pub trait Store: Send + Sync {
    /// Verifies the backend is reachable
    async fn ping(&self) -> StoreResult<()>;

    // Students

    async fn create_student(&self, data: CreateStudent) -> StoreResult<Student>;

    async fn find_student(&self, id: Uuid) -> StoreResult<Option<Student>>;

    async fn find_student_by_email(&self, email: &str) -> StoreResult<Option<Student>>;

    /// Page of students ordered by name
    async fn list_students(&self, query: &StudentQuery) -> StoreResult<Vec<Student>>;

    async fn count_students(&self, name: Option<&str>) -> StoreResult<i64>;

    async fn update_student(&self, id: Uuid, data: UpdateStudent) -> StoreResult<Option<Student>>;

    async fn set_student_approved(&self, id: Uuid) -> StoreResult<Option<Student>>;

    async fn delete_student(&self, id: Uuid) -> StoreResult<bool>;

    // Tutors

    async fn create_tutor(&self, data: CreateTutor) -> StoreResult<Tutor>;

    async fn find_tutor(&self, id: Uuid) -> StoreResult<Option<Tutor>>;

    async fn list_tutors(&self) -> StoreResult<Vec<Tutor>>;

    async fn count_tutors(&self) -> StoreResult<i64>;

    async fn update_tutor(&self, id: Uuid, data: UpdateTutor) -> StoreResult<Option<Tutor>>;

    async fn delete_tutor(&self, id: Uuid) -> StoreResult<bool>;

    /// Lessons of any status referencing the tutor
    async fn count_lessons_for_tutor(&self, tutor_id: Uuid) -> StoreResult<i64>;

    // Lessons

    /// Inserts a scheduled lesson unless the tutor already has a scheduled
    /// lesson at the same timestamp; `None` means the slot was taken.
    async fn insert_lesson_if_free(&self, data: NewLesson) -> StoreResult<Option<Lesson>>;

    async fn find_lesson(&self, id: Uuid) -> StoreResult<Option<Lesson>>;

    async fn list_lessons(&self, filter: &LessonFilter) -> StoreResult<Vec<Lesson>>;

    async fn is_slot_taken(&self, tutor_id: Uuid, at: DateTime<Utc>) -> StoreResult<bool>;

    /// Scheduled lessons of a tutor with `from <= scheduled_at < to`
    async fn scheduled_lessons_between(
        &self,
        tutor_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<Lesson>>;

    /// Moves a scheduled lesson to `target`; `None` if it is missing or no
    /// longer scheduled.
    async fn transition_lesson(&self, id: Uuid, target: LessonStatus) -> StoreResult<Option<Lesson>>;

    /// Changes a scheduled lesson; `None` if it is missing or no longer
    /// scheduled. A slot collision fails with [`StoreError::Conflict`].
    async fn update_lesson(&self, id: Uuid, data: UpdateLesson) -> StoreResult<Option<Lesson>>;

    async fn delete_lesson(&self, id: Uuid) -> StoreResult<bool>;

    /// Completed lessons of a student, optionally restricted to one kind
    async fn count_completed_lessons(
        &self,
        student_id: Uuid,
        kind: Option<LessonKind>,
    ) -> StoreResult<i64>;
}
