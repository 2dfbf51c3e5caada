/// PostgreSQL-backed [`Store`]
///
/// Thin delegation to the model functions; the only logic here is mapping
/// constraint violations to [`StoreError::Conflict`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::db::pool::health_check;
use crate::models::lesson::{Lesson, LessonFilter, LessonKind, LessonStatus, NewLesson, UpdateLesson};
use crate::models::student::{CreateStudent, Student, StudentQuery, UpdateStudent};
use crate::models::tutor::{CreateTutor, Tutor, UpdateTutor};

/// Store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await?;
        Ok(())
    }

    async fn create_student(&self, data: CreateStudent) -> StoreResult<Student> {
        Student::create(&self.pool, data)
            .await
            .map_err(|e| StoreError::from_constraint(e, "email already registered"))
    }

    async fn find_student(&self, id: Uuid) -> StoreResult<Option<Student>> {
        Ok(Student::find_by_id(&self.pool, id).await?)
    }

    async fn find_student_by_email(&self, email: &str) -> StoreResult<Option<Student>> {
        Ok(Student::find_by_email(&self.pool, email).await?)
    }

    async fn list_students(&self, query: &StudentQuery) -> StoreResult<Vec<Student>> {
        Ok(Student::list(&self.pool, query).await?)
    }

    async fn count_students(&self, name: Option<&str>) -> StoreResult<i64> {
        Ok(Student::count(&self.pool, name).await?)
    }

    async fn update_student(&self, id: Uuid, data: UpdateStudent) -> StoreResult<Option<Student>> {
        Student::update(&self.pool, id, data)
            .await
            .map_err(|e| StoreError::from_constraint(e, "email already registered"))
    }

    async fn set_student_approved(&self, id: Uuid) -> StoreResult<Option<Student>> {
        Ok(Student::set_approved(&self.pool, id).await?)
    }

    async fn delete_student(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Student::delete(&self.pool, id).await?)
    }

    async fn create_tutor(&self, data: CreateTutor) -> StoreResult<Tutor> {
        Ok(Tutor::create(&self.pool, data).await?)
    }

    async fn find_tutor(&self, id: Uuid) -> StoreResult<Option<Tutor>> {
        Ok(Tutor::find_by_id(&self.pool, id).await?)
    }

    async fn list_tutors(&self) -> StoreResult<Vec<Tutor>> {
        Ok(Tutor::list(&self.pool).await?)
    }

    async fn count_tutors(&self) -> StoreResult<i64> {
        Ok(Tutor::count(&self.pool).await?)
    }

    async fn update_tutor(&self, id: Uuid, data: UpdateTutor) -> StoreResult<Option<Tutor>> {
        Ok(Tutor::update(&self.pool, id, data).await?)
    }

    async fn delete_tutor(&self, id: Uuid) -> StoreResult<bool> {
        Tutor::delete(&self.pool, id)
            .await
            .map_err(|e| StoreError::from_constraint(e, "tutor still has lessons"))
    }

    async fn count_lessons_for_tutor(&self, tutor_id: Uuid) -> StoreResult<i64> {
        Ok(Lesson::count_for_tutor(&self.pool, tutor_id).await?)
    }

    async fn insert_lesson_if_free(&self, data: NewLesson) -> StoreResult<Option<Lesson>> {
        let lesson = Lesson::create_if_free(&self.pool, data)
            .await
            .map_err(|e| StoreError::from_constraint(e, "student or tutor no longer exists"))?;

        if lesson.is_none() {
            debug!("Conditional lesson insert found the slot taken");
        }

        Ok(lesson)
    }

    async fn find_lesson(&self, id: Uuid) -> StoreResult<Option<Lesson>> {
        Ok(Lesson::find_by_id(&self.pool, id).await?)
    }

    async fn list_lessons(&self, filter: &LessonFilter) -> StoreResult<Vec<Lesson>> {
        Ok(Lesson::list(&self.pool, filter).await?)
    }

    async fn is_slot_taken(&self, tutor_id: Uuid, at: DateTime<Utc>) -> StoreResult<bool> {
        Ok(Lesson::slot_taken(&self.pool, tutor_id, at).await?)
    }

    async fn scheduled_lessons_between(
        &self,
        tutor_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<Lesson>> {
        Ok(Lesson::scheduled_between(&self.pool, tutor_id, from, to).await?)
    }

    async fn transition_lesson(&self, id: Uuid, target: LessonStatus) -> StoreResult<Option<Lesson>> {
        Ok(Lesson::transition_from_scheduled(&self.pool, id, target).await?)
    }

    async fn update_lesson(&self, id: Uuid, data: UpdateLesson) -> StoreResult<Option<Lesson>> {
        Lesson::update_scheduled(&self.pool, id, data)
            .await
            .map_err(|e| StoreError::from_constraint(e, "tutor already has a lesson at that time"))
    }

    async fn delete_lesson(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Lesson::delete(&self.pool, id).await?)
    }

    async fn count_completed_lessons(
        &self,
        student_id: Uuid,
        kind: Option<LessonKind>,
    ) -> StoreResult<i64> {
        Ok(Lesson::count_completed(&self.pool, student_id, kind).await?)
    }
}
