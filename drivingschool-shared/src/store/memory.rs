/// In-memory [`Store`]
///
/// Every operation takes the same lock, so check-and-write sequences such as
/// the conditional lesson insert are atomic. Used by the test suites and by
/// local demos that run without PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::lesson::{Lesson, LessonFilter, LessonKind, LessonStatus, NewLesson, UpdateLesson};
use crate::models::student::{CreateStudent, Student, StudentQuery, UpdateStudent};
use crate::models::tutor::{CreateTutor, Tutor, UpdateTutor};

#[derive(Default)]
struct Tables {
    students: HashMap<Uuid, Student>,
    tutors: HashMap<Uuid, Tutor>,
    lessons: HashMap<Uuid, Lesson>,
}

impl Tables {
    fn slot_taken(&self, tutor_id: Uuid, at: DateTime<Utc>, except: Option<Uuid>) -> bool {
        self.lessons.values().any(|l| {
            l.tutor_id == tutor_id
                && l.scheduled_at == at
                && l.status == LessonStatus::Scheduled
                && Some(l.id) != except
        })
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.students
            .values()
            .any(|s| s.email == email && Some(s.id) != except)
    }

    fn students_matching(&self, name: Option<&str>) -> Vec<&Student> {
        let needle = name.map(|n| n.to_lowercase());
        let mut students: Vec<&Student> = self
            .students
            .values()
            .filter(|s| match &needle {
                Some(n) => s.name.to_lowercase().contains(n.as_str()),
                None => true,
            })
            .collect();
        students.sort_by(|a, b| a.name.cmp(&b.name).then(a.created_at.cmp(&b.created_at)));
        students
    }
}

/// Store keeping everything in process memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_student(&self, data: CreateStudent) -> StoreResult<Student> {
        let mut tables = self.tables.lock().await;
        if tables.email_taken(&data.email, None) {
            return Err(StoreError::Conflict("email already registered".to_string()));
        }

        let now = Utc::now();
        let student = Student {
            id: Uuid::new_v4(),
            name: data.name,
            email: data.email,
            password_hash: data.password_hash,
            phone: data.phone,
            approved: false,
            created_at: now,
            updated_at: now,
        };
        tables.students.insert(student.id, student.clone());
        Ok(student)
    }

    async fn find_student(&self, id: Uuid) -> StoreResult<Option<Student>> {
        Ok(self.tables.lock().await.students.get(&id).cloned())
    }

    async fn find_student_by_email(&self, email: &str) -> StoreResult<Option<Student>> {
        let tables = self.tables.lock().await;
        Ok(tables.students.values().find(|s| s.email == email).cloned())
    }

    async fn list_students(&self, query: &StudentQuery) -> StoreResult<Vec<Student>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .students_matching(query.name.as_deref())
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count_students(&self, name: Option<&str>) -> StoreResult<i64> {
        Ok(self.tables.lock().await.students_matching(name).len() as i64)
    }

    async fn update_student(&self, id: Uuid, data: UpdateStudent) -> StoreResult<Option<Student>> {
        let mut tables = self.tables.lock().await;
        if let Some(email) = &data.email {
            if tables.email_taken(email, Some(id)) {
                return Err(StoreError::Conflict("email already registered".to_string()));
            }
        }

        let Some(student) = tables.students.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = data.name {
            student.name = name;
        }
        if let Some(email) = data.email {
            student.email = email;
        }
        if let Some(hash) = data.password_hash {
            student.password_hash = hash;
        }
        if let Some(phone) = data.phone {
            student.phone = phone;
        }
        student.updated_at = Utc::now();
        Ok(Some(student.clone()))
    }

    async fn set_student_approved(&self, id: Uuid) -> StoreResult<Option<Student>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.students.get_mut(&id).map(|student| {
            student.approved = true;
            student.updated_at = Utc::now();
            student.clone()
        }))
    }

    async fn delete_student(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        let removed = tables.students.remove(&id).is_some();
        if removed {
            tables.lessons.retain(|_, l| l.student_id != id);
        }
        Ok(removed)
    }

    async fn create_tutor(&self, data: CreateTutor) -> StoreResult<Tutor> {
        let now = Utc::now();
        let tutor = Tutor {
            id: Uuid::new_v4(),
            name: data.name,
            specialty: data.specialty,
            email: data.email,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().await.tutors.insert(tutor.id, tutor.clone());
        Ok(tutor)
    }

    async fn find_tutor(&self, id: Uuid) -> StoreResult<Option<Tutor>> {
        Ok(self.tables.lock().await.tutors.get(&id).cloned())
    }

    async fn list_tutors(&self) -> StoreResult<Vec<Tutor>> {
        let tables = self.tables.lock().await;
        let mut tutors: Vec<Tutor> = tables.tutors.values().cloned().collect();
        tutors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tutors)
    }

    async fn count_tutors(&self) -> StoreResult<i64> {
        Ok(self.tables.lock().await.tutors.len() as i64)
    }

    async fn update_tutor(&self, id: Uuid, data: UpdateTutor) -> StoreResult<Option<Tutor>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.tutors.get_mut(&id).map(|tutor| {
            if let Some(name) = data.name {
                tutor.name = name;
            }
            if let Some(specialty) = data.specialty {
                tutor.specialty = specialty;
            }
            if let Some(email) = data.email {
                tutor.email = email;
            }
            tutor.updated_at = Utc::now();
            tutor.clone()
        }))
    }

    async fn delete_tutor(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        if tables.lessons.values().any(|l| l.tutor_id == id) {
            return Err(StoreError::Conflict("tutor still has lessons".to_string()));
        }
        Ok(tables.tutors.remove(&id).is_some())
    }

    async fn count_lessons_for_tutor(&self, tutor_id: Uuid) -> StoreResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables.lessons.values().filter(|l| l.tutor_id == tutor_id).count() as i64)
    }

    async fn insert_lesson_if_free(&self, data: NewLesson) -> StoreResult<Option<Lesson>> {
        let mut tables = self.tables.lock().await;
        if !tables.students.contains_key(&data.student_id) || !tables.tutors.contains_key(&data.tutor_id) {
            return Err(StoreError::Conflict(
                "student or tutor no longer exists".to_string(),
            ));
        }
        if tables.slot_taken(data.tutor_id, data.scheduled_at, None) {
            return Ok(None);
        }

        let now = Utc::now();
        let lesson = Lesson {
            id: Uuid::new_v4(),
            student_id: data.student_id,
            tutor_id: data.tutor_id,
            scheduled_at: data.scheduled_at,
            kind: data.kind,
            status: LessonStatus::Scheduled,
            created_at: now,
            updated_at: now,
        };
        tables.lessons.insert(lesson.id, lesson.clone());
        Ok(Some(lesson))
    }

    async fn find_lesson(&self, id: Uuid) -> StoreResult<Option<Lesson>> {
        Ok(self.tables.lock().await.lessons.get(&id).cloned())
    }

    async fn list_lessons(&self, filter: &LessonFilter) -> StoreResult<Vec<Lesson>> {
        let tables = self.tables.lock().await;
        let mut lessons: Vec<Lesson> = tables
            .lessons
            .values()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect();
        lessons.sort_by_key(|l| l.scheduled_at);
        Ok(lessons)
    }

    async fn is_slot_taken(&self, tutor_id: Uuid, at: DateTime<Utc>) -> StoreResult<bool> {
        Ok(self.tables.lock().await.slot_taken(tutor_id, at, None))
    }

    async fn scheduled_lessons_between(
        &self,
        tutor_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<Lesson>> {
        let tables = self.tables.lock().await;
        let mut lessons: Vec<Lesson> = tables
            .lessons
            .values()
            .filter(|l| {
                l.tutor_id == tutor_id
                    && l.status == LessonStatus::Scheduled
                    && l.scheduled_at >= from
                    && l.scheduled_at < to
            })
            .cloned()
            .collect();
        lessons.sort_by_key(|l| l.scheduled_at);
        Ok(lessons)
    }

    async fn transition_lesson(&self, id: Uuid, target: LessonStatus) -> StoreResult<Option<Lesson>> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .lessons
            .get_mut(&id)
            .filter(|l| l.status == LessonStatus::Scheduled)
            .map(|lesson| {
                lesson.status = target;
                lesson.updated_at = Utc::now();
                lesson.clone()
            }))
    }

    async fn update_lesson(&self, id: Uuid, data: UpdateLesson) -> StoreResult<Option<Lesson>> {
        let mut tables = self.tables.lock().await;
        let Some(current) = tables.lessons.get(&id).filter(|l| l.status == LessonStatus::Scheduled) else {
            return Ok(None);
        };

        let tutor_id = current.tutor_id;
        if let Some(at) = data.scheduled_at {
            if tables.slot_taken(tutor_id, at, Some(id)) {
                return Err(StoreError::Conflict(
                    "tutor already has a lesson at that time".to_string(),
                ));
            }
        }

        Ok(tables.lessons.get_mut(&id).map(|lesson| {
            if let Some(at) = data.scheduled_at {
                lesson.scheduled_at = at;
            }
            if let Some(kind) = data.kind {
                lesson.kind = kind;
            }
            lesson.updated_at = Utc::now();
            lesson.clone()
        }))
    }

    async fn delete_lesson(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.tables.lock().await.lessons.remove(&id).is_some())
    }

    async fn count_completed_lessons(
        &self,
        student_id: Uuid,
        kind: Option<LessonKind>,
    ) -> StoreResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .lessons
            .values()
            .filter(|l| {
                l.student_id == student_id
                    && l.status == LessonStatus::Completed
                    && kind.map_or(true, |k| l.kind == k)
            })
            .count() as i64)
    }
}
