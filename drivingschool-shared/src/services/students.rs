/// Student registration, login and CRUD

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::{required_text, School, ServiceError, ServiceResult};
use crate::auth::password::{hash_password, verify_password};
use crate::models::lesson::{Lesson, LessonFilter};
use crate::models::student::{CreateStudent, Student, StudentQuery, UpdateStudent};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// New student with a plaintext password
#[derive(Debug, Clone)]
pub struct RegisterStudent {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

/// Changes to a student; the password is plaintext and re-hashed
#[derive(Debug, Clone, Default)]
pub struct StudentChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<Option<String>>,
}

/// One page of the student listing
#[derive(Debug, Clone, Serialize)]
pub struct StudentPage {
    pub students: Vec<Student>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total: i64,
}

/// Emails are compared trimmed and lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl School {
    /// Creates a student account
    ///
    /// # Errors
    ///
    /// - `Validation` if the name is blank
    /// - `Conflict` if the email is already registered
    pub async fn register_student(&self, data: RegisterStudent) -> ServiceResult<Student> {
        let name = required_text("name", &data.name)?;
        let password_hash = hash_password(&data.password)?;

        let student = self
            .store
            .create_student(CreateStudent {
                name,
                email: normalize_email(&data.email),
                password_hash,
                phone: data.phone,
            })
            .await?;

        info!(student_id = %student.id, "Student registered");
        Ok(student)
    }

    /// Checks email and password, returning the student on success
    pub async fn authenticate(&self, email: &str, password: &str) -> ServiceResult<Student> {
        let Some(student) = self
            .store
            .find_student_by_email(&normalize_email(email))
            .await?
        else {
            warn!("Login attempt for unknown email");
            return Err(ServiceError::InvalidCredentials);
        };

        if !verify_password(password, &student.password_hash)? {
            warn!(student_id = %student.id, "Login attempt with wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        Ok(student)
    }

    pub async fn get_student(&self, id: Uuid) -> ServiceResult<Student> {
        self.require_student(id).await
    }

    /// Lists students a page at a time
    ///
    /// `page` starts at 1 and `limit` is clamped to `1..=MAX_PAGE_SIZE`.
    /// `name` filters by case-insensitive substring. A page whose offset
    /// does not fit in an `i64` is a `Validation` error.
    pub async fn list_students(
        &self,
        page: i64,
        limit: i64,
        name: Option<&str>,
    ) -> ServiceResult<StudentPage> {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        let offset = (page - 1)
            .checked_mul(limit)
            .ok_or_else(|| ServiceError::Validation(format!("Page {} is out of range", page)))?;

        let total = self.store.count_students(name).await?;
        let students = self
            .store
            .list_students(&StudentQuery {
                name: name.map(str::to_string),
                limit,
                offset,
            })
            .await?;

        Ok(StudentPage {
            students,
            current_page: page,
            total_pages: (total + limit - 1) / limit,
            total,
        })
    }

    pub async fn update_student(&self, id: Uuid, changes: StudentChanges) -> ServiceResult<Student> {
        let name = changes
            .name
            .as_deref()
            .map(|n| required_text("name", n))
            .transpose()?;

        let password_hash = match &changes.password {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        let update = UpdateStudent {
            name,
            email: changes.email.as_deref().map(normalize_email),
            password_hash,
            phone: changes.phone,
        };

        self.store
            .update_student(id, update)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Student {} not found", id)))
    }

    /// Deletes a student together with their lessons
    pub async fn delete_student(&self, id: Uuid) -> ServiceResult<()> {
        if !self.store.delete_student(id).await? {
            return Err(ServiceError::NotFound(format!("Student {} not found", id)));
        }

        info!(student_id = %id, "Student deleted");
        Ok(())
    }

    /// Lessons of one student, ordered by slot
    pub async fn student_lessons(&self, id: Uuid) -> ServiceResult<Vec<Lesson>> {
        self.require_student(id).await?;

        Ok(self
            .store
            .list_lessons(&LessonFilter {
                student_id: Some(id),
                ..Default::default()
            })
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ana@Example.COM "), "ana@example.com");
    }
}
