/// Lesson validation by tutors
///
/// A tutor closes a scheduled lesson as completed or cancelled. Every
/// completion recounts the student's completed theoretical lessons and
/// approves the student once the count reaches [`APPROVAL_THRESHOLD`].
/// Approval never reverts.

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::{School, ServiceError, ServiceResult, APPROVAL_THRESHOLD};
use crate::models::lesson::{Lesson, LessonKind, LessonStatus};

/// Result of validating a lesson
#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutcome {
    pub lesson: Lesson,

    /// Completed theoretical lessons of the student, after this validation
    pub completed_lessons: i64,

    /// Student approval flag, after this validation
    pub student_approved: bool,
}

/// Parses a requested final status, ignoring case
///
/// Only `completed` and `cancelled` are accepted.
pub fn parse_final_status(status: &str) -> ServiceResult<LessonStatus> {
    LessonStatus::parse(status.trim())
        .filter(LessonStatus::is_terminal)
        .ok_or_else(|| {
            ServiceError::Validation(format!(
                "Invalid status '{}': expected 'completed' or 'cancelled'",
                status
            ))
        })
}

impl School {
    /// Marks a scheduled lesson completed or cancelled
    ///
    /// # Errors
    ///
    /// - `Validation` if `status` is not `completed` or `cancelled`
    /// - `NotFound` if the lesson does not exist
    /// - `InvalidTransition` if the lesson is not scheduled, including when
    ///   a concurrent validation got there first
    pub async fn validate_lesson(&self, lesson_id: Uuid, status: &str) -> ServiceResult<ValidationOutcome> {
        let target = parse_final_status(status)?;
        let lesson = self.require_lesson(lesson_id).await?;

        if !lesson.status.can_transition_to(target) {
            return Err(ServiceError::InvalidTransition(format!(
                "Lesson is already {}",
                lesson.status
            )));
        }

        let lesson = self
            .store
            .transition_lesson(lesson_id, target)
            .await?
            .ok_or_else(|| ServiceError::InvalidTransition("Lesson is no longer scheduled".to_string()))?;

        info!(lesson_id = %lesson.id, status = %lesson.status, "Lesson validated");

        let student = self.require_student(lesson.student_id).await?;
        let completed = self
            .store
            .count_completed_lessons(student.id, Some(LessonKind::Theoretical))
            .await?;

        let mut approved = student.approved;
        if target == LessonStatus::Completed && !approved && completed >= APPROVAL_THRESHOLD {
            self.store.set_student_approved(student.id).await?;
            approved = true;
            info!(student_id = %student.id, completed, "Student approved");
        }

        Ok(ValidationOutcome {
            lesson,
            completed_lessons: completed,
            student_approved: approved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_final_status() {
        assert_eq!(parse_final_status("completed").unwrap(), LessonStatus::Completed);
        assert_eq!(parse_final_status("CANCELLED").unwrap(), LessonStatus::Cancelled);
        assert!(matches!(parse_final_status("scheduled"), Err(ServiceError::Validation(_))));
        assert!(matches!(parse_final_status("done"), Err(ServiceError::Validation(_))));
    }
}
