/// Student notifications
///
/// Scheduling tells the student about a booked lesson or, when the slot is
/// taken, about the alternatives on offer. Delivery is best-effort: the
/// services log a failed notification and carry on.
///
/// [`LogNotifier`] is the only shipped implementation; it writes each
/// message as a structured `tracing` event under the `notifications` target.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::models::lesson::Lesson;
use crate::models::student::Student;
use crate::models::tutor::Tutor;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Sends messages to students
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A lesson was booked
    async fn lesson_scheduled(
        &self,
        student: &Student,
        tutor: &Tutor,
        lesson: &Lesson,
    ) -> Result<(), NotifyError>;

    /// The requested slot was taken; `suggestions` may be empty
    async fn slot_conflict(
        &self,
        student: &Student,
        tutor: &Tutor,
        requested: DateTime<Utc>,
        suggestions: &[DateTime<Utc>],
    ) -> Result<(), NotifyError>;
}

/// Notifier that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn lesson_scheduled(
        &self,
        student: &Student,
        tutor: &Tutor,
        lesson: &Lesson,
    ) -> Result<(), NotifyError> {
        info!(
            target: "notifications",
            to = %student.email,
            lesson_id = %lesson.id,
            tutor = %tutor.name,
            kind = %lesson.kind,
            scheduled_at = %lesson.scheduled_at,
            "Lesson scheduled"
        );
        Ok(())
    }

    async fn slot_conflict(
        &self,
        student: &Student,
        tutor: &Tutor,
        requested: DateTime<Utc>,
        suggestions: &[DateTime<Utc>],
    ) -> Result<(), NotifyError> {
        let alternatives: Vec<String> = suggestions.iter().map(|s| s.to_rfc3339()).collect();

        info!(
            target: "notifications",
            to = %student.email,
            tutor = %tutor.name,
            requested = %requested,
            alternatives = ?alternatives,
            "Requested slot unavailable"
        );
        Ok(())
    }
}
