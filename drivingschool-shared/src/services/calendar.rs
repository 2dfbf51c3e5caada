/// External calendar collaborator
///
/// A tutor's external calendar can veto a slot, and every booked lesson is
/// pushed to it as an event. Errors never block scheduling: an unreachable
/// calendar counts as free and a failed insert is only logged.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

use crate::models::lesson::Lesson;
use crate::models::student::Student;
use crate::models::tutor::Tutor;

/// Length of every lesson
pub fn lesson_duration() -> Duration {
    Duration::hours(1)
}

#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error("Calendar unavailable: {0}")]
    Unavailable(String),

    #[error("Calendar rejected the request: {0}")]
    Rejected(String),
}

/// Event pushed to the calendar for a booked lesson
#[derive(Debug, Clone, Serialize)]
pub struct CalendarEvent {
    pub summary: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub attendees: Vec<String>,
}

impl CalendarEvent {
    pub fn for_lesson(lesson: &Lesson, student: &Student, tutor: &Tutor) -> Self {
        let mut attendees = vec![student.email.clone()];
        attendees.extend(tutor.email.clone());

        Self {
            summary: format!("{} lesson", lesson.kind),
            description: format!("{} with {}", student.name, tutor.name),
            start: lesson.scheduled_at,
            end: lesson.scheduled_at + lesson_duration(),
            attendees,
        }
    }
}

#[async_trait]
pub trait CalendarService: Send + Sync {
    /// Whether the tutor's calendar has nothing in `[start, end)`
    async fn is_free(
        &self,
        tutor: &Tutor,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, CalendarError>;

    async fn add_event(&self, event: &CalendarEvent) -> Result<(), CalendarError>;
}

/// Calendar that is always free and stores nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCalendar;

#[async_trait]
impl CalendarService for NoopCalendar {
    async fn is_free(
        &self,
        _tutor: &Tutor,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<bool, CalendarError> {
        Ok(true)
    }

    async fn add_event(&self, event: &CalendarEvent) -> Result<(), CalendarError> {
        debug!(summary = %event.summary, start = %event.start, "Calendar event skipped");
        Ok(())
    }
}
