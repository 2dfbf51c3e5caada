/// Lesson booking and slot availability
///
/// # Booking flow
///
/// ```text
/// schedule_lesson
///   ├─> load student and tutor (NotFound)
///   ├─> practical lesson needs an approved student (PolicyViolation)
///   ├─> slot check: store, then tutor calendar
///   │     └─> taken: suggest alternatives, notify, SlotConflict
///   ├─> conditional insert (losing a race is also SlotConflict)
///   └─> notify student, push calendar event (failures logged)
/// ```
///
/// Slots are compared by exact timestamp, truncated to whole seconds. Two
/// lessons one minute apart do not conflict.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, SubsecRound, TimeZone, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::calendar::{lesson_duration, CalendarEvent};
use super::{School, ServiceError, ServiceResult};
use crate::models::lesson::{Lesson, LessonFilter, LessonKind, LessonStatus, NewLesson, UpdateLesson};
use crate::models::student::Student;
use crate::models::tutor::Tutor;

/// Alternatives offered when a slot is taken
pub const MAX_SUGGESTIONS: usize = 3;

/// Hourly probes made while looking for alternatives
pub const MAX_SUGGESTION_PROBES: i64 = 24;

/// First bookable hour of the day (UTC)
pub const OPENING_HOUR: u32 = 8;

/// Hour at which the last bookable slot has ended (UTC)
pub const CLOSING_HOUR: u32 = 18;

/// Request to book a lesson
#[derive(Debug, Clone)]
pub struct ScheduleLesson {
    pub student_id: Uuid,
    pub tutor_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub kind: LessonKind,
}

/// A lesson occupying a tutor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusyInterval {
    pub lesson_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A tutor's scheduled lessons on one day
#[derive(Debug, Clone, Serialize)]
pub struct TutorAvailability {
    pub tutor_id: Uuid,
    pub date: NaiveDate,
    pub busy: Vec<BusyInterval>,
}

/// Drops sub-second precision so stored and requested slots compare equal
pub fn normalize_slot(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(0)
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Start and end of a UTC day; the last representable date has no end
fn day_bounds(date: NaiveDate) -> ServiceResult<(DateTime<Utc>, DateTime<Utc>)> {
    let next = date
        .succ_opt()
        .ok_or_else(|| ServiceError::Validation(format!("Date {} is out of range", date)))?;
    Ok((midnight(date), midnight(next)))
}

/// Rejects times too close to the end of the calendar to book or suggest around
fn check_bookable(at: DateTime<Utc>) -> ServiceResult<DateTime<Utc>> {
    at.checked_add_signed(Duration::hours(MAX_SUGGESTION_PROBES + 1))
        .map(|_| at)
        .ok_or_else(|| ServiceError::Validation(format!("Time {} is out of range", at)))
}

impl School {
    /// Books a lesson
    ///
    /// # Errors
    ///
    /// - `Validation` if the time is at the very end of the calendar
    /// - `NotFound` if the student or tutor does not exist
    /// - `PolicyViolation` for a practical lesson and an unapproved student
    /// - `SlotConflict` with up to [`MAX_SUGGESTIONS`] alternatives if the
    ///   tutor is busy at that time
    pub async fn schedule_lesson(&self, request: ScheduleLesson) -> ServiceResult<Lesson> {
        let scheduled_at = check_bookable(normalize_slot(request.scheduled_at))?;
        let student = self.require_student(request.student_id).await?;
        let tutor = self.require_tutor(request.tutor_id).await?;

        if request.kind == LessonKind::Practical && !student.approved {
            return Err(ServiceError::PolicyViolation(
                "Student must be approved before booking practical lessons".to_string(),
            ));
        }

        if !self.is_slot_available(&tutor, scheduled_at).await? {
            return Err(self.slot_conflict(&student, &tutor, scheduled_at).await);
        }

        let inserted = self
            .store
            .insert_lesson_if_free(NewLesson {
                student_id: student.id,
                tutor_id: tutor.id,
                scheduled_at,
                kind: request.kind,
            })
            .await?;

        let Some(lesson) = inserted else {
            debug!(tutor_id = %tutor.id, %scheduled_at, "Slot taken between check and insert");
            return Err(self.slot_conflict(&student, &tutor, scheduled_at).await);
        };

        info!(
            lesson_id = %lesson.id,
            student_id = %student.id,
            tutor_id = %tutor.id,
            kind = %lesson.kind,
            scheduled_at = %lesson.scheduled_at,
            "Lesson scheduled"
        );

        self.announce_lesson(&student, &tutor, &lesson).await;
        Ok(lesson)
    }

    /// Whether the tutor can take a lesson at `at`
    ///
    /// Busy if a scheduled lesson exists at that exact timestamp or the
    /// tutor's calendar says so. An unreachable calendar counts as free.
    pub async fn is_slot_available(&self, tutor: &Tutor, at: DateTime<Utc>) -> ServiceResult<bool> {
        if self.store.is_slot_taken(tutor.id, at).await? {
            return Ok(false);
        }

        let end = at
            .checked_add_signed(lesson_duration())
            .ok_or_else(|| ServiceError::Validation(format!("Time {} is out of range", at)))?;

        match self.calendar.is_free(tutor, at, end).await {
            Ok(free) => Ok(free),
            Err(e) => {
                warn!(tutor_id = %tutor.id, error = %e, "Calendar check failed, treating slot as free");
                Ok(true)
            }
        }
    }

    /// Free slots after `requested`, an hour apart
    pub async fn suggest_slots(
        &self,
        tutor: &Tutor,
        requested: DateTime<Utc>,
    ) -> ServiceResult<Vec<DateTime<Utc>>> {
        let mut suggestions = Vec::with_capacity(MAX_SUGGESTIONS);

        for step in 1..=MAX_SUGGESTION_PROBES {
            let Some(candidate) = requested.checked_add_signed(Duration::hours(step)) else {
                break;
            };
            if self.is_slot_available(tutor, candidate).await? {
                suggestions.push(candidate);
                if suggestions.len() == MAX_SUGGESTIONS {
                    break;
                }
            }
        }

        Ok(suggestions)
    }

    /// Whole-hour slots from [`OPENING_HOUR`] to [`CLOSING_HOUR`] on `date`
    /// that the tutor can still take
    pub async fn available_slots(
        &self,
        tutor_id: Uuid,
        date: NaiveDate,
    ) -> ServiceResult<Vec<DateTime<Utc>>> {
        let tutor = self.require_tutor(tutor_id).await?;
        let (day_start, _) = day_bounds(date)?;

        let mut slots = Vec::new();
        for hour in OPENING_HOUR..CLOSING_HOUR {
            let slot = day_start + Duration::hours(i64::from(hour));
            if self.is_slot_available(&tutor, slot).await? {
                slots.push(slot);
            }
        }

        Ok(slots)
    }

    /// The tutor's scheduled lessons on `date`, each lasting one hour
    pub async fn tutor_availability(
        &self,
        tutor_id: Uuid,
        date: NaiveDate,
    ) -> ServiceResult<TutorAvailability> {
        self.require_tutor(tutor_id).await?;
        let (from, to) = day_bounds(date)?;

        let busy = self
            .store
            .scheduled_lessons_between(tutor_id, from, to)
            .await?
            .into_iter()
            .map(|lesson| BusyInterval {
                lesson_id: lesson.id,
                start: lesson.scheduled_at,
                end: lesson.scheduled_at + lesson_duration(),
            })
            .collect();

        Ok(TutorAvailability {
            tutor_id,
            date,
            busy,
        })
    }

    pub async fn get_lesson(&self, id: Uuid) -> ServiceResult<Lesson> {
        self.require_lesson(id).await
    }

    pub async fn list_lessons(&self, filter: &LessonFilter) -> ServiceResult<Vec<Lesson>> {
        Ok(self.store.list_lessons(filter).await?)
    }

    /// Moves or re-kinds a lesson that is still scheduled
    ///
    /// # Errors
    ///
    /// - `NotFound` if the lesson does not exist
    /// - `InvalidTransition` if it is already completed or cancelled
    /// - `PolicyViolation` when switching to practical for an unapproved student
    /// - `Conflict` if the new slot is taken
    pub async fn update_lesson(&self, id: Uuid, mut changes: UpdateLesson) -> ServiceResult<Lesson> {
        let lesson = self.require_lesson(id).await?;
        if lesson.status != LessonStatus::Scheduled {
            return Err(ServiceError::InvalidTransition(format!(
                "Lesson is {} and can no longer be changed",
                lesson.status
            )));
        }

        if changes.kind == Some(LessonKind::Practical) {
            let student = self.require_student(lesson.student_id).await?;
            if !student.approved {
                return Err(ServiceError::PolicyViolation(
                    "Student must be approved before booking practical lessons".to_string(),
                ));
            }
        }

        changes.scheduled_at = changes
            .scheduled_at
            .map(|at| check_bookable(normalize_slot(at)))
            .transpose()?;
        if let Some(at) = changes.scheduled_at.filter(|at| *at != lesson.scheduled_at) {
            let tutor = self.require_tutor(lesson.tutor_id).await?;
            if !self.is_slot_available(&tutor, at).await? {
                return Err(ServiceError::Conflict(
                    "Tutor already has a lesson at that time".to_string(),
                ));
            }
        }

        self.store.update_lesson(id, changes).await?.ok_or_else(|| {
            ServiceError::InvalidTransition("Lesson is no longer scheduled".to_string())
        })
    }

    pub async fn delete_lesson(&self, id: Uuid) -> ServiceResult<()> {
        if !self.store.delete_lesson(id).await? {
            return Err(ServiceError::NotFound(format!("Lesson {} not found", id)));
        }

        info!(lesson_id = %id, "Lesson deleted");
        Ok(())
    }

    async fn slot_conflict(
        &self,
        student: &Student,
        tutor: &Tutor,
        requested: DateTime<Utc>,
    ) -> ServiceError {
        let suggestions = match self.suggest_slots(tutor, requested).await {
            Ok(suggestions) => suggestions,
            Err(e) => return e,
        };

        info!(
            tutor_id = %tutor.id,
            %requested,
            suggestions = suggestions.len(),
            "Requested slot unavailable"
        );

        if let Err(e) = self
            .notifier
            .slot_conflict(student, tutor, requested, &suggestions)
            .await
        {
            warn!(student_id = %student.id, error = %e, "Failed to send conflict notification");
        }

        ServiceError::SlotConflict {
            requested,
            suggestions,
        }
    }

    async fn announce_lesson(&self, student: &Student, tutor: &Tutor, lesson: &Lesson) {
        if let Err(e) = self.notifier.lesson_scheduled(student, tutor, lesson).await {
            warn!(lesson_id = %lesson.id, error = %e, "Failed to send scheduling notification");
        }

        let event = CalendarEvent::for_lesson(lesson, student, tutor);
        if let Err(e) = self.calendar.add_event(&event).await {
            warn!(lesson_id = %lesson.id, error = %e, "Failed to add calendar event");
        }
    }
}
