/// Driving school business rules
///
/// [`School`] is the single entry point the HTTP layer talks to. It owns the
/// store and the two best-effort collaborators, and every rule about
/// students, tutors and lessons is enforced here rather than in handlers.
///
/// # Modules
///
/// - `students` / `tutors`: registration, login and CRUD
/// - `scheduling`: booking, slot availability and suggestions
/// - `validation`: completing or cancelling lessons, student approval
/// - `certificate`: certificate issuance for approved students
/// - `notification` / `calendar`: collaborator traits with default impls
/// - `seed`: demo data for empty databases
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use drivingschool_shared::services::School;
/// use drivingschool_shared::store::MemoryStore;
///
/// let school = School::new(Arc::new(MemoryStore::new()));
/// ```

use std::sync::Arc;
use uuid::Uuid;

use crate::models::lesson::Lesson;
use crate::models::student::Student;
use crate::models::tutor::Tutor;
use crate::store::Store;

pub mod calendar;
pub mod certificate;
pub mod error;
pub mod notification;
pub mod scheduling;
pub mod seed;
pub mod students;
pub mod tutors;
pub mod validation;

pub use calendar::{CalendarService, NoopCalendar};
pub use error::{ServiceError, ServiceResult};
pub use notification::{LogNotifier, Notifier};

/// Completed theoretical lessons needed for approval
pub const APPROVAL_THRESHOLD: i64 = 20;

/// Trims `value`, rejecting it when nothing is left
pub(crate) fn required_text(field: &str, value: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation(format!("{} must not be blank", field)));
    }
    Ok(trimmed.to_string())
}

/// Facade over the store and collaborators
#[derive(Clone)]
pub struct School {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    calendar: Arc<dyn CalendarService>,
}

impl School {
    /// School with the logging notifier and an always-free calendar
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_collaborators(store, Arc::new(LogNotifier), Arc::new(NoopCalendar))
    }

    pub fn with_collaborators(
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        calendar: Arc<dyn CalendarService>,
    ) -> Self {
        Self {
            store,
            notifier,
            calendar,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Checks the backing store is reachable
    pub async fn ping(&self) -> ServiceResult<()> {
        Ok(self.store.ping().await?)
    }

    pub(crate) async fn require_student(&self, id: Uuid) -> ServiceResult<Student> {
        self.store
            .find_student(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Student {} not found", id)))
    }

    pub(crate) async fn require_tutor(&self, id: Uuid) -> ServiceResult<Tutor> {
        self.store
            .find_tutor(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Tutor {} not found", id)))
    }

    pub(crate) async fn require_lesson(&self, id: Uuid) -> ServiceResult<Lesson> {
        self.store
            .find_lesson(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Lesson {} not found", id)))
    }
}
