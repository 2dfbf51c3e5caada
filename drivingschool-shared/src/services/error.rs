use chrono::{DateTime, Utc};

use crate::auth::password::PasswordError;
use crate::store::StoreError;

/// Errors raised by the driving school services
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Referenced entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// Input that parsed but is not acceptable, e.g. an unknown lesson status
    #[error("{0}")]
    Validation(String),

    /// Email unknown or password wrong
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// A business rule forbids the request for this student
    #[error("{0}")]
    PolicyViolation(String),

    /// Lesson is not in a state that allows the change
    #[error("{0}")]
    InvalidTransition(String),

    /// The tutor already has a lesson at the requested time
    #[error("Tutor is not available at {requested}")]
    SlotConflict {
        requested: DateTime<Utc>,
        suggestions: Vec<DateTime<Utc>>,
    },

    /// Uniqueness or referential rule, e.g. duplicate email
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(message) => ServiceError::Conflict(message),
            other => ServiceError::Store(other),
        }
    }
}

/// Service result type alias
pub type ServiceResult<T> = Result<T, ServiceError>;
