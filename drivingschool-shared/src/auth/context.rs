/// Authenticated caller attached to each protected request
///
/// The API's auth middleware builds this after validating the bearer token
/// and loading the student it names; handlers read it from the request
/// extensions.

use serde::Serialize;
use uuid::Uuid;

use crate::models::student::Student;

#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    /// The student the token was issued to, as loaded for this request
    pub student: Student,
}

impl AuthContext {
    pub fn new(student: Student) -> Self {
        Self { student }
    }

    pub fn student_id(&self) -> Uuid {
        self.student.id
    }
}
