/// Course completion certificates
///
/// Certificates are generated on request and not stored; asking twice
/// yields two certificates with different ids.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::{School, ServiceError, ServiceResult};

#[derive(Debug, Clone, Serialize)]
pub struct Certificate {
    /// `CERT-` followed by 32 hex digits
    pub id: String,
    pub student_id: Uuid,
    pub student_name: String,

    /// Completed lessons of any kind
    pub completed_lessons: i64,
    pub issued_at: DateTime<Utc>,
}

impl School {
    /// Issues a certificate to an approved student
    ///
    /// # Errors
    ///
    /// - `NotFound` if the student does not exist
    /// - `PolicyViolation` if the student is not approved
    pub async fn issue_certificate(&self, student_id: Uuid) -> ServiceResult<Certificate> {
        let student = self.require_student(student_id).await?;
        if !student.approved {
            return Err(ServiceError::PolicyViolation(
                "Student must be approved to receive a certificate".to_string(),
            ));
        }

        let completed_lessons = self.store.count_completed_lessons(student.id, None).await?;
        let certificate = Certificate {
            id: format!("CERT-{}", Uuid::new_v4().simple()),
            student_id: student.id,
            student_name: student.name,
            completed_lessons,
            issued_at: Utc::now(),
        };

        info!(student_id = %student_id, certificate_id = %certificate.id, "Certificate issued");
        Ok(certificate)
    }
}
