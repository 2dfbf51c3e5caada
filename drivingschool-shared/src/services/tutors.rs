use tracing::info;
use uuid::Uuid;

use super::{required_text, School, ServiceError, ServiceResult};
use crate::models::tutor::{CreateTutor, Tutor, UpdateTutor};

impl School {
    /// Name and specialty are trimmed and must not be blank
    pub async fn create_tutor(&self, data: CreateTutor) -> ServiceResult<Tutor> {
        let data = CreateTutor {
            name: required_text("name", &data.name)?,
            specialty: required_text("specialty", &data.specialty)?,
            email: data.email,
        };

        let tutor = self.store.create_tutor(data).await?;
        info!(tutor_id = %tutor.id, "Tutor created");
        Ok(tutor)
    }

    pub async fn get_tutor(&self, id: Uuid) -> ServiceResult<Tutor> {
        self.require_tutor(id).await
    }

    pub async fn list_tutors(&self) -> ServiceResult<Vec<Tutor>> {
        Ok(self.store.list_tutors().await?)
    }

    pub async fn update_tutor(&self, id: Uuid, mut data: UpdateTutor) -> ServiceResult<Tutor> {
        data.name = data.name.as_deref().map(|n| required_text("name", n)).transpose()?;
        data.specialty = data
            .specialty
            .as_deref()
            .map(|s| required_text("specialty", s))
            .transpose()?;

        self.store
            .update_tutor(id, data)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Tutor {} not found", id)))
    }

    /// Deletes a tutor that no lesson references
    ///
    /// # Errors
    ///
    /// - `NotFound` if the tutor does not exist
    /// - `Conflict` if any lesson, in any status, references the tutor
    pub async fn delete_tutor(&self, id: Uuid) -> ServiceResult<()> {
        self.require_tutor(id).await?;

        let lessons = self.store.count_lessons_for_tutor(id).await?;
        if lessons > 0 {
            return Err(ServiceError::Conflict(format!(
                "Tutor has {} lesson(s) and cannot be deleted",
                lessons
            )));
        }

        if !self.store.delete_tutor(id).await? {
            return Err(ServiceError::NotFound(format!("Tutor {} not found", id)));
        }

        info!(tutor_id = %id, "Tutor deleted");
        Ok(())
    }
}
