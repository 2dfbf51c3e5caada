/// Demo data for a fresh installation
///
/// Seeds two tutors, two students (password `password123`) and one
/// theoretical lesson for each student, tomorrow at 10:00 and 14:00 UTC.
/// Runs only while the store has no tutors, so restarting is harmless.

use chrono::{Duration, NaiveTime, TimeZone, Utc};
use tracing::info;

use super::scheduling::ScheduleLesson;
use super::students::RegisterStudent;
use super::{School, ServiceResult};
use crate::models::lesson::LessonKind;
use crate::models::tutor::CreateTutor;

pub const DEMO_PASSWORD: &str = "password123";

impl School {
    /// Inserts demo data if there are no tutors yet
    ///
    /// Returns whether anything was inserted.
    pub async fn seed_demo_data(&self) -> ServiceResult<bool> {
        if self.store.count_tutors().await? > 0 {
            info!("Store already has tutors, skipping demo seed");
            return Ok(false);
        }

        let joao = self
            .create_tutor(CreateTutor {
                name: "João Silva".to_string(),
                specialty: "Theory".to_string(),
                email: Some("joao.silva@autoescola.example".to_string()),
            })
            .await?;
        let maria = self
            .create_tutor(CreateTutor {
                name: "Maria Santos".to_string(),
                specialty: "Practical driving".to_string(),
                email: Some("maria.santos@autoescola.example".to_string()),
            })
            .await?;

        let pedro = self
            .register_student(RegisterStudent {
                name: "Pedro Oliveira".to_string(),
                email: "pedro@example.com".to_string(),
                password: DEMO_PASSWORD.to_string(),
                phone: None,
            })
            .await?;
        let ana = self
            .register_student(RegisterStudent {
                name: "Ana Costa".to_string(),
                email: "ana@example.com".to_string(),
                password: DEMO_PASSWORD.to_string(),
                phone: None,
            })
            .await?;

        let tomorrow = (Utc::now() + Duration::days(1)).date_naive();
        let midnight = Utc.from_utc_datetime(&tomorrow.and_time(NaiveTime::MIN));
        let at = |hour: i64| midnight + Duration::hours(hour);

        self.schedule_lesson(ScheduleLesson {
            student_id: pedro.id,
            tutor_id: joao.id,
            scheduled_at: at(10),
            kind: LessonKind::Theoretical,
        })
        .await?;
        self.schedule_lesson(ScheduleLesson {
            student_id: ana.id,
            tutor_id: maria.id,
            scheduled_at: at(14),
            kind: LessonKind::Theoretical,
        })
        .await?;

        info!("Demo data seeded");
        Ok(true)
    }
}
