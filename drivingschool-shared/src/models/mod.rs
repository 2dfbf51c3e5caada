/// Database models for the driving school
///
/// Each model carries its own CRUD operations as associated functions taking
/// a `&PgPool`, mirroring the table it maps.
///
/// # Models
///
/// - `student`: Student accounts, credentials and approval flag
/// - `tutor`: Tutors lessons are booked with
/// - `lesson`: Scheduled lessons and their lifecycle
///
/// # Example
///
/// ```no_run
/// use drivingschool_shared::models::tutor::{Tutor, CreateTutor};
/// use drivingschool_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let tutor = Tutor::create(&pool, CreateTutor {
///     name: "Carlos Lima".to_string(),
///     specialty: "Traffic law".to_string(),
///     email: None,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod lesson;
pub mod student;
pub mod tutor;
