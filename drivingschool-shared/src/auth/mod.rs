/// Authentication primitives
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: HS256 access tokens naming a student
/// - [`context`]: The authenticated caller handed to request handlers
///
/// # Example
///
/// ```no_run
/// use drivingschool_shared::auth::password::{hash_password, verify_password};
/// use drivingschool_shared::auth::jwt::{create_token, Claims};
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("student_password")?;
/// assert!(verify_password("student_password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), Duration::hours(24));
/// let token = create_token(&claims, "a-secret-key-of-at-least-32-bytes!")?;
/// # Ok(())
/// # }
/// ```

pub mod context;
pub mod jwt;
pub mod password;
