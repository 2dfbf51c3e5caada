/// Student model and database operations
///
/// Students register themselves, authenticate with email and password, and
/// book lessons with tutors. A student becomes `approved` once enough
/// theoretical lessons have been completed; approval unlocks practical
/// lessons and certificate issuance.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE students (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     phone VARCHAR(64),
///     approved BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use drivingschool_shared::models::student::{Student, CreateStudent};
/// use drivingschool_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let student = Student::create(&pool, CreateStudent {
///     name: "Ana Souza".to_string(),
///     email: "ana@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     phone: None,
/// }).await?;
///
/// let found = Student::find_by_email(&pool, "ana@example.com").await?;
/// assert_eq!(found.map(|s| s.id), Some(student.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const STUDENT_COLUMNS: &str =
    "id, name, email, password_hash, phone, approved, created_at, updated_at";

/// Student account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    /// Unique student ID (UUID v4)
    pub id: Uuid,

    /// Full name
    pub name: String,

    /// Login email, unique across students
    pub email: String,

    /// Argon2id password hash
    ///
    /// Never leaves the server.
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Optional contact phone
    pub phone: Option<String>,

    /// Eligible for practical lessons and certificates
    pub approved: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new student
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStudent {
    pub name: String,

    pub email: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,

    pub phone: Option<String>,
}

/// Input for updating a student
///
/// Only non-None fields are written. The approval flag is deliberately
/// absent; it only changes through lesson validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStudent {
    pub name: Option<String>,

    pub email: Option<String>,

    /// New password hash
    pub password_hash: Option<String>,

    /// New phone (use Some(None) to clear)
    pub phone: Option<Option<String>>,
}

/// Filter and window for listing students
#[derive(Debug, Clone, Default)]
pub struct StudentQuery {
    /// Case-insensitive substring of the name
    pub name: Option<String>,

    pub limit: i64,

    pub offset: i64,
}

impl Student {
    /// Creates a new student
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Email already exists (unique constraint violation)
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: CreateStudent) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO students (name, email, password_hash, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            STUDENT_COLUMNS
        );

        sqlx::query_as::<_, Student>(&query)
            .bind(data.name)
            .bind(data.email)
            .bind(data.password_hash)
            .bind(data.phone)
            .fetch_one(pool)
            .await
    }

    /// Finds a student by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM students WHERE id = $1", STUDENT_COLUMNS);

        sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a student by login email
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM students WHERE email = $1", STUDENT_COLUMNS);

        sqlx::query_as::<_, Student>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Lists students ordered by name
    ///
    /// `%` and `_` in the name filter match themselves.
    pub async fn list(pool: &PgPool, q: &StudentQuery) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {}
            FROM students
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%' ESCAPE '\')
            ORDER BY name ASC, created_at ASC
            LIMIT $2 OFFSET $3
            "#,
            STUDENT_COLUMNS
        );

        sqlx::query_as::<_, Student>(&query)
            .bind(q.name.as_deref().map(escape_like))
            .bind(q.limit)
            .bind(q.offset)
            .fetch_all(pool)
            .await
    }

    /// Counts students matching the optional name filter
    pub async fn count(pool: &PgPool, name: Option<&str>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r"SELECT COUNT(*) FROM students WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%' ESCAPE '\')",
        )
        .bind(name.map(escape_like))
        .fetch_one(pool)
        .await
    }

    /// Updates a student
    ///
    /// # Returns
    ///
    /// The updated student, or None if not found
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateStudent,
    ) -> Result<Option<Self>, sqlx::Error> {
        let (set_phone, phone) = match data.phone {
            Some(phone) => (true, phone),
            None => (false, None),
        };

        let query = format!(
            r#"
            UPDATE students
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                phone = CASE WHEN $5 THEN $6 ELSE phone END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            STUDENT_COLUMNS
        );

        sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .bind(data.name)
            .bind(data.email)
            .bind(data.password_hash)
            .bind(set_phone)
            .bind(phone)
            .fetch_optional(pool)
            .await
    }

    /// Marks a student approved
    ///
    /// Approval never reverts, so this only ever sets the flag.
    pub async fn set_approved(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE students
            SET approved = TRUE,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            STUDENT_COLUMNS
        );

        sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a student; their lessons cascade
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Escapes `ILIKE` metacharacters so the filter is a literal substring
pub fn escape_like(filter: &str) -> String {
    let mut escaped = String::with_capacity(filter.len());
    for c in filter.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("Ana"), "Ana");
        assert_eq!(escape_like("100%_a\\b"), "100\\%\\_a\\\\b");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let student = Student {
            id: Uuid::new_v4(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            phone: None,
            approved: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&student).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "ana@example.com");
        assert_eq!(json["approved"], false);
    }

    #[test]
    fn test_update_student_default_changes_nothing() {
        let update = UpdateStudent::default();
        assert!(update.name.is_none());
        assert!(update.email.is_none());
        assert!(update.password_hash.is_none());
        assert!(update.phone.is_none());
    }
}
