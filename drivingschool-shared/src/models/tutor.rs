/// Tutor model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tutors (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     specialty VARCHAR(255) NOT NULL,
///     email VARCHAR(255),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const TUTOR_COLUMNS: &str = "id, name, specialty, email, created_at, updated_at";

/// Driving school tutor
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tutor {
    pub id: Uuid,

    pub name: String,

    /// Free text, e.g. "Traffic law" or "Category B"
    pub specialty: String,

    /// Calendar attendee address, when known
    pub email: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a tutor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTutor {
    pub name: String,
    pub specialty: String,
    pub email: Option<String>,
}

/// Input for updating a tutor; None fields are left alone
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTutor {
    pub name: Option<String>,
    pub specialty: Option<String>,

    /// Use Some(None) to clear
    pub email: Option<Option<String>>,
}

impl Tutor {
    pub async fn create(pool: &PgPool, data: CreateTutor) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO tutors (name, specialty, email)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            TUTOR_COLUMNS
        );

        sqlx::query_as::<_, Tutor>(&query)
            .bind(data.name)
            .bind(data.specialty)
            .bind(data.email)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM tutors WHERE id = $1", TUTOR_COLUMNS);

        sqlx::query_as::<_, Tutor>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists all tutors ordered by name
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM tutors ORDER BY name ASC", TUTOR_COLUMNS);

        sqlx::query_as::<_, Tutor>(&query).fetch_all(pool).await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tutors")
            .fetch_one(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTutor,
    ) -> Result<Option<Self>, sqlx::Error> {
        let (set_email, email) = match data.email {
            Some(email) => (true, email),
            None => (false, None),
        };

        let query = format!(
            r#"
            UPDATE tutors
            SET name = COALESCE($2, name),
                specialty = COALESCE($3, specialty),
                email = CASE WHEN $4 THEN $5 ELSE email END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            TUTOR_COLUMNS
        );

        sqlx::query_as::<_, Tutor>(&query)
            .bind(id)
            .bind(data.name)
            .bind(data.specialty)
            .bind(set_email)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a tutor
    ///
    /// Fails with a foreign key violation while lessons still reference
    /// the tutor.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tutors WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
