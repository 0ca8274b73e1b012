//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of
//! the store ports from the `core` crate. It handles all interactions with the
//! PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feedback_coach_core::domain::{
    Document, DocumentSummary, NewTrainingSample, NewUser, TrainingSample, User, UserCredentials,
};
use feedback_coach_core::ports::{
    CredentialStore, DocumentStore, PortError, PortResult, TrainingCorpusStore,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements every store port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Maps a driver error, turning unique-constraint violations into `Conflict`.
fn map_db_error(e: sqlx::Error, conflict: &str) -> PortError {
    match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            PortError::Conflict(conflict.to_string())
        }
        other => PortError::Internal(other.to_string()),
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Internal(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    created_at: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
}
impl UserRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user: User {
                id: self.id,
                email: self.email,
                first_name: self.first_name,
                last_name: self.last_name,
                created_at: self.created_at,
                last_login: self.last_login,
            },
            password_hash: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct DocumentRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    content: String,
    created_at: DateTime<Utc>,
}
impl DocumentRecord {
    fn to_domain(self) -> Document {
        Document {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            content: self.content,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct DocumentSummaryRecord {
    id: Uuid,
    title: String,
    created_at: DateTime<Utc>,
}
impl DocumentSummaryRecord {
    fn to_domain(self) -> DocumentSummary {
        DocumentSummary {
            id: self.id,
            title: self.title,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct TrainingSampleRecord {
    id: Uuid,
    original_text: String,
    teacher_correction: String,
    cbc_feedback: String,
    submitted_at: DateTime<Utc>,
}
impl TrainingSampleRecord {
    fn to_domain(self) -> TrainingSample {
        TrainingSample {
            id: self.id,
            original_text: self.original_text,
            teacher_correction: self.teacher_correction,
            cbc_feedback: self.cbc_feedback,
            submitted_at: self.submitted_at,
        }
    }
}

//=========================================================================================
// `CredentialStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CredentialStore for DbAdapter {
    async fn create(&self, user: &NewUser) -> PortResult<Uuid> {
        let (id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO users (id, email, password_hash, first_name, last_name) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Email already registered"))?;
        Ok(id)
    }

    async fn find_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, password_hash, first_name, last_name, created_at, last_login \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(UserRecord::to_domain))
    }

    async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> PortResult<()> {
        sqlx::query("UPDATE users SET last_login = $1 WHERE id = $2")
            .bind(at)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStore for DbAdapter {
    async fn exists_title_for_user(&self, user_id: Uuid, title: &str) -> PortResult<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM documents WHERE user_id = $1 AND title = $2)",
        )
        .bind(user_id)
        .bind(title)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(exists)
    }

    async fn insert(&self, user_id: Uuid, title: &str, content: &str) -> PortResult<Uuid> {
        let (id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO documents (id, user_id, title, content) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(title)
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Duplicate document title"))?;
        Ok(id)
    }

    async fn list_for_user(&self, user_id: Uuid) -> PortResult<Vec<DocumentSummary>> {
        let records = sqlx::query_as::<_, DocumentSummaryRecord>(
            "SELECT id, title, created_at FROM documents WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let documents = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(documents)
    }

    async fn get(&self, document_id: Uuid, user_id: Uuid) -> PortResult<Option<Document>> {
        let record = sqlx::query_as::<_, DocumentRecord>(
            "SELECT id, user_id, title, content, created_at FROM documents \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(document_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(DocumentRecord::to_domain))
    }

    async fn update_content(
        &self,
        document_id: Uuid,
        user_id: Uuid,
        content: &str,
    ) -> PortResult<bool> {
        let result =
            sqlx::query("UPDATE documents SET content = $1 WHERE id = $2 AND user_id = $3")
                .bind(content)
                .bind(document_id)
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn rename(&self, document_id: Uuid, user_id: Uuid, new_title: &str) -> PortResult<bool> {
        let result = sqlx::query("UPDATE documents SET title = $1 WHERE id = $2 AND user_id = $3")
            .bind(new_title)
            .bind(document_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error(e, "Duplicate document title"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, document_id: Uuid, user_id: Uuid) -> PortResult<Option<Document>> {
        let record = sqlx::query_as::<_, DocumentRecord>(
            "DELETE FROM documents WHERE id = $1 AND user_id = $2 \
             RETURNING id, user_id, title, content, created_at",
        )
        .bind(document_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(DocumentRecord::to_domain))
    }
}

//=========================================================================================
// `TrainingCorpusStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl TrainingCorpusStore for DbAdapter {
    async fn append(&self, sample: &NewTrainingSample) -> PortResult<TrainingSample> {
        let record = sqlx::query_as::<_, TrainingSampleRecord>(
            "INSERT INTO training_data (id, original_text, teacher_correction, cbc_feedback) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, original_text, teacher_correction, cbc_feedback, submitted_at",
        )
        .bind(Uuid::new_v4())
        .bind(&sample.original_text)
        .bind(&sample.teacher_correction)
        .bind(&sample.cbc_feedback)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }
}
