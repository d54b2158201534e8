//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `EntryStore` port from the `core` crate, plus the user and auth-session
//! persistence the web layer needs. It handles all interactions with the
//! PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diary_core::domain::{AnalysisResult, DiaryEntry, Identity};
use diary_core::ports::{EntryStore, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use tracing::warn;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `EntryStore` port and backs the
/// auth layer's users and sessions.
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
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct EntryRecord {
    id: Uuid,
    user_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
    analysis_result: Option<serde_json::Value>,
}

impl EntryRecord {
    fn to_domain(self) -> DiaryEntry {
        // A malformed analysis_result is decorative data; keep the entry and
        // drop the annotation.
        let analysis_result = self.analysis_result.and_then(|value| {
            serde_json::from_value::<AnalysisResult>(value)
                .map_err(|e| warn!(entry_id = %self.id, error = %e, "ignoring malformed analysis_result"))
                .ok()
        });
        DiaryEntry {
            id: self.id,
            user_id: self.user_id,
            content: self.content,
            created_at: self.created_at,
            analysis_result,
        }
    }
}

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
}

impl UserRecord {
    fn to_domain(self) -> Identity {
        Identity {
            user_id: self.user_id,
            email: self.email,
        }
    }
}

/// Only used internally for login - contains sensitive data.
#[derive(FromRow)]
pub struct StoredCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

#[derive(FromRow)]
struct AuthSessionRecord {
    user_id: Uuid,
    email: String,
    expires_at: DateTime<Utc>,
}

//=========================================================================================
// User and Auth-Session Persistence
//=========================================================================================

impl DbAdapter {
    pub async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<Identity> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (email, hashed_password)
            VALUES ($1, $2)
            RETURNING user_id, email
            "#,
        )
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }

    pub async fn get_user_by_email(&self, email: &str) -> PortResult<StoredCredentials> {
        sqlx::query_as::<_, StoredCredentials>(
            r#"
            SELECT user_id, email, hashed_password
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => PortError::Unexpected(e.to_string()),
        })
    }

    pub async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_sessions (id, user_id, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    /// Resolves a session cookie to the identity it belongs to. Expired or
    /// unknown sessions are `Unauthorized`.
    pub async fn validate_auth_session(
        &self,
        session_id: &str,
    ) -> PortResult<(Identity, DateTime<Utc>)> {
        let record = sqlx::query_as::<_, AuthSessionRecord>(
            r#"
            SELECT u.user_id, u.email, s.expires_at
            FROM auth_sessions s
            JOIN users u ON u.user_id = s.user_id
            WHERE s.id = $1 AND s.expires_at > now()
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        match record {
            Some(record) => Ok((
                Identity {
                    user_id: record.user_id,
                    email: record.email,
                },
                record.expires_at,
            )),
            None => Err(PortError::Unauthorized),
        }
    }

    pub async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }
}

//=========================================================================================
// `EntryStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl EntryStore for DbAdapter {
    async fn insert_entry(&self, user_id: Uuid, content: &str) -> PortResult<DiaryEntry> {
        // fetch_one enforces the "exactly one inserted row comes back" contract.
        let record = sqlx::query_as::<_, EntryRecord>(
            r#"
            INSERT INTO diary_entries (user_id, content)
            VALUES ($1, $2)
            RETURNING id, user_id, content, created_at, analysis_result
            "#,
        )
        .bind(user_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }

    async fn entries_for_user(&self, user_id: Uuid) -> PortResult<Vec<DiaryEntry>> {
        let records = sqlx::query_as::<_, EntryRecord>(
            r#"
            SELECT id, user_id, content, created_at, analysis_result
            FROM diary_entries
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn update_content(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        content: &str,
    ) -> PortResult<Option<DiaryEntry>> {
        // Ownership scoping lives here: without row-level security in the
        // database, the user_id clause is the store-side access policy.
        let record = sqlx::query_as::<_, EntryRecord>(
            r#"
            UPDATE diary_entries
            SET content = $3
            WHERE id = $2 AND user_id = $1
            RETURNING id, user_id, content, created_at, analysis_result
            "#,
        )
        .bind(user_id)
        .bind(entry_id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn delete_entry(&self, user_id: Uuid, entry_id: Uuid) -> PortResult<()> {
        // Zero rows affected is a success: the delete is idempotent.
        sqlx::query("DELETE FROM diary_entries WHERE id = $2 AND user_id = $1")
            .bind(user_id)
            .bind(entry_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn write_analysis(&self, entry_id: Uuid, result: &AnalysisResult) -> PortResult<()> {
        let value = serde_json::to_value(result)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        sqlx::query("UPDATE diary_entries SET analysis_result = $2 WHERE id = $1")
            .bind(entry_id)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }
}
