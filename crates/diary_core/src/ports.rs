//! crates/diary_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like databases,
//! auth providers, or classifier APIs.

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::{AnalysisResult, AuthChange, DiaryEntry, Identity, Sentiment, Session};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The external authentication provider. Sign-in and sign-up report only
/// success or failure; the resulting session always arrives through the
/// change stream, so observers have a single source of truth.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> PortResult<()>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> PortResult<()>;

    async fn sign_out(&self) -> PortResult<()>;

    /// Any already-valid session, e.g. restored credentials after a reload.
    async fn get_session(&self) -> PortResult<Option<Session>>;

    /// A stream of `AuthChange` notifications, one per transition.
    fn subscribe(&self) -> broadcast::Receiver<AuthChange>;
}

/// Resolves the identity on whose behalf an operation runs. The session
/// manager is the canonical implementation; request-scoped wrappers exist on
/// the server side.
#[async_trait]
pub trait IdentitySource: Send + Sync {
    async fn current_identity(&self) -> Option<Identity>;
}

/// The remote, user-scoped entry collection. Mutation scoping to the owning
/// identity is the store side's responsibility, which is why `update_content`
/// and `delete_entry` take the requesting `user_id`.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Inserts `{content, user_id}` and returns exactly the inserted row.
    async fn insert_entry(&self, user_id: Uuid, content: &str) -> PortResult<DiaryEntry>;

    /// All entries owned by `user_id`, ordered by `created_at` descending.
    async fn entries_for_user(&self, user_id: Uuid) -> PortResult<Vec<DiaryEntry>>;

    /// Updates only `content`; `None` when no row matched.
    async fn update_content(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        content: &str,
    ) -> PortResult<Option<DiaryEntry>>;

    /// Zero rows affected is success.
    async fn delete_entry(&self, user_id: Uuid, entry_id: Uuid) -> PortResult<()>;

    /// Writes the analysis result onto the matching entry. No ownership
    /// re-check: the id is trusted to come from an already-owned entry.
    async fn write_analysis(&self, entry_id: Uuid, result: &AnalysisResult) -> PortResult<()>;
}

/// The external sentiment classifier.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, content: &str) -> PortResult<Sentiment>;
}

/// The interactive yes/no gate in front of entry deletion.
#[async_trait]
pub trait ConfirmDelete: Send + Sync {
    async fn confirm_delete(&self, entry_id: Uuid) -> bool;
}
