//! crates/diary_core/src/gateway.rs
//!
//! The entry store gateway: user-scoped CRUD against the remote entry
//! collection. Every operation resolves the current identity first and
//! resolves all failures into `DiaryError`. Nothing panics or leaks a raw
//! provider error across this boundary.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::domain::{DiaryEntry, Identity};
use crate::ports::{EntryStore, IdentitySource, PortError};

/// The tagged result type at the gateway and session boundary.
#[derive(Debug, thiserror::Error)]
pub enum DiaryError {
    #[error("Not authenticated. Please sign in.")]
    NotAuthenticated,
    #[error("Entry not found.")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("The diary store failed: {0}")]
    Remote(String),
}

impl From<PortError> for DiaryError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(_) => DiaryError::NotFound,
            PortError::Unauthorized => DiaryError::NotAuthenticated,
            PortError::Unexpected(msg) => DiaryError::Remote(msg),
        }
    }
}

/// Performs remote CRUD operations against the user-scoped entry collection.
/// Keeps no local cache; the list orchestrator owns the in-memory view.
#[derive(Clone)]
pub struct EntryGateway {
    identity: Arc<dyn IdentitySource>,
    store: Arc<dyn EntryStore>,
}

impl EntryGateway {
    pub fn new(identity: Arc<dyn IdentitySource>, store: Arc<dyn EntryStore>) -> Self {
        Self { identity, store }
    }

    async fn require_identity(&self) -> Result<Identity, DiaryError> {
        self.identity
            .current_identity()
            .await
            .ok_or(DiaryError::NotAuthenticated)
    }

    pub async fn create(&self, content: &str) -> Result<DiaryEntry, DiaryError> {
        let identity = self.require_identity().await?;
        let entry = self.store.insert_entry(identity.user_id, content).await?;
        debug!(entry_id = %entry.id, "entry created");
        Ok(entry)
    }

    /// Newest first. Consumers rely on this order without re-sorting.
    pub async fn list(&self) -> Result<Vec<DiaryEntry>, DiaryError> {
        let identity = self.require_identity().await?;
        let entries = self.store.entries_for_user(identity.user_id).await?;
        Ok(entries)
    }

    /// Updates only `content` on the matching row. `NotFound` when the row
    /// does not exist or is not owned by the requesting identity.
    pub async fn update(&self, entry_id: Uuid, content: &str) -> Result<DiaryEntry, DiaryError> {
        let identity = self.require_identity().await?;
        match self
            .store
            .update_content(identity.user_id, entry_id, content)
            .await?
        {
            Some(entry) => {
                debug!(%entry_id, "entry updated");
                Ok(entry)
            }
            None => Err(DiaryError::NotFound),
        }
    }

    /// Deleting an entry that is already gone is a success.
    pub async fn delete(&self, entry_id: Uuid) -> Result<(), DiaryError> {
        let identity = self.require_identity().await?;
        self.store.delete_entry(identity.user_id, entry_id).await?;
        debug!(%entry_id, "entry deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryStore, StaticIdentity};
    use chrono::{Duration, Utc};

    fn gateway(identity: Option<Identity>, store: Arc<MemoryStore>) -> EntryGateway {
        EntryGateway::new(Arc::new(StaticIdentity(identity)), store)
    }

    fn identity() -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            email: "me@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn create_then_list_surfaces_the_new_entry() {
        let me = identity();
        let store = Arc::new(MemoryStore::default());
        let gateway = gateway(Some(me.clone()), store.clone());

        let created = gateway.create("first entry").await.unwrap();
        assert_eq!(created.user_id, me.user_id);
        assert_eq!(created.content, "first entry");

        let listed = gateway.list().await.unwrap();
        assert_eq!(listed, vec![created]);
    }

    #[tokio::test]
    async fn list_orders_by_created_at_descending() {
        let me = identity();
        let store = Arc::new(MemoryStore::default());
        let t1 = Utc::now() - Duration::hours(2);
        let t2 = Utc::now() - Duration::hours(1);
        let older = store.seed_entry(me.user_id, "a", t1);
        let newer = store.seed_entry(me.user_id, "b", t2);

        let gateway = gateway(Some(me), store);
        let listed = gateway.list().await.unwrap();
        assert_eq!(listed, vec![newer, older]);
    }

    #[tokio::test]
    async fn list_is_scoped_to_the_requesting_identity() {
        let me = identity();
        let store = Arc::new(MemoryStore::default());
        store.seed_entry(me.user_id, "mine", Utc::now());
        store.seed_entry(Uuid::new_v4(), "someone else's", Utc::now());

        let gateway = gateway(Some(me), store);
        let listed = gateway.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].content, "mine");
    }

    #[tokio::test]
    async fn update_on_missing_id_is_not_found_and_leaves_store_unchanged() {
        let me = identity();
        let store = Arc::new(MemoryStore::default());
        let existing = store.seed_entry(me.user_id, "keep me", Utc::now());

        let gateway = gateway(Some(me), store.clone());
        let err = gateway.update(Uuid::new_v4(), "new content").await.unwrap_err();
        assert!(matches!(err, DiaryError::NotFound));
        assert_eq!(store.all_entries(), vec![existing]);
    }

    #[tokio::test]
    async fn update_on_someone_elses_entry_is_not_found() {
        let me = identity();
        let store = Arc::new(MemoryStore::default());
        let theirs = store.seed_entry(Uuid::new_v4(), "not yours", Utc::now());

        let gateway = gateway(Some(me), store.clone());
        let err = gateway.update(theirs.id, "overwritten").await.unwrap_err();
        assert!(matches!(err, DiaryError::NotFound));
        assert_eq!(store.all_entries()[0].content, "not yours");
    }

    #[tokio::test]
    async fn delete_on_missing_id_succeeds() {
        let me = identity();
        let store = Arc::new(MemoryStore::default());
        let gateway = gateway(Some(me), store);
        gateway.delete(Uuid::new_v4()).await.unwrap();
    }

    #[tokio::test]
    async fn every_operation_is_gated_on_a_live_identity() {
        let store = Arc::new(MemoryStore::default());
        let gateway = gateway(None, store.clone());

        assert!(matches!(
            gateway.create("content").await.unwrap_err(),
            DiaryError::NotAuthenticated
        ));
        assert!(matches!(
            gateway.list().await.unwrap_err(),
            DiaryError::NotAuthenticated
        ));
        assert!(matches!(
            gateway.update(Uuid::new_v4(), "content").await.unwrap_err(),
            DiaryError::NotAuthenticated
        ));
        assert!(matches!(
            gateway.delete(Uuid::new_v4()).await.unwrap_err(),
            DiaryError::NotAuthenticated
        ));
        assert_eq!(store.call_count(), 0, "the store must never be reached");
    }

    #[tokio::test]
    async fn store_failures_map_to_remote_errors() {
        let me = identity();
        let store = Arc::new(MemoryStore::default());
        store.fail_next("connection reset");

        let gateway = gateway(Some(me), store);
        let err = gateway.list().await.unwrap_err();
        assert!(matches!(err, DiaryError::Remote(_)));
    }
}
