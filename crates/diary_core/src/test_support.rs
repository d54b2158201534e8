//! crates/diary_core/src/test_support.rs
//!
//! In-memory fakes of the ports, shared by the unit tests across modules.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::{
    AnalysisResult, AuthChange, AuthEvent, DiaryEntry, Identity, Sentiment, Session,
};
use crate::ports::{
    AuthProvider, ConfirmDelete, EntryStore, IdentitySource, PortError, PortResult,
    SentimentClassifier,
};

pub(crate) fn session_for(email: &str) -> Session {
    Session {
        identity: Identity {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
        },
        expires_at: Some(Utc::now() + Duration::days(30)),
    }
}

/// An identity source pinned to one value, signed in or out.
pub(crate) struct StaticIdentity(pub(crate) Option<Identity>);

#[async_trait]
impl IdentitySource for StaticIdentity {
    async fn current_identity(&self) -> Option<Identity> {
        self.0.clone()
    }
}

/// An in-memory entry store. Counts every port call and can be armed to fail
/// the next one.
#[derive(Default)]
pub(crate) struct MemoryStore {
    entries: Mutex<Vec<DiaryEntry>>,
    calls: AtomicUsize,
    fail_next: Mutex<Option<String>>,
}

impl MemoryStore {
    /// Puts an entry into the store directly, bypassing the port surface.
    pub(crate) fn seed_entry(
        &self,
        user_id: Uuid,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> DiaryEntry {
        let entry = DiaryEntry {
            id: Uuid::new_v4(),
            user_id,
            content: content.to_string(),
            created_at,
            analysis_result: None,
        };
        self.entries.lock().unwrap().push(entry.clone());
        entry
    }

    pub(crate) fn all_entries(&self) -> Vec<DiaryEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_next(&self, message: &str) {
        *self.fail_next.lock().unwrap() = Some(message.to_string());
    }

    fn checkpoint(&self) -> PortResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.fail_next.lock().unwrap().take() {
            return Err(PortError::Unexpected(message));
        }
        Ok(())
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    async fn insert_entry(&self, user_id: Uuid, content: &str) -> PortResult<DiaryEntry> {
        self.checkpoint()?;
        let entry = DiaryEntry {
            id: Uuid::new_v4(),
            user_id,
            content: content.to_string(),
            created_at: Utc::now(),
            analysis_result: None,
        };
        self.entries.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn entries_for_user(&self, user_id: Uuid) -> PortResult<Vec<DiaryEntry>> {
        self.checkpoint()?;
        let mut entries: Vec<DiaryEntry> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    async fn update_content(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        content: &str,
    ) -> PortResult<Option<DiaryEntry>> {
        self.checkpoint()?;
        let mut entries = self.entries.lock().unwrap();
        Ok(entries
            .iter_mut()
            .find(|e| e.id == entry_id && e.user_id == user_id)
            .map(|e| {
                e.content = content.to_string();
                e.clone()
            }))
    }

    async fn delete_entry(&self, user_id: Uuid, entry_id: Uuid) -> PortResult<()> {
        self.checkpoint()?;
        self.entries
            .lock()
            .unwrap()
            .retain(|e| !(e.id == entry_id && e.user_id == user_id));
        Ok(())
    }

    async fn write_analysis(&self, entry_id: Uuid, result: &AnalysisResult) -> PortResult<()> {
        self.checkpoint()?;
        if let Some(entry) = self
            .entries
            .lock()
            .unwrap()
            .iter_mut()
            .find(|e| e.id == entry_id)
        {
            entry.analysis_result = Some(result.clone());
        }
        Ok(())
    }
}

/// An auth provider whose notifications the tests script by hand. Signing in
/// through the port behaves like the real provider: it records a session and
/// pushes the matching change notification.
pub(crate) struct FakeAuthProvider {
    session: Mutex<Option<Session>>,
    changes: broadcast::Sender<AuthChange>,
    fail_sign_out: AtomicBool,
    sign_out_calls: AtomicUsize,
}

impl Default for FakeAuthProvider {
    fn default() -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            session: Mutex::new(None),
            changes,
            fail_sign_out: AtomicBool::new(false),
            sign_out_calls: AtomicUsize::new(0),
        }
    }
}

impl FakeAuthProvider {
    pub(crate) fn with_session(session: Session) -> Self {
        let provider = Self::default();
        *provider.session.lock().unwrap() = Some(session);
        provider
    }

    pub(crate) fn fail_sign_out(&self) {
        self.fail_sign_out.store(true, Ordering::SeqCst);
    }

    pub(crate) fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn push_change(&self, event: AuthEvent, session: Option<Session>) {
        *self.session.lock().unwrap() = session.clone();
        let _ = self.changes.send(AuthChange { event, session });
    }
}

#[async_trait]
impl AuthProvider for FakeAuthProvider {
    async fn sign_up(&self, _email: &str, _password: &str) -> PortResult<()> {
        Ok(())
    }

    async fn sign_in_with_password(&self, email: &str, _password: &str) -> PortResult<()> {
        self.push_change(AuthEvent::SignedIn, Some(session_for(email)));
        Ok(())
    }

    async fn sign_out(&self) -> PortResult<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("sign out rejected".to_string()));
        }
        self.push_change(AuthEvent::SignedOut, None);
        Ok(())
    }

    async fn get_session(&self) -> PortResult<Option<Session>> {
        Ok(self.session.lock().unwrap().clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.changes.subscribe()
    }
}

/// A classifier that always answers the same way.
pub(crate) struct FakeClassifier {
    response: Result<Sentiment, String>,
    calls: Mutex<Vec<String>>,
}

impl FakeClassifier {
    pub(crate) fn returning(sentiment: Sentiment) -> Self {
        Self {
            response: Ok(sentiment),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SentimentClassifier for FakeClassifier {
    async fn classify(&self, content: &str) -> PortResult<Sentiment> {
        self.calls.lock().unwrap().push(content.to_string());
        match &self.response {
            Ok(sentiment) => Ok(sentiment.clone()),
            Err(message) => Err(PortError::Unexpected(message.clone())),
        }
    }
}

/// A confirmation gate with a fixed answer.
pub(crate) struct FixedConfirm(pub(crate) bool);

#[async_trait]
impl ConfirmDelete for FixedConfirm {
    async fn confirm_delete(&self, _entry_id: Uuid) -> bool {
        self.0
    }
}
