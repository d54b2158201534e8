//! crates/diary_core/src/list.rs
//!
//! The list orchestrator: owns the observable collection of entries for the
//! current session and coordinates fetch, create, update, delete, and the
//! post-save analysis refresh. All other components are pass-through to the
//! remote store; this is the only place the in-memory view is mutated, and
//! only ever by a wholesale replace.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, warn};
use uuid::Uuid;

use crate::analysis::AnalysisTrigger;
use crate::domain::DiaryEntry;
use crate::gateway::EntryGateway;
use crate::ports::ConfirmDelete;

/// How long after a save to re-fetch the list so the detached analysis write
/// becomes visible. A heuristic, not a completion signal: analysis may well
/// not have finished by then, and the next manual refresh picks it up.
pub const ANALYSIS_REFRESH_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Default)]
pub enum EditorState {
    #[default]
    Closed,
    /// Open for editing an existing entry, or empty for a new one.
    Open { editing: Option<DiaryEntry> },
}

/// The observable state of the entry list.
#[derive(Debug, Clone, Default)]
pub struct ListState {
    pub entries: Vec<DiaryEntry>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub editor: EditorState,
}

#[derive(Clone)]
pub struct ListOrchestrator {
    gateway: EntryGateway,
    analysis: AnalysisTrigger,
    confirm: Arc<dyn ConfirmDelete>,
    state: Arc<watch::Sender<ListState>>,
    refresh_delay: Duration,
}

impl ListOrchestrator {
    pub fn new(
        gateway: EntryGateway,
        analysis: AnalysisTrigger,
        confirm: Arc<dyn ConfirmDelete>,
    ) -> Self {
        let (state, _) = watch::channel(ListState::default());
        Self {
            gateway,
            analysis,
            confirm,
            state: Arc::new(state),
            refresh_delay: ANALYSIS_REFRESH_DELAY,
        }
    }

    /// Overrides the post-save refresh delay. Tests shorten it; the default
    /// is [`ANALYSIS_REFRESH_DELAY`].
    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    /// Observe the list state as it changes.
    pub fn watch(&self) -> watch::Receiver<ListState> {
        self.state.subscribe()
    }

    /// The current snapshot.
    pub fn state(&self) -> ListState {
        self.state.borrow().clone()
    }

    /// Re-fetches the list and replaces the in-memory view wholesale. On
    /// failure the error is surfaced and the previous entries are kept.
    pub async fn refresh(&self) {
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });
        match self.gateway.list().await {
            Ok(entries) => self.state.send_modify(|s| {
                s.entries = entries;
                s.is_loading = false;
            }),
            Err(err) => {
                error!(error = %err, "failed to fetch entries");
                self.state.send_modify(|s| {
                    s.error = Some(err.to_string());
                    s.is_loading = false;
                });
            }
        }
    }

    /// Opens the editor pre-filled with `entry`, or empty for a new one.
    pub fn open_editor(&self, entry: Option<DiaryEntry>) {
        self.state
            .send_modify(|s| s.editor = EditorState::Open { editing: entry });
    }

    pub fn close_editor(&self) {
        self.state.send_modify(|s| s.editor = EditorState::Closed);
    }

    /// Persists the editor content: update when `id` is present, create
    /// otherwise. On success the committed state always comes from a
    /// re-fetch (the returned row is never spliced into the local view),
    /// and the analysis pipeline is detached with exactly one delayed
    /// refresh scheduled behind it.
    pub async fn save(&self, id: Option<Uuid>, content: &str) {
        if content.trim().is_empty() {
            // Rejected before any remote call.
            self.state
                .send_modify(|s| s.error = Some("Entry content cannot be empty.".to_string()));
            return;
        }

        self.state.send_modify(|s| s.is_loading = true);
        let saved = match id {
            Some(id) => self.gateway.update(id, content).await,
            None => self.gateway.create(content).await,
        };
        let entry = match saved {
            Ok(entry) => entry,
            Err(err) => {
                error!(error = %err, "failed to save entry");
                self.state.send_modify(|s| {
                    s.error = Some(err.to_string());
                    s.is_loading = false;
                });
                return;
            }
        };

        self.close_editor();
        self.refresh().await;

        if entry.id.is_nil() {
            warn!("could not trigger analysis: save returned no entry id");
            return;
        }

        // Detached from the save flow: runs concurrently with whatever the
        // user does next; the last refresh to complete wins.
        let orchestrator = self.clone();
        let content = content.to_string();
        tokio::spawn(async move {
            orchestrator.analysis.run(entry.id, &content).await;
            tokio::time::sleep(orchestrator.refresh_delay).await;
            orchestrator.refresh().await;
        });
    }

    /// Deletes an entry behind the interactive confirmation gate. A declined
    /// confirmation changes nothing.
    pub async fn delete(&self, entry_id: Uuid) {
        if !self.confirm.confirm_delete(entry_id).await {
            return;
        }

        self.state.send_modify(|s| s.is_loading = true);
        match self.gateway.delete(entry_id).await {
            Ok(()) => self.refresh().await,
            Err(err) => {
                error!(error = %err, "failed to delete entry");
                self.state.send_modify(|s| {
                    s.error = Some(err.to_string());
                    s.is_loading = false;
                });
            }
        }
    }
}
