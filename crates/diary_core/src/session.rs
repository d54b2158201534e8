//! crates/diary_core/src/session.rs
//!
//! Tracks whether a user is authenticated and exposes the current session as
//! an observable value. State is always a projection of the auth provider's
//! last-known notification; there is no local-only sign-out state.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::domain::{Identity, Session};
use crate::ports::{AuthProvider, IdentitySource};

/// Owns the process-wide current-identity projection. Constructed once by the
/// application root and injected into the gateway and orchestrator.
pub struct SessionManager {
    provider: Arc<dyn AuthProvider>,
    state: Arc<watch::Sender<Option<Session>>>,
    shutdown: CancellationToken,
}

impl SessionManager {
    /// Performs one fetch of any already-valid session (the reload-with-
    /// existing-credentials case), then consumes the provider's change stream
    /// for the lifetime of the manager. A failed initial fetch is logged and
    /// treated as signed out.
    pub async fn start(provider: Arc<dyn AuthProvider>) -> Self {
        let initial = match provider.get_session().await {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, "initial session fetch failed, starting signed out");
                None
            }
        };
        debug!(signed_in = initial.is_some(), "initial session");

        let (state, _) = watch::channel(initial);
        let state = Arc::new(state);
        let shutdown = CancellationToken::new();

        let mut changes = provider.subscribe();
        let tx = state.clone();
        let token = shutdown.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    change = changes.recv() => match change {
                        Ok(change) => {
                            debug!(event = ?change.event, signed_in = change.session.is_some(), "auth state changed");
                            tx.send_replace(change.session);
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "auth change stream lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });

        Self {
            provider,
            state,
            shutdown,
        }
    }

    /// Observe the session as it changes.
    pub fn watch(&self) -> watch::Receiver<Option<Session>> {
        self.state.subscribe()
    }

    /// The last-known session, if any.
    pub fn current(&self) -> Option<Session> {
        self.state.borrow().clone()
    }

    /// A failed sign-out is logged, never returned: the observable state only
    /// moves once the provider emits the cleared session.
    pub async fn sign_out(&self) {
        if let Err(err) = self.provider.sign_out().await {
            error!(error = %err, "sign out failed");
        }
    }

    /// Stops consuming provider notifications. Also runs on drop.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[async_trait]
impl IdentitySource for SessionManager {
    async fn current_identity(&self) -> Option<Identity> {
        self.state.borrow().as_ref().map(|s| s.identity.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AuthEvent;
    use crate::test_support::{session_for, FakeAuthProvider};

    #[tokio::test]
    async fn initial_fetch_restores_an_existing_session() {
        let session = session_for("restored@example.com");
        let provider = Arc::new(FakeAuthProvider::with_session(session.clone()));
        let manager = SessionManager::start(provider).await;

        assert_eq!(manager.current(), Some(session.clone()));
        assert_eq!(
            manager.current_identity().await,
            Some(session.identity)
        );
    }

    #[tokio::test]
    async fn provider_notifications_drive_the_observable_state() {
        let provider = Arc::new(FakeAuthProvider::default());
        let manager = SessionManager::start(provider.clone()).await;
        assert_eq!(manager.current(), None);

        let mut rx = manager.watch();
        let session = session_for("signed-in@example.com");
        provider.push_change(AuthEvent::SignedIn, Some(session.clone()));
        rx.changed().await.unwrap();
        assert_eq!(manager.current(), Some(session));

        provider.push_change(AuthEvent::SignedOut, None);
        rx.changed().await.unwrap();
        assert_eq!(manager.current(), None);
    }

    #[tokio::test]
    async fn sign_in_is_reflected_through_the_change_stream() {
        let provider = Arc::new(FakeAuthProvider::default());
        let manager = SessionManager::start(provider.clone()).await;

        provider
            .sign_in_with_password("new@example.com", "hunter2")
            .await
            .unwrap();

        let mut rx = manager.watch();
        rx.wait_for(|s| {
            s.as_ref().map(|s| s.identity.email.as_str()) == Some("new@example.com")
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn failed_sign_out_leaves_state_to_the_next_notification() {
        let session = session_for("sticky@example.com");
        let provider = Arc::new(FakeAuthProvider::with_session(session.clone()));
        provider.fail_sign_out();
        let manager = SessionManager::start(provider.clone()).await;

        manager.sign_out().await;
        assert_eq!(provider.sign_out_calls(), 1);
        // No local-only sign-out: the session stays until the provider says otherwise.
        assert_eq!(manager.current(), Some(session));

        provider.push_change(AuthEvent::SignedOut, None);
        let mut rx = manager.watch();
        rx.wait_for(|s| s.is_none()).await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_stops_consuming_notifications() {
        let provider = Arc::new(FakeAuthProvider::default());
        let manager = SessionManager::start(provider.clone()).await;
        manager.shutdown();
        // Give the subscription task a chance to observe the cancellation.
        tokio::task::yield_now().await;

        provider.push_change(AuthEvent::SignedIn, Some(session_for("late@example.com")));
        tokio::task::yield_now().await;
        assert_eq!(manager.current(), None);
    }
}
