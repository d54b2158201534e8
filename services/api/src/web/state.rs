//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the request-scoped identity
//! wrapper that lets the web handlers drive the core entry gateway.

use crate::adapters::DbAdapter;
use crate::config::Config;
use async_trait::async_trait;
use diary_core::analysis::AnalysisTrigger;
use diary_core::domain::Identity;
use diary_core::gateway::EntryGateway;
use diary_core::ports::{EntryStore, IdentitySource, SentimentClassifier};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// User and auth-session persistence for the web auth layer.
    pub db: DbAdapter,
    pub store: Arc<dyn EntryStore>,
    pub classifier: Arc<dyn SentimentClassifier>,
    pub analysis: AnalysisTrigger,
    pub config: Arc<Config>,
}

impl AppState {
    /// An entry gateway acting on behalf of the request's identity.
    pub fn gateway_for(&self, identity: Identity) -> EntryGateway {
        EntryGateway::new(Arc::new(RequestIdentity(identity)), self.store.clone())
    }
}

//=========================================================================================
// Request-Scoped Identity
//=========================================================================================

/// Adapts the identity established by the auth middleware to the gateway's
/// `IdentitySource`. Unlike the client-side session manager this can never be
/// signed out mid-request: the middleware already rejected anonymous callers.
pub struct RequestIdentity(pub Identity);

#[async_trait]
impl IdentitySource for RequestIdentity {
    async fn current_identity(&self) -> Option<Identity> {
        Some(self.0.clone())
    }
}
