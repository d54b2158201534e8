pub mod analysis;
pub mod domain;
pub mod gateway;
pub mod list;
pub mod ports;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use analysis::AnalysisTrigger;
pub use domain::{
    AnalysisResult, AuthChange, AuthEvent, DiaryEntry, Identity, Sentiment, Session,
};
pub use gateway::{DiaryError, EntryGateway};
pub use list::{EditorState, ListOrchestrator, ListState, ANALYSIS_REFRESH_DELAY};
pub use ports::{
    AuthProvider, ConfirmDelete, EntryStore, IdentitySource, PortError, PortResult,
    SentimentClassifier,
};
pub use session::SessionManager;
