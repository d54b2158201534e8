//! crates/diary_core/src/analysis.rs
//!
//! The sentiment analysis trigger: a best-effort enrichment step decoupled
//! from the save flow. Every failure here is logged and swallowed; the
//! correctness of the displayed list never depends on analysis succeeding.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::AnalysisResult;
use crate::ports::{EntryStore, SentimentClassifier};

#[derive(Clone)]
pub struct AnalysisTrigger {
    classifier: Arc<dyn SentimentClassifier>,
    store: Arc<dyn EntryStore>,
}

impl AnalysisTrigger {
    pub fn new(classifier: Arc<dyn SentimentClassifier>, store: Arc<dyn EntryStore>) -> Self {
        Self { classifier, store }
    }

    /// Classifies `content` and writes the result onto the matching entry.
    /// No retry, no partial write, no surfaced error.
    pub async fn run(&self, entry_id: Uuid, content: &str) {
        if entry_id.is_nil() || content.trim().is_empty() {
            warn!("entry id and content are required for analysis, skipping");
            return;
        }

        info!(%entry_id, "invoking sentiment analysis");
        let sentiment = match self.classifier.classify(content).await {
            Ok(sentiment) => sentiment,
            Err(err) => {
                error!(%entry_id, error = %err, "sentiment analysis failed");
                return;
            }
        };

        let result = AnalysisResult { sentiment };
        match self.store.write_analysis(entry_id, &result).await {
            Ok(()) => {
                info!(%entry_id, sentiment = %result.sentiment, "entry updated with analysis result")
            }
            Err(err) => {
                error!(%entry_id, error = %err, "failed to write analysis result")
            }
        }
    }

    /// Detaches `run` from the caller. The task's outcome is only ever
    /// logged; nothing joins it.
    pub fn spawn(&self, entry_id: Uuid, content: String) {
        let trigger = self.clone();
        tokio::spawn(async move {
            trigger.run(entry_id, &content).await;
        });
    }
}
