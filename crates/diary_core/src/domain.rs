//! crates/diary_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or transport format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// The authenticated subject: an opaque identifier plus the email it was
/// registered with. Owned by the auth provider; the application only ever
/// holds a read-only projection of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

/// A live, time-bounded proof that requests originate from an authenticated
/// identity. Created on sign-in, invalidated on sign-out or expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: Identity,
    pub expires_at: Option<DateTime<Utc>>,
}

/// The kind of transition the auth provider is reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// A single notification pushed by the auth provider on every transition.
#[derive(Debug, Clone)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

/// A single diary record owned by one identity.
#[derive(Debug, Clone, PartialEq)]
pub struct DiaryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Absent until the analysis pipeline has run for this entry; overwritten
    /// on each successful analysis. Never required for the entry to exist.
    pub analysis_result: Option<AnalysisResult>,
}

/// The structured value the analysis pipeline writes back onto an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub sentiment: Sentiment,
}

/// A coarse classification label attached to an entry's content by the
/// external classifier. The classifier is prompted for one of the three
/// canonical labels, but anything else it produces is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Other(String),
}

impl Sentiment {
    pub fn as_str(&self) -> &str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
            Sentiment::Other(raw) => raw,
        }
    }
}

impl From<&str> for Sentiment {
    fn from(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("positive") {
            Sentiment::Positive
        } else if raw.eq_ignore_ascii_case("negative") {
            Sentiment::Negative
        } else if raw.eq_ignore_ascii_case("neutral") {
            Sentiment::Neutral
        } else {
            Sentiment::Other(raw.to_string())
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Sentiment crosses the wire as its plain string form, so the three canonical
// labels and free text share one representation.
impl Serialize for Sentiment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Sentiment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Sentiment::from(raw.as_str()))
    }
}
