//! Progress sessions for long-running analyses.
//!
//! An analysis can take tens of seconds (rasterizing a large PDF deck), so
//! the web layer polls for progress instead of blocking on the result. The
//! [`ProgressStore`] is the decoupling point: the analysis task is the single
//! writer for its session id, and any number of pollers read snapshots.
//!
//! The store is an explicitly owned value injected into
//! [`crate::analyze::analyze_presentation`] — not ambient module state — so
//! tests and embedders control its lifetime. It never expires entries on its
//! own: the consumer must delete a session after observing a terminal state
//! ([`take_terminal`](ProgressStore::take_terminal) does both in one step).
//! A session whose consumer never polls stays in the map for the store's
//! lifetime; acceptable, since session ids are bounded by concurrent
//! analyses.

use crate::slide::Slide;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Lifecycle state of one analysis session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Starting,
    Processing,
    Completed,
    Error,
}

impl AnalysisStatus {
    /// `Completed` and `Error` are terminal; the record will not change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Error)
    }
}

/// Snapshot of one in-flight (or finished) analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisProgress {
    /// Percentage complete, 0–100.
    pub progress: u8,
    pub status: AnalysisStatus,
    /// Human-readable milestone description for the progress UI.
    pub message: String,
    /// Final slide list; present only once `status == Completed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slides: Option<Vec<Slide>>,
    /// Failure description; present only once `status == Error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisProgress {
    fn starting() -> Self {
        Self {
            progress: 0,
            status: AnalysisStatus::Starting,
            message: "Starting analysis...".to_string(),
            slides: None,
            error: None,
        }
    }
}

/// Shared map from session id to progress record.
///
/// Cheap to clone (an `Arc` handle). One writer per session id; updates are
/// single guarded assignments, so pollers always observe a consistent record.
#[derive(Debug, Clone, Default)]
pub struct ProgressStore {
    sessions: Arc<RwLock<HashMap<String, AnalysisProgress>>>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session in the `Starting` state.
    ///
    /// Re-creating an existing id resets it; callers generate a fresh id per
    /// analysis, so this only matters in tests.
    pub async fn create(&self, session_id: &str) {
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), AnalysisProgress::starting());
    }

    /// Report a milestone for a running session.
    ///
    /// No-op for unknown ids, matching the original's tolerance of updates
    /// that race a consumer-side delete.
    pub async fn report(&self, session_id: &str, progress: u8, message: impl Into<String>) {
        let mut sessions = self.sessions.write().await;
        if let Some(s) = sessions.get_mut(session_id) {
            s.progress = progress.min(100);
            s.status = AnalysisStatus::Processing;
            s.message = message.into();
        }
    }

    /// Mark a session complete and attach the final slide list.
    pub async fn complete(&self, session_id: &str, slides: Vec<Slide>) {
        let mut sessions = self.sessions.write().await;
        if let Some(s) = sessions.get_mut(session_id) {
            s.progress = 100;
            s.status = AnalysisStatus::Completed;
            s.message = "Analysis finished successfully".to_string();
            s.slides = Some(slides);
            s.error = None;
        }
    }

    /// Mark a session failed with the error message.
    pub async fn fail(&self, session_id: &str, error: impl Into<String>) {
        let error = error.into();
        let mut sessions = self.sessions.write().await;
        if let Some(s) = sessions.get_mut(session_id) {
            s.progress = 0;
            s.status = AnalysisStatus::Error;
            s.message = error.clone();
            s.error = Some(error);
        }
    }

    /// Snapshot the current record for a session, if any.
    pub async fn get(&self, session_id: &str) -> Option<AnalysisProgress> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Delete a session record, returning it if it existed.
    pub async fn remove(&self, session_id: &str) -> Option<AnalysisProgress> {
        self.sessions.write().await.remove(session_id)
    }

    /// Delete-after-read: remove and return the record only if it has reached
    /// a terminal state. Non-terminal sessions are left untouched so an
    /// in-flight analysis keeps its record.
    pub async fn take_terminal(&self, session_id: &str) -> Option<AnalysisProgress> {
        let mut sessions = self.sessions.write().await;
        if sessions
            .get(session_id)
            .is_some_and(|s| s.status.is_terminal())
        {
            sessions.remove(session_id)
        } else {
            None
        }
    }

    /// Number of live sessions (diagnostics only).
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// A store handle bound to one session id.
///
/// Extraction stages take a `SessionReporter` instead of the full store so
/// they cannot touch any other session.
#[derive(Debug, Clone)]
pub struct SessionReporter {
    store: ProgressStore,
    session_id: String,
}

impl SessionReporter {
    pub fn new(store: ProgressStore, session_id: impl Into<String>) -> Self {
        Self {
            store,
            session_id: session_id.into(),
        }
    }

    /// A reporter nobody listens to. Reports land on a session that was
    /// never created, which the store drops.
    pub fn detached() -> Self {
        Self {
            store: ProgressStore::new(),
            session_id: String::new(),
        }
    }

    pub async fn report(&self, progress: u8, message: impl Into<String>) {
        self.store.report(&self.session_id, progress, message).await;
    }
}
