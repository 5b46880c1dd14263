//! Session state

use crate::backend::types::{Clarification, GrantItem, SearchQuery};
use crate::backend::SearchError;
use crate::interstitial::InterstitialState;
use crate::notify::GuardState;
use crate::progress::ProgressState;
use serde::Serialize;

/// Lifecycle of the current search session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No search running. Results from a completed session are gone once a
    /// new submission replaces them.
    #[default]
    Idle,
    /// Primary search in flight; progress and interstitials run here.
    Submitting,
    /// The server asked a disambiguation question and is waiting on the
    /// user's pick. Progress keeps running; interstitials do not.
    AwaitingClarification,
    /// Refinement request in flight after the user answered.
    Clarifying,
    /// Results (possibly zero of them) are displayed.
    Completed,
    /// The session ended with a classified error.
    Failed,
}

/// The whole orchestrator state. Cheap to clone; snapshots of it are what
/// the UI layer receives.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    /// Bumped on every submission and reset. Async callbacks tagged with an
    /// older generation are dropped on arrival.
    pub generation: u64,
    pub status: SessionStatus,
    /// The criteria behind the current session, kept through clarification
    /// so the refinement request can echo them.
    pub query: Option<SearchQuery>,
    pub results: Vec<GrantItem>,
    /// Pending disambiguation question, present only in
    /// [`SessionStatus::AwaitingClarification`].
    pub clarification: Option<Clarification>,
    pub error: Option<SearchError>,
    pub progress: ProgressState,
    pub interstitial: InterstitialState,
    /// At-most-once digest dispatch bookkeeping. Survives resets so a
    /// repeated search over the same result set stays silent.
    pub guard: GuardState,
    /// Digest address snapshotted at submit time; later edits to the stored
    /// address do not affect the running session.
    pub digest_email: Option<String>,
}
