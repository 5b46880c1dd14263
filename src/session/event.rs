//! Session events
//!
//! Everything that can move the session forward arrives here, user actions
//! and async callbacks alike, serialized through one channel. Callback
//! events carry the generation they were spawned under.

use crate::backend::types::{GrantItem, SearchQuery, SearchReply};
use crate::backend::SearchError;
use crate::interstitial::SequencerStep;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Start a new session, superseding whatever is running.
    Submit {
        query: SearchQuery,
        /// Digest opt-in for this session. `None` means "use the stored
        /// address"; the runtime fills it in before the transition runs.
        digest_email: Option<String>,
    },
    /// The user picked a clarification option.
    ResolveClarification { choice: String },
    /// The user dismissed the clarification question.
    CancelClarification,
    /// Abandon the session and return to idle.
    Reset,
    /// The user answered the presented interstitial question.
    AnswerQuestion { choice: String },
    /// The user skipped the presented interstitial question.
    SkipQuestion,

    /// Primary search round-trip finished.
    SearchOutcome {
        generation: u64,
        outcome: Result<SearchReply, SearchError>,
    },
    /// Clarification refinement round-trip finished.
    ClarifyOutcome {
        generation: u64,
        outcome: Result<Vec<GrantItem>, SearchError>,
    },
    /// Progress cadence timer fired.
    ProgressTick { generation: u64 },
    /// An interstitial sequencer timer fired.
    InterstitialTimer {
        generation: u64,
        step: SequencerStep,
    },
    /// Automatic digest dispatch finished. Keyed by result-set fingerprint
    /// rather than generation: the guard outlives sessions, and a failure
    /// must re-arm it even if the session was reset while the send ran.
    DigestOutcome {
        fingerprint: String,
        outcome: Result<(), SearchError>,
    },
}

impl Event {
    /// The generation this event was spawned under, for callback events.
    /// User-initiated events always apply to the current session.
    pub fn generation(&self) -> Option<u64> {
        match self {
            Event::SearchOutcome { generation, .. }
            | Event::ClarifyOutcome { generation, .. }
            | Event::ProgressTick { generation }
            | Event::InterstitialTimer { generation, .. } => Some(*generation),
            Event::Submit { .. }
            | Event::ResolveClarification { .. }
            | Event::CancelClarification
            | Event::Reset
            | Event::AnswerQuestion { .. }
            | Event::SkipQuestion
            | Event::DigestOutcome { .. } => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Event::Submit { .. } => "submit",
            Event::ResolveClarification { .. } => "resolve_clarification",
            Event::CancelClarification => "cancel_clarification",
            Event::Reset => "reset",
            Event::AnswerQuestion { .. } => "answer_question",
            Event::SkipQuestion => "skip_question",
            Event::SearchOutcome { .. } => "search_outcome",
            Event::ClarifyOutcome { .. } => "clarify_outcome",
            Event::ProgressTick { .. } => "progress_tick",
            Event::InterstitialTimer { .. } => "interstitial_timer",
            Event::DigestOutcome { .. } => "digest_outcome",
        }
    }
}
