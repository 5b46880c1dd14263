//! Session effects
//!
//! Descriptions of the I/O a transition wants performed. The transition
//! function only ever returns these; the runtime interprets them. Network
//! effects are tagged with the generation that requested them so their
//! outcomes can be recognized as current or stale.

use crate::backend::types::{GrantItem, SearchQuery};
use crate::interstitial::SequencerStep;

/// Which pending timers a cancellation covers. Clarification stops the
/// interstitial sequencer but leaves the progress cadence running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerScope {
    Progress,
    Interstitial,
    All,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// `POST /process-input`, reporting back as [`super::Event::SearchOutcome`].
    IssueSearch { generation: u64, query: SearchQuery },
    /// `POST /clarify`, reporting back as [`super::Event::ClarifyOutcome`].
    IssueClarify {
        generation: u64,
        query: SearchQuery,
        choice: String,
    },
    /// `POST /send-email`, reporting back as [`super::Event::DigestOutcome`].
    /// Not generation-tagged: the outcome is for the guard, which is keyed
    /// by fingerprint and survives session resets.
    DispatchDigest {
        fingerprint: String,
        email: String,
        grants: Vec<GrantItem>,
        filters: SearchQuery,
    },
    /// Arm the next progress advance.
    ScheduleProgressTick { generation: u64 },
    /// Arm an interstitial sequencer step after its characteristic delay.
    ScheduleInterstitial {
        generation: u64,
        step: SequencerStep,
    },
    CancelTimers { scope: TimerScope },
    /// Persist the submitted criteria as the last-used filters.
    SaveFilters { query: SearchQuery },
    /// Append a completed search to the history.
    RecordSearch {
        query: SearchQuery,
        result_count: usize,
    },
}
