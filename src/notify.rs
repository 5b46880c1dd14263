//! Notification guard
//!
//! The automatic send-results digest must go out at most once per distinct
//! result set, no matter how many completion events reference it. The guard
//! flips its `sent` flag in the same state transition that emits the
//! dispatch effect, before the async send runs, which closes the window
//! where two near-simultaneous completions could both pass a check-then-set.
//! A failed dispatch resets the flag, leaving exactly one retry opportunity.
//! Manual, user-initiated sends bypass the guard entirely.

use crate::backend::types::GrantItem;
use serde::Serialize;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GuardState {
    pub sent: bool,
    /// Fingerprint of the result set last offered to the guard.
    pub fingerprint: Option<String>,
}

impl GuardState {
    /// Offer a result set for automatic dispatch. Returns true when the
    /// caller should dispatch; the flag is set immediately so a second offer
    /// of the same set is refused even while the dispatch is in flight.
    pub fn offer(&mut self, fingerprint: &str) -> bool {
        if self.sent && self.fingerprint.as_deref() == Some(fingerprint) {
            return false;
        }
        self.fingerprint = Some(fingerprint.to_string());
        self.sent = true;
        true
    }

    /// Record a new result set superseding the previous one, without
    /// dispatching (no address on file, or an empty set).
    pub fn supersede(&mut self, fingerprint: &str) {
        self.fingerprint = Some(fingerprint.to_string());
        self.sent = false;
    }

    /// The dispatch for `fingerprint` ultimately failed; clear the flag so
    /// one retry is possible. A failure report for a superseded result set
    /// is ignored.
    pub fn dispatch_failed(&mut self, fingerprint: &str) {
        if self.fingerprint.as_deref() == Some(fingerprint) {
            self.sent = false;
        }
    }
}

/// Identity of a result set: SHA-256 over the ordered grant ids. Two
/// responses with the same grants in the same order are the same set.
pub fn fingerprint(grants: &[GrantItem]) -> String {
    let mut hasher = Sha256::new();
    for grant in grants {
        hasher.update(grant.id.as_bytes());
        hasher.update([0u8]);
    }
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
