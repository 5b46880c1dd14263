//! Progress simulator
//!
//! Cosmetic, timer-driven stage indicator shown while the real search is in
//! flight. Advances on a fixed cadence regardless of how long the request
//! actually takes, holds at the final stage, and freezes when stopped. It is
//! never consulted for control flow; only the session controller transitions
//! status, and only from real responses.

use serde::Serialize;
use std::time::Duration;

/// How often the simulator advances one stage.
pub const TICK_INTERVAL: Duration = Duration::from_secs(2);

/// The canonical stage sequence, mirroring the steps the search agent
/// actually performs server-side.
pub const STAGES: [&str; 6] = [
    "Parsing your criteria",
    "Searching grant databases",
    "Filtering by eligibility",
    "Ranking by relevance",
    "Generating recommendations",
    "Preparing your results",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressState {
    pub stages: Vec<String>,
    pub current: usize,
    pub active: bool,
}

impl ProgressState {
    /// Begin a new simulation at the first stage.
    pub fn start(stages: &[&str]) -> Self {
        Self {
            stages: stages.iter().map(|s| (*s).to_string()).collect(),
            current: 0,
            active: true,
        }
    }

    /// Advance one stage. Holds at the final stage; inert once stopped.
    pub fn advance(&mut self) {
        if !self.active {
            return;
        }
        if self.current + 1 < self.stages.len() {
            self.current += 1;
        }
    }

    /// Freeze the indicator. `current` is retained so callers can keep
    /// displaying the last stage reached.
    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Whether another advance would move the indicator.
    pub fn at_final_stage(&self) -> bool {
        self.stages.is_empty() || self.current + 1 >= self.stages.len()
    }

    /// Label of the current stage, if a simulation ran at all.
    pub fn label(&self) -> Option<&str> {
        self.stages.get(self.current).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_and_holds_at_final_stage() {
        let mut progress = ProgressState::start(&STAGES);
        assert_eq!(progress.current, 0);
        assert_eq!(progress.label(), Some("Parsing your criteria"));

        for _ in 0..20 {
            progress.advance();
        }
        assert_eq!(progress.current, STAGES.len() - 1);
        assert!(progress.at_final_stage());
        assert_eq!(progress.label(), Some("Preparing your results"));
    }

    #[test]
    fn index_never_regresses() {
        let mut progress = ProgressState::start(&STAGES);
        let mut last = progress.current;
        for _ in 0..10 {
            progress.advance();
            assert!(progress.current >= last);
            last = progress.current;
        }
    }

    #[test]
    fn stop_freezes_current_index() {
        let mut progress = ProgressState::start(&STAGES);
        progress.advance();
        progress.advance();
        progress.stop();
        assert_eq!(progress.current, 2);

        progress.advance();
        assert_eq!(progress.current, 2, "no advancement after stop");
        assert!(!progress.active);
    }

    #[test]
    fn default_state_is_inert() {
        let mut progress = ProgressState::default();
        assert!(!progress.active);
        assert_eq!(progress.label(), None);
        progress.advance();
        assert_eq!(progress.current, 0);
    }
}
