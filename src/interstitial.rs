//! Interstitial question sequencer
//!
//! While a search is in flight the agent asks a short burst of optional
//! multiple-choice questions, one at a time: a "thinking" pause, then the
//! question with an auto-skip deadline, then a gap before the next one.
//! This module holds the question list, the timing constants, and the pure
//! phase machine; the session runtime schedules the actual timers.

use rand::Rng;
use serde::Serialize;
use std::time::Duration;

/// Delay between session start and the first question's thinking phase.
pub const INITIAL_DELAY: Duration = Duration::from_millis(1500);
/// Base "agent is composing" delay before a question appears.
pub const THINKING_DELAY_MIN: Duration = Duration::from_millis(600);
/// Random extension added to the thinking delay (0..=this).
pub const THINKING_JITTER_MS: u64 = 300;
/// How long a presented question waits for input before skipping itself.
pub const AUTO_SKIP_AFTER: Duration = Duration::from_secs(12);
/// Pause between one question's exit and the next question's thinking phase.
pub const NEXT_QUESTION_DELAY: Duration = Duration::from_secs(5);

pub struct Question {
    pub id: &'static str,
    pub prompt: &'static str,
    pub options: &'static [&'static str],
}

pub const QUESTIONS: [Question; 3] = [
    Question {
        id: "preference",
        prompt: "Do you prefer government or private grants?",
        options: &["Government grants", "Private grants", "No preference"],
    },
    Question {
        id: "deadline",
        prompt: "Earliest acceptable deadline?",
        options: &["Within 1 month", "Within 3 months", "Within 6 months", "No rush"],
    },
    Question {
        id: "eligibility",
        prompt: "Nonprofit or for-profit eligibility?",
        options: &["Nonprofit only", "For-profit only", "Either works"],
    },
];

/// The timer firings that drive the sequencer forward. Each carries the
/// question index it was scheduled for, so a late firing for a question that
/// already exited is recognizably stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerStep {
    /// Initial or inter-question delay elapsed; enter the thinking phase.
    BeginThinking { question: usize },
    /// Thinking delay elapsed; present the question.
    Present { question: usize },
    /// Auto-skip deadline hit with no input.
    AutoSkip { question: usize },
}

/// Delay before `step` should fire. The thinking delay is jittered here, in
/// the runtime's hands, so the phase machine itself stays deterministic.
pub fn delay_for(step: SequencerStep) -> Duration {
    match step {
        SequencerStep::BeginThinking { question: 0 } => INITIAL_DELAY,
        SequencerStep::BeginThinking { .. } => NEXT_QUESTION_DELAY,
        SequencerStep::Present { .. } => {
            let jitter = rand::thread_rng().gen_range(0..=THINKING_JITTER_MS);
            THINKING_DELAY_MIN + Duration::from_millis(jitter)
        }
        SequencerStep::AutoSkip { .. } => AUTO_SKIP_AFTER,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Between questions, or before the first / after the last.
    #[default]
    Idle,
    /// Agent is "composing"; no interaction possible.
    Thinking,
    /// Question visible, waiting for an answer, skip, or auto-skip.
    Presented,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub question: String,
    pub choice: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InterstitialState {
    /// Recorded answers in the order they were given. Monotonic within a
    /// session: entries are appended, never removed.
    pub answers: Vec<Answer>,
    pub current: Option<usize>,
    pub phase: Phase,
    /// Set once the last question has exited or the sequencer was stopped.
    pub finished: bool,
    /// How many questions have exited (answered or skipped).
    exited: usize,
}

impl InterstitialState {
    /// Fresh sequencer for a new session.
    pub fn start() -> Self {
        Self::default()
    }

    /// Apply a `BeginThinking` firing. Returns false if the firing is stale
    /// (wrong phase, wrong index, or the sequencer already finished).
    pub fn begin_thinking(&mut self, question: usize) -> bool {
        if self.finished
            || self.phase != Phase::Idle
            || self.current.is_some()
            || question >= QUESTIONS.len()
            || question != self.answered_or_skipped_count()
        {
            return false;
        }
        self.current = Some(question);
        self.phase = Phase::Thinking;
        true
    }

    /// Apply a `Present` firing.
    pub fn present(&mut self, question: usize) -> bool {
        if self.finished || self.phase != Phase::Thinking || self.current != Some(question) {
            return false;
        }
        self.phase = Phase::Presented;
        true
    }

    /// Record the user's choice for the presented question. Returns the index
    /// of the question that just exited, or None if nothing was presented.
    pub fn answer(&mut self, choice: &str) -> Option<usize> {
        if self.phase != Phase::Presented {
            return None;
        }
        let index = self.current?;
        self.answers.push(Answer {
            question: QUESTIONS[index].id.to_string(),
            choice: choice.to_string(),
        });
        self.exit_question(index);
        Some(index)
    }

    /// Exit the presented question without recording an answer. Covers both
    /// the explicit skip button and the auto-skip deadline.
    pub fn skip(&mut self, question: usize) -> bool {
        if self.phase != Phase::Presented || self.current != Some(question) {
            return false;
        }
        self.exit_question(question);
        true
    }

    /// Halt the sequencer for the rest of the session. Recorded answers are
    /// retained for the results view.
    pub fn stop(&mut self) {
        self.current = None;
        self.phase = Phase::Idle;
        self.finished = true;
    }

    /// Index of the question to schedule next, if any remain after an exit.
    pub fn next_question(&self) -> Option<usize> {
        if self.finished || self.phase != Phase::Idle || self.current.is_some() {
            return None;
        }
        let next = self.answered_or_skipped_count();
        (next < QUESTIONS.len()).then_some(next)
    }

    fn exit_question(&mut self, index: usize) {
        self.current = None;
        self.phase = Phase::Idle;
        self.exited = index + 1;
        if self.exited >= QUESTIONS.len() {
            self.finished = true;
        }
    }

    fn answered_or_skipped_count(&self) -> usize {
        self.exited
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_all_questions_in_order() {
        let mut seq = InterstitialState::start();

        for i in 0..QUESTIONS.len() {
            assert!(seq.begin_thinking(i));
            assert!(seq.present(i));
            assert_eq!(seq.answer("No preference"), Some(i));
        }
        assert!(seq.finished);
        assert_eq!(seq.answers.len(), QUESTIONS.len());
        assert_eq!(seq.next_question(), None);
    }

    #[test]
    fn skip_records_no_answer_and_advances() {
        let mut seq = InterstitialState::start();
        assert!(seq.begin_thinking(0));
        assert!(seq.present(0));
        assert!(seq.skip(0));

        assert!(seq.answers.is_empty());
        assert_eq!(seq.next_question(), Some(1));
    }

    #[test]
    fn stale_firings_are_rejected() {
        let mut seq = InterstitialState::start();
        assert!(!seq.present(0), "present before thinking");
        assert!(seq.begin_thinking(0));
        assert!(!seq.begin_thinking(0), "double thinking");
        assert!(!seq.begin_thinking(1), "wrong index");
        assert!(seq.present(0));
        assert!(!seq.skip(1), "auto-skip for a different question");
        assert_eq!(seq.answer("x"), Some(0));
        assert!(!seq.skip(0), "auto-skip after the question exited");
    }

    #[test]
    fn answers_only_for_presented_questions() {
        let mut seq = InterstitialState::start();
        assert_eq!(seq.answer("early"), None);
        assert!(seq.begin_thinking(0));
        assert_eq!(seq.answer("still thinking"), None);
        assert!(seq.answers.is_empty());
    }

    #[test]
    fn stop_halts_but_keeps_answers() {
        let mut seq = InterstitialState::start();
        assert!(seq.begin_thinking(0));
        assert!(seq.present(0));
        seq.answer("Government grants");

        seq.stop();
        assert!(seq.finished);
        assert!(!seq.begin_thinking(1), "no transitions after stop");
        assert_eq!(seq.answers.len(), 1);
        assert_eq!(seq.answers[0].question, "preference");
    }

    #[test]
    fn last_question_exit_finishes_sequencer() {
        let mut seq = InterstitialState::start();
        for i in 0..QUESTIONS.len() {
            assert!(seq.begin_thinking(i));
            assert!(seq.present(i));
            assert!(seq.skip(i));
        }
        assert!(seq.finished);
        assert!(seq.answers.is_empty());
    }
}
