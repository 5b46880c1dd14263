//! The pure transition function
//!
//! No I/O, no clocks, no randomness: given the current session and one
//! event, produce the next session plus the effects to run. Determinism
//! here is what makes the generation guard airtight and the whole
//! orchestrator testable without timers or a server.

use super::effect::{Effect, TimerScope};
use super::event::Event;
use super::state::{Session, SessionStatus};
use crate::backend::types::GrantItem;
use crate::interstitial::{InterstitialState, SequencerStep};
use crate::notify;
use crate::progress::{ProgressState, STAGES};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionResult {
    pub session: Session,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    fn new(session: Session) -> Self {
        Self {
            session,
            effects: Vec::new(),
        }
    }

    /// The event applies but changes nothing (stale callbacks land here).
    fn unchanged(session: &Session) -> Self {
        Self::new(session.clone())
    }

    fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// A user action that makes no sense in the current status. Surfaced to the
/// caller rather than applied; stale async callbacks never produce this.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("no clarification question is pending")]
    NoClarificationPending,
}

pub fn transition(session: &Session, event: Event) -> Result<TransitionResult, TransitionError> {
    // The generation guard. A callback spawned under a superseded session
    // is dropped here, whole, before any state is touched.
    if let Some(generation) = event.generation() {
        if generation != session.generation {
            tracing::debug!(
                event = event.name(),
                event_generation = generation,
                current_generation = session.generation,
                "dropping stale callback"
            );
            return Ok(TransitionResult::unchanged(session));
        }
    }

    match event {
        Event::Submit {
            query,
            digest_email,
        } => {
            let generation = session.generation + 1;
            let next = Session {
                generation,
                status: SessionStatus::Submitting,
                query: Some(query.clone()),
                progress: ProgressState::start(&STAGES),
                interstitial: InterstitialState::start(),
                guard: session.guard.clone(),
                digest_email,
                ..Session::default()
            };
            Ok(TransitionResult::new(next)
                .with_effect(Effect::CancelTimers {
                    scope: TimerScope::All,
                })
                .with_effect(Effect::SaveFilters {
                    query: query.clone(),
                })
                .with_effect(Effect::IssueSearch { generation, query })
                .with_effect(Effect::ScheduleProgressTick { generation })
                .with_effect(Effect::ScheduleInterstitial {
                    generation,
                    step: SequencerStep::BeginThinking { question: 0 },
                }))
        }

        Event::SearchOutcome { outcome, .. } => {
            if session.status != SessionStatus::Submitting {
                tracing::debug!(status = ?session.status, "search outcome outside submitting");
                return Ok(TransitionResult::unchanged(session));
            }
            match outcome {
                Ok(reply) if reply.needs_clarification() => {
                    let mut next = session.clone();
                    next.status = SessionStatus::AwaitingClarification;
                    next.clarification = reply.clarification;
                    next.interstitial.stop();
                    // Progress keeps running behind the question.
                    Ok(TransitionResult::new(next).with_effect(Effect::CancelTimers {
                        scope: TimerScope::Interstitial,
                    }))
                }
                Ok(reply) => Ok(complete_with_results(session, reply.grants)),
                Err(error) => Ok(fail(session, error)),
            }
        }

        Event::ResolveClarification { choice } => {
            if session.status != SessionStatus::AwaitingClarification {
                return Err(TransitionError::NoClarificationPending);
            }
            let mut next = session.clone();
            next.status = SessionStatus::Clarifying;
            next.clarification = None;
            let query = next.query.clone().unwrap_or_default();
            Ok(TransitionResult::new(next).with_effect(Effect::IssueClarify {
                generation: session.generation,
                query,
                choice,
            }))
        }

        Event::ClarifyOutcome { outcome, .. } => {
            if session.status != SessionStatus::Clarifying {
                tracing::debug!(status = ?session.status, "clarify outcome outside clarifying");
                return Ok(TransitionResult::unchanged(session));
            }
            match outcome {
                Ok(grants) => Ok(complete_with_results(session, grants)),
                Err(error) => Ok(fail(session, error)),
            }
        }

        Event::CancelClarification => {
            if session.status != SessionStatus::AwaitingClarification {
                return Err(TransitionError::NoClarificationPending);
            }
            let mut next = session.clone();
            next.status = SessionStatus::Idle;
            next.clarification = None;
            next.query = None;
            next.progress = ProgressState::default();
            // Recorded interstitial answers survive until a real reset; the
            // sequencer was already stopped when the clarification arrived.
            Ok(TransitionResult::new(next).with_effect(Effect::CancelTimers {
                scope: TimerScope::All,
            }))
        }

        Event::Reset => {
            let next = Session {
                generation: session.generation + 1,
                guard: session.guard.clone(),
                ..Session::default()
            };
            Ok(TransitionResult::new(next).with_effect(Effect::CancelTimers {
                scope: TimerScope::All,
            }))
        }

        Event::ProgressTick { .. } => {
            if !session.progress.active {
                return Ok(TransitionResult::unchanged(session));
            }
            let mut next = session.clone();
            next.progress.advance();
            let result = TransitionResult::new(next);
            if session.progress.at_final_stage() && result.session.progress.at_final_stage() {
                // Holding at the last stage; nothing left to schedule.
                Ok(result)
            } else {
                Ok(result.with_effect(Effect::ScheduleProgressTick {
                    generation: session.generation,
                }))
            }
        }

        Event::InterstitialTimer { step, .. } => {
            if session.status != SessionStatus::Submitting {
                return Ok(TransitionResult::unchanged(session));
            }
            apply_sequencer_step(session, step)
        }

        Event::AnswerQuestion { choice } => {
            let mut next = session.clone();
            match next.interstitial.answer(&choice) {
                // Nothing presented right now; the question may have just
                // auto-skipped under the user's click.
                None => Ok(TransitionResult::unchanged(session)),
                Some(_) => Ok(after_question_exit(next)),
            }
        }

        Event::SkipQuestion => {
            let mut next = session.clone();
            let Some(current) = next.interstitial.current else {
                return Ok(TransitionResult::unchanged(session));
            };
            if next.interstitial.skip(current) {
                Ok(after_question_exit(next))
            } else {
                Ok(TransitionResult::unchanged(session))
            }
        }

        Event::DigestOutcome {
            fingerprint,
            outcome,
        } => match outcome {
            Ok(()) => {
                tracing::info!("digest email dispatched");
                Ok(TransitionResult::unchanged(session))
            }
            Err(error) => {
                tracing::warn!(kind = error.kind.label(), %error, "digest dispatch failed");
                let mut next = session.clone();
                next.guard.dispatch_failed(&fingerprint);
                Ok(TransitionResult::new(next))
            }
        },
    }
}

/// Shared tail of both successful outcome paths.
fn complete_with_results(session: &Session, grants: Vec<GrantItem>) -> TransitionResult {
    let mut next = session.clone();
    next.status = SessionStatus::Completed;
    next.clarification = None;
    next.error = None;
    next.progress.stop();
    next.interstitial.stop();

    let mut result = TransitionResult::new(next).with_effect(Effect::CancelTimers {
        scope: TimerScope::All,
    });
    if let Some(query) = result.session.query.clone() {
        result = result.with_effect(Effect::RecordSearch {
            query,
            result_count: grants.len(),
        });
    }

    // Digest dispatch decision happens inside the same transition that sets
    // the results, so the guard flag and the dispatch effect are atomic.
    let fingerprint = notify::fingerprint(&grants);
    let email = result.session.digest_email.clone().filter(|e| !e.is_empty());
    let filters = result.session.query.clone().unwrap_or_default();
    match email {
        Some(email) if !grants.is_empty() => {
            if result.session.guard.offer(&fingerprint) {
                result = result.with_effect(Effect::DispatchDigest {
                    fingerprint,
                    email,
                    grants: grants.clone(),
                    filters,
                });
            }
        }
        _ => result.session.guard.supersede(&fingerprint),
    }

    result.session.results = grants;
    result
}

fn fail(session: &Session, error: crate::backend::SearchError) -> TransitionResult {
    let mut next = session.clone();
    next.status = SessionStatus::Failed;
    next.error = Some(error);
    next.progress.stop();
    next.interstitial.stop();
    TransitionResult::new(next).with_effect(Effect::CancelTimers {
        scope: TimerScope::All,
    })
}

fn apply_sequencer_step(
    session: &Session,
    step: SequencerStep,
) -> Result<TransitionResult, TransitionError> {
    let mut next = session.clone();
    let generation = session.generation;
    match step {
        SequencerStep::BeginThinking { question } => {
            if !next.interstitial.begin_thinking(question) {
                return Ok(TransitionResult::unchanged(session));
            }
            Ok(
                TransitionResult::new(next).with_effect(Effect::ScheduleInterstitial {
                    generation,
                    step: SequencerStep::Present { question },
                }),
            )
        }
        SequencerStep::Present { question } => {
            if !next.interstitial.present(question) {
                return Ok(TransitionResult::unchanged(session));
            }
            Ok(
                TransitionResult::new(next).with_effect(Effect::ScheduleInterstitial {
                    generation,
                    step: SequencerStep::AutoSkip { question },
                }),
            )
        }
        SequencerStep::AutoSkip { question } => {
            if !next.interstitial.skip(question) {
                return Ok(TransitionResult::unchanged(session));
            }
            Ok(schedule_next_question(TransitionResult::new(next)))
        }
    }
}

/// A question exited through user input: kill its pending auto-skip, then
/// arm the gap before the next question if one remains.
fn after_question_exit(next: Session) -> TransitionResult {
    let result = TransitionResult::new(next).with_effect(Effect::CancelTimers {
        scope: TimerScope::Interstitial,
    });
    schedule_next_question(result)
}

fn schedule_next_question(result: TransitionResult) -> TransitionResult {
    let generation = result.session.generation;
    match result.session.interstitial.next_question() {
        Some(question) => result.with_effect(Effect::ScheduleInterstitial {
            generation,
            step: SequencerStep::BeginThinking { question },
        }),
        None => result,
    }
}
