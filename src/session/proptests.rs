//! Property tests over the pure transition function
//!
//! Random event sequences against the invariants that matter: staleness is
//! absolute, the function is deterministic, cosmetic state never moves
//! backwards, and the digest guard holds under any interleaving.

use super::effect::Effect;
use super::event::Event;
use super::state::Session;
use super::transition::transition;
use crate::backend::types::{GrantItem, SearchQuery, SearchReply};
use crate::backend::SearchError;
use crate::interstitial::SequencerStep;
use proptest::prelude::*;
use std::collections::HashMap;

fn grant(id: &str) -> GrantItem {
    GrantItem {
        id: id.to_string(),
        title: format!("Grant {id}"),
        amount: String::new(),
        deadline: None,
        country: String::new(),
        sector: String::new(),
        eligibility: String::new(),
        source: String::new(),
        apply_link: String::new(),
        relevance_score: None,
    }
}

/// Small id pool so identical result sets recur across a run.
fn arb_grants() -> impl Strategy<Value = Vec<GrantItem>> {
    proptest::collection::vec(
        prop_oneof![Just("a"), Just("b"), Just("c")].prop_map(grant),
        0..3,
    )
}

fn arb_search_error() -> impl Strategy<Value = SearchError> {
    prop_oneof![
        Just(SearchError::timeout("no response")),
        Just(SearchError::connectivity("refused")),
        Just(SearchError::server("boom")),
    ]
}

fn arb_step() -> impl Strategy<Value = SequencerStep> {
    prop_oneof![
        (0usize..4).prop_map(|question| SequencerStep::BeginThinking { question }),
        (0usize..4).prop_map(|question| SequencerStep::Present { question }),
        (0usize..4).prop_map(|question| SequencerStep::AutoSkip { question }),
    ]
}

fn arb_callback_event(generation: u64) -> impl Strategy<Value = Event> {
    prop_oneof![
        (arb_grants(), proptest::bool::ANY).prop_map(move |(grants, ok)| {
            let outcome = if ok {
                Ok(SearchReply {
                    grants,
                    clarification: None,
                })
            } else {
                Err(SearchError::server("boom"))
            };
            Event::SearchOutcome {
                generation,
                outcome,
            }
        }),
        (arb_grants(), proptest::bool::ANY).prop_map(move |(grants, ok)| {
            let outcome = if ok { Ok(grants) } else { Err(SearchError::timeout("slow")) };
            Event::ClarifyOutcome {
                generation,
                outcome,
            }
        }),
        Just(Event::ProgressTick { generation }),
        arb_step().prop_map(move |step| Event::InterstitialTimer { generation, step }),
    ]
}

/// Digest outcomes are keyed by fingerprint, not generation, so they are
/// generated separately from the guarded callbacks.
fn arb_digest_event() -> impl Strategy<Value = Event> {
    (arb_grants(), arb_search_error(), proptest::bool::ANY).prop_map(|(grants, error, ok)| {
        Event::DigestOutcome {
            fingerprint: crate::notify::fingerprint(&grants),
            outcome: if ok { Ok(()) } else { Err(error) },
        }
    })
}

fn arb_user_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        ("[a-z ]{1,12}", proptest::bool::ANY).prop_map(|(text, opt_in)| Event::Submit {
            query: SearchQuery::chat(text),
            digest_email: opt_in.then(|| "founder@example.com".to_string()),
        }),
        Just(Event::Reset),
        Just(Event::CancelClarification),
        Just(Event::SkipQuestion),
        "[A-Za-z ]{1,10}".prop_map(|choice| Event::ResolveClarification { choice }),
        "[A-Za-z ]{1,10}".prop_map(|choice| Event::AnswerQuestion { choice }),
    ]
}

fn arb_any_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        arb_user_event(),
        arb_digest_event(),
        (0u64..4).prop_flat_map(arb_callback_event),
    ]
}

fn submitted() -> Session {
    transition(
        &Session::default(),
        Event::Submit {
            query: SearchQuery::chat("seed"),
            digest_email: Some("founder@example.com".to_string()),
        },
    )
    .unwrap()
    .session
}

proptest! {
    /// Any callback from a generation other than the current one leaves the
    /// session untouched and produces no effects.
    #[test]
    fn stale_callbacks_are_inert(
        event in prop_oneof![Just(0u64), 2u64..64].prop_flat_map(arb_callback_event)
    ) {
        let session = submitted();
        let result = transition(&session, event).unwrap();
        prop_assert_eq!(&result.session, &session);
        prop_assert!(result.effects.is_empty());
    }

    /// Same session, same event, same answer. No hidden clocks or RNG.
    #[test]
    fn transition_is_deterministic(events in proptest::collection::vec(arb_any_event(), 0..24)) {
        let mut session = Session::default();
        for event in events {
            let first = transition(&session, event.clone());
            let second = transition(&session, event);
            prop_assert_eq!(&first, &second);
            if let Ok(result) = first {
                session = result.session;
            }
        }
    }

    /// While a session's progress display is live, its stage index only
    /// ever moves forward.
    #[test]
    fn progress_never_regresses(events in proptest::collection::vec(arb_any_event(), 0..32)) {
        let mut session = submitted();
        for event in events {
            let Ok(result) = transition(&session, event) else { continue };
            if result.session.generation == session.generation
                && result.session.progress.active
            {
                prop_assert!(result.session.progress.current >= session.progress.current);
            }
            session = result.session;
        }
    }

    /// Within a session, recorded answers are append-only.
    #[test]
    fn answers_are_append_only(events in proptest::collection::vec(arb_any_event(), 0..32)) {
        let mut session = submitted();
        for event in events {
            let Ok(result) = transition(&session, event) else { continue };
            if result.session.generation == session.generation {
                prop_assert!(result
                    .session
                    .interstitial
                    .answers
                    .starts_with(&session.interstitial.answers));
            }
            session = result.session;
        }
    }

    /// A given result set is dispatched at most once more than the number
    /// of reported dispatch failures for it.
    #[test]
    fn digest_dispatch_is_at_most_once(events in proptest::collection::vec(arb_any_event(), 0..48)) {
        let mut session = Session::default();
        let mut dispatches: HashMap<String, usize> = HashMap::new();
        let mut failures: HashMap<String, usize> = HashMap::new();

        for event in events {
            if let Event::DigestOutcome { fingerprint, outcome: Err(_) } = &event {
                *failures.entry(fingerprint.clone()).or_default() += 1;
            }
            let Ok(result) = transition(&session, event) else { continue };
            for effect in &result.effects {
                if let Effect::DispatchDigest { fingerprint, .. } = effect {
                    *dispatches.entry(fingerprint.clone()).or_default() += 1;
                }
            }
            session = result.session;
        }

        for (fingerprint, count) in &dispatches {
            let allowed = 1 + failures.get(fingerprint).copied().unwrap_or(0);
            prop_assert!(
                *count <= allowed,
                "fingerprint {} dispatched {} times with {} failures",
                fingerprint,
                count,
                allowed - 1
            );
        }
    }
}
