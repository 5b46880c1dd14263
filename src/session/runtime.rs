//! Session runtime
//!
//! Owns the single event channel, applies [`transition`], and interprets
//! the returned effects: network calls become spawned tasks that report
//! back as generation-tagged events, timer effects arm one of two
//! cancellable timer sets, store effects are applied inline. State
//! snapshots go out over a broadcast channel for whatever UI is attached.

use super::effect::{Effect, TimerScope};
use super::event::Event;
use super::state::Session;
use super::transition::transition;
use crate::backend::types::{GrantItem, SearchQuery};
use crate::backend::{SearchBackend, SearchError};
use crate::interstitial;
use crate::progress;
use crate::store::{PrefStore, SearchRecord, StoreError};
use crate::timer::TimerSet;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

const EVENT_CHANNEL_CAPACITY: usize = 64;
const UI_CHANNEL_CAPACITY: usize = 64;

/// What the UI layer receives.
#[derive(Debug, Clone)]
pub enum UiEvent {
    /// The session changed; here is the whole new state.
    Snapshot(Session),
    /// A user action was rejected as invalid in the current state.
    Rejected { message: String },
}

/// Start the orchestrator on the current tokio runtime.
pub fn spawn(
    backend: impl SearchBackend + 'static,
    store: impl PrefStore + 'static,
) -> SessionHandle {
    let backend: Arc<dyn SearchBackend> = Arc::new(backend);
    let store: Arc<dyn PrefStore> = Arc::new(store);
    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (ui_tx, _) = broadcast::channel(UI_CHANNEL_CAPACITY);

    let runtime = SessionRuntime {
        session: Session::default(),
        backend: Arc::clone(&backend),
        store: Arc::clone(&store),
        event_tx: event_tx.clone(),
        ui_tx: ui_tx.clone(),
        progress_timers: TimerSet::new(event_tx.clone()),
        interstitial_timers: TimerSet::new(event_tx.clone()),
    };
    tokio::spawn(runtime.run(event_rx));

    SessionHandle {
        event_tx,
        ui_tx,
        backend,
        store,
    }
}

/// Cloneable handle for driving the session and observing it.
#[derive(Clone)]
pub struct SessionHandle {
    event_tx: mpsc::Sender<Event>,
    ui_tx: broadcast::Sender<UiEvent>,
    backend: Arc<dyn SearchBackend>,
    store: Arc<dyn PrefStore>,
}

impl SessionHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.ui_tx.subscribe()
    }

    pub async fn submit(&self, query: SearchQuery) {
        self.send(Event::Submit {
            query,
            digest_email: None,
        })
        .await;
    }

    pub async fn resolve_clarification(&self, choice: impl Into<String>) {
        self.send(Event::ResolveClarification {
            choice: choice.into(),
        })
        .await;
    }

    pub async fn cancel_clarification(&self) {
        self.send(Event::CancelClarification).await;
    }

    pub async fn reset(&self) {
        self.send(Event::Reset).await;
    }

    pub async fn answer_question(&self, choice: impl Into<String>) {
        self.send(Event::AnswerQuestion {
            choice: choice.into(),
        })
        .await;
    }

    pub async fn skip_question(&self) {
        self.send(Event::SkipQuestion).await;
    }

    /// User-initiated digest send. Deliberately bypasses the at-most-once
    /// guard; an explicit click always sends.
    pub async fn send_digest_now(
        &self,
        email: &str,
        grants: &[GrantItem],
        filters: &SearchQuery,
    ) -> Result<(), SearchError> {
        self.backend.send_digest(email, grants, filters).await
    }

    pub async fn save_grant(&self, grant: GrantItem) -> Result<(), StoreError> {
        self.store.save_grant(grant).await
    }

    pub async fn unsave_grant(&self, id: &str) -> Result<(), StoreError> {
        self.store.unsave_grant(id).await
    }

    pub async fn saved_grants(&self) -> Result<Vec<GrantItem>, StoreError> {
        self.store.saved_grants().await
    }

    pub async fn history(&self) -> Result<Vec<SearchRecord>, StoreError> {
        self.store.history().await
    }

    pub async fn set_digest_email(&self, email: Option<String>) -> Result<(), StoreError> {
        self.store.set_digest_email(email).await
    }

    async fn send(&self, event: Event) {
        if self.event_tx.send(event).await.is_err() {
            tracing::warn!("session runtime is gone; event dropped");
        }
    }
}

struct SessionRuntime {
    session: Session,
    backend: Arc<dyn SearchBackend>,
    store: Arc<dyn PrefStore>,
    event_tx: mpsc::Sender<Event>,
    ui_tx: broadcast::Sender<UiEvent>,
    progress_timers: TimerSet<Event>,
    interstitial_timers: TimerSet<Event>,
}

impl SessionRuntime {
    async fn run(mut self, mut event_rx: mpsc::Receiver<Event>) {
        while let Some(event) = event_rx.recv().await {
            self.handle(event).await;
        }
        tracing::debug!("event channel closed; session runtime stopping");
    }

    async fn handle(&mut self, event: Event) {
        let name = event.name();
        let event = self.enrich(event).await;
        match transition(&self.session, event) {
            Ok(result) => {
                let changed = result.session != self.session;
                self.session = result.session;
                for effect in result.effects {
                    self.execute(effect).await;
                }
                if changed {
                    let _ = self.ui_tx.send(UiEvent::Snapshot(self.session.clone()));
                }
            }
            Err(e) => {
                tracing::debug!(event = name, error = %e, "rejected event");
                let _ = self.ui_tx.send(UiEvent::Rejected {
                    message: e.to_string(),
                });
            }
        }
    }

    /// A submission without an explicit digest opt-in picks up the stored
    /// address here, so the transition sees the snapshotted value.
    async fn enrich(&self, event: Event) -> Event {
        match event {
            Event::Submit {
                query,
                digest_email: None,
            } => {
                let digest_email = match self.store.digest_email().await {
                    Ok(email) => email,
                    Err(e) => {
                        tracing::warn!(error = %e, "could not read digest address");
                        None
                    }
                };
                Event::Submit {
                    query,
                    digest_email,
                }
            }
            other => other,
        }
    }

    async fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::IssueSearch { generation, query } => {
                let backend = Arc::clone(&self.backend);
                let tx = self.event_tx.clone();
                tokio::spawn(async move {
                    let outcome = backend.search(&query).await;
                    let _ = tx.send(Event::SearchOutcome {
                        generation,
                        outcome,
                    })
                    .await;
                });
            }
            Effect::IssueClarify {
                generation,
                query,
                choice,
            } => {
                let backend = Arc::clone(&self.backend);
                let tx = self.event_tx.clone();
                tokio::spawn(async move {
                    let outcome = backend.clarify(&query, &choice).await;
                    let _ = tx.send(Event::ClarifyOutcome {
                        generation,
                        outcome,
                    })
                    .await;
                });
            }
            Effect::DispatchDigest {
                fingerprint,
                email,
                grants,
                filters,
            } => {
                let backend = Arc::clone(&self.backend);
                let tx = self.event_tx.clone();
                tokio::spawn(async move {
                    let outcome = backend.send_digest(&email, &grants, &filters).await;
                    let _ = tx.send(Event::DigestOutcome {
                        fingerprint,
                        outcome,
                    })
                    .await;
                });
            }
            Effect::ScheduleProgressTick { generation } => {
                self.progress_timers.schedule(
                    progress::TICK_INTERVAL,
                    Event::ProgressTick { generation },
                );
            }
            Effect::ScheduleInterstitial { generation, step } => {
                self.interstitial_timers.schedule(
                    interstitial::delay_for(step),
                    Event::InterstitialTimer { generation, step },
                );
            }
            Effect::CancelTimers { scope } => match scope {
                TimerScope::Progress => self.progress_timers.cancel_all(),
                TimerScope::Interstitial => self.interstitial_timers.cancel_all(),
                TimerScope::All => {
                    self.progress_timers.cancel_all();
                    self.interstitial_timers.cancel_all();
                }
            },
            Effect::SaveFilters { query } => {
                if let Err(e) = self.store.set_last_filters(&query).await {
                    tracing::warn!(error = %e, "could not persist last filters");
                }
            }
            Effect::RecordSearch {
                query,
                result_count,
            } => {
                let record = SearchRecord {
                    query,
                    submitted_at: chrono::Utc::now(),
                    result_count,
                };
                if let Err(e) = self.store.record_search(record).await {
                    tracing::warn!(error = %e, "could not record search history");
                }
            }
        }
    }
}
