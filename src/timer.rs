//! Timer scheduler
//!
//! The substrate the timer-driven components build on: delayed delivery of
//! events into the session event channel, cancellable as a unit.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A set of pending delayed events that can be cancelled together.
///
/// Each scheduled event is a spawned task racing a sleep against the set's
/// cancellation token. Cancelling the set (or dropping it) prevents every
/// pending event from being delivered; an event already sent into the channel
/// is past the point of no return and must be filtered downstream.
pub struct TimerSet<E: Send + 'static> {
    event_tx: mpsc::Sender<E>,
    cancel: CancellationToken,
}

impl<E: Send + 'static> TimerSet<E> {
    pub fn new(event_tx: mpsc::Sender<E>) -> Self {
        Self {
            event_tx,
            cancel: CancellationToken::new(),
        }
    }

    /// Deliver `event` into the channel after `delay`, unless cancelled first.
    pub fn schedule(&self, delay: Duration, event: E) {
        let token = self.cancel.child_token();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;

                () = token.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    let _ = tx.send(event).await;
                }
            }
        });
    }

    /// Cancel every pending timer in the set. The set stays usable: timers
    /// scheduled after this call are unaffected.
    pub fn cancel_all(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
    }
}

impl<E: Send + 'static> Drop for TimerSet<E> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
