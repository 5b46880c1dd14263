//! Search session orchestration
//!
//! One search session at a time, modeled as a pure state machine: the
//! [`transition`] function maps (state, event) to (state, effects) without
//! performing any I/O, and the [`runtime`] executes the effects and feeds
//! outcomes back in as events. Every async callback carries the generation
//! it was spawned under; the transition function drops callbacks from
//! superseded generations, which is the whole cancellation story.

mod effect;
mod event;
#[cfg(test)]
mod proptests;
mod runtime;
mod state;
#[cfg(test)]
pub mod testing;
mod transition;

pub use effect::{Effect, TimerScope};
pub use event::Event;
pub use runtime::{spawn, SessionHandle, UiEvent};
pub use state::{Session, SessionStatus};
pub use transition::{transition, TransitionError, TransitionResult};
