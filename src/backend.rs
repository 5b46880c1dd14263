//! Search backend round-trips
//!
//! Wraps the three endpoints of the grant finder API behind a trait seam:
//! primary search, clarification refinement, and digest dispatch. Responses
//! are interpreted here; failure classification drives the user-facing
//! message but never control flow beyond marking the session failed.

mod client;
mod error;
pub mod types;

pub use client::{HttpBackend, SearchBackend};
pub use error::{SearchError, SearchErrorKind};
