//! Tiketon background jobs.
//!
//! - [`purge`] -- the yearly retention purge: advance warnings to event
//!   creators, deletion of expired events, and an admin summary.
//! - [`schedule`] -- runs the purge once a day until cancelled.

pub mod purge;
pub mod schedule;

pub use purge::{PurgeEngine, PurgeError, PurgeReport};
