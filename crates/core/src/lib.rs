//! Tiketon domain logic.
//!
//! Pure business rules shared by the database, notification, worker and API
//! crates. Nothing in here performs I/O:
//!
//! - [`accrual`] -- how participation hours are computed from an event's
//!   duration (lateness deduction or leader bonus).
//! - [`certificate`] -- certificate documents, hour aggregation and rounding.
//! - [`retention`] -- the one-year retention window and purge notices.

pub mod accrual;
pub mod certificate;
pub mod channels;
pub mod error;
pub mod retention;
pub mod roles;
pub mod types;
