//! Core types and scheduling logic for the Cadence study tracker.
//!
//! No HTTP, no database. The interval policy, the scheduler, the completion
//! engine and the statistics are pure functions over the types defined here;
//! storage backends implement [`store::StudyStore`].

pub mod completion;
pub mod error;
pub mod interval;
pub mod review;
pub mod schedule;
pub mod session;
pub mod stats;
pub mod store;
pub mod subject;

pub use error::{Error, Result};
