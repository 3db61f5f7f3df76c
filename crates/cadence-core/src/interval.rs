//! The interval policy: maps a review outcome to the next step and offset.
//!
//! The standard ladder is `[24h, 7d, 15d, 30d, 60d]`. Its last rung repeats
//! indefinitely, so an item that keeps succeeding plateaus at 60 days.

use chrono::{DateTime, Duration, Utc};

use crate::{Error, Result, review::Outcome};

/// An ordered, non-empty sequence of review offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalLadder {
  offsets: Vec<Duration>,
}

impl Default for IntervalLadder {
  fn default() -> Self {
    Self {
      offsets: vec![
        Duration::hours(24),
        Duration::days(7),
        Duration::days(15),
        Duration::days(30),
        Duration::days(60),
      ],
    }
  }
}

impl IntervalLadder {
  pub fn new(offsets: Vec<Duration>) -> Result<Self> {
    if offsets.is_empty() {
      return Err(Error::EmptyLadder);
    }
    Ok(Self { offsets })
  }

  pub fn last_index(&self) -> u32 { (self.offsets.len() - 1) as u32 }

  /// Clamp a step into the ladder; steps past the end sit on the last rung.
  pub fn clamp(&self, step: u32) -> u32 { step.min(self.last_index()) }

  /// The offset for `step`, clamped.
  pub fn offset(&self, step: u32) -> Duration {
    self.offsets[self.clamp(step) as usize]
  }

  /// Step and offset for an item that has never been reviewed.
  pub fn initial(&self) -> (u32, Duration) { (0, self.offsets[0]) }

  /// Apply `outcome` to an item currently at `current`.
  pub fn next_step(&self, current: u32, outcome: Outcome) -> (u32, Duration) {
    let new_step = match outcome {
      Outcome::Success => self.clamp(current).saturating_add(1).min(self.last_index()),
      Outcome::Fail => 0,
    };
    (new_step, self.offset(new_step))
  }

  /// The due date consistent with an anchor and a step.
  pub fn due_at(&self, anchor: DateTime<Utc>, step: u32) -> DateTime<Utc> {
    anchor + self.offset(step)
  }
}
