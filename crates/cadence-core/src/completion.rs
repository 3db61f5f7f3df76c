//! The completion engine: applies a review outcome to a [`ReviewItem`].
//!
//! These functions are pure. Storage backends load the item, call
//! [`complete`], and persist both the updated item and the returned
//! [`ReviewEvent`] in one transaction.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error, Result,
  interval::IntervalLadder,
  review::{NewReview, Outcome, ReviewEvent, ReviewItem},
};

/// The result of applying one outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
  pub review: ReviewItem,
  pub event:  ReviewEvent,
}

/// Build the first schedule for a topic that has never been reviewed: step 0,
/// due one rung after creation.
pub fn schedule_new(input: NewReview, ladder: &IntervalLadder) -> ReviewItem {
  let (step, offset) = ladder.initial();
  ReviewItem {
    review_id:        input.review_id.unwrap_or_else(Uuid::new_v4),
    subject_id:       input.subject_id,
    topic:            input.topic,
    created_at:       input.created_at,
    last_reviewed_at: None,
    interval_step:    step,
    due_at:           input.created_at + offset,
  }
}

/// Apply `outcome` at `at` to `item`.
///
/// Returns [`Error::StaleTimestamp`] unless `at` is strictly after the
/// item's anchor (the last review, or creation for an item never reviewed).
/// Replaying the event that created or last completed the item is rejected.
pub fn complete(
  item: &ReviewItem,
  outcome: Outcome,
  at: DateTime<Utc>,
  ladder: &IntervalLadder,
) -> Result<Completion> {
  if at <= item.anchor() {
    return Err(Error::StaleTimestamp {
      id:   item.review_id,
      at,
      last: item.anchor(),
    });
  }

  let (new_step, offset) = ladder.next_step(item.interval_step, outcome);
  let review = ReviewItem {
    last_reviewed_at: Some(at),
    interval_step: new_step,
    due_at: at + offset,
    ..item.clone()
  };

  let event = ReviewEvent {
    event_id: Uuid::new_v4(),
    review_id: item.review_id,
    outcome,
    reviewed_at: at,
    previous_step: item.interval_step,
    new_step,
    previous_due_at: item.due_at,
    new_due_at: review.due_at,
  };

  Ok(Completion { review, event })
}
