//! The scheduler: projects priority and status, and partitions review items
//! into the overdue / due-today / upcoming board.
//!
//! Everything here is a read-side projection recomputed from `due_at` on
//! every call. Nothing is persisted, so the board can never drift from the
//! schedule.

use std::collections::HashMap;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset as _, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::review::{Priority, ReviewItem, ReviewStatus, ScheduledReview};

// ─── Board ───────────────────────────────────────────────────────────────────

/// The scheduler's partition of review items as of `as_of`.
///
/// Every item lands in exactly one list. Each list is ordered by `due_at`,
/// then priority rank, then subject id, then review id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewBoard {
  pub as_of:     DateTime<Utc>,
  /// `due_at < as_of`.
  pub overdue:   Vec<ScheduledReview>,
  /// Due later in the current calendar day.
  pub due_today: Vec<ScheduledReview>,
  /// Due on a later calendar day.
  pub upcoming:  Vec<ScheduledReview>,
}

impl ReviewBoard {
  pub fn len(&self) -> usize {
    self.overdue.len() + self.due_today.len() + self.upcoming.len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  /// Drop entries not matching `filter`; order is preserved.
  /// `subject_names` resolves subject ids for the free-text match.
  pub fn filtered(
    mut self,
    filter: &BoardFilter,
    subject_names: &HashMap<Uuid, String>,
  ) -> Self {
    let keep = |r: &ScheduledReview| {
      filter.matches(r, subject_names.get(&r.review.subject_id).map(String::as_str))
    };
    self.overdue.retain(keep);
    self.due_today.retain(keep);
    self.upcoming.retain(keep);
    self
  }
}

/// Narrowing applied to a [`ReviewBoard`] for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BoardFilter {
  /// Case-insensitive match against the topic or the subject name.
  pub text:       Option<String>,
  pub priority:   Option<Priority>,
  pub subject_id: Option<Uuid>,
}

impl BoardFilter {
  pub fn matches(&self, review: &ScheduledReview, subject_name: Option<&str>) -> bool {
    if let Some(p) = self.priority
      && review.priority != p
    {
      return false;
    }
    if let Some(id) = self.subject_id
      && review.review.subject_id != id
    {
      return false;
    }
    match self.text.as_deref().map(str::trim) {
      None | Some("") => true,
      Some(text) => {
        let needle = text.to_lowercase();
        review.review.topic.to_lowercase().contains(&needle)
          || subject_name.is_some_and(|n| n.to_lowercase().contains(&needle))
      }
    }
  }
}

// ─── Scheduler ───────────────────────────────────────────────────────────────

/// Computes the review board. Calendar days are evaluated in a fixed UTC
/// offset so "due today" matches the learner's wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduler {
  offset: FixedOffset,
}

impl Default for Scheduler {
  fn default() -> Self { Self { offset: Utc.fix() } }
}

impl Scheduler {
  pub fn new(offset: FixedOffset) -> Self { Self { offset } }

  /// Returns `None` when the offset is not strictly within ±24h.
  pub fn with_utc_offset_minutes(minutes: i32) -> Option<Self> {
    minutes.checked_mul(60).and_then(FixedOffset::east_opt).map(Self::new)
  }

  pub fn offset(&self) -> FixedOffset { self.offset }

  /// The calendar date of `at` on the learner's wall clock.
  pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&self.offset).date_naive()
  }

  /// The UTC instant at which local `date` begins.
  pub fn start_of(&self, date: NaiveDate) -> DateTime<Utc> {
    let local_midnight = date.and_time(NaiveTime::MIN);
    (local_midnight - Duration::seconds(i64::from(self.offset.local_minus_utc()))).and_utc()
  }

  pub fn start_of_today(&self, now: DateTime<Utc>) -> DateTime<Utc> {
    self.start_of(self.local_date(now))
  }

  pub fn start_of_tomorrow(&self, now: DateTime<Utc>) -> DateTime<Utc> {
    let tomorrow = self.local_date(now).succ_opt().unwrap_or(NaiveDate::MAX);
    self.start_of(tomorrow)
  }

  /// `High` when overdue or due within 24h, `Medium` within 7 days, else
  /// `Low`.
  pub fn priority(&self, item: &ReviewItem, now: DateTime<Utc>) -> Priority {
    let until_due = item.due_at - now;
    if until_due <= Duration::hours(24) {
      Priority::High
    } else if until_due <= Duration::days(7) {
      Priority::Medium
    } else {
      Priority::Low
    }
  }

  pub fn status(&self, item: &ReviewItem, now: DateTime<Utc>) -> ReviewStatus {
    if item.due_at < now {
      ReviewStatus::Overdue
    } else if item
      .last_reviewed_at
      .is_some_and(|at| at >= self.start_of_today(now) && at <= now)
    {
      ReviewStatus::Completed
    } else {
      ReviewStatus::Pending
    }
  }

  pub fn project(&self, item: ReviewItem, now: DateTime<Utc>) -> ScheduledReview {
    ScheduledReview {
      priority: self.priority(&item, now),
      status:   self.status(&item, now),
      cycle:    item.cycle(),
      review:   item,
    }
  }

  /// Project and order `items` without partitioning.
  pub fn project_all(
    &self,
    items: impl IntoIterator<Item = ReviewItem>,
    now: DateTime<Utc>,
  ) -> Vec<ScheduledReview> {
    let mut all: Vec<_> = items.into_iter().map(|i| self.project(i, now)).collect();
    all.sort_by(board_order);
    all
  }

  /// Split `items` into overdue, due-today and upcoming as of `now`.
  pub fn partition(
    &self,
    items: impl IntoIterator<Item = ReviewItem>,
    now: DateTime<Utc>,
  ) -> ReviewBoard {
    let tomorrow = self.start_of_tomorrow(now);
    let mut board = ReviewBoard {
      as_of:     now,
      overdue:   Vec::new(),
      due_today: Vec::new(),
      upcoming:  Vec::new(),
    };

    for scheduled in self.project_all(items, now) {
      let due = scheduled.review.due_at;
      if due < now {
        board.overdue.push(scheduled);
      } else if due < tomorrow {
        board.due_today.push(scheduled);
      } else {
        board.upcoming.push(scheduled);
      }
    }

    board
  }
}

fn board_order(a: &ScheduledReview, b: &ScheduledReview) -> std::cmp::Ordering {
  a.review
    .due_at
    .cmp(&b.review.due_at)
    .then(a.priority.cmp(&b.priority))
    .then(a.review.subject_id.cmp(&b.review.subject_id))
    .then(a.review.review_id.cmp(&b.review.review_id))
}
