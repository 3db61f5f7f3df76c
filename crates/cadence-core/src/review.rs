//! Review items, outcomes and the read models the scheduler projects.
//!
//! A [`ReviewItem`] stores only scheduling state: the interval step and the
//! due date it implies. Priority and status are never stored; they are
//! derived on read by [`crate::schedule::Scheduler`] and returned as a
//! [`ScheduledReview`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// The result of reviewing a topic.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Outcome {
  /// The topic was recalled; the item climbs one rung of the ladder.
  Success,
  /// The topic was forgotten; the item drops back to the first rung.
  Fail,
}

impl Outcome {
  /// Parse an outcome from caller-supplied text.
  pub fn parse(s: &str) -> Result<Self> {
    s.trim()
      .to_ascii_lowercase()
      .parse::<Self>()
      .map_err(|_| Error::InvalidOutcome(s.to_owned()))
  }

  /// Derive an outcome from a session score. A session without answers is
  /// counted as a success: the topic was studied, nothing was failed.
  pub fn from_score(correct: u32, total: u32, pass_ratio: f64) -> Self {
    if total == 0 || f64::from(correct) / f64::from(total) >= pass_ratio {
      Self::Success
    } else {
      Self::Fail
    }
  }
}

// ─── Derived projections ─────────────────────────────────────────────────────

/// Urgency of a review. Variant order is the sort rank: `High` sorts first.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
  High,
  Medium,
  Low,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReviewStatus {
  Pending,
  /// Reviewed earlier in the current calendar day and not yet due again.
  Completed,
  Overdue,
}

/// Human-facing name of an interval step on the standard ladder.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReviewCycle {
  /// 24 hours: concepts studied just now.
  Immediate,
  /// 7 days: consolidation.
  Weekly,
  /// 15 days: reinforcement.
  Biweekly,
  /// 30 days: retention.
  Monthly,
  /// 60 days: maintenance, repeated indefinitely.
  Bimonthly,
}

impl ReviewCycle {
  const ALL: [Self; 5] = [
    Self::Immediate,
    Self::Weekly,
    Self::Biweekly,
    Self::Monthly,
    Self::Bimonthly,
  ];

  /// Steps past the end of the ladder stay in maintenance.
  pub fn from_step(step: u32) -> Self {
    let idx = (step as usize).min(Self::ALL.len() - 1);
    Self::ALL[idx]
  }
}

// ─── ReviewItem ──────────────────────────────────────────────────────────────

/// Scheduling state for one topic of one subject.
///
/// `due_at` always equals `anchor() + ladder[interval_step]`. Only the
/// completion engine moves `interval_step`, `last_reviewed_at` and `due_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewItem {
  pub review_id:        Uuid,
  pub subject_id:       Uuid,
  pub topic:            String,
  pub created_at:       DateTime<Utc>,
  pub last_reviewed_at: Option<DateTime<Utc>>,
  pub interval_step:    u32,
  pub due_at:           DateTime<Utc>,
}

impl ReviewItem {
  /// The instant the current interval is measured from.
  pub fn anchor(&self) -> DateTime<Utc> {
    self.last_reviewed_at.unwrap_or(self.created_at)
  }

  pub fn cycle(&self) -> ReviewCycle { ReviewCycle::from_step(self.interval_step) }
}

/// Input to [`crate::store::StudyStore::create_review`] when a topic is
/// scheduled explicitly rather than through a study session.
#[derive(Debug, Clone)]
pub struct NewReview {
  /// Caller-supplied id; a fresh v4 UUID is generated when `None`.
  pub review_id:  Option<Uuid>,
  pub subject_id: Uuid,
  pub topic:      String,
  pub created_at: DateTime<Utc>,
}

impl NewReview {
  pub fn new(subject_id: Uuid, topic: impl Into<String>, created_at: DateTime<Utc>) -> Self {
    Self { review_id: None, subject_id, topic: topic.into(), created_at }
  }
}

// ─── Read model ──────────────────────────────────────────────────────────────

/// A review item bundled with its projections as of a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledReview {
  pub review:   ReviewItem,
  pub priority: Priority,
  pub status:   ReviewStatus,
  pub cycle:    ReviewCycle,
}

// ─── History ─────────────────────────────────────────────────────────────────

/// An append-only record of one applied completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEvent {
  pub event_id:        Uuid,
  pub review_id:       Uuid,
  pub outcome:         Outcome,
  pub reviewed_at:     DateTime<Utc>,
  pub previous_step:   u32,
  pub new_step:        u32,
  pub previous_due_at: DateTime<Utc>,
  pub new_due_at:      DateTime<Utc>,
}
