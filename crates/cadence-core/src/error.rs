//! Error types for `cadence-core`.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("subject not found: {0}")]
  SubjectNotFound(Uuid),

  #[error("review not found: {0}")]
  ReviewNotFound(Uuid),

  #[error("invalid review outcome: {0:?} (expected \"success\" or \"fail\")")]
  InvalidOutcome(String),

  #[error("id {0} is already taken")]
  DuplicateId(Uuid),

  #[error("topic {topic:?} of subject {subject_id} is already scheduled")]
  TopicAlreadyScheduled { subject_id: Uuid, topic: String },

  /// A completion carried a timestamp that does not move the item forward.
  #[error("stale completion for review {id}: {at} is not after {last}")]
  StaleTimestamp {
    id:   Uuid,
    at:   DateTime<Utc>,
    last: DateTime<Utc>,
  },

  #[error("subject weight must be a positive integer")]
  InvalidWeight,

  #[error("subject name must not be empty")]
  EmptyName,

  #[error("topic must not be empty")]
  EmptyTopic,

  #[error("invalid study session: {0}")]
  InvalidSession(String),

  #[error("interval ladder must contain at least one offset")]
  EmptyLadder,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// `true` for the "unknown id" family of errors.
  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::SubjectNotFound(_) | Self::ReviewNotFound(_))
  }

  /// `true` for errors that a caller resolves by re-reading and retrying.
  pub fn is_conflict(&self) -> bool {
    matches!(
      self,
      Self::DuplicateId(_) | Self::TopicAlreadyScheduled { .. } | Self::StaleTimestamp { .. }
    )
  }

  /// `true` for errors caused by malformed caller input.
  pub fn is_invalid_input(&self) -> bool {
    matches!(
      self,
      Self::InvalidOutcome(_)
        | Self::InvalidWeight
        | Self::EmptyName
        | Self::EmptyTopic
        | Self::InvalidSession(_)
        | Self::EmptyLadder
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
