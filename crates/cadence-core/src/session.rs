//! Study sessions: immutable records of time spent on a topic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, review::Outcome};

/// Share of correct answers at or above which a session counts as a
/// successful review.
pub const DEFAULT_PASS_RATIO: f64 = 0.7;

/// A completed study session. Never updated after it is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySession {
  pub session_id:       Uuid,
  pub subject_id:       Uuid,
  pub topic:            String,
  pub duration_minutes: u32,
  pub correct_answers:  u32,
  pub total_answers:    u32,
  pub occurred_at:      DateTime<Utc>,
  pub notes:            Option<String>,
  /// The review outcome this session fed into the schedule.
  pub outcome:          Outcome,
}

/// Input to [`crate::store::StudyStore::record_session`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStudySession {
  pub subject_id:       Uuid,
  pub topic:            String,
  #[serde(default)]
  pub duration_minutes: u32,
  #[serde(default)]
  pub correct_answers:  u32,
  #[serde(default)]
  pub total_answers:    u32,
  pub occurred_at:      DateTime<Utc>,
  #[serde(default)]
  pub notes:            Option<String>,
  /// Explicit outcome; derived from the score when absent.
  #[serde(default)]
  pub outcome:          Option<Outcome>,
}

impl NewStudySession {
  pub fn new(subject_id: Uuid, topic: impl Into<String>, occurred_at: DateTime<Utc>) -> Self {
    Self {
      subject_id,
      topic: topic.into(),
      duration_minutes: 0,
      correct_answers: 0,
      total_answers: 0,
      occurred_at,
      notes: None,
      outcome: None,
    }
  }

  /// Check the answer counts and build the stored session.
  pub fn into_session(self, pass_ratio: f64) -> Result<StudySession> {
    let topic = self.topic.trim().to_owned();
    if topic.is_empty() {
      return Err(Error::EmptyTopic);
    }
    if self.correct_answers > self.total_answers {
      return Err(Error::InvalidSession(format!(
        "{} correct answers out of {}",
        self.correct_answers, self.total_answers
      )));
    }

    let outcome = self.outcome.unwrap_or_else(|| {
      Outcome::from_score(self.correct_answers, self.total_answers, pass_ratio)
    });

    Ok(StudySession {
      session_id: Uuid::new_v4(),
      subject_id: self.subject_id,
      topic,
      duration_minutes: self.duration_minutes,
      correct_answers: self.correct_answers,
      total_answers: self.total_answers,
      occurred_at: self.occurred_at,
      notes: self.notes.filter(|n| !n.trim().is_empty()),
      outcome,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn at() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 1, 14, 16, 0, 0).unwrap() }

  #[test]
  fn outcome_is_derived_from_score() {
    let mut input = NewStudySession::new(Uuid::new_v4(), "Interpretação de Texto", at());
    input.correct_answers = 12;
    input.total_answers = 15;
    assert_eq!(input.clone().into_session(0.7).unwrap().outcome, Outcome::Success);
    assert_eq!(input.into_session(0.9).unwrap().outcome, Outcome::Fail);
  }

  #[test]
  fn explicit_outcome_wins() {
    let mut input = NewStudySession::new(Uuid::new_v4(), "Atos Administrativos", at());
    input.correct_answers = 15;
    input.total_answers = 20;
    input.outcome = Some(Outcome::Fail);
    assert_eq!(input.into_session(0.7).unwrap().outcome, Outcome::Fail);
  }

  #[test]
  fn more_correct_than_total_is_rejected() {
    let mut input = NewStudySession::new(Uuid::new_v4(), "Tabelas verdade", at());
    input.correct_answers = 9;
    input.total_answers = 8;
    assert!(matches!(input.into_session(0.7), Err(Error::InvalidSession(_))));
  }

  #[test]
  fn blank_topic_is_rejected() {
    let input = NewStudySession::new(Uuid::new_v4(), "   ", at());
    assert!(matches!(input.into_session(0.7), Err(Error::EmptyTopic)));
  }

  #[test]
  fn session_without_answers_passes_and_drops_blank_notes() {
    let mut input = NewStudySession::new(Uuid::new_v4(), " Crase ", at());
    input.notes = Some("  ".into());
    let session = input.into_session(0.7).unwrap();
    assert_eq!(session.outcome, Outcome::Success);
    assert_eq!(session.topic, "Crase");
    assert_eq!(session.notes, None);
  }
}
