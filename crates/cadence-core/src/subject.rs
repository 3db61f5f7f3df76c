//! Subjects: a discipline being studied, with its weight and topic list.
//!
//! A subject owns its review items and sessions by reference only: they carry
//! the subject's UUID. Deleting a subject is the one operation that removes
//! review items (see [`crate::store::StudyStore::delete_subject`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// A discipline with a relative importance and an ordered list of topics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id: Uuid,
  pub name:       String,
  /// Relative importance in the study plan; always positive.
  pub weight:     u32,
  pub topics:     Vec<String>,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::StudyStore::add_subject`] and
/// [`crate::store::StudyStore::update_subject`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubject {
  pub name:   String,
  pub weight: u32,
  #[serde(default)]
  pub topics: Vec<String>,
}

impl NewSubject {
  pub fn new(name: impl Into<String>, weight: u32) -> Self {
    Self { name: name.into(), weight, topics: Vec::new() }
  }

  pub fn with_topics<I, T>(mut self, topics: I) -> Self
  where
    I: IntoIterator<Item = T>,
    T: Into<String>,
  {
    self.topics = topics.into_iter().map(Into::into).collect();
    self
  }

  /// Check the name and weight and normalise the topic list: entries are
  /// trimmed, blanks dropped, and repeated topics keep only their first
  /// position.
  pub fn validated(mut self) -> Result<Self> {
    self.name = self.name.trim().to_owned();
    if self.name.is_empty() {
      return Err(Error::EmptyName);
    }
    if self.weight == 0 {
      return Err(Error::InvalidWeight);
    }

    let mut topics: Vec<String> = Vec::with_capacity(self.topics.len());
    for topic in self.topics.drain(..) {
      let topic = topic.trim();
      if !topic.is_empty() && !topics.iter().any(|t| t == topic) {
        topics.push(topic.to_owned());
      }
    }
    self.topics = topics;
    Ok(self)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn zero_weight_is_rejected() {
    let err = NewSubject::new("Math", 0).validated().unwrap_err();
    assert!(matches!(err, Error::InvalidWeight));
  }

  #[test]
  fn blank_name_is_rejected() {
    let err = NewSubject::new("   ", 3).validated().unwrap_err();
    assert!(matches!(err, Error::EmptyName));
    assert!(err.is_invalid_input());
  }

  #[test]
  fn topics_are_trimmed_and_deduplicated() {
    let subject = NewSubject::new("  Portuguese ", 15)
      .with_topics(["Crase", " ", "Concordância Verbal ", "Crase"])
      .validated()
      .unwrap();
    assert_eq!(subject.name, "Portuguese");
    assert_eq!(subject.topics, vec!["Crase", "Concordância Verbal"]);
  }
}
