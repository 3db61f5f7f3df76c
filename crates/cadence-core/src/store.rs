//! The `StudyStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `cadence-store-sqlite`). Higher layers (`cadence-api`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  interval::IntervalLadder,
  review::{NewReview, Outcome, ReviewEvent, ReviewItem},
  session::{NewStudySession, StudySession},
  subject::{NewSubject, Subject},
};

// ─── Query and result types ──────────────────────────────────────────────────

/// Parameters for [`StudyStore::list_sessions`].
#[derive(Debug, Clone, Default)]
pub struct SessionQuery {
  pub subject_id: Option<Uuid>,
  /// Free-text filter over topic and notes.
  pub text:       Option<String>,
  pub since:      Option<DateTime<Utc>>,
  pub until:      Option<DateTime<Utc>>,
  pub limit:      Option<usize>,
  pub offset:     Option<usize>,
}

impl SessionQuery {
  /// The free-text filter, trimmed and lowercased; `None` when blank.
  pub fn needle(&self) -> Option<String> {
    self.text.as_deref().map(str::trim).filter(|t| !t.is_empty()).map(str::to_lowercase)
  }

  /// Case-insensitive match of `needle` against the topic or the notes.
  /// Matching is literal: `%` and `_` are ordinary characters.
  pub fn matches_text(needle: &str, session: &StudySession) -> bool {
    session.topic.to_lowercase().contains(needle)
      || session.notes.as_deref().is_some_and(|n| n.to_lowercase().contains(needle))
  }
}

/// What [`StudyStore::record_session`] wrote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedSession {
  pub session: StudySession,
  /// The review item created or completed for the session's topic.
  pub review:  ReviewItem,
  /// `true` when the topic was studied for the first time.
  pub created: bool,
}

/// What [`StudyStore::delete_subject`] removed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SubjectDeletion {
  pub subject_id:       Uuid,
  pub reviews_removed:  usize,
  pub sessions_removed: usize,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Implemented by backend error types so callers can recover the domain error
/// (not found, stale timestamp, ...) without knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The domain error wrapped by this backend error, if any.
  fn domain(&self) -> Option<&crate::Error>;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Cadence record store backend.
///
/// Review items are created and completed, never edited directly: every
/// schedule change goes through [`crate::completion`]. Items are removed only
/// by [`StudyStore::delete_subject`].
///
/// Completions on the same item must be serialised by the backend; a
/// completion that loses a race fails with
/// [`crate::Error::StaleTimestamp`].
pub trait StudyStore: Send + Sync {
  type Error: StoreError;

  /// The ladder this store schedules with.
  fn ladder(&self) -> &IntervalLadder;

  // ── Subjects ──────────────────────────────────────────────────────────

  fn add_subject(
    &self,
    input: NewSubject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  /// Retrieve a subject by UUID. Returns `None` if not found.
  fn get_subject(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// List all subjects ordered by name.
  fn list_subjects(
    &self,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  /// Replace name, weight and topics. Fails with
  /// [`crate::Error::SubjectNotFound`].
  fn update_subject(
    &self,
    id: Uuid,
    input: NewSubject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  /// Delete a subject together with its review items, their events, and its
  /// sessions.
  fn delete_subject(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<SubjectDeletion, Self::Error>> + Send + '_;

  // ── Sessions ──────────────────────────────────────────────────────────

  /// Record a session and feed its outcome into the topic's review item:
  /// the item is created on first study and completed afterwards.
  fn record_session(
    &self,
    input: NewStudySession,
  ) -> impl Future<Output = Result<RecordedSession, Self::Error>> + Send + '_;

  fn list_sessions<'a>(
    &'a self,
    query: &'a SessionQuery,
  ) -> impl Future<Output = Result<Vec<StudySession>, Self::Error>> + Send + 'a;

  // ── Review items ──────────────────────────────────────────────────────

  /// Schedule a topic explicitly. Fails with [`crate::Error::DuplicateId`]
  /// if the id is taken and [`crate::Error::TopicAlreadyScheduled`] if the
  /// subject/topic pair is.
  fn create_review(
    &self,
    input: NewReview,
  ) -> impl Future<Output = Result<ReviewItem, Self::Error>> + Send + '_;

  fn get_review(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<ReviewItem>, Self::Error>> + Send + '_;

  fn find_review<'a>(
    &'a self,
    subject_id: Uuid,
    topic: &'a str,
  ) -> impl Future<Output = Result<Option<ReviewItem>, Self::Error>> + Send + 'a;

  /// List review items, optionally for one subject. Never mutates anything.
  fn list_reviews(
    &self,
    subject_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<ReviewItem>, Self::Error>> + Send + '_;

  /// Apply `outcome` at `at` via the completion engine and persist the
  /// result.
  fn complete_review(
    &self,
    id: Uuid,
    outcome: Outcome,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<ReviewItem, Self::Error>> + Send + '_;

  /// Completion history for an item, oldest first.
  fn review_history(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Vec<ReviewEvent>, Self::Error>> + Send + '_;
}
