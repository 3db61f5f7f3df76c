//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with a fixed nanosecond
//! width, so lexical order in SQL matches chronological order. UUIDs are
//! stored as hyphenated lowercase strings, topic lists as JSON arrays.

use cadence_core::{
  review::{Outcome, ReviewEvent, ReviewItem},
  session::StudySession,
  subject::Subject,
};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Outcome ──────────────────────────────────────────────────────────────────

pub fn encode_outcome(o: &Outcome) -> &str { o.as_ref() }

pub fn decode_outcome(s: &str) -> Result<Outcome> {
  s.parse::<Outcome>()
    .map_err(|_| Error::UnknownValue { column: "outcome", value: s.to_owned() })
}

// ─── Topics ───────────────────────────────────────────────────────────────────

pub fn encode_topics(topics: &[String]) -> Result<String> {
  Ok(serde_json::to_string(topics)?)
}

pub fn decode_topics(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const SUBJECT_COLUMNS: &str = "subject_id, name, weight, topics, created_at";

/// Raw values read directly from a `subjects` row.
pub struct RawSubject {
  pub subject_id: String,
  pub name:       String,
  pub weight:     u32,
  pub topics:     String,
  pub created_at: String,
}

impl RawSubject {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id: row.get(0)?,
      name:       row.get(1)?,
      weight:     row.get(2)?,
      topics:     row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      subject_id: decode_uuid(&self.subject_id)?,
      name:       self.name,
      weight:     self.weight,
      topics:     decode_topics(&self.topics)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const REVIEW_COLUMNS: &str =
  "review_id, subject_id, topic, created_at, last_reviewed_at, interval_step, due_at";

/// Raw values read directly from a `review_items` row.
pub struct RawReview {
  pub review_id:        String,
  pub subject_id:       String,
  pub topic:            String,
  pub created_at:       String,
  pub last_reviewed_at: Option<String>,
  pub interval_step:    u32,
  pub due_at:           String,
}

impl RawReview {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      review_id:        row.get(0)?,
      subject_id:       row.get(1)?,
      topic:            row.get(2)?,
      created_at:       row.get(3)?,
      last_reviewed_at: row.get(4)?,
      interval_step:    row.get(5)?,
      due_at:           row.get(6)?,
    })
  }

  pub fn into_review(self) -> Result<ReviewItem> {
    Ok(ReviewItem {
      review_id:        decode_uuid(&self.review_id)?,
      subject_id:       decode_uuid(&self.subject_id)?,
      topic:            self.topic,
      created_at:       decode_dt(&self.created_at)?,
      last_reviewed_at: self.last_reviewed_at.as_deref().map(decode_dt).transpose()?,
      interval_step:    self.interval_step,
      due_at:           decode_dt(&self.due_at)?,
    })
  }
}

pub const EVENT_COLUMNS: &str = "event_id, review_id, outcome, reviewed_at, previous_step, \
                                 new_step, previous_due_at, new_due_at";

/// Raw values read directly from a `review_events` row.
pub struct RawEvent {
  pub event_id:        String,
  pub review_id:       String,
  pub outcome:         String,
  pub reviewed_at:     String,
  pub previous_step:   u32,
  pub new_step:        u32,
  pub previous_due_at: String,
  pub new_due_at:      String,
}

impl RawEvent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:        row.get(0)?,
      review_id:       row.get(1)?,
      outcome:         row.get(2)?,
      reviewed_at:     row.get(3)?,
      previous_step:   row.get(4)?,
      new_step:        row.get(5)?,
      previous_due_at: row.get(6)?,
      new_due_at:      row.get(7)?,
    })
  }

  pub fn into_event(self) -> Result<ReviewEvent> {
    Ok(ReviewEvent {
      event_id:        decode_uuid(&self.event_id)?,
      review_id:       decode_uuid(&self.review_id)?,
      outcome:         decode_outcome(&self.outcome)?,
      reviewed_at:     decode_dt(&self.reviewed_at)?,
      previous_step:   self.previous_step,
      new_step:        self.new_step,
      previous_due_at: decode_dt(&self.previous_due_at)?,
      new_due_at:      decode_dt(&self.new_due_at)?,
    })
  }
}

pub const SESSION_COLUMNS: &str = "session_id, subject_id, topic, duration_minutes, \
                                   correct_answers, total_answers, occurred_at, notes, outcome";

/// Raw values read directly from a `study_sessions` row.
pub struct RawSession {
  pub session_id:       String,
  pub subject_id:       String,
  pub topic:            String,
  pub duration_minutes: u32,
  pub correct_answers:  u32,
  pub total_answers:    u32,
  pub occurred_at:      String,
  pub notes:            Option<String>,
  pub outcome:          String,
}

impl RawSession {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      session_id:       row.get(0)?,
      subject_id:       row.get(1)?,
      topic:            row.get(2)?,
      duration_minutes: row.get(3)?,
      correct_answers:  row.get(4)?,
      total_answers:    row.get(5)?,
      occurred_at:      row.get(6)?,
      notes:            row.get(7)?,
      outcome:          row.get(8)?,
    })
  }

  pub fn into_session(self) -> Result<StudySession> {
    Ok(StudySession {
      session_id:       decode_uuid(&self.session_id)?,
      subject_id:       decode_uuid(&self.subject_id)?,
      topic:            self.topic,
      duration_minutes: self.duration_minutes,
      correct_answers:  self.correct_answers,
      total_answers:    self.total_answers,
      occurred_at:      decode_dt(&self.occurred_at)?,
      notes:            self.notes,
      outcome:          decode_outcome(&self.outcome)?,
    })
  }
}
