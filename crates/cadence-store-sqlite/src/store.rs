//! [`SqliteStore`], the SQLite implementation of [`StudyStore`].

use std::{path::Path, sync::Arc};

use cadence_core::{
  completion::{self, Completion},
  interval::IntervalLadder,
  review::{NewReview, Outcome, ReviewEvent, ReviewItem},
  session::{DEFAULT_PASS_RATIO, NewStudySession, StudySession},
  store::{RecordedSession, SessionQuery, StudyStore, SubjectDeletion},
  subject::{NewSubject, Subject},
};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    EVENT_COLUMNS, REVIEW_COLUMNS, RawEvent, RawReview, RawSession, RawSubject,
    SESSION_COLUMNS, SUBJECT_COLUMNS, encode_dt, encode_outcome, encode_topics, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Cadence record store backed by a single SQLite database.
///
/// Clones share one connection thread, which serialises completions.
#[derive(Clone)]
pub struct SqliteStore {
  conn:       tokio_rusqlite::Connection,
  ladder:     Arc<IntervalLadder>,
  pass_ratio: f64,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store; its contents vanish with the last clone.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self {
      conn,
      ladder: Arc::new(IntervalLadder::default()),
      pass_ratio: DEFAULT_PASS_RATIO,
    })
  }

  /// Schedule with `ladder` instead of the standard one.
  pub fn with_ladder(mut self, ladder: IntervalLadder) -> Self {
    self.ladder = Arc::new(ladder);
    self
  }

  /// Score ratio at which a session without an explicit outcome passes.
  pub fn with_pass_ratio(mut self, pass_ratio: f64) -> Self {
    self.pass_ratio = pass_ratio;
    self
  }

  /// Close the connection. Other clones fail with a closed-connection error
  /// afterwards.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    info!("store closed");
    Ok(())
  }
}

// ─── Synchronous helpers (run on the connection thread) ──────────────────────

fn subject_exists(conn: &Connection, id: &str) -> Result<bool> {
  Ok(
    conn
      .query_row("SELECT 1 FROM subjects WHERE subject_id = ?1", [id], |_| Ok(true))
      .optional()?
      .unwrap_or(false),
  )
}

fn load_subject(conn: &Connection, id: &str) -> Result<Option<Subject>> {
  conn
    .query_row(
      &format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE subject_id = ?1"),
      [id],
      RawSubject::from_row,
    )
    .optional()?
    .map(RawSubject::into_subject)
    .transpose()
}

fn load_review(conn: &Connection, id: &str) -> Result<Option<ReviewItem>> {
  conn
    .query_row(
      &format!("SELECT {REVIEW_COLUMNS} FROM review_items WHERE review_id = ?1"),
      [id],
      RawReview::from_row,
    )
    .optional()?
    .map(RawReview::into_review)
    .transpose()
}

fn load_review_by_topic(conn: &Connection, subject_id: &str, topic: &str) -> Result<Option<ReviewItem>> {
  conn
    .query_row(
      &format!("SELECT {REVIEW_COLUMNS} FROM review_items WHERE subject_id = ?1 AND topic = ?2"),
      [subject_id, topic],
      RawReview::from_row,
    )
    .optional()?
    .map(RawReview::into_review)
    .transpose()
}

fn insert_review(conn: &Connection, item: &ReviewItem) -> Result<()> {
  conn.execute(
    &format!("INSERT INTO review_items ({REVIEW_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
    rusqlite::params![
      encode_uuid(item.review_id),
      encode_uuid(item.subject_id),
      item.topic,
      encode_dt(item.created_at),
      item.last_reviewed_at.map(encode_dt),
      item.interval_step,
      encode_dt(item.due_at),
    ],
  )?;
  Ok(())
}

fn insert_event(conn: &Connection, event: &ReviewEvent) -> Result<()> {
  conn.execute(
    &format!("INSERT INTO review_events ({EVENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
    rusqlite::params![
      encode_uuid(event.event_id),
      encode_uuid(event.review_id),
      encode_outcome(&event.outcome),
      encode_dt(event.reviewed_at),
      event.previous_step,
      event.new_step,
      encode_dt(event.previous_due_at),
      encode_dt(event.new_due_at),
    ],
  )?;
  Ok(())
}

/// Write a completion, guarded on the `last_reviewed_at` the engine saw.
fn persist_completion(conn: &Connection, previous: &ReviewItem, done: &Completion) -> Result<()> {
  let changed = conn.execute(
    "UPDATE review_items
        SET last_reviewed_at = ?1, interval_step = ?2, due_at = ?3
      WHERE review_id = ?4 AND last_reviewed_at IS ?5",
    rusqlite::params![
      done.review.last_reviewed_at.map(encode_dt),
      done.review.interval_step,
      encode_dt(done.review.due_at),
      encode_uuid(previous.review_id),
      previous.last_reviewed_at.map(encode_dt),
    ],
  )?;
  if changed == 0 {
    return Err(
      cadence_core::Error::StaleTimestamp {
        id:   previous.review_id,
        at:   done.event.reviewed_at,
        last: previous.anchor(),
      }
      .into(),
    );
  }
  insert_event(conn, &done.event)
}

fn complete_tx(
  conn: &mut Connection,
  id: Uuid,
  outcome: Outcome,
  at: DateTime<Utc>,
  ladder: &IntervalLadder,
) -> Result<ReviewItem> {
  let tx = conn.transaction()?;
  let item = load_review(&tx, &encode_uuid(id))?.ok_or(cadence_core::Error::ReviewNotFound(id))?;
  let done = completion::complete(&item, outcome, at, ladder)?;
  persist_completion(&tx, &item, &done)?;
  tx.commit()?;
  Ok(done.review)
}

fn record_session_tx(
  conn: &mut Connection,
  session: StudySession,
  ladder: &IntervalLadder,
) -> Result<RecordedSession> {
  let tx = conn.transaction()?;
  let subject_id = encode_uuid(session.subject_id);
  if !subject_exists(&tx, &subject_id)? {
    return Err(cadence_core::Error::SubjectNotFound(session.subject_id).into());
  }

  tx.execute(
    &format!(
      "INSERT INTO study_sessions ({SESSION_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
    ),
    rusqlite::params![
      encode_uuid(session.session_id),
      subject_id,
      session.topic,
      session.duration_minutes,
      session.correct_answers,
      session.total_answers,
      encode_dt(session.occurred_at),
      session.notes,
      encode_outcome(&session.outcome),
    ],
  )?;

  let (review, created) = match load_review_by_topic(&tx, &subject_id, &session.topic)? {
    Some(item) => {
      let done = completion::complete(&item, session.outcome, session.occurred_at, ladder)?;
      persist_completion(&tx, &item, &done)?;
      (done.review, false)
    }
    None => {
      let item = completion::schedule_new(
        NewReview::new(session.subject_id, session.topic.clone(), session.occurred_at),
        ladder,
      );
      insert_review(&tx, &item)?;
      (item, true)
    }
  };

  tx.commit()?;
  Ok(RecordedSession { session, review, created })
}

fn create_review_tx(conn: &mut Connection, item: ReviewItem) -> Result<ReviewItem> {
  let tx = conn.transaction()?;
  if !subject_exists(&tx, &encode_uuid(item.subject_id))? {
    return Err(cadence_core::Error::SubjectNotFound(item.subject_id).into());
  }
  if load_review(&tx, &encode_uuid(item.review_id))?.is_some() {
    return Err(cadence_core::Error::DuplicateId(item.review_id).into());
  }
  if load_review_by_topic(&tx, &encode_uuid(item.subject_id), &item.topic)?.is_some() {
    return Err(
      cadence_core::Error::TopicAlreadyScheduled {
        subject_id: item.subject_id,
        topic:      item.topic,
      }
      .into(),
    );
  }
  insert_review(&tx, &item)?;
  tx.commit()?;
  Ok(item)
}

fn delete_subject_tx(conn: &mut Connection, id: Uuid) -> Result<SubjectDeletion> {
  let tx = conn.transaction()?;
  let id_str = encode_uuid(id);
  if !subject_exists(&tx, &id_str)? {
    return Err(cadence_core::Error::SubjectNotFound(id).into());
  }

  tx.execute(
    "DELETE FROM review_events
      WHERE review_id IN (SELECT review_id FROM review_items WHERE subject_id = ?1)",
    [&id_str],
  )?;
  let reviews_removed = tx.execute("DELETE FROM review_items WHERE subject_id = ?1", [&id_str])?;
  let sessions_removed = tx.execute("DELETE FROM study_sessions WHERE subject_id = ?1", [&id_str])?;
  tx.execute("DELETE FROM subjects WHERE subject_id = ?1", [&id_str])?;
  tx.commit()?;

  Ok(SubjectDeletion { subject_id: id, reviews_removed, sessions_removed })
}

// ─── StudyStore impl ─────────────────────────────────────────────────────────

impl StudyStore for SqliteStore {
  type Error = Error;

  fn ladder(&self) -> &IntervalLadder { &self.ladder }

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn add_subject(&self, input: NewSubject) -> Result<Subject> {
    let input = input.validated()?;
    let subject = Subject {
      subject_id: Uuid::new_v4(),
      name:       input.name,
      weight:     input.weight,
      topics:     input.topics,
      created_at: Utc::now(),
    };

    let id_str     = encode_uuid(subject.subject_id);
    let name       = subject.name.clone();
    let weight     = subject.weight;
    let topics_str = encode_topics(&subject.topics)?;
    let at_str     = encode_dt(subject.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("INSERT INTO subjects ({SUBJECT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
          rusqlite::params![id_str, name, weight, topics_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(subject)
  }

  async fn get_subject(&self, id: Uuid) -> Result<Option<Subject>> {
    let id_str = encode_uuid(id);
    self
      .conn
      .call(move |conn| Ok(load_subject(conn, &id_str)))
      .await?
  }

  async fn list_subjects(&self) -> Result<Vec<Subject>> {
    let raws: Vec<RawSubject> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBJECT_COLUMNS} FROM subjects ORDER BY name COLLATE NOCASE, subject_id"
        ))?;
        let rows = stmt
          .query_map([], RawSubject::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubject::into_subject).collect()
  }

  async fn update_subject(&self, id: Uuid, input: NewSubject) -> Result<Subject> {
    let input      = input.validated()?;
    let id_str     = encode_uuid(id);
    let topics_str = encode_topics(&input.topics)?;

    let updated: Option<Subject> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE subjects SET name = ?1, weight = ?2, topics = ?3 WHERE subject_id = ?4",
          rusqlite::params![input.name, input.weight, topics_str, id_str],
        )?;
        if changed == 0 {
          return Ok(Ok(None));
        }
        Ok(load_subject(conn, &id_str))
      })
      .await??;

    updated.ok_or_else(|| cadence_core::Error::SubjectNotFound(id).into())
  }

  async fn delete_subject(&self, id: Uuid) -> Result<SubjectDeletion> {
    let deletion = self
      .conn
      .call(move |conn| Ok(delete_subject_tx(conn, id)))
      .await??;

    info!(
      subject_id = %id,
      reviews = deletion.reviews_removed,
      sessions = deletion.sessions_removed,
      "subject deleted"
    );
    Ok(deletion)
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn record_session(&self, input: NewStudySession) -> Result<RecordedSession> {
    let session = input.into_session(self.pass_ratio)?;
    let ladder  = Arc::clone(&self.ladder);

    let recorded = self
      .conn
      .call(move |conn| Ok(record_session_tx(conn, session, &ladder)))
      .await?;

    match &recorded {
      Ok(r) => debug!(
        session_id = %r.session.session_id,
        review_id = %r.review.review_id,
        outcome = %r.session.outcome,
        created = r.created,
        step = r.review.interval_step,
        "session recorded"
      ),
      Err(e) => warn_if_stale(e),
    }
    recorded
  }

  async fn list_sessions(&self, query: &SessionQuery) -> Result<Vec<StudySession>> {
    let subject_str = query.subject_id.map(encode_uuid);
    let since_str   = query.since.map(encode_dt);
    let until_str   = query.until.map(encode_dt);
    let needle      = query.needle();

    // The text filter runs in Rust, so paging must too when it is set.
    let (limit_val, offset_val) = match needle {
      Some(_) => (-1i64, 0i64),
      None => (
        query.limit.map(|l| l as i64).unwrap_or(-1),
        query.offset.unwrap_or(0) as i64,
      ),
    };

    let raws: Vec<RawSession> = self
      .conn
      .call(move |conn| {
        // Build WHERE clause dynamically; unused parameters stay bound.
        let mut conds: Vec<&'static str> = vec![];
        if subject_str.is_some() {
          conds.push("subject_id = ?1");
        }
        if since_str.is_some() {
          conds.push("occurred_at >= ?2");
        }
        if until_str.is_some() {
          conds.push("occurred_at < ?3");
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "SELECT {SESSION_COLUMNS}
           FROM study_sessions
           {where_clause}
           ORDER BY occurred_at DESC, session_id
           LIMIT ?4 OFFSET ?5"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![subject_str, since_str, until_str, limit_val, offset_val],
            RawSession::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    let sessions = raws
      .into_iter()
      .map(RawSession::into_session)
      .collect::<Result<Vec<_>>>()?;

    Ok(match needle {
      Some(needle) => sessions
        .into_iter()
        .filter(|s| SessionQuery::matches_text(&needle, s))
        .skip(query.offset.unwrap_or(0))
        .take(query.limit.unwrap_or(usize::MAX))
        .collect(),
      None => sessions,
    })
  }

  // ── Review items ──────────────────────────────────────────────────────────

  async fn create_review(&self, input: NewReview) -> Result<ReviewItem> {
    let input = NewReview { topic: input.topic.trim().to_owned(), ..input };
    if input.topic.is_empty() {
      return Err(cadence_core::Error::EmptyTopic.into());
    }
    let item = completion::schedule_new(input, &self.ladder);

    let created = self
      .conn
      .call(move |conn| Ok(create_review_tx(conn, item)))
      .await??;

    debug!(review_id = %created.review_id, due_at = %created.due_at, "review scheduled");
    Ok(created)
  }

  async fn get_review(&self, id: Uuid) -> Result<Option<ReviewItem>> {
    let id_str = encode_uuid(id);
    self
      .conn
      .call(move |conn| Ok(load_review(conn, &id_str)))
      .await?
  }

  async fn find_review(&self, subject_id: Uuid, topic: &str) -> Result<Option<ReviewItem>> {
    let subject_str = encode_uuid(subject_id);
    let topic       = topic.trim().to_owned();
    self
      .conn
      .call(move |conn| Ok(load_review_by_topic(conn, &subject_str, &topic)))
      .await?
  }

  async fn list_reviews(&self, subject_id: Option<Uuid>) -> Result<Vec<ReviewItem>> {
    let subject_str = subject_id.map(encode_uuid);

    let raws: Vec<RawReview> = self
      .conn
      .call(move |conn| {
        let where_clause = if subject_str.is_some() { "WHERE subject_id = ?1" } else { "" };
        let mut stmt = conn.prepare(&format!(
          "SELECT {REVIEW_COLUMNS} FROM review_items {where_clause} ORDER BY due_at, review_id"
        ))?;
        let rows = match &subject_str {
          Some(s) => stmt.query_map([s], RawReview::from_row)?,
          None => stmt.query_map([], RawReview::from_row)?,
        }
        .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReview::into_review).collect()
  }

  async fn complete_review(
    &self,
    id:      Uuid,
    outcome: Outcome,
    at:      DateTime<Utc>,
  ) -> Result<ReviewItem> {
    let ladder = Arc::clone(&self.ladder);

    let completed = self
      .conn
      .call(move |conn| Ok(complete_tx(conn, id, outcome, at, &ladder)))
      .await?;

    match &completed {
      Ok(item) => debug!(
        review_id = %id,
        %outcome,
        step = item.interval_step,
        due_at = %item.due_at,
        "review completed"
      ),
      Err(e) => warn_if_stale(e),
    }
    completed
  }

  async fn review_history(&self, id: Uuid) -> Result<Vec<ReviewEvent>> {
    let id_str = encode_uuid(id);

    let raws: Option<Vec<RawEvent>> = self
      .conn
      .call(move |conn| {
        let exists = conn
          .query_row("SELECT 1 FROM review_items WHERE review_id = ?1", [&id_str], |_| Ok(()))
          .optional()?
          .is_some();
        if !exists {
          return Ok(None);
        }
        let mut stmt = conn.prepare(&format!(
          "SELECT {EVENT_COLUMNS} FROM review_events WHERE review_id = ?1
           ORDER BY reviewed_at, event_id"
        ))?;
        let rows = stmt
          .query_map([&id_str], RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(rows))
      })
      .await?;

    raws
      .ok_or(cadence_core::Error::ReviewNotFound(id))?
      .into_iter()
      .map(RawEvent::into_event)
      .collect()
  }
}

fn warn_if_stale(e: &Error) {
  if let Error::Core(cadence_core::Error::StaleTimestamp { id, at, last }) = e {
    warn!(review_id = %id, %at, %last, "rejected stale completion");
  }
}
