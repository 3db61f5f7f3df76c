//! Handlers for `/sessions` endpoints.
//!
//! Recording a session is the main write path: the store creates the topic's
//! review item on first study and completes it on every later one.

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use cadence_core::{
  review::Outcome,
  session::{NewStudySession, StudySession},
  store::{SessionQuery, StudyStore},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub subject_id: Option<Uuid>,
  /// Free-text filter over topic and notes.
  pub text:       Option<String>,
  pub since:      Option<DateTime<Utc>>,
  pub until:      Option<DateTime<Utc>>,
  pub limit:      Option<usize>,
  pub offset:     Option<usize>,
}

impl From<ListParams> for SessionQuery {
  fn from(p: ListParams) -> Self {
    SessionQuery {
      subject_id: p.subject_id,
      text:       p.text.filter(|t| !t.trim().is_empty()),
      since:      p.since,
      until:      p.until,
      limit:      p.limit,
      offset:     p.offset,
    }
  }
}

/// `GET /sessions[?subject_id=...][&text=...][&since=...][&until=...][&limit=...][&offset=...]`
pub async fn list<S: StudyStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<StudySession>>, ApiError> {
  let query = SessionQuery::from(params);
  let sessions = state.store.list_sessions(&query).await.map_err(ApiError::from_store)?;
  Ok(Json(sessions))
}

// ─── Record ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /sessions`.
#[derive(Debug, Deserialize)]
pub struct RecordBody {
  pub subject_id:       Uuid,
  pub topic:            String,
  #[serde(default)]
  pub duration_minutes: u32,
  #[serde(default)]
  pub correct_answers:  u32,
  #[serde(default)]
  pub total_answers:    u32,
  /// Defaults to the time the request is handled.
  pub occurred_at:      Option<DateTime<Utc>>,
  pub notes:            Option<String>,
  /// `"success"` or `"fail"`; derived from the score when absent.
  pub outcome:          Option<String>,
}

impl RecordBody {
  fn into_new_session(self, now: DateTime<Utc>) -> Result<NewStudySession, ApiError> {
    let outcome = self.outcome.as_deref().map(Outcome::parse).transpose()?;
    Ok(NewStudySession {
      subject_id: self.subject_id,
      topic: self.topic,
      duration_minutes: self.duration_minutes,
      correct_answers: self.correct_answers,
      total_answers: self.total_answers,
      occurred_at: self.occurred_at.unwrap_or(now),
      notes: self.notes,
      outcome,
    })
  }
}

/// `POST /sessions`: returns 201 + the recorded session and its review item.
pub async fn record<S: StudyStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<RecordBody>,
) -> Result<impl IntoResponse, ApiError> {
  let input = body.into_new_session(Utc::now())?;
  let recorded = state.store.record_session(input).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(recorded)))
}
