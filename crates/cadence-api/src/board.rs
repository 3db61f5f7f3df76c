//! Handler for `GET /board`: the review board split into overdue, due-today
//! and upcoming.

use std::collections::HashMap;

use axum::{
  Json,
  extract::{Query, State},
};
use cadence_core::{
  review::Priority,
  schedule::{BoardFilter, ReviewBoard},
  store::StudyStore,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize, Default)]
pub struct BoardParams {
  /// Board time. Defaults to now.
  pub as_of:      Option<DateTime<Utc>>,
  /// Case-insensitive match on topic or subject name.
  pub text:       Option<String>,
  pub priority:   Option<Priority>,
  pub subject_id: Option<Uuid>,
}

/// `GET /board[?as_of=...][&text=...][&priority=high|medium|low][&subject_id=...]`
pub async fn handler<S: StudyStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<BoardParams>,
) -> Result<Json<ReviewBoard>, ApiError> {
  let now = params.as_of.unwrap_or_else(Utc::now);
  let filter = BoardFilter {
    text:       params.text,
    priority:   params.priority,
    subject_id: params.subject_id,
  };

  let items = state
    .store
    .list_reviews(filter.subject_id)
    .await
    .map_err(ApiError::from_store)?;
  let board = state.scheduler.partition(items, now);

  if filter == BoardFilter::default() {
    return Ok(Json(board));
  }

  let names: HashMap<Uuid, String> = state
    .store
    .list_subjects()
    .await
    .map_err(ApiError::from_store)?
    .into_iter()
    .map(|s| (s.subject_id, s.name))
    .collect();

  Ok(Json(board.filtered(&filter, &names)))
}
