//! Handlers for `/stats` endpoints.

use std::collections::HashMap;

use axum::{
  Json,
  extract::{Query, State},
};
use cadence_core::{
  stats::{self, DailySummary, Overview},
  store::{SessionQuery, StudyStore},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct OverviewParams {
  pub as_of: Option<DateTime<Utc>>,
}

/// `GET /stats/overview[?as_of=...]`
pub async fn overview<S: StudyStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<OverviewParams>,
) -> Result<Json<Overview>, ApiError> {
  let now = params.as_of.unwrap_or_else(Utc::now);
  let sessions = state
    .store
    .list_sessions(&SessionQuery::default())
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(stats::overview(&sessions, now, &state.scheduler)))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
  pub subject_id: Option<Uuid>,
  pub since:      Option<DateTime<Utc>>,
  pub until:      Option<DateTime<Utc>>,
}

/// `GET /stats/history[?subject_id=...][&since=...][&until=...]`, newest day
/// first.
pub async fn history<S: StudyStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<DailySummary>>, ApiError> {
  let query = SessionQuery {
    subject_id: params.subject_id,
    since: params.since,
    until: params.until,
    ..Default::default()
  };
  let sessions = state.store.list_sessions(&query).await.map_err(ApiError::from_store)?;

  let names: HashMap<Uuid, String> = state
    .store
    .list_subjects()
    .await
    .map_err(ApiError::from_store)?
    .into_iter()
    .map(|s| (s.subject_id, s.name))
    .collect();

  Ok(Json(stats::daily_history(&sessions, &names, &state.scheduler)))
}
