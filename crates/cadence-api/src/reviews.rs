//! Handlers for `/reviews` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/reviews` | Optional `subject_id`, `as_of`; items as [`ScheduledReview`] |
//! | `POST` | `/reviews` | Body: [`CreateBody`]; 201, or 409 on a taken id or topic |
//! | `GET`  | `/reviews/:id` | One [`ScheduledReview`] |
//! | `POST` | `/reviews/:id/complete` | Body: `{"outcome":"success","at":"..."}` |
//! | `GET`  | `/reviews/:id/history` | Completion events, oldest first |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use cadence_core::{
  review::{NewReview, Outcome, ReviewEvent, ScheduledReview},
  store::StudyStore,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub subject_id: Option<Uuid>,
  /// Projection time for priority and status. Defaults to now.
  pub as_of:      Option<DateTime<Utc>>,
}

/// `GET /reviews[?subject_id=...][&as_of=...]`
pub async fn list<S: StudyStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<ScheduledReview>>, ApiError> {
  let now = params.as_of.unwrap_or_else(Utc::now);
  let items = state
    .store
    .list_reviews(params.subject_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(state.scheduler.project_all(items, now)))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /reviews`.
#[derive(Debug, Deserialize)]
pub struct CreateBody {
  /// Caller-chosen id; a fresh one is generated when absent.
  pub review_id:  Option<Uuid>,
  pub subject_id: Uuid,
  pub topic:      String,
  /// Defaults to now.
  pub created_at: Option<DateTime<Utc>>,
}

/// `POST /reviews`: schedule a topic without recording a session.
pub async fn create<S: StudyStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let now = Utc::now();
  let input = NewReview {
    review_id:  body.review_id,
    subject_id: body.subject_id,
    topic:      body.topic,
    created_at: body.created_at.unwrap_or(now),
  };
  let item = state.store.create_review(input).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(state.scheduler.project(item, now))))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AsOfParams {
  pub as_of: Option<DateTime<Utc>>,
}

/// `GET /reviews/:id[?as_of=...]`
pub async fn get_one<S: StudyStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<AsOfParams>,
) -> Result<Json<ScheduledReview>, ApiError> {
  let item = state
    .store
    .get_review(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("review {id} not found")))?;
  let now = params.as_of.unwrap_or_else(Utc::now);
  Ok(Json(state.scheduler.project(item, now)))
}

// ─── Complete ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CompleteBody {
  /// `"success"` or `"fail"`; anything else is a 400.
  pub outcome: String,
  /// Review time. Defaults to now.
  pub at:      Option<DateTime<Utc>>,
}

/// `POST /reviews/:id/complete`
///
/// The returned item is projected as of the review time.
pub async fn complete<S: StudyStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<CompleteBody>,
) -> Result<Json<ScheduledReview>, ApiError> {
  let outcome = Outcome::parse(&body.outcome)?;
  let at = body.at.unwrap_or_else(Utc::now);
  let item = state
    .store
    .complete_review(id, outcome, at)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(state.scheduler.project(item, at)))
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /reviews/:id/history`
pub async fn history<S: StudyStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<ReviewEvent>>, ApiError> {
  let events = state.store.review_history(id).await.map_err(ApiError::from_store)?;
  Ok(Json(events))
}
