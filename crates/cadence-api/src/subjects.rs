//! Handlers for `/subjects` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/subjects` | Optional `?text=` filter on the name |
//! | `POST`   | `/subjects` | Body: [`NewSubject`]; returns 201 |
//! | `GET`    | `/subjects/:id` | 404 if not found |
//! | `PUT`    | `/subjects/:id` | Body: [`NewSubject`] |
//! | `DELETE` | `/subjects/:id` | Cascades to review items and sessions |
//! | `GET`    | `/subjects/:id/progress` | [`SubjectProgress`] |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use cadence_core::{
  stats::{self, SubjectProgress},
  store::{SessionQuery, StudyStore, SubjectDeletion},
  subject::{NewSubject, Subject},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub text: Option<String>,
}

/// `GET /subjects[?text=<name fragment>]`
pub async fn list<S: StudyStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Subject>>, ApiError> {
  let mut subjects = state.store.list_subjects().await.map_err(ApiError::from_store)?;

  if let Some(text) = params.text.as_deref().map(str::trim)
    && !text.is_empty()
  {
    let needle = text.to_lowercase();
    subjects.retain(|s| s.name.to_lowercase().contains(&needle));
  }

  Ok(Json(subjects))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /subjects`, body: `{"name":"...","weight":15,"topics":[...]}`
pub async fn create<S: StudyStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewSubject>,
) -> Result<impl IntoResponse, ApiError> {
  let subject = state.store.add_subject(body).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(subject)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /subjects/:id`
pub async fn get_one<S: StudyStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Subject>, ApiError> {
  let subject = state
    .store
    .get_subject(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("subject {id} not found")))?;
  Ok(Json(subject))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /subjects/:id` replaces name, weight and topics.
pub async fn update<S: StudyStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<NewSubject>,
) -> Result<Json<Subject>, ApiError> {
  let subject = state.store.update_subject(id, body).await.map_err(ApiError::from_store)?;
  Ok(Json(subject))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /subjects/:id`
pub async fn delete_one<S: StudyStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SubjectDeletion>, ApiError> {
  let deletion = state.store.delete_subject(id).await.map_err(ApiError::from_store)?;
  Ok(Json(deletion))
}

// ─── Progress ─────────────────────────────────────────────────────────────────

/// `GET /subjects/:id/progress`
pub async fn progress<S: StudyStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SubjectProgress>, ApiError> {
  let subject = state
    .store
    .get_subject(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("subject {id} not found")))?;

  let query = SessionQuery { subject_id: Some(id), ..Default::default() };
  let sessions = state.store.list_sessions(&query).await.map_err(ApiError::from_store)?;
  let reviews = state.store.list_reviews(Some(id)).await.map_err(ApiError::from_store)?;

  Ok(Json(stats::subject_progress(
    &subject,
    &sessions,
    &reviews,
    state.store.ladder(),
  )))
}
