//! JSON REST API for Cadence.
//!
//! Exposes an axum [`Router`] backed by any
//! [`cadence_core::store::StudyStore`]. Transport concerns (listening,
//! tracing layers) are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", cadence_api::api_router(store.clone(), scheduler))
//! ```

pub mod board;
pub mod error;
pub mod reviews;
pub mod sessions;
pub mod stats;
pub mod subjects;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use cadence_core::{schedule::Scheduler, store::StudyStore};

pub use error::ApiError;

/// Shared state handed to every handler.
pub struct AppState<S> {
  pub store:     Arc<S>,
  pub scheduler: Scheduler,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), scheduler: self.scheduler }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, scheduler: Scheduler) -> Router<()>
where
  S: StudyStore + 'static,
{
  Router::new()
    // Subjects
    .route("/subjects", get(subjects::list::<S>).post(subjects::create::<S>))
    .route(
      "/subjects/{id}",
      get(subjects::get_one::<S>)
        .put(subjects::update::<S>)
        .delete(subjects::delete_one::<S>),
    )
    .route("/subjects/{id}/progress", get(subjects::progress::<S>))
    // Sessions
    .route("/sessions", get(sessions::list::<S>).post(sessions::record::<S>))
    // Reviews
    .route("/reviews", get(reviews::list::<S>).post(reviews::create::<S>))
    .route("/reviews/{id}", get(reviews::get_one::<S>))
    .route("/reviews/{id}/complete", post(reviews::complete::<S>))
    .route("/reviews/{id}/history", get(reviews::history::<S>))
    // Board and statistics
    .route("/board", get(board::handler::<S>))
    .route("/stats/overview", get(stats::overview::<S>))
    .route("/stats/history", get(stats::history::<S>))
    .with_state(AppState { store, scheduler })
}
