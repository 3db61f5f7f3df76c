//! Integration tests for `SqliteStore` against an in-memory database.

use cadence_core::{
  review::{NewReview, Outcome},
  schedule::Scheduler,
  session::NewStudySession,
  store::{SessionQuery, StudyStore},
  subject::NewSubject,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn t0() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap() }

fn core_err(err: Error) -> cadence_core::Error {
  match err {
    Error::Core(e) => e,
    other => panic!("expected a domain error, got {other:?}"),
  }
}

fn constitutional() -> NewSubject {
  NewSubject::new("Direito Constitucional", 15)
    .with_topics(["Princípios Fundamentais", "Direitos Fundamentais"])
}

fn studied(subject_id: Uuid, topic: &str, at: DateTime<Utc>) -> NewStudySession {
  let mut input = NewStudySession::new(subject_id, topic, at);
  input.duration_minutes = 45;
  input.correct_answers = 8;
  input.total_answers = 10;
  input
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_subject() {
  let s = store().await;

  let subject = s.add_subject(constitutional()).await.unwrap();
  assert_eq!(subject.weight, 15);

  let fetched = s.get_subject(subject.subject_id).await.unwrap().unwrap();
  assert_eq!(fetched, subject);
}

#[tokio::test]
async fn get_subject_missing_returns_none() {
  let s = store().await;
  assert!(s.get_subject(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn add_subject_rejects_zero_weight() {
  let s = store().await;
  let err = s.add_subject(NewSubject::new("Matemática", 0)).await.unwrap_err();
  assert!(matches!(core_err(err), cadence_core::Error::InvalidWeight));
}

#[tokio::test]
async fn list_subjects_sorted_by_name() {
  let s = store().await;
  s.add_subject(NewSubject::new("Raciocínio Lógico", 10)).await.unwrap();
  s.add_subject(NewSubject::new("Direito Penal", 10)).await.unwrap();
  s.add_subject(NewSubject::new("matemática", 10)).await.unwrap();

  let names: Vec<_> = s
    .list_subjects()
    .await
    .unwrap()
    .into_iter()
    .map(|s| s.name)
    .collect();
  assert_eq!(names, vec!["Direito Penal", "matemática", "Raciocínio Lógico"]);
}

#[tokio::test]
async fn update_subject_replaces_fields() {
  let s = store().await;
  let subject = s.add_subject(constitutional()).await.unwrap();

  let updated = s
    .update_subject(
      subject.subject_id,
      NewSubject::new("Direito Constitucional II", 12).with_topics(["Controle de Constitucionalidade"]),
    )
    .await
    .unwrap();

  assert_eq!(updated.subject_id, subject.subject_id);
  assert_eq!(updated.created_at, subject.created_at);
  assert_eq!(updated.weight, 12);
  assert_eq!(updated.topics, vec!["Controle de Constitucionalidade"]);
}

#[tokio::test]
async fn update_unknown_subject_is_not_found() {
  let s = store().await;
  let err = s.update_subject(Uuid::new_v4(), constitutional()).await.unwrap_err();
  assert!(core_err(err).is_not_found());
}

// ─── Sessions feed the schedule ──────────────────────────────────────────────

#[tokio::test]
async fn first_session_creates_review_due_next_day() {
  let s = store().await;
  let subject = s.add_subject(constitutional()).await.unwrap();

  let recorded = s
    .record_session(studied(subject.subject_id, "Princípios Fundamentais", t0()))
    .await
    .unwrap();

  assert!(recorded.created);
  assert_eq!(recorded.session.outcome, Outcome::Success);
  assert_eq!(recorded.review.interval_step, 0);
  assert_eq!(recorded.review.created_at, t0());
  assert_eq!(recorded.review.due_at, t0() + Duration::hours(24));

  let stored = s.get_review(recorded.review.review_id).await.unwrap().unwrap();
  assert_eq!(stored, recorded.review);
}

#[tokio::test]
async fn later_sessions_complete_the_same_review() {
  let s = store().await;
  let subject = s.add_subject(constitutional()).await.unwrap();
  let id = subject.subject_id;

  let first = s.record_session(studied(id, "Direitos Fundamentais", t0())).await.unwrap();
  let day2 = t0() + Duration::days(1);
  let second = s.record_session(studied(id, "Direitos Fundamentais", day2)).await.unwrap();

  assert!(!second.created);
  assert_eq!(second.review.review_id, first.review.review_id);
  assert_eq!(second.review.interval_step, 1);
  assert_eq!(second.review.due_at, day2 + Duration::days(7));
  assert_eq!(s.list_reviews(Some(id)).await.unwrap().len(), 1);

  let mut failed = studied(id, "Direitos Fundamentais", day2 + Duration::days(3));
  failed.correct_answers = 2;
  let third = s.record_session(failed).await.unwrap();
  assert_eq!(third.session.outcome, Outcome::Fail);
  assert_eq!(third.review.interval_step, 0);
  assert_eq!(third.review.due_at, day2 + Duration::days(3) + Duration::hours(24));
}

#[tokio::test]
async fn session_for_unknown_subject_is_rejected() {
  let s = store().await;
  let err = s.record_session(studied(Uuid::new_v4(), "x", t0())).await.unwrap_err();
  assert!(matches!(core_err(err), cadence_core::Error::SubjectNotFound(_)));
  assert!(s.list_sessions(&SessionQuery::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn stale_session_rolls_back_entirely() {
  let s = store().await;
  let subject = s.add_subject(constitutional()).await.unwrap();
  let id = subject.subject_id;
  s.record_session(studied(id, "a", t0())).await.unwrap();
  s.record_session(studied(id, "a", t0() + Duration::days(2))).await.unwrap();

  let err = s
    .record_session(studied(id, "a", t0() + Duration::days(1)))
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), cadence_core::Error::StaleTimestamp { .. }));
  assert_eq!(s.list_sessions(&SessionQuery::default()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn replaying_the_creating_session_is_stale() {
  let s = store().await;
  let subject = s.add_subject(constitutional()).await.unwrap();
  let input = studied(subject.subject_id, "Princípios Fundamentais", t0());

  let first = s.record_session(input.clone()).await.unwrap();
  let err = s.record_session(input).await.unwrap_err();
  assert!(matches!(core_err(err), cadence_core::Error::StaleTimestamp { .. }));

  let stored = s.get_review(first.review.review_id).await.unwrap().unwrap();
  assert_eq!(stored, first.review);
  assert_eq!(stored.interval_step, 0);
  assert_eq!(s.list_sessions(&SessionQuery::default()).await.unwrap().len(), 1);
  assert!(s.review_history(stored.review_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn session_text_filter_folds_case_and_is_literal() {
  let s = store().await;
  let math = s.add_subject(NewSubject::new("Matemática", 10)).await.unwrap();
  let mut pct = studied(math.subject_id, "Porcentagem", t0());
  pct.notes = Some("acertei 80% das questões".into());
  s.record_session(pct).await.unwrap();
  s.record_session(studied(math.subject_id, "Equações", t0() + Duration::hours(1)))
    .await
    .unwrap();
  s.record_session(studied(math.subject_id, "Equações do 2º grau", t0() + Duration::hours(2)))
    .await
    .unwrap();

  let text = |t: &str| SessionQuery { text: Some(t.into()), ..Default::default() };

  let accented = s.list_sessions(&text("EQUAÇÕES")).await.unwrap();
  assert_eq!(accented.len(), 2);

  let percent = s.list_sessions(&text("%")).await.unwrap();
  assert_eq!(percent.len(), 1);
  assert_eq!(percent[0].topic, "Porcentagem");
  assert!(s.list_sessions(&text("_")).await.unwrap().is_empty());

  let paged = s
    .list_sessions(&SessionQuery { limit: Some(1), offset: Some(1), ..text("equações") })
    .await
    .unwrap();
  assert_eq!(paged.len(), 1);
  assert_eq!(paged[0].topic, "Equações");
}

#[tokio::test]
async fn list_sessions_filters() {
  let s = store().await;
  let law = s.add_subject(constitutional()).await.unwrap();
  let math = s.add_subject(NewSubject::new("Matemática", 10)).await.unwrap();

  let mut noted = studied(law.subject_id, "Princípios Fundamentais", t0());
  noted.notes = Some("Revisão dos artigos 1° a 4°".into());
  s.record_session(noted).await.unwrap();
  s.record_session(studied(math.subject_id, "Porcentagem", t0() + Duration::hours(1)))
    .await
    .unwrap();
  s.record_session(studied(math.subject_id, "Equações", t0() + Duration::days(1)))
    .await
    .unwrap();

  let all = s.list_sessions(&SessionQuery::default()).await.unwrap();
  assert_eq!(all.len(), 3);
  assert_eq!(all[0].topic, "Equações", "newest first");

  let math_only = s
    .list_sessions(&SessionQuery { subject_id: Some(math.subject_id), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(math_only.len(), 2);

  let by_notes = s
    .list_sessions(&SessionQuery { text: Some("artigos".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(by_notes.len(), 1);
  assert_eq!(by_notes[0].subject_id, law.subject_id);

  let first_day = s
    .list_sessions(&SessionQuery {
      since: Some(t0()),
      until: Some(t0() + Duration::hours(2)),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(first_day.len(), 2);

  let paged = s
    .list_sessions(&SessionQuery { limit: Some(1), offset: Some(1), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(paged.len(), 1);
  assert_eq!(paged[0].topic, "Porcentagem");
}

// ─── Review items ────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_review_with_duplicate_id_fails() {
  let s = store().await;
  let subject = s.add_subject(constitutional()).await.unwrap();
  let review_id = Uuid::new_v4();

  let mut input = NewReview::new(subject.subject_id, "Crimes contra a Pessoa", t0());
  input.review_id = Some(review_id);
  let created = s.create_review(input.clone()).await.unwrap();
  assert_eq!(created.review_id, review_id);

  input.topic = "Another topic".into();
  let err = s.create_review(input).await.unwrap_err();
  assert!(matches!(core_err(err), cadence_core::Error::DuplicateId(id) if id == review_id));
}

#[tokio::test]
async fn create_review_for_scheduled_topic_conflicts() {
  let s = store().await;
  let subject = s.add_subject(constitutional()).await.unwrap();
  s.create_review(NewReview::new(subject.subject_id, "Licitações", t0())).await.unwrap();

  let err = s
    .create_review(NewReview::new(subject.subject_id, " Licitações ", t0()))
    .await
    .unwrap_err();
  let err = core_err(err);
  assert!(matches!(err, cadence_core::Error::TopicAlreadyScheduled { .. }));
  assert!(err.is_conflict());
}

#[tokio::test]
async fn completing_explicit_review_at_creation_is_stale() {
  let s = store().await;
  let subject = s.add_subject(constitutional()).await.unwrap();
  let item = s
    .create_review(NewReview::new(subject.subject_id, "Poder Constituinte", t0()))
    .await
    .unwrap();

  let err = s
    .complete_review(item.review_id, Outcome::Success, item.created_at)
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), cadence_core::Error::StaleTimestamp { .. }));
  assert_eq!(s.get_review(item.review_id).await.unwrap().unwrap(), item);
  assert!(s.review_history(item.review_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn add_subject_rejects_blank_name() {
  let s = store().await;
  let err = s.add_subject(NewSubject::new("   ", 3)).await.unwrap_err();
  assert!(matches!(core_err(err), cadence_core::Error::EmptyName));
  assert!(s.list_subjects().await.unwrap().is_empty());
}

#[tokio::test]
async fn find_review_by_topic() {
  let s = store().await;
  let subject = s.add_subject(constitutional()).await.unwrap();
  let created = s
    .create_review(NewReview::new(subject.subject_id, "Equações", t0()))
    .await
    .unwrap();

  let found = s.find_review(subject.subject_id, "Equações").await.unwrap();
  assert_eq!(found, Some(created));
  assert!(s.find_review(subject.subject_id, "Frações").await.unwrap().is_none());
}

#[tokio::test]
async fn complete_unknown_review_is_not_found() {
  let s = store().await;
  let err = s
    .complete_review(Uuid::new_v4(), Outcome::Success, t0())
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), cadence_core::Error::ReviewNotFound(_)));
}

#[tokio::test]
async fn completions_walk_the_ladder_and_record_history() {
  let s = store().await;
  let subject = s.add_subject(constitutional()).await.unwrap();
  let item = s
    .create_review(NewReview::new(subject.subject_id, "Direitos Fundamentais", t0()))
    .await
    .unwrap();

  let mut current = item.clone();
  let mut expected_due = t0() + Duration::hours(24);
  for n in 1..=6u32 {
    current = s
      .complete_review(item.review_id, Outcome::Success, current.due_at)
      .await
      .unwrap();
    expected_due += s.ladder().offset(n);
    assert_eq!(current.interval_step, n.min(4));
    assert_eq!(current.due_at, expected_due);
  }

  let history = s.review_history(item.review_id).await.unwrap();
  assert_eq!(history.len(), 6);
  assert_eq!(history[0].previous_step, 0);
  assert_eq!(history[0].new_step, 1);
  assert_eq!(history[5].new_due_at, current.due_at);
  assert!(history.iter().all(|e| e.outcome == Outcome::Success));
}

#[tokio::test]
async fn replayed_completion_is_stale_and_changes_nothing() {
  let s = store().await;
  let subject = s.add_subject(constitutional()).await.unwrap();
  let item = s
    .create_review(NewReview::new(subject.subject_id, "Atos Administrativos", t0()))
    .await
    .unwrap();

  let at = t0() + Duration::hours(26);
  let done = s.complete_review(item.review_id, Outcome::Success, at).await.unwrap();
  let err = s
    .complete_review(item.review_id, Outcome::Success, at)
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), cadence_core::Error::StaleTimestamp { .. }));

  let stored = s.get_review(item.review_id).await.unwrap().unwrap();
  assert_eq!(stored, done);
  assert_eq!(s.review_history(item.review_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_completions_serialise() {
  let s = store().await;
  let subject = s.add_subject(constitutional()).await.unwrap();
  let item = s
    .create_review(NewReview::new(subject.subject_id, "Proposições Lógicas", t0()))
    .await
    .unwrap();

  let id = item.review_id;
  let at = t0() + Duration::hours(25);
  let handles: Vec<_> = (0..8)
    .map(|_| {
      let s = s.clone();
      tokio::spawn(async move { s.complete_review(id, Outcome::Success, at).await })
    })
    .collect();

  let mut ok = 0;
  for h in handles {
    if h.await.unwrap().is_ok() {
      ok += 1;
    }
  }
  assert_eq!(ok, 1, "exactly one completion wins");

  let stored = s.get_review(id).await.unwrap().unwrap();
  assert_eq!(stored.interval_step, 1);
  assert_eq!(s.review_history(id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn custom_ladder_drives_scheduling() {
  let ladder =
    cadence_core::interval::IntervalLadder::new(vec![Duration::hours(1), Duration::days(2)]).unwrap();
  let s = store().await.with_ladder(ladder);
  let subject = s.add_subject(constitutional()).await.unwrap();

  let first = s.record_session(studied(subject.subject_id, "a", t0())).await.unwrap();
  assert_eq!(first.review.due_at, t0() + Duration::hours(1));

  let at = t0() + Duration::hours(2);
  let done = s.complete_review(first.review.review_id, Outcome::Success, at).await.unwrap();
  assert_eq!(done.interval_step, 1);
  assert_eq!(done.due_at, at + Duration::days(2));
}

#[tokio::test]
async fn history_of_unknown_review_is_not_found() {
  let s = store().await;
  let err = s.review_history(Uuid::new_v4()).await.unwrap_err();
  assert!(core_err(err).is_not_found());
}

#[tokio::test]
async fn reads_feed_an_idempotent_board() {
  let s = store().await;
  let subject = s.add_subject(constitutional()).await.unwrap();
  for (i, topic) in ["a", "b", "c", "d"].into_iter().enumerate() {
    s.record_session(studied(subject.subject_id, topic, t0() - Duration::days(i as i64)))
      .await
      .unwrap();
  }

  let scheduler = Scheduler::default();
  let now = t0() + Duration::hours(1);
  let first = scheduler.partition(s.list_reviews(None).await.unwrap(), now);
  let second = scheduler.partition(s.list_reviews(None).await.unwrap(), now);
  assert_eq!(first, second);
  assert_eq!(first.len(), 4);
  assert_eq!(first.overdue.len(), 3);
  assert_eq!(first.upcoming.len(), 1);
}

// ─── Cascade ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_subject_cascades_only_to_its_records() {
  let s = store().await;
  let law = s.add_subject(constitutional()).await.unwrap();
  let math = s.add_subject(NewSubject::new("Matemática", 10)).await.unwrap();

  let law_review = s.record_session(studied(law.subject_id, "a", t0())).await.unwrap().review;
  s.complete_review(law_review.review_id, Outcome::Fail, t0() + Duration::hours(3))
    .await
    .unwrap();
  s.record_session(studied(law.subject_id, "b", t0())).await.unwrap();
  s.record_session(studied(math.subject_id, "c", t0())).await.unwrap();

  let deletion = s.delete_subject(law.subject_id).await.unwrap();
  assert_eq!(deletion.reviews_removed, 2);
  assert_eq!(deletion.sessions_removed, 2);

  assert!(s.get_subject(law.subject_id).await.unwrap().is_none());
  assert!(s.get_review(law_review.review_id).await.unwrap().is_none());
  assert_eq!(s.list_reviews(None).await.unwrap().len(), 1);
  assert_eq!(s.list_sessions(&SessionQuery::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_unknown_subject_is_not_found() {
  let s = store().await;
  let err = s.delete_subject(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(core_err(err), cadence_core::Error::SubjectNotFound(_)));
}

#[tokio::test]
async fn closed_store_rejects_calls() {
  let s = store().await;
  let other = s.clone();
  s.close().await.unwrap();
  assert!(matches!(
    other.list_subjects().await.unwrap_err(),
    Error::Database(_)
  ));
}
