//! Aggregate reads for the dashboard: per-subject progress, the per-day
//! study history and the overview numbers.
//!
//! All functions are pure and take already-loaded records; the API layer
//! fetches them from the store.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use uuid::Uuid;

use crate::{
  interval::IntervalLadder,
  review::ReviewItem,
  schedule::Scheduler,
  session::StudySession,
  subject::Subject,
};

fn percent(part: f64, whole: f64) -> Option<u8> {
  (whole > 0.0).then(|| (part * 100.0 / whole).round().clamp(0.0, 100.0) as u8)
}

fn answer_rate<'a>(sessions: impl IntoIterator<Item = &'a StudySession>) -> Option<u8> {
  let (correct, total) = sessions.into_iter().fold((0u64, 0u64), |(c, t), s| {
    (c + u64::from(s.correct_answers), t + u64::from(s.total_answers))
  });
  percent(correct as f64, total as f64)
}

// ─── Subject progress ────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SubjectStatus {
  NotStarted,
  InProgress,
  Completed,
}

/// Aggregate progress for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectProgress {
  pub subject_id:       Uuid,
  pub name:             String,
  pub weight:           u32,
  pub sessions:         usize,
  pub total_minutes:    u64,
  pub correct_answers:  u64,
  pub total_answers:    u64,
  /// Correct answers as a percentage of all answers.
  pub accuracy:         Option<u8>,
  pub topics_total:     usize,
  pub topics_studied:   usize,
  pub reviews_total:    usize,
  /// Review items sitting on the last rung of the ladder.
  pub reviews_mastered: usize,
  /// Mean ladder position over all topics, as a percentage.
  pub progress:         u8,
  pub last_studied_at:  Option<DateTime<Utc>>,
  pub status:           SubjectStatus,
}

/// Compute progress for `subject` from its sessions and review items.
/// Records belonging to other subjects are ignored.
pub fn subject_progress(
  subject: &Subject,
  sessions: &[StudySession],
  reviews: &[ReviewItem],
  ladder: &IntervalLadder,
) -> SubjectProgress {
  let sessions: Vec<&StudySession> = sessions
    .iter()
    .filter(|s| s.subject_id == subject.subject_id)
    .collect();
  let reviews: Vec<&ReviewItem> = reviews
    .iter()
    .filter(|r| r.subject_id == subject.subject_id)
    .collect();

  // Declared topics first, then anything studied outside the declared list.
  let mut topics: Vec<&str> = subject.topics.iter().map(String::as_str).collect();
  for extra in sessions
    .iter()
    .map(|s| s.topic.as_str())
    .chain(reviews.iter().map(|r| r.topic.as_str()))
  {
    if !topics.contains(&extra) {
      topics.push(extra);
    }
  }

  let rungs = f64::from(ladder.last_index() + 1);
  let by_topic: HashMap<&str, &ReviewItem> =
    reviews.iter().map(|r| (r.topic.as_str(), *r)).collect();
  let climbed: f64 = topics
    .iter()
    .filter_map(|t| by_topic.get(t))
    .map(|r| f64::from(ladder.clamp(r.interval_step) + 1) / rungs)
    .sum();
  let progress = percent(climbed, topics.len() as f64).unwrap_or(0);

  let topics_studied = topics
    .iter()
    .filter(|t| by_topic.contains_key(*t) || sessions.iter().any(|s| s.topic == **t))
    .count();

  let status = if sessions.is_empty() && reviews.is_empty() {
    SubjectStatus::NotStarted
  } else if progress == 100 {
    SubjectStatus::Completed
  } else {
    SubjectStatus::InProgress
  };

  SubjectProgress {
    subject_id: subject.subject_id,
    name: subject.name.clone(),
    weight: subject.weight,
    sessions: sessions.len(),
    total_minutes: sessions.iter().map(|s| u64::from(s.duration_minutes)).sum(),
    correct_answers: sessions.iter().map(|s| u64::from(s.correct_answers)).sum(),
    total_answers: sessions.iter().map(|s| u64::from(s.total_answers)).sum(),
    accuracy: answer_rate(sessions.iter().copied()),
    topics_total: topics.len(),
    topics_studied,
    reviews_total: reviews.len(),
    reviews_mastered: reviews
      .iter()
      .filter(|r| ladder.clamp(r.interval_step) == ladder.last_index())
      .count(),
    progress,
    last_studied_at: sessions.iter().map(|s| s.occurred_at).max(),
    status,
  }
}

// ─── Daily history ───────────────────────────────────────────────────────────

/// Everything studied on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
  pub date:          NaiveDate,
  pub sessions:      usize,
  pub total_minutes: u64,
  /// Subject names in order of first study that day.
  pub subjects:      Vec<String>,
  /// Correct answers as a percentage of the day's answers.
  pub performance:   Option<u8>,
}

/// Group sessions by local calendar day, newest day first.
pub fn daily_history(
  sessions: &[StudySession],
  subject_names: &HashMap<Uuid, String>,
  scheduler: &Scheduler,
) -> Vec<DailySummary> {
  let mut days: BTreeMap<NaiveDate, Vec<&StudySession>> = BTreeMap::new();
  for s in sessions {
    days.entry(scheduler.local_date(s.occurred_at)).or_default().push(s);
  }

  days
    .into_iter()
    .rev()
    .map(|(date, mut day)| {
      day.sort_by_key(|s| s.occurred_at);
      let mut subjects: Vec<String> = Vec::new();
      for s in &day {
        let name = subject_names
          .get(&s.subject_id)
          .cloned()
          .unwrap_or_else(|| s.subject_id.to_string());
        if !subjects.contains(&name) {
          subjects.push(name);
        }
      }
      DailySummary {
        date,
        sessions: day.len(),
        total_minutes: day.iter().map(|s| u64::from(s.duration_minutes)).sum(),
        subjects,
        performance: answer_rate(day.iter().copied()),
      }
    })
    .collect()
}

// ─── Overview ────────────────────────────────────────────────────────────────

/// The headline numbers on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
  pub sessions:         usize,
  pub total_minutes:    u64,
  /// Total study time in hours, rounded to one decimal.
  pub total_hours:      f64,
  /// Distinct subjects with at least one session.
  pub studied_subjects: usize,
  /// Correct answers as a percentage of all answers.
  pub success_rate:     Option<u8>,
  /// Consecutive days with at least one session, ending today (or yesterday
  /// if nothing has been studied yet today).
  pub streak_days:      u32,
}

pub fn overview(sessions: &[StudySession], now: DateTime<Utc>, scheduler: &Scheduler) -> Overview {
  let total_minutes: u64 = sessions.iter().map(|s| u64::from(s.duration_minutes)).sum();
  let studied_subjects = sessions.iter().map(|s| s.subject_id).collect::<BTreeSet<_>>().len();

  let days: BTreeSet<NaiveDate> = sessions
    .iter()
    .filter(|s| s.occurred_at <= now)
    .map(|s| scheduler.local_date(s.occurred_at))
    .collect();

  let today = scheduler.local_date(now);
  let mut cursor = if days.contains(&today) { Some(today) } else { today.pred_opt() };
  let mut streak_days = 0;
  while let Some(day) = cursor
    && days.contains(&day)
  {
    streak_days += 1;
    cursor = day.pred_opt();
  }

  Overview {
    sessions: sessions.len(),
    total_minutes,
    total_hours: (total_minutes as f64 / 60.0 * 10.0).round() / 10.0,
    studied_subjects,
    success_rate: answer_rate(sessions),
    streak_days,
  }
}
