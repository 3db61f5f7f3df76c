//! SQL schema for the Cadence SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS subjects (
    subject_id  TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    weight      INTEGER NOT NULL CHECK (weight > 0),
    topics      TEXT NOT NULL DEFAULT '[]',   -- JSON array, ordered
    created_at  TEXT NOT NULL
);

-- Scheduling state only; priority and status are derived on read.
CREATE TABLE IF NOT EXISTS review_items (
    review_id        TEXT PRIMARY KEY,
    subject_id       TEXT NOT NULL REFERENCES subjects(subject_id),
    topic            TEXT NOT NULL,
    created_at       TEXT NOT NULL,
    last_reviewed_at TEXT,
    interval_step    INTEGER NOT NULL CHECK (interval_step >= 0),
    due_at           TEXT NOT NULL,
    UNIQUE (subject_id, topic)
);

-- Completion history. Append-only; rows leave only with their subject.
CREATE TABLE IF NOT EXISTS review_events (
    event_id        TEXT PRIMARY KEY,
    review_id       TEXT NOT NULL REFERENCES review_items(review_id),
    outcome         TEXT NOT NULL,   -- 'success' | 'fail'
    reviewed_at     TEXT NOT NULL,
    previous_step   INTEGER NOT NULL,
    new_step        INTEGER NOT NULL,
    previous_due_at TEXT NOT NULL,
    new_due_at      TEXT NOT NULL
);

-- Sessions are immutable once written.
CREATE TABLE IF NOT EXISTS study_sessions (
    session_id       TEXT PRIMARY KEY,
    subject_id       TEXT NOT NULL REFERENCES subjects(subject_id),
    topic            TEXT NOT NULL,
    duration_minutes INTEGER NOT NULL,
    correct_answers  INTEGER NOT NULL,
    total_answers    INTEGER NOT NULL,
    occurred_at      TEXT NOT NULL,
    notes            TEXT,
    outcome          TEXT NOT NULL,
    CHECK (correct_answers <= total_answers)
);

CREATE INDEX IF NOT EXISTS review_items_due_idx      ON review_items(due_at);
CREATE INDEX IF NOT EXISTS review_items_subject_idx  ON review_items(subject_id);
CREATE INDEX IF NOT EXISTS review_events_review_idx  ON review_events(review_id);
CREATE INDEX IF NOT EXISTS study_sessions_subject_idx  ON study_sessions(subject_id);
CREATE INDEX IF NOT EXISTS study_sessions_occurred_idx ON study_sessions(occurred_at);

PRAGMA user_version = 1;
";
