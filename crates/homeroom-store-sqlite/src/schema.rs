//! SQL schema for the Homeroom SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Two unique constraints carry domain invariants: one teachable per
/// concrete owner, and at most one completion per `(subject, date)` — the
/// latter is the final arbiter under concurrent toggles.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS guardians (
    guardian_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS learners (
    learner_id  TEXT PRIMARY KEY,
    guardian_id TEXT NOT NULL REFERENCES guardians(guardian_id),
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS groups (
    group_id   TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS group_members (
    group_id   TEXT NOT NULL REFERENCES groups(group_id)     ON DELETE CASCADE,
    learner_id TEXT NOT NULL REFERENCES learners(learner_id) ON DELETE CASCADE,
    UNIQUE (group_id, learner_id)
);

-- One ownership record per concrete learner or group.
CREATE TABLE IF NOT EXISTS teachables (
    teachable_id TEXT PRIMARY KEY,
    kind         TEXT NOT NULL,   -- 'individual' | 'group'
    owner_id     TEXT NOT NULL,   -- learner_id or group_id per kind
    created_at   TEXT NOT NULL,
    UNIQUE (kind, owner_id)
);

CREATE TABLE IF NOT EXISTS subjects (
    subject_id         TEXT PRIMARY KEY,
    teachable_id       TEXT NOT NULL REFERENCES teachables(teachable_id),
    name               TEXT NOT NULL,
    icon               TEXT,
    variant            TEXT NOT NULL,              -- 'fixed' | 'scheduled' | 'pick1'
    days               TEXT,                       -- JSON weekday array; scheduled only
    narration_required INTEGER NOT NULL DEFAULT 0,
    created_at         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS subject_options (
    option_id  TEXT PRIMARY KEY,
    subject_id TEXT NOT NULL REFERENCES subjects(subject_id) ON DELETE CASCADE,
    name       TEXT NOT NULL,
    position   INTEGER NOT NULL
);

-- Presence/absence record: a toggle inserts or deletes a whole row.
CREATE TABLE IF NOT EXISTS completions (
    completion_id      TEXT PRIMARY KEY,
    subject_id         TEXT NOT NULL REFERENCES subjects(subject_id) ON DELETE CASCADE,
    date               TEXT NOT NULL,   -- ISO 8601 calendar date
    selected_option_id TEXT REFERENCES subject_options(option_id) ON DELETE CASCADE,
    completed_at       TEXT NOT NULL,
    UNIQUE (subject_id, date)
);

CREATE TABLE IF NOT EXISTS narrations (
    narration_id TEXT PRIMARY KEY,
    subject_id   TEXT NOT NULL REFERENCES subjects(subject_id) ON DELETE CASCADE,
    date         TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    UNIQUE (subject_id, date)
);

CREATE INDEX IF NOT EXISTS learners_guardian_idx      ON learners(guardian_id);
CREATE INDEX IF NOT EXISTS group_members_learner_idx  ON group_members(learner_id);
CREATE INDEX IF NOT EXISTS subjects_teachable_idx     ON subjects(teachable_id);
CREATE INDEX IF NOT EXISTS options_subject_idx        ON subject_options(subject_id);
CREATE INDEX IF NOT EXISTS completions_subject_idx    ON completions(subject_id, date);

PRAGMA user_version = 1;
";
