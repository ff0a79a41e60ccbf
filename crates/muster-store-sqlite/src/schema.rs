//! SQL schema for the Muster SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 5000;

CREATE TABLE IF NOT EXISTS students (
    student_id    TEXT PRIMARY KEY,
    scan_code     TEXT NOT NULL UNIQUE,
    first_name    TEXT,
    middle_name   TEXT,
    last_name     TEXT,
    sex           TEXT,              -- 'male' | 'female'
    department    TEXT,
    year_level    INTEGER,
    date_of_birth TEXT,              -- YYYY-MM-DD
    photo         TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

-- Rows are inserted by scans and updated at most once, to set time_out.
-- AUTOINCREMENT keeps event ids strictly increasing; they break ties
-- between events created within the same clock tick.
CREATE TABLE IF NOT EXISTS attendance_events (
    event_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id  TEXT NOT NULL REFERENCES students(student_id),
    date        TEXT NOT NULL,       -- school day, YYYY-MM-DD
    time_in     TEXT,                -- RFC 3339 UTC, fixed width
    time_out    TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    CHECK (time_in IS NOT NULL OR time_out IS NOT NULL)
);

CREATE INDEX IF NOT EXISTS events_student_day_idx ON attendance_events(student_id, date);
CREATE INDEX IF NOT EXISTS events_updated_idx     ON attendance_events(updated_at);
CREATE INDEX IF NOT EXISTS events_date_idx        ON attendance_events(date);

PRAGMA user_version = 1;
";
