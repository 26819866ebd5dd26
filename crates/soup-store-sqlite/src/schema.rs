//! SQL schema for the game store.
//!
//! Executed once at connection startup; `PRAGMA user_version` records the
//! schema revision for future migrations.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    nickname    TEXT,
    created_at  TEXT NOT NULL
);

-- Written by ingestion only; read-only during play.
CREATE TABLE IF NOT EXISTS puzzles (
    puzzle_id   TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    surface     TEXT NOT NULL,
    truth       TEXT NOT NULL,
    source_file TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    session_id   TEXT PRIMARY KEY,
    user_id      TEXT NOT NULL REFERENCES users(user_id),
    puzzle_id    TEXT NOT NULL REFERENCES puzzles(puzzle_id),
    status       TEXT NOT NULL DEFAULT 'in_progress',  -- 'in_progress' | 'solved' | 'given_up'
    rating_fun   INTEGER,
    rating_logic INTEGER,
    created_at   TEXT NOT NULL,
    UNIQUE (user_id, puzzle_id)
);

-- Interactions are strictly append-only and listed in rowid order.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS interactions (
    interaction_id TEXT PRIMARY KEY,
    session_id     TEXT NOT NULL REFERENCES sessions(session_id),
    role           TEXT NOT NULL,     -- 'user' | 'ai'
    content        TEXT NOT NULL,
    is_legal       INTEGER NOT NULL DEFAULT 1,
    recorded_at    TEXT NOT NULL      -- fixed-width RFC 3339 UTC
);

CREATE INDEX IF NOT EXISTS interactions_session_idx
    ON interactions(session_id);
CREATE INDEX IF NOT EXISTS sessions_user_idx ON sessions(user_id);

PRAGMA user_version = 1;
";
