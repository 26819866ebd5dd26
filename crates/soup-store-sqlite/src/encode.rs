//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed number of
//! fractional digits so that lexical order matches chronological order.
//! UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use soup_core::{
  interaction::{Interaction, Role},
  puzzle::{Puzzle, User},
  session::{Session, SessionStatus},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── SessionStatus ────────────────────────────────────────────────────────────

pub fn encode_status(s: SessionStatus) -> &'static str { s.as_str() }

pub fn decode_status(s: &str) -> Result<SessionStatus> {
  match s {
    "in_progress" => Ok(SessionStatus::InProgress),
    "solved" => Ok(SessionStatus::Solved),
    "given_up" => Ok(SessionStatus::GivenUp),
    other => Err(Error::UnknownValue { column: "status", value: other.to_owned() }),
  }
}

// ─── Role ─────────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str {
  match r {
    Role::User => "user",
    Role::Ai => "ai",
  }
}

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "user" => Ok(Role::User),
    "ai" => Ok(Role::Ai),
    other => Err(Error::UnknownValue { column: "role", value: other.to_owned() }),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:    String,
  pub nickname:   Option<String>,
  pub created_at: String,
}

impl RawUser {
  pub const COLUMNS: &'static str = "user_id, nickname, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      nickname:   row.get(1)?,
      created_at: row.get(2)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    decode_uuid(&self.user_id)?,
      nickname:   self.nickname,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `puzzles` row.
pub struct RawPuzzle {
  pub puzzle_id:   String,
  pub title:       String,
  pub surface:     String,
  pub truth:       String,
  pub source_file: String,
  pub created_at:  String,
}

impl RawPuzzle {
  pub const COLUMNS: &'static str =
    "puzzle_id, title, surface, truth, source_file, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      puzzle_id:   row.get(0)?,
      title:       row.get(1)?,
      surface:     row.get(2)?,
      truth:       row.get(3)?,
      source_file: row.get(4)?,
      created_at:  row.get(5)?,
    })
  }

  pub fn into_puzzle(self) -> Result<Puzzle> {
    Ok(Puzzle {
      puzzle_id:   decode_uuid(&self.puzzle_id)?,
      title:       self.title,
      surface:     self.surface,
      truth:       self.truth,
      source_file: self.source_file,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `sessions` row.
pub struct RawSession {
  pub session_id:   String,
  pub user_id:      String,
  pub puzzle_id:    String,
  pub status:       String,
  pub rating_fun:   Option<u8>,
  pub rating_logic: Option<u8>,
  pub created_at:   String,
}

impl RawSession {
  pub const COLUMNS: &'static str =
    "session_id, user_id, puzzle_id, status, rating_fun, rating_logic, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      session_id:   row.get(0)?,
      user_id:      row.get(1)?,
      puzzle_id:    row.get(2)?,
      status:       row.get(3)?,
      rating_fun:   row.get(4)?,
      rating_logic: row.get(5)?,
      created_at:   row.get(6)?,
    })
  }

  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      session_id:   decode_uuid(&self.session_id)?,
      user_id:      decode_uuid(&self.user_id)?,
      puzzle_id:    decode_uuid(&self.puzzle_id)?,
      status:       decode_status(&self.status)?,
      rating_fun:   self.rating_fun,
      rating_logic: self.rating_logic,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from an `interactions` row.
pub struct RawInteraction {
  pub interaction_id: String,
  pub session_id:     String,
  pub role:           String,
  pub content:        String,
  pub is_legal:       bool,
  pub recorded_at:    String,
}

impl RawInteraction {
  pub const COLUMNS: &'static str =
    "interaction_id, session_id, role, content, is_legal, recorded_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      interaction_id: row.get(0)?,
      session_id:     row.get(1)?,
      role:           row.get(2)?,
      content:        row.get(3)?,
      is_legal:       row.get(4)?,
      recorded_at:    row.get(5)?,
    })
  }

  pub fn into_interaction(self) -> Result<Interaction> {
    Ok(Interaction {
      interaction_id: decode_uuid(&self.interaction_id)?,
      session_id:     decode_uuid(&self.session_id)?,
      role:           decode_role(&self.role)?,
      content:        self.content,
      is_legal:       self.is_legal,
      recorded_at:    decode_dt(&self.recorded_at)?,
    })
  }
}
