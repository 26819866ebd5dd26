//! Session lifecycle: the one place where a session's status may change.
//!
//! ```text
//!               SolvedTurn / Finish
//!  in_progress ─────────────────────▶ solved
//!       │
//!       │ GiveUp
//!       ▼
//!   given_up   (sticky: every event leaves it unchanged)
//! ```
//!
//! There is no edge between `solved` and `given_up` in either direction.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
  #[default]
  InProgress,
  Solved,
  GivenUp,
}

/// Something that happened to a session and may move its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
  /// The host legitimately emitted a `SOLVED` reply.
  SolvedTurn,
  /// The player closed the game through the finish action.
  Finish,
  /// The player explicitly gave up.
  GiveUp,
}

impl SessionStatus {
  /// The single transition function for session status.
  pub fn apply(self, event: SessionEvent) -> Self {
    match (self, event) {
      (Self::InProgress, SessionEvent::SolvedTurn | SessionEvent::Finish) => {
        Self::Solved
      }
      (Self::InProgress, SessionEvent::GiveUp) => Self::GivenUp,
      (status, _) => status,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::InProgress => "in_progress",
      Self::Solved => "solved",
      Self::GivenUp => "given_up",
    }
  }
}

impl fmt::Display for SessionStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// One player's attempt at one puzzle. At most one exists per
/// `(user_id, puzzle_id)` pair; it is created lazily on first view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub session_id:   Uuid,
  pub user_id:      Uuid,
  pub puzzle_id:    Uuid,
  pub status:       SessionStatus,
  pub rating_fun:   Option<u8>,
  pub rating_logic: Option<u8>,
  pub created_at:   DateTime<Utc>,
}

// ─── Ratings ─────────────────────────────────────────────────────────────────

/// Validated ratings, each within `1..=`[`Ratings::MAX`] when present.
/// `None` leaves the stored value alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ratings {
  pub fun:   Option<u8>,
  pub logic: Option<u8>,
}

impl Ratings {
  pub const MAX: u8 = 5;

  pub fn is_empty(&self) -> bool { self.fun.is_none() && self.logic.is_none() }
}

/// Ratings as a client submits them with the finish action. Any integer is
/// accepted here so that out-of-range values reach [`Self::validate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct SubmittedRatings {
  pub fun:   Option<i64>,
  pub logic: Option<i64>,
}

impl SubmittedRatings {
  /// Drop zero values and reject anything outside `0..=`[`Ratings::MAX`].
  pub fn validate(self) -> Result<Ratings> {
    fn check(value: Option<i64>) -> Result<Option<u8>> {
      match value {
        None | Some(0) => Ok(None),
        Some(v) => u8::try_from(v)
          .ok()
          .filter(|v| *v <= Ratings::MAX)
          .map(Some)
          .ok_or(Error::InvalidRating(v)),
      }
    }
    Ok(Ratings { fun: check(self.fun)?, logic: check(self.logic)? })
  }
}
