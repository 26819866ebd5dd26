//! Puzzles and the players who solve them.
//!
//! A puzzle is written once at ingestion and only ever read during play. The
//! truth travels with the puzzle inside the server but is never serialised
//! into a player-facing view; see [`crate::catalogue`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Puzzle ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
  pub puzzle_id:   Uuid,
  pub title:       String,
  /// The scenario shown to the player (汤面).
  pub surface:     String,
  /// The hidden explanation (汤底).
  pub truth:       String,
  /// File name the puzzle was ingested from; unique across the catalogue.
  pub source_file: String,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::GameStore::upsert_puzzle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPuzzle {
  pub title:       String,
  pub surface:     String,
  pub truth:       String,
  pub source_file: String,
}

/// Number of characters kept when the surface has no sentence terminator.
const PREVIEW_CHARS: usize = 30;

impl Puzzle {
  /// A short teaser for catalogue listings: the surface up to and including
  /// its first sentence terminator, or the first few characters followed by
  /// an ellipsis.
  pub fn preview(&self) -> String {
    match self
      .surface
      .char_indices()
      .find(|(_, c)| matches!(c, '。' | '！' | '？' | '.' | '!' | '?'))
    {
      Some((idx, c)) => self.surface[..idx + c.len_utf8()].to_owned(),
      None => {
        let head: String = self.surface.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
      }
    }
  }
}

// ─── User ────────────────────────────────────────────────────────────────────

/// An anonymous player identified by a client-held UUID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:    Uuid,
  pub nickname:   Option<String>,
  pub created_at: DateTime<Utc>,
}
