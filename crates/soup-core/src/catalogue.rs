//! Player-facing read models. None of these carry a puzzle's truth.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  interaction::{Interaction, Role},
  puzzle::Puzzle,
  session::{Session, SessionStatus},
};

/// A player's progress on a puzzle, as shown in the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Progress {
  /// No session exists yet.
  New,
  InProgress,
  Solved,
  GivenUp,
}

impl From<SessionStatus> for Progress {
  fn from(status: SessionStatus) -> Self {
    match status {
      SessionStatus::InProgress => Self::InProgress,
      SessionStatus::Solved => Self::Solved,
      SessionStatus::GivenUp => Self::GivenUp,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogueEntry {
  pub id:      Uuid,
  pub title:   String,
  pub status:  Progress,
  pub preview: String,
}

/// The puzzle as the player may see it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PuzzleCard {
  pub id:      Uuid,
  pub title:   String,
  pub content: String,
}

impl From<&Puzzle> for PuzzleCard {
  fn from(p: &Puzzle) -> Self {
    Self { id: p.puzzle_id, title: p.title.clone(), content: p.surface.clone() }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
  pub role:    Role,
  pub content: String,
}

impl From<&Interaction> for HistoryEntry {
  fn from(i: &Interaction) -> Self {
    Self { role: i.role, content: i.displayed_content().to_owned() }
  }
}

/// Everything the game page needs when a player opens a puzzle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PuzzleView {
  pub puzzle:  PuzzleCard,
  pub session: Session,
  pub history: Vec<HistoryEntry>,
}
