//! The append-only chat log of a session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::protocol::SILENCE;

/// Who produced an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  User,
  Ai,
}

/// One entry of a session's log. Never updated or deleted once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
  pub interaction_id: Uuid,
  pub session_id:     Uuid,
  pub role:           Role,
  /// What was recorded: for an illegal AI reply this is the raw model
  /// output, kept for audit and never shown to the player.
  pub content:        String,
  pub is_legal:       bool,
  /// When the entry was created. Listing order is insertion order, not
  /// this field.
  pub recorded_at:    DateTime<Utc>,
}

impl Interaction {
  /// The text a player should see for this entry.
  pub fn displayed_content(&self) -> &str {
    if self.is_legal { &self.content } else { SILENCE }
  }
}

/// Input to the append operations of [`crate::store::GameStore`].
/// `recorded_at` is stamped when the input is built, so a player message
/// built before the model call keeps its send time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInteraction {
  pub role:        Role,
  pub content:     String,
  pub is_legal:    bool,
  pub recorded_at: DateTime<Utc>,
}

impl NewInteraction {
  /// Player messages are stored verbatim and are always legal.
  pub fn user(content: impl Into<String>) -> Self {
    Self {
      role:        Role::User,
      content:     content.into(),
      is_legal:    true,
      recorded_at: Utc::now(),
    }
  }

  pub fn ai(content: impl Into<String>, is_legal: bool) -> Self {
    Self { role: Role::Ai, content: content.into(), is_legal, recorded_at: Utc::now() }
  }
}
