//! In-memory doubles for the store and model traits.

use std::{
  collections::{HashMap, VecDeque},
  sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::{
  interaction::{Interaction, NewInteraction},
  model::{ChatModel, ProviderError},
  prompt::ChatMessage,
  puzzle::{NewPuzzle, Puzzle, User},
  session::{Ratings, Session, SessionStatus},
  store::GameStore,
};

// ─── Store ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
#[error("memory store: {0}")]
pub struct MemoryError(String);

#[derive(Default)]
struct Tables {
  users:        HashMap<Uuid, User>,
  puzzles:      Vec<Puzzle>,
  sessions:     HashMap<Uuid, Session>,
  interactions: Vec<Interaction>,
}

#[derive(Default)]
pub struct MemoryStore {
  tables: Mutex<Tables>,
}

impl MemoryStore {
  fn with<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
    let mut tables = self.tables.lock().unwrap();
    f(&mut tables)
  }

  fn append(tables: &mut Tables, session_id: Uuid, input: NewInteraction) -> Interaction {
    let interaction = Interaction {
      interaction_id: Uuid::new_v4(),
      session_id,
      role: input.role,
      content: input.content,
      is_legal: input.is_legal,
      recorded_at: input.recorded_at,
    };
    tables.interactions.push(interaction.clone());
    interaction
  }
}

impl GameStore for MemoryStore {
  type Error = MemoryError;

  async fn get_user(&self, id: Uuid) -> Result<Option<User>, MemoryError> {
    Ok(self.with(|t| t.users.get(&id).cloned()))
  }

  async fn save_user(&self, user: User) -> Result<User, MemoryError> {
    self.with(|t| {
      let stored = t.users.entry(user.user_id).or_insert_with(|| user.clone());
      stored.nickname = user.nickname;
      Ok(stored.clone())
    })
  }

  async fn upsert_puzzle(&self, input: NewPuzzle) -> Result<(Puzzle, bool), MemoryError> {
    self.with(|t| {
      if let Some(p) = t.puzzles.iter_mut().find(|p| p.source_file == input.source_file) {
        p.title = input.title;
        p.surface = input.surface;
        p.truth = input.truth;
        return Ok((p.clone(), false));
      }
      let puzzle = Puzzle {
        puzzle_id:   Uuid::new_v4(),
        title:       input.title,
        surface:     input.surface,
        truth:       input.truth,
        source_file: input.source_file,
        created_at:  Utc::now(),
      };
      t.puzzles.push(puzzle.clone());
      Ok((puzzle, true))
    })
  }

  async fn get_puzzle(&self, id: Uuid) -> Result<Option<Puzzle>, MemoryError> {
    Ok(self.with(|t| t.puzzles.iter().find(|p| p.puzzle_id == id).cloned()))
  }

  async fn list_puzzles(&self) -> Result<Vec<Puzzle>, MemoryError> {
    Ok(self.with(|t| t.puzzles.clone()))
  }

  async fn get_session(&self, id: Uuid) -> Result<Option<Session>, MemoryError> {
    Ok(self.with(|t| t.sessions.get(&id).cloned()))
  }

  async fn get_or_create_session(
    &self,
    user_id: Uuid,
    puzzle_id: Uuid,
  ) -> Result<Session, MemoryError> {
    Ok(self.with(|t| {
      if let Some(s) = t
        .sessions
        .values()
        .find(|s| s.user_id == user_id && s.puzzle_id == puzzle_id)
      {
        return s.clone();
      }
      let session = Session {
        session_id: Uuid::new_v4(),
        user_id,
        puzzle_id,
        status: SessionStatus::InProgress,
        rating_fun: None,
        rating_logic: None,
        created_at: Utc::now(),
      };
      t.sessions.insert(session.session_id, session.clone());
      session
    }))
  }

  async fn list_user_sessions(&self, user_id: Uuid) -> Result<Vec<Session>, MemoryError> {
    Ok(self.with(|t| {
      t.sessions.values().filter(|s| s.user_id == user_id).cloned().collect()
    }))
  }

  async fn update_session_status(
    &self,
    id: Uuid,
    status: SessionStatus,
  ) -> Result<(), MemoryError> {
    self.with(|t| match t.sessions.get_mut(&id) {
      Some(s) => {
        s.status = status;
        Ok(())
      }
      None => Err(MemoryError(format!("no session {id}"))),
    })
  }

  async fn set_ratings(&self, id: Uuid, ratings: Ratings) -> Result<(), MemoryError> {
    self.with(|t| match t.sessions.get_mut(&id) {
      Some(s) => {
        s.rating_fun = ratings.fun.or(s.rating_fun);
        s.rating_logic = ratings.logic.or(s.rating_logic);
        Ok(())
      }
      None => Err(MemoryError(format!("no session {id}"))),
    })
  }

  async fn append_interaction(
    &self,
    session_id: Uuid,
    input: NewInteraction,
  ) -> Result<Interaction, MemoryError> {
    Ok(self.with(|t| Self::append(t, session_id, input)))
  }

  async fn list_interactions(&self, session_id: Uuid) -> Result<Vec<Interaction>, MemoryError> {
    Ok(self.with(|t| {
      t.interactions
        .iter()
        .filter(|i| i.session_id == session_id)
        .cloned()
        .collect()
    }))
  }

  async fn commit_turn(
    &self,
    session_id: Uuid,
    entries: Vec<NewInteraction>,
    status: Option<SessionStatus>,
  ) -> Result<Vec<Interaction>, MemoryError> {
    self.with(|t| {
      let session = t
        .sessions
        .get_mut(&session_id)
        .ok_or_else(|| MemoryError(format!("no session {session_id}")))?;
      if let Some(status) = status {
        session.status = status;
      }
      Ok(
        entries
          .into_iter()
          .map(|e| Self::append(t, session_id, e))
          .collect(),
      )
    })
  }
}

// ─── Model ───────────────────────────────────────────────────────────────────

/// Replies with queued results in order and records every request.
#[derive(Default)]
pub struct ScriptedModel {
  replies:   Mutex<VecDeque<Result<String, ProviderError>>>,
  requests:  Mutex<Vec<Vec<ChatMessage>>>,
  delay:     Option<Duration>,
  in_flight: AtomicUsize,
  peak:      AtomicUsize,
}

impl ScriptedModel {
  pub fn new<I>(replies: I) -> Self
  where
    I: IntoIterator<Item = Result<String, ProviderError>>,
  {
    Self { replies: Mutex::new(replies.into_iter().collect()), ..Self::default() }
  }

  pub fn replying<I, T>(replies: I) -> Self
  where
    I: IntoIterator<Item = T>,
    T: Into<String>,
  {
    Self::new(replies.into_iter().map(|r| Ok(r.into())))
  }

  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = Some(delay);
    self
  }

  pub fn requests(&self) -> Vec<Vec<ChatMessage>> { self.requests.lock().unwrap().clone() }

  /// Highest number of overlapping `generate` calls seen.
  pub fn peak_concurrency(&self) -> usize { self.peak.load(Ordering::SeqCst) }
}

impl ChatModel for ScriptedModel {
  async fn generate(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
    let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    self.peak.fetch_max(now, Ordering::SeqCst);
    self.requests.lock().unwrap().push(messages.to_vec());

    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }

    let reply = self
      .replies
      .lock()
      .unwrap()
      .pop_front()
      .unwrap_or_else(|| Err(ProviderError::Other("script exhausted".into())));
    self.in_flight.fetch_sub(1, Ordering::SeqCst);
    reply
  }
}
