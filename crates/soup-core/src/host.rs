//! [`Host`] — drives chat turns and session lifecycle actions.
//!
//! Every operation that writes to a session holds that session's lock for
//! its whole duration, including the model call, so turns on one session are
//! applied one at a time and in arrival order. Different sessions never
//! contend.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use serde::Serialize;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  catalogue::{CatalogueEntry, HistoryEntry, Progress, PuzzleCard, PuzzleView},
  interaction::{NewInteraction, Role},
  model::{ChatModel, ProviderError},
  prompt,
  protocol::{self, truth_block},
  puzzle::{Puzzle, User},
  session::{Session, SessionEvent, SessionStatus, SubmittedRatings},
  store::GameStore,
};

/// Shown as the host's reply when the provider rejects our credentials.
pub const CONFIG_ERROR_MESSAGE: &str =
  "配置错误：无法连接到主持人 (401 Unauthorized)。请检查服务器 API Key。";

/// Recorded as the host's last word when a player gives up.
pub fn give_up_notice(truth: &str) -> String {
  format!("你选择了放弃。\n\n{}", truth_block(truth))
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// Outcome of [`Host::process_turn`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnReply {
  /// What the player sees.
  pub content:     String,
  /// The session's status after the turn.
  pub game_status: SessionStatus,
}

/// Outcome of [`Host::give_up`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GiveUpReply {
  pub truth:       String,
  pub game_status: SessionStatus,
}

// ─── Session locks ───────────────────────────────────────────────────────────

/// One async mutex per session id. Entries nobody holds are pruned whenever a
/// new lock is handed out.
#[derive(Default)]
struct SessionLocks {
  inner: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl SessionLocks {
  async fn acquire(&self, session_id: Uuid) -> OwnedMutexGuard<()> {
    let lock = {
      let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
      map.retain(|id, m| *id == session_id || Arc::strong_count(m) > 1);
      map.entry(session_id).or_default().clone()
    };
    lock.lock_owned().await
  }
}

// ─── Host ────────────────────────────────────────────────────────────────────

/// The game host: owns the store and model handles plus the per-session
/// locks. Share it behind an `Arc`.
pub struct Host<S, M> {
  store: Arc<S>,
  model: Arc<M>,
  locks: SessionLocks,
}

impl<S, M> Host<S, M>
where
  S: GameStore,
  M: ChatModel,
{
  pub fn new(store: Arc<S>, model: Arc<M>) -> Self {
    Self { store, model, locks: SessionLocks::default() }
  }

  pub fn store(&self) -> &S { &self.store }

  // ── Lookups ─────────────────────────────────────────────────────────────

  async fn load_session(&self, id: Uuid) -> Result<Session> {
    self
      .store
      .get_session(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::SessionNotFound(id))
  }

  async fn load_puzzle(&self, id: Uuid) -> Result<Puzzle> {
    self
      .store
      .get_puzzle(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::PuzzleNotFound(id))
  }

  // ── Players ─────────────────────────────────────────────────────────────

  /// Log a player in. Without an id a fresh player is created; an unknown id
  /// is re-created as given; a known id picks up a changed nickname.
  pub async fn login(
    &self,
    id: Option<Uuid>,
    nickname: Option<String>,
  ) -> Result<User> {
    let nickname = nickname.filter(|n| !n.trim().is_empty());
    let existing = match id {
      Some(id) => self.store.get_user(id).await.map_err(Error::store)?,
      None => None,
    };

    let user = match existing {
      Some(user) if nickname.is_none() || user.nickname == nickname => {
        return Ok(user);
      }
      Some(user) => User { nickname, ..user },
      None => User {
        user_id: id.unwrap_or_else(Uuid::new_v4),
        nickname,
        created_at: chrono::Utc::now(),
      },
    };
    self.store.save_user(user).await.map_err(Error::store)
  }

  // ── Catalogue ───────────────────────────────────────────────────────────

  /// Every puzzle with this player's progress on it.
  pub async fn catalogue(&self, user_id: Uuid) -> Result<Vec<CatalogueEntry>> {
    let puzzles = self.store.list_puzzles().await.map_err(Error::store)?;
    let progress: HashMap<Uuid, SessionStatus> = self
      .store
      .list_user_sessions(user_id)
      .await
      .map_err(Error::store)?
      .into_iter()
      .map(|s| (s.puzzle_id, s.status))
      .collect();

    Ok(
      puzzles
        .iter()
        .map(|p| CatalogueEntry {
          id:      p.puzzle_id,
          title:   p.title.clone(),
          status:  progress
            .get(&p.puzzle_id)
            .copied()
            .map_or(Progress::New, Progress::from),
          preview: p.preview(),
        })
        .collect(),
    )
  }

  /// Open a puzzle for a player, creating their session on first view.
  pub async fn open_puzzle(&self, puzzle_id: Uuid, user_id: Uuid) -> Result<PuzzleView> {
    let puzzle = self.load_puzzle(puzzle_id).await?;
    if self.store.get_user(user_id).await.map_err(Error::store)?.is_none() {
      return Err(Error::UserNotFound(user_id));
    }

    let session = self
      .store
      .get_or_create_session(user_id, puzzle_id)
      .await
      .map_err(Error::store)?;
    let history = self
      .store
      .list_interactions(session.session_id)
      .await
      .map_err(Error::store)?;

    Ok(PuzzleView {
      puzzle: PuzzleCard::from(&puzzle),
      session,
      history: history.iter().map(HistoryEntry::from).collect(),
    })
  }

  // ── Turns ───────────────────────────────────────────────────────────────

  /// Run one chat turn: ask the model, judge its reply, move the session
  /// status if the reply solved the puzzle, and record both messages.
  ///
  /// The player message and the host reply are committed together once the
  /// model has answered; a failed model call leaves the log untouched so the
  /// turn can simply be retried.
  pub async fn process_turn(&self, session_id: Uuid, message: &str) -> Result<TurnReply> {
    if message.trim().is_empty() {
      return Err(Error::EmptyMessage);
    }

    let _turn = self.locks.acquire(session_id).await;
    let question = NewInteraction::user(message);
    let session = self.load_session(session_id).await?;
    let puzzle = self.load_puzzle(session.puzzle_id).await?;
    let history = self
      .store
      .list_interactions(session_id)
      .await
      .map_err(Error::store)?;

    let messages = prompt::build_messages(
      &puzzle,
      history
        .iter()
        .map(|i| (i.role, i.content.as_str()))
        .chain(std::iter::once((Role::User, message))),
    );

    let raw = match self.model.generate(&messages).await {
      Ok(raw) => raw,
      Err(ProviderError::Unauthorized(detail)) => {
        warn!(%session_id, %detail, "model provider rejected credentials");
        return Ok(TurnReply {
          content:     CONFIG_ERROR_MESSAGE.to_owned(),
          game_status: session.status,
        });
      }
      Err(e) => {
        warn!(%session_id, error = %e, "model provider call failed");
        return Err(Error::Provider(e));
      }
    };

    let reply = protocol::parse_reply(&raw);
    let verdict = protocol::judge(&reply, &puzzle.truth);
    let status = if verdict.solved {
      session.status.apply(SessionEvent::SolvedTurn)
    } else {
      session.status
    };

    if verdict.is_legal {
      debug!(%session_id, kind = %reply.kind, %status, "host replied");
    } else {
      warn!(%session_id, kind = %reply.kind, "host reply rejected by protocol");
    }

    let recorded = if verdict.is_legal {
      verdict.content.clone()
    } else {
      raw.trim().to_owned()
    };

    self
      .store
      .commit_turn(
        session_id,
        vec![question, NewInteraction::ai(recorded, verdict.is_legal)],
        (status != session.status).then_some(status),
      )
      .await
      .map_err(Error::store)?;

    Ok(TurnReply { content: verdict.content, game_status: status })
  }

  // ── Lifecycle actions ───────────────────────────────────────────────────

  /// Give up on a puzzle. The first give-up on an unfinished session records
  /// a host message disclosing the truth; later calls change nothing.
  pub async fn give_up(&self, session_id: Uuid) -> Result<GiveUpReply> {
    let _turn = self.locks.acquire(session_id).await;
    let session = self.load_session(session_id).await?;
    let puzzle = self.load_puzzle(session.puzzle_id).await?;

    let status = session.status.apply(SessionEvent::GiveUp);
    if status != session.status {
      self
        .store
        .commit_turn(
          session_id,
          vec![NewInteraction::ai(give_up_notice(&puzzle.truth), true)],
          Some(status),
        )
        .await
        .map_err(Error::store)?;
      info!(%session_id, "player gave up");
    }

    Ok(GiveUpReply { truth: puzzle.truth, game_status: status })
  }

  /// Close a game and attach ratings. An unfinished session counts as solved.
  pub async fn finish(
    &self,
    session_id: Uuid,
    ratings: SubmittedRatings,
  ) -> Result<SessionStatus> {
    let ratings = ratings.validate()?;

    let _turn = self.locks.acquire(session_id).await;
    let session = self.load_session(session_id).await?;

    let status = session.status.apply(SessionEvent::Finish);
    if status != session.status {
      self
        .store
        .update_session_status(session_id, status)
        .await
        .map_err(Error::store)?;
    }
    if !ratings.is_empty() {
      self
        .store
        .set_ratings(session_id, ratings)
        .await
        .map_err(Error::store)?;
    }
    Ok(status)
  }
}

#[cfg(test)]
impl SessionLocks {
  fn tracked(&self) -> std::collections::HashSet<Uuid> {
    self
      .inner
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .keys()
      .copied()
      .collect()
  }
}
