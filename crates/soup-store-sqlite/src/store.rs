//! [`SqliteStore`] — the SQLite implementation of [`GameStore`].

use std::path::Path;

use chrono::{DateTime, SubsecRound as _, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use soup_core::{
  interaction::{Interaction, NewInteraction},
  puzzle::{NewPuzzle, Puzzle, User},
  session::{Ratings, Session, SessionStatus},
  store::GameStore,
};

use crate::{
  encode::{
    RawInteraction, RawPuzzle, RawSession, RawUser, encode_dt, encode_role,
    encode_status, encode_uuid,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A game store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// An interaction already encoded for insertion.
struct InteractionRow {
  interaction_id: String,
  session_id:     String,
  role:           &'static str,
  content:        String,
  is_legal:       bool,
  recorded_at:    String,
}

impl InteractionRow {
  fn encode(i: &Interaction) -> Self {
    Self {
      interaction_id: encode_uuid(i.interaction_id),
      session_id:     encode_uuid(i.session_id),
      role:           encode_role(i.role),
      content:        i.content.clone(),
      is_legal:       i.is_legal,
      recorded_at:    encode_dt(i.recorded_at),
    }
  }

  fn insert(&self, conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute(
      "INSERT INTO interactions (
         interaction_id, session_id, role, content, is_legal, recorded_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      rusqlite::params![
        self.interaction_id,
        self.session_id,
        self.role,
        self.content,
        self.is_legal,
        self.recorded_at,
      ],
    )?;
    Ok(())
  }
}

/// The current time at the precision timestamps are stored with.
fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

fn build_interactions(session_id: Uuid, entries: Vec<NewInteraction>) -> Vec<Interaction> {
  entries
    .into_iter()
    .map(|e| Interaction {
      interaction_id: Uuid::new_v4(),
      session_id,
      role: e.role,
      content: e.content,
      is_legal: e.is_legal,
      recorded_at: e.recorded_at.trunc_subsecs(6),
    })
    .collect()
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn user_by_id(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {} FROM users WHERE user_id = ?1", RawUser::COLUMNS),
            rusqlite::params![id_str],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;
    raw.map(RawUser::into_user).transpose()
  }
}

// ─── GameStore impl ──────────────────────────────────────────────────────────

impl GameStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> { self.user_by_id(id).await }

  async fn save_user(&self, user: User) -> Result<User> {
    let id_str   = encode_uuid(user.user_id);
    let at_str   = encode_dt(user.created_at);
    let nickname = user.nickname.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, nickname, created_at) VALUES (?1, ?2, ?3)
           ON CONFLICT (user_id) DO UPDATE SET nickname = excluded.nickname",
          rusqlite::params![id_str, nickname, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(self.user_by_id(user.user_id).await?.unwrap_or(user))
  }

  // ── Puzzles ───────────────────────────────────────────────────────────────

  async fn upsert_puzzle(&self, input: NewPuzzle) -> Result<(Puzzle, bool)> {
    let new_id_str = encode_uuid(Uuid::new_v4());
    let at_str     = encode_dt(now());

    let (raw, created): (RawPuzzle, bool) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let existing: Option<String> = tx
          .query_row(
            "SELECT puzzle_id FROM puzzles WHERE source_file = ?1",
            rusqlite::params![input.source_file],
            |r| r.get(0),
          )
          .optional()?;

        let (id_str, created) = match existing {
          Some(id_str) => {
            tx.execute(
              "UPDATE puzzles SET title = ?2, surface = ?3, truth = ?4
               WHERE puzzle_id = ?1",
              rusqlite::params![id_str, input.title, input.surface, input.truth],
            )?;
            (id_str, false)
          }
          None => {
            tx.execute(
              "INSERT INTO puzzles (
                 puzzle_id, title, surface, truth, source_file, created_at
               ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
              rusqlite::params![
                new_id_str,
                input.title,
                input.surface,
                input.truth,
                input.source_file,
                at_str,
              ],
            )?;
            (new_id_str, true)
          }
        };

        let raw = tx.query_row(
          &format!("SELECT {} FROM puzzles WHERE puzzle_id = ?1", RawPuzzle::COLUMNS),
          rusqlite::params![id_str],
          RawPuzzle::from_row,
        )?;
        tx.commit()?;
        Ok((raw, created))
      })
      .await?;

    Ok((raw.into_puzzle()?, created))
  }

  async fn get_puzzle(&self, id: Uuid) -> Result<Option<Puzzle>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawPuzzle> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {} FROM puzzles WHERE puzzle_id = ?1", RawPuzzle::COLUMNS),
            rusqlite::params![id_str],
            RawPuzzle::from_row,
          )
          .optional()?)
      })
      .await?;
    raw.map(RawPuzzle::into_puzzle).transpose()
  }

  async fn list_puzzles(&self) -> Result<Vec<Puzzle>> {
    let raws: Vec<RawPuzzle> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM puzzles ORDER BY title, created_at",
          RawPuzzle::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawPuzzle::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawPuzzle::into_puzzle).collect()
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn get_session(&self, id: Uuid) -> Result<Option<Session>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {} FROM sessions WHERE session_id = ?1", RawSession::COLUMNS),
            rusqlite::params![id_str],
            RawSession::from_row,
          )
          .optional()?)
      })
      .await?;
    raw.map(RawSession::into_session).transpose()
  }

  async fn get_or_create_session(&self, user_id: Uuid, puzzle_id: Uuid) -> Result<Session> {
    let new_id_str    = encode_uuid(Uuid::new_v4());
    let user_id_str   = encode_uuid(user_id);
    let puzzle_id_str = encode_uuid(puzzle_id);
    let at_str        = encode_dt(now());
    let status_str    = encode_status(SessionStatus::InProgress);

    let raw: RawSession = self
      .conn
      .call(move |conn| {
        // The UNIQUE (user_id, puzzle_id) constraint turns a racing second
        // insert into a no-op.
        conn.execute(
          "INSERT OR IGNORE INTO sessions (
             session_id, user_id, puzzle_id, status, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![new_id_str, user_id_str, puzzle_id_str, status_str, at_str],
        )?;
        Ok(conn.query_row(
          &format!(
            "SELECT {} FROM sessions WHERE user_id = ?1 AND puzzle_id = ?2",
            RawSession::COLUMNS
          ),
          rusqlite::params![user_id_str, puzzle_id_str],
          RawSession::from_row,
        )?)
      })
      .await?;
    raw.into_session()
  }

  async fn list_user_sessions(&self, user_id: Uuid) -> Result<Vec<Session>> {
    let user_id_str = encode_uuid(user_id);
    let raws: Vec<RawSession> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM sessions WHERE user_id = ?1",
          RawSession::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_id_str], RawSession::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawSession::into_session).collect()
  }

  async fn update_session_status(&self, id: Uuid, status: SessionStatus) -> Result<()> {
    let id_str     = encode_uuid(id);
    let status_str = encode_status(status);

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE sessions SET status = ?2 WHERE session_id = ?1",
          rusqlite::params![id_str, status_str],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(Error::SessionNotFound(id));
    }
    Ok(())
  }

  async fn set_ratings(&self, id: Uuid, ratings: Ratings) -> Result<()> {
    let id_str = encode_uuid(id);

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE sessions
           SET rating_fun   = COALESCE(?2, rating_fun),
               rating_logic = COALESCE(?3, rating_logic)
           WHERE session_id = ?1",
          rusqlite::params![id_str, ratings.fun, ratings.logic],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(Error::SessionNotFound(id));
    }
    Ok(())
  }

  // ── Interactions ──────────────────────────────────────────────────────────

  async fn append_interaction(
    &self,
    session_id: Uuid,
    input:      NewInteraction,
  ) -> Result<Interaction> {
    let mut written = self.commit_turn(session_id, vec![input], None).await?;
    written.pop().ok_or(Error::SessionNotFound(session_id))
  }

  async fn list_interactions(&self, session_id: Uuid) -> Result<Vec<Interaction>> {
    let session_id_str = encode_uuid(session_id);
    let raws: Vec<RawInteraction> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM interactions
           WHERE session_id = ?1
           ORDER BY rowid",
          RawInteraction::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![session_id_str], RawInteraction::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawInteraction::into_interaction).collect()
  }

  async fn commit_turn(
    &self,
    session_id: Uuid,
    entries:    Vec<NewInteraction>,
    status:     Option<SessionStatus>,
  ) -> Result<Vec<Interaction>> {
    let interactions   = build_interactions(session_id, entries);
    let rows: Vec<_>   = interactions.iter().map(InteractionRow::encode).collect();
    let session_id_str = encode_uuid(session_id);
    let status_str     = status.map(encode_status);

    let found = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let exists = tx
          .query_row(
            "SELECT 1 FROM sessions WHERE session_id = ?1",
            rusqlite::params![session_id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(false);
        }

        for row in &rows {
          row.insert(&tx)?;
        }
        if let Some(status_str) = status_str {
          tx.execute(
            "UPDATE sessions SET status = ?2 WHERE session_id = ?1",
            rusqlite::params![session_id_str, status_str],
          )?;
        }
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !found {
      return Err(Error::SessionNotFound(session_id));
    }
    Ok(interactions)
  }
}
