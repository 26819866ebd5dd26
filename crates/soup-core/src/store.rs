//! The `GameStore` trait.
//!
//! Implemented by storage backends (e.g. `soup-store-sqlite`). The host and
//! the HTTP layer depend on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  interaction::{Interaction, NewInteraction},
  puzzle::{NewPuzzle, Puzzle, User},
  session::{Ratings, Session, SessionStatus},
};

/// Abstraction over a game store backend.
///
/// Interactions are append-only. All methods return `Send` futures so the
/// trait can be used in multi-threaded async runtimes (e.g. tokio with
/// `axum`).
pub trait GameStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Insert `user`, or overwrite the nickname of an existing user with the
  /// same id.
  fn save_user(
    &self,
    user: User,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  // ── Puzzles ───────────────────────────────────────────────────────────

  /// Insert a puzzle, or update title, surface and truth of the puzzle with
  /// the same `source_file`. The flag is `true` when a new row was created.
  fn upsert_puzzle(
    &self,
    input: NewPuzzle,
  ) -> impl Future<Output = Result<(Puzzle, bool), Self::Error>> + Send + '_;

  /// `loadPuzzle`. Returns `None` if not found.
  fn get_puzzle(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Puzzle>, Self::Error>> + Send + '_;

  /// All puzzles, ordered by title.
  fn list_puzzles(
    &self,
  ) -> impl Future<Output = Result<Vec<Puzzle>, Self::Error>> + Send + '_;

  // ── Sessions ──────────────────────────────────────────────────────────

  /// `loadSession`. Returns `None` if not found.
  fn get_session(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + '_;

  /// Return the session for `(user_id, puzzle_id)`, creating an
  /// `in_progress` one if none exists yet.
  fn get_or_create_session(
    &self,
    user_id: Uuid,
    puzzle_id: Uuid,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;

  /// Every session belonging to `user_id`.
  fn list_user_sessions(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Session>, Self::Error>> + Send + '_;

  /// `updateSessionStatus`.
  fn update_session_status(
    &self,
    id: Uuid,
    status: SessionStatus,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Store the non-`None` ratings; `None` fields are left untouched.
  fn set_ratings(
    &self,
    id: Uuid,
    ratings: Ratings,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Interactions ──────────────────────────────────────────────────────

  /// `appendInteraction`. The `recorded_at` timestamp is set by the store.
  fn append_interaction(
    &self,
    session_id: Uuid,
    input: NewInteraction,
  ) -> impl Future<Output = Result<Interaction, Self::Error>> + Send + '_;

  /// `listInteractions`: the session's log in ascending `recorded_at` order,
  /// ties broken by insertion order.
  fn list_interactions(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Interaction>, Self::Error>> + Send + '_;

  /// Append `entries` in order and, if given, set the session status, all in
  /// one transaction.
  fn commit_turn(
    &self,
    session_id: Uuid,
    entries: Vec<NewInteraction>,
    status: Option<SessionStatus>,
  ) -> impl Future<Output = Result<Vec<Interaction>, Self::Error>> + Send + '_;
}
