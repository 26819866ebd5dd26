//! Error types for `soup-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::model::ProviderError;

#[derive(Debug, Error)]
pub enum Error {
  #[error("puzzle not found: {0}")]
  PuzzleNotFound(Uuid),

  #[error("session not found: {0}")]
  SessionNotFound(Uuid),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("rating must be between 1 and 5, got {0}")]
  InvalidRating(i64),

  #[error("message is empty")]
  EmptyMessage,

  /// A provider failure that is not an authorization failure. Authorization
  /// failures never surface here; the host turns them into a chat message.
  #[error("model provider error: {0}")]
  Provider(#[from] ProviderError),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error into [`Error::Store`].
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::PuzzleNotFound(_) | Self::SessionNotFound(_) | Self::UserNotFound(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
