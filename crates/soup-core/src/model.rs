//! The `ChatModel` trait — the host's only route to a language model.

use std::future::Future;

use thiserror::Error;

use crate::prompt::ChatMessage;

/// Why a model call failed. Authorization failures are told apart because the
/// host answers them with a configuration notice instead of an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("{0}")]
  Other(String),
}

/// Abstraction over a chat-completion provider.
///
/// Implemented by `soup-llm` for OpenAI-compatible endpoints; tests use
/// scripted doubles.
pub trait ChatModel: Send + Sync {
  /// Generate the next assistant message for `messages`.
  fn generate<'a>(
    &'a self,
    messages: &'a [ChatMessage],
  ) -> impl Future<Output = Result<String, ProviderError>> + Send + 'a;
}
