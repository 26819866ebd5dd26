//! Core types and game logic for the turtle-soup host.
//!
//! No HTTP, database or model-provider code lives here. Storage and the
//! language model are reached through the [`store::GameStore`] and
//! [`model::ChatModel`] traits; everything that decides what the host is
//! allowed to say lives here.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod catalogue;
pub mod error;
pub mod host;
pub mod ingest;
pub mod interaction;
pub mod model;
pub mod prompt;
pub mod protocol;
pub mod puzzle;
pub mod session;
pub mod store;

pub use error::{Error, Result};
pub use host::Host;

#[cfg(test)]
mod testing;
