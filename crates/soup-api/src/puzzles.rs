//! Handlers for `/puzzles` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/puzzles` | `?user_id` required; per-player progress and preview |
//! | `GET`  | `/puzzles/:id` | `?user_id` required; creates the session on first view |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;
use soup_core::{
  Host,
  catalogue::{CatalogueEntry, PuzzleView},
  model::ChatModel,
  store::GameStore,
};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct PlayerParams {
  pub user_id: Uuid,
}

/// `GET /puzzles?user_id=<id>`
pub async fn list<S, M>(
  State(host): State<Arc<Host<S, M>>>,
  Query(params): Query<PlayerParams>,
) -> Result<Json<Vec<CatalogueEntry>>, ApiError>
where
  S: GameStore,
  M: ChatModel,
{
  Ok(Json(host.catalogue(params.user_id).await?))
}

/// `GET /puzzles/:id?user_id=<id>` — the truth is never part of the view.
pub async fn get_one<S, M>(
  State(host): State<Arc<Host<S, M>>>,
  Path(id): Path<Uuid>,
  Query(params): Query<PlayerParams>,
) -> Result<Json<PuzzleView>, ApiError>
where
  S: GameStore,
  M: ChatModel,
{
  Ok(Json(host.open_puzzle(id, params.user_id).await?))
}
