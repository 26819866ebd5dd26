//! Handlers for `/game` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/game/chat` | Body: `{"session_id","message"}`; one host turn |
//! | `POST` | `/game/finish` | Body: `{"session_id","rating_fun"?,"rating_logic"?}` |
//! | `POST` | `/game/giveup` | Body: `{"session_id"}`; returns the truth |

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use soup_core::{
  Host,
  interaction::Role,
  model::ChatModel,
  session::{SessionStatus, SubmittedRatings},
  store::GameStore,
};
use uuid::Uuid;

use crate::error::ApiError;

// ─── Chat ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatBody {
  pub session_id: Uuid,
  pub message:    String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
  pub role:        Role,
  pub content:     String,
  pub game_status: SessionStatus,
}

/// `POST /game/chat`
pub async fn chat<S, M>(
  State(host): State<Arc<Host<S, M>>>,
  Json(body): Json<ChatBody>,
) -> Result<Json<ChatResponse>, ApiError>
where
  S: GameStore,
  M: ChatModel,
{
  let reply = host.process_turn(body.session_id, &body.message).await?;
  Ok(Json(ChatResponse {
    role:        Role::Ai,
    content:     reply.content,
    game_status: reply.game_status,
  }))
}

// ─── Finish ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FinishBody {
  pub session_id:   Uuid,
  pub rating_fun:   Option<i64>,
  pub rating_logic: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct FinishResponse {
  pub status:      &'static str,
  pub game_status: SessionStatus,
}

/// `POST /game/finish` — ratings of 0 or absent leave stored values alone;
/// any other value outside 1..=5 is a 400.
pub async fn finish<S, M>(
  State(host): State<Arc<Host<S, M>>>,
  Json(body): Json<FinishBody>,
) -> Result<Json<FinishResponse>, ApiError>
where
  S: GameStore,
  M: ChatModel,
{
  let ratings = SubmittedRatings { fun: body.rating_fun, logic: body.rating_logic };
  let game_status = host.finish(body.session_id, ratings).await?;
  Ok(Json(FinishResponse { status: "success", game_status }))
}

// ─── Give up ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GiveUpBody {
  pub session_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct GiveUpResponse {
  pub truth: String,
}

/// `POST /game/giveup`
pub async fn give_up<S, M>(
  State(host): State<Arc<Host<S, M>>>,
  Json(body): Json<GiveUpBody>,
) -> Result<Json<GiveUpResponse>, ApiError>
where
  S: GameStore,
  M: ChatModel,
{
  let reply = host.give_up(body.session_id).await?;
  Ok(Json(GiveUpResponse { truth: reply.truth }))
}
