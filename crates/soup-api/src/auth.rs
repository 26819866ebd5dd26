//! Handler for `POST /auth/login`.
//!
//! Players are anonymous: the client keeps the returned id and sends it back
//! on later visits.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use soup_core::{Host, model::ChatModel, store::GameStore};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub id:       Option<Uuid>,
  pub nickname: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
  pub id:       Uuid,
  pub nickname: Option<String>,
}

/// `POST /auth/login` — body: `{"id":"...","nickname":"..."}`, both optional.
pub async fn login<S, M>(
  State(host): State<Arc<Host<S, M>>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<LoginResponse>, ApiError>
where
  S: GameStore,
  M: ChatModel,
{
  let user = host.login(body.id, body.nickname).await?;
  Ok(Json(LoginResponse { id: user.user_id, nickname: user.nickname }))
}
