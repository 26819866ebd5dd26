//! JSON REST API for the turtle-soup host.
//!
//! Exposes an axum [`Router`] backed by a [`soup_core::Host`]. Transport and
//! tracing layers are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", soup_api::api_router(host.clone()))
//! ```

pub mod auth;
pub mod error;
pub mod game;
pub mod puzzles;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use soup_core::{Host, model::ChatModel, store::GameStore};

pub use error::ApiError;

/// Build a fully-materialised API router for `host`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, M>(host: Arc<Host<S, M>>) -> Router<()>
where
  S: GameStore + 'static,
  M: ChatModel + 'static,
{
  Router::new()
    // Players
    .route("/auth/login", post(auth::login::<S, M>))
    // Puzzles
    .route("/puzzles", get(puzzles::list::<S, M>))
    .route("/puzzles/{id}", get(puzzles::get_one::<S, M>))
    // Game
    .route("/game/chat", post(game::chat::<S, M>))
    .route("/game/finish", post(game::finish::<S, M>))
    .route("/game/giveup", post(game::give_up::<S, M>))
    .with_state(host)
}

#[cfg(test)]
mod tests {
  use std::{collections::VecDeque, sync::Mutex};

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use serde_json::{Value, json};
  use soup_core::{
    host::CONFIG_ERROR_MESSAGE,
    model::ProviderError,
    prompt::ChatMessage,
    protocol::SILENCE,
    puzzle::NewPuzzle,
  };
  use soup_store_sqlite::SqliteStore;
  use tower::ServiceExt;
  use uuid::Uuid;

  use super::*;

  /// Answers with queued replies; an empty queue is a provider failure.
  #[derive(Default)]
  struct Canned(Mutex<VecDeque<Result<String, ProviderError>>>);

  impl Canned {
    fn replying(replies: &[&str]) -> Self {
      Self(Mutex::new(replies.iter().map(|r| Ok(r.to_string())).collect()))
    }

    fn failing(err: ProviderError) -> Self { Self(Mutex::new(VecDeque::from([Err(err)]))) }
  }

  impl ChatModel for Canned {
    async fn generate(&self, _: &[ChatMessage]) -> Result<String, ProviderError> {
      self
        .0
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(ProviderError::Other("no reply queued".into())))
    }
  }

  struct Fixture {
    router:    Router,
    puzzle_id: Uuid,
  }

  async fn fixture(model: Canned) -> Fixture {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let (puzzle, _) = store
      .upsert_puzzle(NewPuzzle {
        title:       "海龟汤".into(),
        surface:     "一个人喝了一口海龟汤，然后自杀了。他为什么这么做？".into(),
        truth:       "他终于知道当年喝的不是海龟汤。".into(),
        source_file: "turtle.md".into(),
      })
      .await
      .unwrap();
    let host = Arc::new(Host::new(Arc::new(store), Arc::new(model)));
    Fixture { router: api_router(host), puzzle_id: puzzle.puzzle_id }
  }

  async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    let resp = router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
  }

  /// Log in a fresh player and open the fixture puzzle; returns the player
  /// id and session id.
  async fn start(f: &Fixture) -> (String, String) {
    let (status, user) = send(&f.router, "POST", "/auth/login", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    let user_id = user["id"].as_str().unwrap().to_owned();

    let uri = format!("/puzzles/{}?user_id={user_id}", f.puzzle_id);
    let (status, view) = send(&f.router, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let session_id = view["session"]["session_id"].as_str().unwrap().to_owned();
    (user_id, session_id)
  }

  // ── Players ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn login_keeps_supplied_id_and_nickname() {
    let f = fixture(Canned::default()).await;
    let id = Uuid::new_v4();
    let (status, body) = send(
      &f.router,
      "POST",
      "/auth/login",
      Some(json!({ "id": id, "nickname": "阿汤" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], json!(id));
    assert_eq!(body["nickname"], "阿汤");
  }

  // ── Puzzles ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn catalogue_reports_progress_and_preview() {
    let f = fixture(Canned::default()).await;
    let (user_id, _) = start(&f).await;

    let (status, body) = send(&f.router, "GET", &format!("/puzzles?user_id={user_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["status"], "in_progress");
    assert_eq!(entries[0]["preview"], "一个人喝了一口海龟汤，然后自杀了。");
  }

  #[tokio::test]
  async fn puzzle_view_never_contains_truth() {
    let f = fixture(Canned::default()).await;
    let (user_id, _) = start(&f).await;
    let uri = format!("/puzzles/{}?user_id={user_id}", f.puzzle_id);
    let (_, view) = send(&f.router, "GET", &uri, None).await;
    assert!(!view.to_string().contains("当年喝的"));
    assert_eq!(view["history"], json!([]));
  }

  #[tokio::test]
  async fn unknown_puzzle_is_404() {
    let f = fixture(Canned::default()).await;
    let (user_id, _) = start(&f).await;
    let uri = format!("/puzzles/{}?user_id={user_id}", Uuid::new_v4());
    let (status, body) = send(&f.router, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
  }

  // ── Game ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn chat_returns_normalised_answer() {
    let f = fixture(Canned::replying(&["[[ANSWER]] 是。"])).await;
    let (_, session_id) = start(&f).await;
    let (status, body) = send(
      &f.router,
      "POST",
      "/game/chat",
      Some(json!({ "session_id": session_id, "message": "他以前喝过海龟汤吗？" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "role": "ai", "content": "是", "game_status": "in_progress" }));
  }

  #[tokio::test]
  async fn illegal_reply_is_silenced_in_chat_and_history() {
    let f = fixture(Canned::replying(&["[[ANSWER]] 也许吧，这很难说。"])).await;
    let (user_id, session_id) = start(&f).await;
    let (_, body) = send(
      &f.router,
      "POST",
      "/game/chat",
      Some(json!({ "session_id": session_id, "message": "他是厨师吗？" })),
    )
    .await;
    assert_eq!(body["content"], SILENCE);

    let uri = format!("/puzzles/{}?user_id={user_id}", f.puzzle_id);
    let (_, view) = send(&f.router, "GET", &uri, None).await;
    assert_eq!(
      view["history"],
      json!([
        { "role": "user", "content": "他是厨师吗？" },
        { "role": "ai", "content": SILENCE },
      ])
    );
  }

  #[tokio::test]
  async fn solved_chat_reveals_truth_and_flips_status() {
    let f = fixture(Canned::replying(&["[[SOLVED]] 恭喜你！"])).await;
    let (_, session_id) = start(&f).await;
    let (_, body) = send(
      &f.router,
      "POST",
      "/game/chat",
      Some(json!({ "session_id": session_id, "message": "他吃过人肉。" })),
    )
    .await;
    assert_eq!(body["game_status"], "solved");
    let content = body["content"].as_str().unwrap();
    assert!(content.starts_with("恭喜你！"));
    assert!(content.ends_with("【汤底】\n他终于知道当年喝的不是海龟汤。"));
  }

  #[tokio::test]
  async fn empty_message_is_400() {
    let f = fixture(Canned::default()).await;
    let (_, session_id) = start(&f).await;
    let (status, _) = send(
      &f.router,
      "POST",
      "/game/chat",
      Some(json!({ "session_id": session_id, "message": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn chat_on_unknown_session_is_404() {
    let f = fixture(Canned::default()).await;
    let (status, _) = send(
      &f.router,
      "POST",
      "/game/chat",
      Some(json!({ "session_id": Uuid::new_v4(), "message": "在吗？" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn unauthorized_provider_yields_config_notice() {
    let f = fixture(Canned::failing(ProviderError::Unauthorized("bad key".into()))).await;
    let (_, session_id) = start(&f).await;
    let (status, body) = send(
      &f.router,
      "POST",
      "/game/chat",
      Some(json!({ "session_id": session_id, "message": "他是谁？" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], CONFIG_ERROR_MESSAGE);
    assert_eq!(body["game_status"], "in_progress");
  }

  #[tokio::test]
  async fn provider_failure_is_500() {
    let f = fixture(Canned::failing(ProviderError::Other("upstream 502".into()))).await;
    let (_, session_id) = start(&f).await;
    let (status, body) = send(
      &f.router,
      "POST",
      "/game/chat",
      Some(json!({ "session_id": session_id, "message": "他是谁？" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("upstream 502"));
  }

  #[tokio::test]
  async fn give_up_returns_truth_and_blocks_further_progress() {
    let f = fixture(Canned::replying(&["[[SOLVED]] 对了"])).await;
    let (user_id, session_id) = start(&f).await;
    let (status, body) = send(
      &f.router,
      "POST",
      "/game/giveup",
      Some(json!({ "session_id": session_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["truth"], "他终于知道当年喝的不是海龟汤。");

    let (_, body) = send(
      &f.router,
      "POST",
      "/game/chat",
      Some(json!({ "session_id": session_id, "message": "他吃过人肉。" })),
    )
    .await;
    assert_eq!(body["game_status"], "given_up");

    let (_, list) = send(&f.router, "GET", &format!("/puzzles?user_id={user_id}"), None).await;
    assert_eq!(list[0]["status"], "given_up");
  }

  #[tokio::test]
  async fn finish_stores_ratings_and_rejects_out_of_range() {
    let f = fixture(Canned::default()).await;
    let (user_id, session_id) = start(&f).await;

    for bad in [json!(9), json!(300), json!(-1)] {
      let (status, body) = send(
        &f.router,
        "POST",
        "/game/finish",
        Some(json!({ "session_id": session_id, "rating_fun": bad })),
      )
      .await;
      assert_eq!(status, StatusCode::BAD_REQUEST, "rating {bad}");
      assert!(body["error"].as_str().unwrap().contains("rating"), "rating {bad}");
    }

    let (status, body) = send(
      &f.router,
      "POST",
      "/game/finish",
      Some(json!({ "session_id": session_id, "rating_fun": 4, "rating_logic": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["game_status"], "solved");

    let uri = format!("/puzzles/{}?user_id={user_id}", f.puzzle_id);
    let (_, view) = send(&f.router, "GET", &uri, None).await;
    assert_eq!(view["session"]["rating_fun"], 4);
    assert_eq!(view["session"]["rating_logic"], Value::Null);
  }
}
