//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument, warn};

use crate::error::AppError;
use crate::logic::{self, Direction};
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "study_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "study_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let out = reply_to_text(&txt, &state).await;
        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "study_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "study_backend", "WebSocket disconnected");
}

/// Parse, dispatch, serialize: the JSON reply for one text frame.
pub async fn reply_to_text(txt: &str, state: &AppState) -> String {
  let reply_msg = match serde_json::from_str::<ClientWsMessage>(txt) {
    Ok(incoming) => {
      debug!(target: "study_backend", "WS received: {:?}", &incoming);
      handle_client_ws(incoming, state).await
    }
    Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
  };

  serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  })
}

/// Dispatch one client message. Failures become an `error` reply; the socket stays open.
pub async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match dispatch(msg, state).await {
    Ok(reply) => reply,
    Err(e) => {
      warn!(target: "study_backend", error = %e, "WS request failed");
      ServerWsMessage::Error { message: e.to_string() }
    }
  }
}

async fn dispatch(msg: ClientWsMessage, state: &AppState) -> Result<ServerWsMessage, AppError> {
  let reply = match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::StartQuiz { quiz_id, user_id } => {
      let user_id = user_id.filter(|u| !u.trim().is_empty());
      let session = logic::start_session(state, &quiz_id, user_id).await?;
      info!(target: "quiz", session_id = %session.session_id, %quiz_id, "WS session started");
      ServerWsMessage::Session { session }
    }

    ClientWsMessage::View { session_id } => ServerWsMessage::Session {
      session: logic::session_view(state, session_id).await?,
    },

    ClientWsMessage::Answer { session_id, question_id, value } => ServerWsMessage::Session {
      session: logic::record_answer(state, session_id, &question_id, value).await?,
    },

    ClientWsMessage::ToggleOption { session_id, question_id, option } => ServerWsMessage::Session {
      session: logic::toggle_option(state, session_id, &question_id, option).await?,
    },

    ClientWsMessage::Next { session_id } => ServerWsMessage::Session {
      session: logic::navigate(state, session_id, Direction::Next).await?,
    },

    ClientWsMessage::Previous { session_id } => ServerWsMessage::Session {
      session: logic::navigate(state, session_id, Direction::Previous).await?,
    },

    ClientWsMessage::Submit { session_id } => ServerWsMessage::Result {
      result: logic::submit(state, session_id).await?,
    },

    ClientWsMessage::Abandon { session_id } => {
      logic::abandon(state, session_id).await?;
      ServerWsMessage::Abandoned { session_id }
    }
  };
  Ok(reply)
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use serde_json::{json, Value};

  use super::*;
  use crate::backend::MemoryBackend;
  use crate::config::SessionSettings;
  use crate::seeds::{seed_decks, seed_modules, seed_quizzes};

  fn state() -> AppState {
    let backend = Arc::new(MemoryBackend::new(seed_quizzes()));
    AppState::with_backend(backend, SessionSettings::default(), seed_decks(), seed_modules())
  }

  async fn send(state: &AppState, msg: Value) -> Value {
    let reply = reply_to_text(&msg.to_string(), state).await;
    serde_json::from_str(&reply).unwrap()
  }

  #[tokio::test]
  async fn ping_and_invalid_json() {
    let state = state();
    assert_eq!(send(&state, json!({ "type": "ping" })).await, json!({ "type": "pong" }));

    let reply: Value = serde_json::from_str(&reply_to_text("{not json", &state).await).unwrap();
    assert_eq!(reply["type"], "error");
    assert!(reply["message"].as_str().unwrap().starts_with("Invalid JSON"));

    let reply = send(&state, json!({ "type": "launch_rocket" })).await;
    assert_eq!(reply["type"], "error");
  }

  #[tokio::test]
  async fn full_session_over_the_socket() {
    let state = state();
    let reply = send(&state, json!({ "type": "start_quiz", "quizId": "berufspaedagogik-grundlagen", "userId": "u1" })).await;
    assert_eq!(reply["type"], "session");
    assert_eq!(reply["session"]["question"]["id"], "bp-1");
    let id = reply["session"]["session_id"].as_str().unwrap().to_string();

    let reply = send(&state, json!({ "type": "answer", "sessionId": id, "questionId": "bp-1", "value": 0 })).await;
    assert_eq!(reply["type"], "session");
    assert_eq!(reply["session"]["answer"], 0);

    let reply = send(&state, json!({ "type": "next", "sessionId": id })).await;
    assert_eq!(reply["session"]["question_index"], 1);

    for option in [0, 1] {
      let reply = send(&state, json!({ "type": "toggle_option", "sessionId": id, "questionId": "bp-2", "option": option })).await;
      assert_eq!(reply["type"], "session");
    }
    let reply = send(&state, json!({ "type": "view", "sessionId": id })).await;
    assert_eq!(reply["session"]["answer"], json!([0, 1]));

    let reply = send(&state, json!({ "type": "previous", "sessionId": id })).await;
    assert_eq!(reply["session"]["question_index"], 0);

    let reply = send(&state, json!({ "type": "submit", "sessionId": id })).await;
    assert_eq!(reply["type"], "result");
    assert_eq!(reply["result"]["score"], 2);
    assert_eq!(reply["result"]["percentage"], 100);

    let reply = send(&state, json!({ "type": "answer", "sessionId": id, "questionId": "bp-1", "value": 1 })).await;
    assert_eq!(reply["type"], "error");

    let reply = send(&state, json!({ "type": "abandon", "sessionId": id })).await;
    assert_eq!(reply, json!({ "type": "abandoned", "sessionId": id }));

    let reply = send(&state, json!({ "type": "view", "sessionId": id })).await;
    assert_eq!(reply["type"], "error");
  }

  #[tokio::test]
  async fn rejected_answers_keep_the_socket_usable() {
    let state = state();
    let reply = send(&state, json!({ "type": "start_quiz", "quizId": "missing" })).await;
    assert_eq!(reply["type"], "error");

    let reply = send(&state, json!({ "type": "start_quiz", "quizId": "berufspaedagogik-grundlagen" })).await;
    let id = reply["session"]["session_id"].as_str().unwrap().to_string();
    let reply = send(&state, json!({ "type": "toggle_option", "sessionId": id, "questionId": "bp-1", "option": 0 })).await;
    assert_eq!(reply["type"], "error");
    assert!(reply["message"].as_str().unwrap().contains("bp-1"));

    assert_eq!(send(&state, json!({ "type": "ping" })).await["type"], "pong");
  }
}
