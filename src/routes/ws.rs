//! WebSocket upgrade + message loop. Each connection owns exactly one game; every
//! client message applies one transition and is answered with a JSON snapshot.
//!
//! With `auto_advance_ms` configured, a selection is answered twice: first the
//! feedback snapshot, then (after the pause) the next round's snapshot.

use std::sync::Arc;
use std::time::Duration;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::config::QuizSettings;
use crate::error::GameError;
use crate::logic;
use crate::protocol::{to_out, ClientWsMessage, ServerWsMessage};
use crate::state::{AppState, SessionEntry};

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "portrait_quiz", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "portrait_quiz", "WebSocket connected");
  let mut game: Option<SessionEntry> = None;

  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let (reply, auto_advance) = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "portrait_quiz", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state, &mut game).await
          }
          Err(e) => (ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }, false),
        };
        if send(&mut socket, &reply).await.is_err() {
          break;
        }

        let pause = auto_advance_pause(&state.settings);
        if let (true, Some(pause), Some(entry)) = (auto_advance, pause, game.as_mut()) {
          tokio::time::sleep(pause).await;
          let result = logic::advance(&state, entry).await;
          let next = reply_with(entry, result);
          if send(&mut socket, &next).await.is_err() {
            break;
          }
        }
      }
      Message::Ping(payload) => {
        if send_raw(&mut socket, Message::Pong(payload)).await.is_err() {
          break;
        }
      }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "portrait_quiz", "WebSocket disconnected");
}

async fn send(socket: &mut WebSocket, msg: &ServerWsMessage) -> Result<(), axum::Error> {
  let out = serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  });
  send_raw(socket, Message::Text(out)).await
}

async fn send_raw(socket: &mut WebSocket, msg: Message) -> Result<(), axum::Error> {
  socket.send(msg).await.map_err(|e| {
    error!(target: "portrait_quiz", error = %e, "WS send error");
    e
  })
}

/// Feedback pause before the automatic advance; `None` when the client advances itself.
fn auto_advance_pause(settings: &QuizSettings) -> Option<Duration> {
  settings.auto_advance_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
}

fn reply_with<T>(entry: &SessionEntry, result: Result<T, GameError>) -> ServerWsMessage {
  match result {
    Ok(_) => ServerWsMessage::Session { session: to_out(entry) },
    Err(e) => ServerWsMessage::Error { message: e.to_string() },
  }
}

/// Returns the reply and whether an automatic advance should follow it.
#[instrument(level = "info", skip(state, game))]
async fn handle_client_ws(
  msg: ClientWsMessage,
  state: &AppState,
  game: &mut Option<SessionEntry>,
) -> (ServerWsMessage, bool) {
  match msg {
    ClientWsMessage::Ping => (ServerWsMessage::Pong, false),

    ClientWsMessage::NewGame => match logic::new_game(state).await {
      Ok(entry) => {
        info!(target: "quiz", id = %entry.id, "WS game started");
        let reply = ServerWsMessage::Session { session: to_out(&entry) };
        *game = Some(entry);
        (reply, false)
      }
      Err(e) => (ServerWsMessage::Error { message: e.to_string() }, false),
    },

    ClientWsMessage::Select { name } => match game.as_mut() {
      Some(entry) => {
        let result = logic::select(entry, &name).map_err(GameError::from);
        let ok = result.is_ok();
        (reply_with(entry, result), ok)
      }
      None => (no_game(), false),
    },

    ClientWsMessage::Advance => match game.as_mut() {
      Some(entry) => {
        let result = logic::advance(state, entry).await;
        (reply_with(entry, result), false)
      }
      None => (no_game(), false),
    },

    ClientWsMessage::PlayAgain => match game.as_mut() {
      Some(entry) => {
        let result = logic::play_again(state, entry).await;
        (reply_with(entry, result), false)
      }
      None => (no_game(), false),
    },
  }
}

fn no_game() -> ServerWsMessage {
  ServerWsMessage::Error { message: "No game in progress; send new_game first.".into() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::logic::tests::test_state;
  use crate::protocol::SessionOut;
  use crate::session::Phase;

  fn snapshot(reply: ServerWsMessage) -> SessionOut {
    match reply {
      ServerWsMessage::Session { session } => session,
      other => panic!("expected a session snapshot, got {other:?}"),
    }
  }

  fn parse(json: &str) -> ClientWsMessage {
    serde_json::from_str(json).unwrap()
  }

  #[test]
  fn client_messages_parse_from_tagged_json() {
    assert!(matches!(parse(r#"{"type":"select","name":"X"}"#), ClientWsMessage::Select { name } if name == "X"));
    assert!(matches!(parse(r#"{"type":"new_game"}"#), ClientWsMessage::NewGame));
    assert!(matches!(parse(r#"{"type":"play_again"}"#), ClientWsMessage::PlayAgain));
    assert!(matches!(parse(r#"{"type":"advance"}"#), ClientWsMessage::Advance));
    assert!(serde_json::from_str::<ClientWsMessage>(r#"{"type":"select"}"#).is_err());
    assert!(serde_json::from_str::<ClientWsMessage>(r#"{"type":"cheat"}"#).is_err());
  }

  #[test]
  fn pause_only_when_configured_and_positive() {
    let mut settings = QuizSettings::default();
    assert_eq!(auto_advance_pause(&settings), Some(Duration::from_millis(1000)));
    settings.auto_advance_ms = Some(0);
    assert_eq!(auto_advance_pause(&settings), None);
    settings.auto_advance_ms = None;
    assert_eq!(auto_advance_pause(&settings), None);
  }

  #[tokio::test]
  async fn commands_before_new_game_are_errors() {
    let state = test_state(6);
    let mut game = None;

    let (reply, _) = handle_client_ws(ClientWsMessage::Ping, &state, &mut game).await;
    assert!(matches!(reply, ServerWsMessage::Pong));

    for msg in [
      ClientWsMessage::Select { name: "President 0".into() },
      ClientWsMessage::Advance,
      ClientWsMessage::PlayAgain,
    ] {
      let (reply, auto) = handle_client_ws(msg, &state, &mut game).await;
      assert!(matches!(reply, ServerWsMessage::Error { ref message } if message.contains("new_game")));
      assert!(!auto);
    }
    assert!(game.is_none());
  }

  #[tokio::test]
  async fn round_trip_through_one_connection() {
    let state = test_state(6);
    let mut game = None;

    let (reply, auto) = handle_client_ws(ClientWsMessage::NewGame, &state, &mut game).await;
    assert!(!auto);
    let first = snapshot(reply);
    assert_eq!(first.phase, Phase::AwaitingSelection);
    assert_eq!(first.question, Some(1));
    assert_eq!(first.options.len(), 4);
    assert!(game.is_some());

    let (reply, auto) =
      handle_client_ws(ClientWsMessage::Select { name: "Nobody".into() }, &state, &mut game).await;
    assert!(matches!(reply, ServerWsMessage::Error { ref message } if message.contains("Nobody")));
    assert!(!auto);

    let pick = first.options[0].clone();
    let (reply, auto) = handle_client_ws(ClientWsMessage::Select { name: pick.clone() }, &state, &mut game).await;
    assert!(auto);
    let answered = snapshot(reply);
    assert_eq!(answered.phase, Phase::ShowingFeedback);
    assert_eq!(answered.selected, Some(pick.clone()));
    assert!(answered.correct.is_some());

    let (reply, auto) = handle_client_ws(ClientWsMessage::Select { name: pick }, &state, &mut game).await;
    assert!(matches!(reply, ServerWsMessage::Error { .. }));
    assert!(!auto);

    let (reply, auto) = handle_client_ws(ClientWsMessage::Advance, &state, &mut game).await;
    assert!(!auto);
    let second = snapshot(reply);
    assert_eq!(second.phase, Phase::AwaitingSelection);
    assert_eq!(second.question, Some(2));
    assert_eq!(second.score, answered.score);

    let (reply, auto) = handle_client_ws(ClientWsMessage::PlayAgain, &state, &mut game).await;
    assert!(!auto);
    let fresh = snapshot(reply);
    assert_eq!(fresh.id, first.id);
    assert_eq!((fresh.phase, fresh.score, fresh.question), (Phase::AwaitingSelection, 0, Some(1)));
  }

  #[tokio::test]
  async fn new_game_on_tiny_roster_is_an_error() {
    let state = test_state(3);
    let mut game = None;
    let (reply, auto) = handle_client_ws(ClientWsMessage::NewGame, &state, &mut game).await;
    assert!(matches!(reply, ServerWsMessage::Error { .. }));
    assert!(!auto);
    assert!(game.is_none());
  }
}
