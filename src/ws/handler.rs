//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::app::AppState;
use crate::game::{ArenaHandle, EntityId};
use crate::mirror::KeyFilter;
use crate::util::rate_limit::ObserverRateLimiter;

use super::codec::{Codec, CodecError};
use super::protocol::Message;

/// WebSocket upgrade handler. Every connection joins the arena as a player.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection = match state.arena.connect().await {
        Ok(connection) => connection,
        Err(e) => {
            error!(error = %e, "Failed to join arena");
            return;
        }
    };
    let id = connection.id;
    info!(entity_id = id, "New WebSocket connection");

    let (ws_sink, ws_stream) = socket.split();
    let gate = InputGate::new(ObserverRateLimiter::new(state.config.input_rate_limit));

    run_session(id, ws_sink, ws_stream, &state.arena, connection.messages, gate).await;

    if state.arena.disconnect(id).await.is_err() {
        debug!(entity_id = id, "Arena closed before disconnect");
    }
    info!(entity_id = id, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    id: EntityId,
    mut ws_sink: SplitSink<WebSocket, WsMessage>,
    mut ws_stream: SplitStream<WebSocket>,
    arena: &ArenaHandle,
    mut messages: broadcast::Receiver<Message>,
    mut gate: InputGate,
) {
    // Writer task: arena broadcast -> WebSocket
    let writer_handle = tokio::spawn(async move {
        let codec = Codec::default();
        loop {
            match messages.recv().await {
                Ok(message) => match send_msg(&mut ws_sink, &codec, &message).await {
                    Ok(()) => {}
                    Err(SendError::Codec(e)) => {
                        warn!(entity_id = id, error = %e, "Failed to encode message, skipping");
                    }
                    Err(e) => {
                        debug!(entity_id = id, error = %e, "WebSocket send failed");
                        break;
                    }
                },
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(entity_id = id, lagged_count = n, "Observer lagged, skipped {} messages", n);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(entity_id = id, "Arena broadcast closed");
                    break;
                }
            }
        }
    });

    // Reader loop: WebSocket -> arena
    let codec = Codec::scalars();
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(WsMessage::Text(text)) => {
                let message = match codec.decode(&text) {
                    Ok(message) => message,
                    Err(e) => {
                        warn!(entity_id = id, error = %e, "Failed to decode client message");
                        continue;
                    }
                };
                match gate.admit(&message) {
                    Admission::Forward => {}
                    Admission::Redundant => {
                        debug!(entity_id = id, action = ?message.action, "Dropped redundant input");
                        continue;
                    }
                    Admission::RateLimited => {
                        warn!(entity_id = id, "Rate limited input message");
                        continue;
                    }
                }
                if arena.input(id, message).await.is_err() {
                    debug!(entity_id = id, "Arena command channel closed");
                    break;
                }
            }
            Ok(WsMessage::Binary(_)) => {
                warn!(entity_id = id, "Received binary message, ignoring");
            }
            Ok(WsMessage::Ping(_)) | Ok(WsMessage::Pong(_)) => {}
            Ok(WsMessage::Close(_)) => {
                info!(entity_id = id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(entity_id = id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
}

/// Verdict on one inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Forward,
    /// Not a key transition, or one that changes nothing
    Redundant,
    RateLimited,
}

/// Per-observer input filter. Releases of held keys always pass so that a
/// burst of presses can never leave a key stuck down.
pub struct InputGate {
    keys: KeyFilter,
    limiter: ObserverRateLimiter,
}

impl InputGate {
    pub fn new(limiter: ObserverRateLimiter) -> Self {
        Self {
            keys: KeyFilter::new(),
            limiter,
        }
    }

    pub fn admit(&mut self, message: &Message) -> Admission {
        let Some((pressed, key)) = message.key_event() else {
            return Admission::Redundant;
        };
        if pressed {
            if self.keys.is_held(key) {
                return Admission::Redundant;
            }
            if !self.limiter.check_input() {
                return Admission::RateLimited;
            }
        }
        if self.keys.transition(pressed, key) {
            Admission::Forward
        } else {
            Admission::Redundant
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum SendError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Socket(#[from] axum::Error),
}

/// Encode a message and send it over WebSocket
async fn send_msg(
    sink: &mut SplitSink<WebSocket, WsMessage>,
    codec: &Codec,
    message: &Message,
) -> Result<(), SendError> {
    let json = codec.encode(message)?;
    sink.send(WsMessage::Text(json)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{ArenaTuning, Entity, Game};
    use crate::ws::protocol::Key;

    #[test]
    fn releases_pass_even_when_quota_is_spent() {
        let (tx, _) = broadcast::channel(64);
        let mut game = Game::new(ArenaTuning::default(), tx).with_seed(1);
        let id = game.join(false).unwrap();
        let mut gate = InputGate::new(ObserverRateLimiter::new(2));

        let inputs = [
            (Message::keydown(Key::ArrowUp), Admission::Forward),
            (Message::keydown(Key::Space), Admission::Forward),
            (Message::keydown(Key::ArrowLeft), Admission::RateLimited),
            (Message::keyup(Key::Space), Admission::Forward),
            (Message::keyup(Key::ArrowUp), Admission::Forward),
            (Message::keyup(Key::ArrowLeft), Admission::Redundant),
        ];
        for (message, expected) in inputs {
            let verdict = gate.admit(&message);
            assert_eq!(verdict, expected, "{message:?}");
            if verdict == Admission::Forward {
                game.on_message(id, &message);
            }
        }

        let controls = game.get(id).and_then(Entity::vehicle).unwrap().controls;
        assert!(!controls.accelerating);
        assert!(!controls.turning_left);
        assert!(!gate.keys.is_held(Key::ArrowUp));
    }

    #[test]
    fn repeated_presses_do_not_spend_quota() {
        let mut gate = InputGate::new(ObserverRateLimiter::new(1));
        assert_eq!(gate.admit(&Message::keydown(Key::ArrowUp)), Admission::Forward);
        assert_eq!(gate.admit(&Message::keydown(Key::ArrowUp)), Admission::Redundant);
        assert_eq!(gate.admit(&Message::join(0)), Admission::Redundant);
        assert_eq!(gate.admit(&Message::keyup(Key::ArrowUp)), Admission::Forward);
    }
}
