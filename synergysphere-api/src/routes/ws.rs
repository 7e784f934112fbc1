/// WebSocket endpoint: connection lifecycle for the real-time channel
///
/// One upgraded connection per browser tab, gated by a bearer credential
/// supplied at connect time (`?token=` query parameter or `Authorization`
/// header). A connection without a valid credential is closed with close
/// code 1008 immediately; the server never retries.
///
/// After the upgrade:
/// - The connection is registered under the authenticated user id and a
///   writer task forwards broadcast frames to the socket.
/// - The client may send an explicit `{"type": "authenticate"}` handshake;
///   the server acknowledges with an `authenticated` envelope. Malformed
///   client JSON is logged and ignored; the connection stays open.
/// - A ping is sent on a fixed interval; a connection that misses a pong
///   between two probes is forcibly terminated. This is the only bound on
///   a stuck transport.
/// - On close the connection is unregistered; client-side reconnection
///   creates a brand-new registration.

use crate::app::AppState;
use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::time::Duration;
use synergysphere_shared::{
    auth::{jwt, middleware::bearer_token},
    realtime::ServerMessage,
};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Connect-time query parameters
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Bearer credential; the Authorization header is the fallback
    pub token: Option<String>,
}

/// Messages the client may send over the socket
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    /// Explicit handshake associating the connection with a user id
    ///
    /// The bearer credential at connect time is authoritative; the claimed
    /// id is only logged.
    Authenticate {
        #[serde(rename = "userId")]
        user_id: Option<String>,
    },
}

/// WebSocket upgrade handler
///
/// The credential is checked before the upgrade completes, but an invalid
/// one still upgrades so the failure can be reported with a WebSocket close
/// code (1008) rather than an opaque HTTP error.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let token = query
        .token
        .or_else(|| bearer_token(&headers).map(str::to_string));

    let user_id = token.and_then(|t| {
        jwt::validate_access_token(&t, state.jwt_secret())
            .map(|claims| claims.sub)
            .map_err(|e| {
                debug!(error = %e, "WebSocket credential rejected");
                e
            })
            .ok()
    });

    ws.on_upgrade(move |socket| handle_socket(state, socket, user_id))
}

/// Drives one connection from registration to close
async fn handle_socket(state: AppState, mut socket: WebSocket, user_id: Option<Uuid>) {
    let Some(user_id) = user_id else {
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: close_code::POLICY,
                reason: "Authentication required".into(),
            })))
            .await;
        return;
    };

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    let connection_id = state.registry.register(user_id, tx.clone());
    info!(%user_id, connection_id, "User connected");

    // Writer task: forwards registered-channel frames to the socket.
    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(frame).await.is_err() {
                break;
            }
        }
    });

    // Liveness probe: first ping after one full interval, then periodic.
    let period = Duration::from_secs(state.config.realtime.ping_interval_seconds);
    let mut probe = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    let mut awaiting_pong = false;

    loop {
        tokio::select! {
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        handle_client_message(user_id, &tx, &text);
                    }
                    Some(Ok(Message::Pong(_))) => {
                        awaiting_pong = false;
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        let _ = tx.send(Message::Pong(payload));
                    }
                    Some(Ok(Message::Binary(_))) => {
                        debug!(%user_id, "Ignoring binary frame");
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(%user_id, error = %e, "WebSocket error");
                        break;
                    }
                }
            }
            _ = probe.tick() => {
                if awaiting_pong {
                    warn!(%user_id, connection_id, "Connection unresponsive, terminating");
                    break;
                }
                awaiting_pong = true;
                if tx.send(Message::Ping(Vec::new())).is_err() {
                    break;
                }
            }
        }
    }

    state.registry.unregister(connection_id);
    writer.abort();
    info!(%user_id, connection_id, "User disconnected");
}

/// Parses one client frame; malformed JSON is logged and ignored
fn handle_client_message(user_id: Uuid, tx: &UnboundedSender<Message>, text: &str) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Authenticate { user_id: claimed }) => {
            debug!(%user_id, ?claimed, "Authenticate handshake received");
            let reply = ServerMessage::authenticated(user_id);
            if let Ok(payload) = serde_json::to_string(&reply) {
                let _ = tx.send(Message::Text(payload));
            }
        }
        Err(e) => {
            debug!(%user_id, error = %e, "Ignoring malformed client message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authenticate_message_parses() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"authenticate","userId":"42"}"#).unwrap();
        let ClientMessage::Authenticate { user_id } = msg;
        assert_eq!(user_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_authenticate_without_user_id_parses() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"authenticate"}"#).unwrap();
        let ClientMessage::Authenticate { user_id } = msg;
        assert!(user_id.is_none());
    }

    #[test]
    fn test_unknown_and_malformed_messages_are_errors() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"subscribe"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>("not json").is_err());
    }

    #[tokio::test]
    async fn test_authenticate_reply_is_sent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let user_id = Uuid::new_v4();

        handle_client_message(user_id, &tx, r#"{"type":"authenticate"}"#);

        let Message::Text(payload) = rx.recv().await.unwrap() else {
            panic!("expected text frame");
        };
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["type"], "authenticated");
        assert_eq!(value["data"]["userId"], serde_json::json!(user_id));
    }

    #[tokio::test]
    async fn test_malformed_message_sends_nothing() {
        let (tx, mut rx) = mpsc::unbounded_channel();

        handle_client_message(Uuid::new_v4(), &tx, "{{{");

        assert!(rx.try_recv().is_err());
    }
}
