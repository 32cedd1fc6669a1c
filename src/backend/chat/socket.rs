/**
 * WebSocket Transport
 *
 * `GET /socket` authenticates the handshake and only then upgrades. A
 * refused handshake gets a plain 401 JSON response and never becomes a
 * socket.
 *
 * # Tasks
 *
 * Each socket runs two halves:
 *
 * - a writer task draining the session's outbound queue and sending a
 *   ping every `ping_interval`
 * - the reader loop feeding text frames to the session one at a time
 *
 * The connection closes when the client closes, the transport errors, the
 * writer stops, or nothing arrives for two ping intervals.
 */

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::backend::auth::authenticate;
use crate::backend::chat::session::ChatSession;
use crate::backend::middleware::auth::handshake_token;
use crate::backend::server::state::AppState;
use crate::shared::messaging::UserProfile;

#[derive(Debug, Default, Deserialize)]
pub struct SocketParams {
    /// Credential for clients that cannot set headers on the upgrade
    pub token: Option<String>,
}

/// Authenticate the handshake and upgrade (GET /socket)
///
/// The credential is checked before the upgrade request itself, so an
/// unauthenticated client always sees 401.
pub async fn socket_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SocketParams>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let token = handshake_token(&headers, params.token.as_deref());
    let identity = match authenticate(
        state.store.as_ref(),
        &state.config.jwt_secret,
        token.as_deref(),
    )
    .await
    {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!("Socket handshake refused: {}", e);
            return e.into_response();
        }
    };

    match ws {
        Ok(ws) => ws.on_upgrade(move |socket| run_socket(socket, state, identity)),
        Err(rejection) => rejection.into_response(),
    }
}

async fn run_socket(socket: WebSocket, state: AppState, identity: UserProfile) {
    let ping_interval = state.config.ping_interval;
    let idle_timeout = ping_interval * 2;
    let (mut sink, mut stream) = socket.split();
    let (mut session, mut events) = ChatSession::open(state, identity).await;
    let connection_id = session.connection_id();

    let mut writer = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(ping_interval);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else { break };
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!("Failed to serialize {} event: {}", event.name(), e);
                            continue;
                        }
                    };
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if sink.send(Message::Ping(Default::default())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    loop {
        tokio::select! {
            next = tokio::time::timeout(idle_timeout, stream.next()) => match next {
                Ok(Some(Ok(Message::Text(text)))) => session.handle_text(text.as_str()).await,
                Ok(Some(Ok(Message::Close(_)))) | Ok(None) => break,
                // Pings are answered by the transport; pongs only prove liveness
                Ok(Some(Ok(_))) => {}
                Ok(Some(Err(e))) => {
                    tracing::debug!(connection = %connection_id, "Socket error: {}", e);
                    break;
                }
                Err(_) => {
                    tracing::info!(connection = %connection_id, "Socket idle, closing");
                    break;
                }
            },
            _ = &mut writer => break,
        }
    }

    writer.abort();
    session.close().await;
}
