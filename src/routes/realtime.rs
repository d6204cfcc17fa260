use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;

use crate::{
    dto::notification_dto::DEFAULT_LIMIT,
    error::Result,
    middleware::auth::{decode_token, AuthUser},
    services::realtime_service::Topic,
    AppState,
};

const PING_EVERY: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
pub struct RealtimeQuery {
    pub token: String,
}

/// Browsers cannot set headers on websocket upgrades, so the token travels in the query.
pub async fn realtime_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<RealtimeQuery>,
) -> Result<Response> {
    let user = decode_token(&query.token, &state.config.jwt_secret)?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user)))
}

async fn handle_socket(socket: WebSocket, state: AppState, user: AuthUser) {
    let (mut sender, mut receiver) = socket.split();
    let mut subscription = state.hub.subscribe(user.id);
    tracing::debug!(user_id = %user.id, "realtime client connected");

    for topic in Topic::ALL {
        if send_snapshot(&mut sender, &state, &user, topic).await.is_err() {
            return;
        }
    }

    let mut ping = tokio::time::interval(PING_EVERY);
    ping.tick().await;

    loop {
        tokio::select! {
            changed = subscription.next() => {
                let Some(topics) = changed else { break };
                let mut failed = false;
                for topic in topics {
                    if send_snapshot(&mut sender, &state, &user, topic).await.is_err() {
                        failed = true;
                        break;
                    }
                }
                if failed {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Ping(payload))) => {
                        if sender.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Text(text))) if text.trim() == "refresh" => {
                        for topic in Topic::ALL {
                            if send_snapshot(&mut sender, &state, &user, topic).await.is_err() {
                                return;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                }
            }
            _ = ping.tick() => {
                if sender.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
        }
    }
    tracing::debug!(user_id = %user.id, "realtime client disconnected");
}

/// Re-reads the topic's current state and pushes it as one frame.
async fn send_snapshot(
    sender: &mut SplitSink<WebSocket, Message>,
    state: &AppState,
    user: &AuthUser,
    topic: Topic,
) -> std::result::Result<(), axum::Error> {
    let frame = match snapshot(state, user, topic).await {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(user_id = %user.id, ?topic, error = %e, "realtime snapshot failed");
            json!({ "type": "error", "topic": topic, "error": e.to_string() })
        }
    };
    sender.send(Message::Text(frame.to_string())).await
}

async fn snapshot(state: &AppState, user: &AuthUser, topic: Topic) -> Result<serde_json::Value> {
    let frame = match topic {
        Topic::Notifications => {
            let items = state.notification_service.list(user.id, DEFAULT_LIMIT).await?;
            let unread = state.notification_service.unread_count(user.id).await?;
            json!({ "type": "snapshot", "topic": topic, "items": items, "unread": unread })
        }
        Topic::Messages => {
            let conversations = state.message_service.list_conversations(user.id).await?;
            let unread = state.message_service.unread_count(user.id).await?;
            json!({ "type": "snapshot", "topic": topic, "conversations": conversations, "unread": unread })
        }
    };
    Ok(frame)
}
