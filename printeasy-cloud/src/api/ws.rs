//! WebSocket handler — 实时推送通道
//!
//! 每个连接对应 SessionRegistry 中的一个会话：注册后拿到专属 mpsc 接收端，
//! select 循环把事件按 FIFO 顺序写入 socket。浏览器无法在升级请求上带
//! Authorization 头，所以 token 走 query 参数。

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::live::LiveEvent;
use shared::models::UserIdentity;
use std::time::Duration;

use crate::auth;
use crate::state::AppState;

/// 空闲超时：超过该时长没有任何入站帧就断开
const IDLE_TIMEOUT: Duration = Duration::from_secs(90);
/// 空闲检查与服务端 Ping 的周期
const PING_PERIOD: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

/// 客户端 → 服务端控制命令
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientCommand {
    /// 订阅某店铺公开页的状态变化
    #[serde(rename_all = "camelCase")]
    WatchShop { shop_id: i64 },
    UnwatchShop,
    Ping,
}

/// GET /api/ws — upgrade to WebSocket
pub async fn handle_ws(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let token = query
        .token
        .ok_or_else(|| AppError::new(ErrorCode::NotAuthenticated))?;
    let identity = auth::verify_token(&token, &state.jwt_secret)?;

    Ok(ws.on_upgrade(move |socket| handle_ws_connection(socket, state, identity)))
}

async fn handle_ws_connection(socket: WebSocket, state: AppState, identity: UserIdentity) {
    let (session_id, mut event_rx) = state.registry.register(identity.user_id, identity.role);
    tracing::info!(
        session_id,
        user_id = identity.user_id,
        role = %identity.role,
        "WebSocket connected"
    );

    let (mut ws_sink, mut ws_stream) = socket.split();

    // Connection ack
    let hello = LiveEvent::Connected {
        user_id: identity.user_id,
    };
    if let Ok(json) = serde_json::to_string(&hello)
        && ws_sink.send(Message::Text(json.into())).await.is_err()
    {
        state.registry.unregister(session_id);
        return;
    }

    let mut ping_timer = tokio::time::interval(PING_PERIOD);
    ping_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut last_seen = tokio::time::Instant::now();

    loop {
        tokio::select! {
            // Incoming frame from the client
            msg = ws_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        last_seen = tokio::time::Instant::now();
                        if let Some(reply) = handle_client_command(&text, &state, session_id) {
                            let _ = ws_sink.send(Message::Text(reply.into())).await;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        last_seen = tokio::time::Instant::now();
                        let _ = ws_sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Pong(_))) => {
                        last_seen = tokio::time::Instant::now();
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!(session_id, "WebSocket disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::warn!(session_id, "WebSocket error: {e}");
                        break;
                    }
                    _ => {} // Binary — ignore
                }
            }

            // Event to push to this session (FIFO per session)
            event = event_rx.recv() => {
                match event {
                    Some(event) => {
                        if let Ok(json) = serde_json::to_string(&event)
                            && ws_sink.send(Message::Text(json.into())).await.is_err()
                        {
                            tracing::warn!(session_id, "Failed to push live event");
                            break;
                        }
                    }
                    None => break, // registry dropped the session
                }
            }

            // Idle deadline + server-side keepalive
            _ = ping_timer.tick() => {
                if last_seen.elapsed() > IDLE_TIMEOUT {
                    tracing::info!(session_id, "Closing idle WebSocket session");
                    break;
                }
                let _ = ws_sink.send(Message::Ping(Default::default())).await;
            }
        }
    }

    // Send Close frame (best-effort), then drop every index entry
    let _ = ws_sink.close().await;
    state.registry.unregister(session_id);
    tracing::info!(
        session_id,
        user_id = identity.user_id,
        "WebSocket session cleaned up"
    );
}

/// Handle one client command; returns an optional raw JSON reply
fn handle_client_command(text: &str, state: &AppState, session_id: u64) -> Option<String> {
    let command: ClientCommand = match serde_json::from_str(text) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(session_id, "Ignoring malformed client command: {e}");
            return None;
        }
    };

    match command {
        ClientCommand::WatchShop { shop_id } => {
            state.registry.watch_shop(session_id, shop_id);
            None
        }
        ClientCommand::UnwatchShop => {
            state.registry.unwatch_shop(session_id);
            None
        }
        ClientCommand::Ping => Some(r#"{"type":"pong"}"#.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_commands_parse() {
        assert_eq!(
            serde_json::from_str::<ClientCommand>(r#"{"type":"watch_shop","shopId":7}"#).unwrap(),
            ClientCommand::WatchShop { shop_id: 7 }
        );
        assert_eq!(
            serde_json::from_str::<ClientCommand>(r#"{"type":"unwatch_shop"}"#).unwrap(),
            ClientCommand::UnwatchShop
        );
        assert_eq!(
            serde_json::from_str::<ClientCommand>(r#"{"type":"ping"}"#).unwrap(),
            ClientCommand::Ping
        );
        assert!(serde_json::from_str::<ClientCommand>(r#"{"type":"nope"}"#).is_err());
    }
}
