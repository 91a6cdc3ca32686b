/**
 * WebSocket Connection Driver
 *
 * `GET /ws` upgrades the connection and runs one task per socket. The task
 * drives a connection session through its lifecycle and multiplexes four
 * sources in a `select!` loop:
 *
 * - broadcast events for this session (`online_users`, `new_message`)
 * - frames from the client (`send_message`, `ping`)
 * - replies from spawned send tasks (`message_sent`, `send_failed`)
 * - the heartbeat timer
 *
 * A client that sends nothing (not even a pong) for the heartbeat timeout is
 * closed with code 1001 (going away).
 *
 * # Authentication
 *
 * The credential is read from the upgrade request (the `jwt` cookie, or a
 * bearer header). A rejected credential still completes the upgrade; the
 * server then immediately closes with code 1008 and the rejection text as
 * the reason. There are no anonymous sessions.
 *
 * # Sends
 *
 * Each `send_message` runs in its own task. Closing the socket does not
 * cancel it: the message is persisted (or fails) regardless, and the ack is
 * simply dropped when nobody is listening anymore.
 */
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{
        ws::{close_code, CloseFrame, Message as WsMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    http::HeaderMap,
    response::Response,
};
use futures_util::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

use crate::backend::auth::extract_token;
use crate::backend::messaging::DeliveryCoordinator;
use crate::backend::presence::PresenceHub;
use crate::backend::realtime::broadcast::DeliveryError;
use crate::backend::server::config::ServerConfig;
use crate::shared::{ClientEvent, SendMessageBody, ServerEvent};

type SocketSink = SplitSink<WebSocket, WsMessage>;

/// Close reason sent when the client stops answering pings
const HEARTBEAT_TIMEOUT_REASON: &str = "Heartbeat timeout";

#[derive(Debug, Clone, Copy)]
struct Heartbeat {
    interval: Duration,
    timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeartbeatTick {
    Ping,
    Close { code: u16, reason: &'static str },
}

impl Heartbeat {
    fn on_tick(&self, last_alive: Instant, now: Instant) -> HeartbeatTick {
        if now.saturating_duration_since(last_alive) > self.timeout {
            HeartbeatTick::Close {
                code: close_code::AWAY,
                reason: HEARTBEAT_TIMEOUT_REASON,
            }
        } else {
            HeartbeatTick::Ping
        }
    }
}

/// `GET /ws`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(hub): State<PresenceHub>,
    State(delivery): State<DeliveryCoordinator>,
    State(config): State<Arc<ServerConfig>>,
    headers: HeaderMap,
) -> Response {
    let token = extract_token(&headers);
    let heartbeat = Heartbeat {
        interval: config.heartbeat_interval,
        timeout: config.heartbeat_timeout,
    };
    ws.on_upgrade(move |socket| handle_socket(socket, hub, delivery, heartbeat, token))
}

async fn handle_socket(
    socket: WebSocket,
    hub: PresenceHub,
    delivery: DeliveryCoordinator,
    heartbeat: Heartbeat,
    token: Option<String>,
) {
    let (mut sink, mut stream) = socket.split();

    let authenticated = match hub.connect().authenticate(token.as_deref()).await {
        Ok(session) => session,
        Err(e) => {
            close_with(&mut sink, close_code::POLICY, e.to_string()).await;
            return;
        }
    };

    let mut session = match authenticated.activate() {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!("[Realtime] Refusing connection: {}", e);
            close_with(&mut sink, close_code::POLICY, e.to_string()).await;
            return;
        }
    };

    let me = session.identity_id();
    let handle = session.handle();
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<ServerEvent>();

    let mut ticker = tokio::time::interval(heartbeat.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;
    let mut last_alive = Instant::now();

    loop {
        tokio::select! {
            event = session.next_event() => match event {
                Some(event) => {
                    if let Err(e) = send_event(&mut sink, &event).await {
                        tracing::warn!("[Realtime] {}: {}", handle, e);
                        break;
                    }
                }
                None => break,
            },
            Some(reply) = reply_rx.recv() => {
                if let Err(e) = send_event(&mut sink, &reply).await {
                    tracing::warn!("[Realtime] {}: {}", handle, e);
                    break;
                }
            }
            frame = stream.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    last_alive = Instant::now();
                    handle_client_frame(text.as_str(), me, &delivery, &reply_tx);
                }
                Some(Ok(WsMessage::Close(_))) | None => break,
                Some(Ok(_)) => last_alive = Instant::now(),
                Some(Err(e)) => {
                    tracing::warn!("[Realtime] {}: {}", handle, DeliveryError::Transport(e.to_string()));
                    break;
                }
            },
            _ = ticker.tick() => match heartbeat.on_tick(last_alive, Instant::now()) {
                HeartbeatTick::Ping => {
                    if sink.send(WsMessage::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                }
                HeartbeatTick::Close { code, reason } => {
                    tracing::info!("[Realtime] {} missed heartbeat, closing", handle);
                    close_with(&mut sink, code, reason.to_string()).await;
                    break;
                }
            },
        }
    }

    session.close().await;
}

fn handle_client_frame(raw: &str, me: Uuid, delivery: &DeliveryCoordinator, replies: &mpsc::UnboundedSender<ServerEvent>) {
    let event = match ClientEvent::parse(raw) {
        Ok(event) => event,
        Err(e) => {
            let _ = replies.send(ServerEvent::Error { message: e.to_string() });
            return;
        }
    };

    match event {
        ClientEvent::Ping => {
            let _ = replies.send(ServerEvent::Pong);
        }
        ClientEvent::SendMessage {
            client_id,
            receiver_id,
            text,
            image,
        } => {
            let delivery = delivery.clone();
            let replies = replies.clone();
            tokio::spawn(async move {
                let reply = match delivery.submit(me, receiver_id, SendMessageBody { text, image }).await {
                    Ok(message) => ServerEvent::MessageSent { client_id, message },
                    Err(e) => ServerEvent::SendFailed {
                        client_id,
                        retryable: e.is_retryable(),
                        error: e.to_string(),
                    },
                };
                // The socket may be gone; the message is persisted either way
                let _ = replies.send(reply);
            });
        }
    }
}

async fn send_event(sink: &mut SocketSink, event: &ServerEvent) -> Result<(), DeliveryError> {
    let json = match event.to_json() {
        Ok(json) => json,
        Err(e) => {
            // Skip the frame, keep the connection
            tracing::warn!("[Realtime] {}", DeliveryError::Encode(e.to_string()));
            return Ok(());
        }
    };
    sink.send(WsMessage::Text(json.into()))
        .await
        .map_err(|e| DeliveryError::Transport(e.to_string()))
}

async fn close_with(sink: &mut SocketSink, code: u16, reason: String) {
    let frame = CloseFrame {
        code,
        reason: reason.into(),
    };
    if let Err(e) = sink.send(WsMessage::Close(Some(frame))).await {
        tracing::debug!("[Realtime] Failed to send close frame: {}", e);
    }
}
