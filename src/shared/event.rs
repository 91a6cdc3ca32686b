/**
 * Realtime Wire Events
 *
 * This module defines the JSON frames exchanged over the realtime socket.
 * Every frame is an adjacently tagged object:
 *
 * ```json
 * {"type": "online_users", "data": {"revision": 3, "online": ["..."]}}
 * ```
 *
 * Server frames replace client state wholesale (`online_users`) or carry a
 * full durable message (`new_message`, `message_sent`). Client frames reuse
 * the REST send body so both transports share one validation path.
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;
use crate::shared::message::{Message, SendMessageBody};

/// Frame sent from the server to a connected client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Full set of online identities (not a delta)
    OnlineUsers { revision: u64, online: Vec<Uuid> },
    /// A message addressed to this client's identity was persisted
    NewMessage { message: Message },
    /// Acknowledges a socket send with the durable record
    MessageSent {
        client_id: Option<Uuid>,
        message: Message,
    },
    /// A socket send was rejected; the client drops its pending entry
    SendFailed {
        client_id: Option<Uuid>,
        error: String,
        retryable: bool,
    },
    /// Reply to `ping`
    Pong,
    /// The previous frame could not be understood
    Error { message: String },
}

impl ServerEvent {
    pub fn to_json(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Event name as it appears in the `type` field
    pub fn name(&self) -> &'static str {
        match self {
            Self::OnlineUsers { .. } => "online_users",
            Self::NewMessage { .. } => "new_message",
            Self::MessageSent { .. } => "message_sent",
            Self::SendFailed { .. } => "send_failed",
            Self::Pong => "pong",
            Self::Error { .. } => "error",
        }
    }
}

/// Frame sent from a client to the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Send a direct message; `client_id` is echoed back in the ack
    SendMessage {
        #[serde(default)]
        client_id: Option<Uuid>,
        receiver_id: Uuid,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        image: Option<String>,
    },
    Ping,
}

impl ClientEvent {
    pub fn parse(raw: &str) -> Result<Self, SharedError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Build a send frame from the shared request body
    pub fn send_message(client_id: Option<Uuid>, receiver_id: Uuid, body: SendMessageBody) -> Self {
        Self::SendMessage {
            client_id,
            receiver_id,
            text: body.text,
            image: body.image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_online_users_wire_shape() {
        let id = Uuid::new_v4();
        let event = ServerEvent::OnlineUsers {
            revision: 4,
            online: vec![id],
        };
        let json: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "online_users");
        assert_eq!(json["data"]["revision"], 4);
        assert_eq!(json["data"]["online"][0], id.to_string());
    }

    #[test]
    fn test_pong_has_no_data() {
        let json: serde_json::Value = serde_json::from_str(&ServerEvent::Pong.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "pong");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_name_matches_tag() {
        let message = Message {
            id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            receiver_id: Uuid::new_v4(),
            text: Some("hi".to_string()),
            image: None,
            created_at: Utc::now(),
        };
        let event = ServerEvent::NewMessage { message };
        let json: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], event.name());
    }

    #[test]
    fn test_parse_send_message_without_client_id() {
        let receiver = Uuid::new_v4();
        let raw = format!(r#"{{"type":"send_message","data":{{"receiver_id":"{receiver}","text":"hi"}}}}"#);
        match ClientEvent::parse(&raw).unwrap() {
            ClientEvent::SendMessage {
                client_id,
                receiver_id,
                text,
                image,
            } => {
                assert_eq!(client_id, None);
                assert_eq!(receiver_id, receiver);
                assert_eq!(text.as_deref(), Some("hi"));
                assert_eq!(image, None);
            }
            other => panic!("Expected SendMessage, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_ping() {
        assert_eq!(ClientEvent::parse(r#"{"type":"ping"}"#).unwrap(), ClientEvent::Ping);
    }

    #[test]
    fn test_parse_unknown_type_fails() {
        let err = ClientEvent::parse(r#"{"type":"typing","data":{}}"#).unwrap_err();
        assert!(matches!(err, SharedError::SerializationError { .. }));
    }
}
