//! Events the relay hands to the transport for delivery

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::types::ConnectionId;

/// Per-connection delivery channel. The transport owns the receiving half.
pub type Outbox = mpsc::UnboundedSender<Envelope>;

/// Server → client events
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RelayEvent {
    /// First frame on every connection, carries the id peers address it by
    Connected { connection_id: ConnectionId },

    /// Direct message from another connection
    PrivateMessage {
        sender: ConnectionId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender_name: Option<String>,
        message: String,
    },

    /// A connection joined a room (sent to every member, the joiner included)
    MemberJoined {
        room: String,
        connection_id: ConnectionId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user: Option<String>,
    },

    /// A connection left a room or disconnected
    MemberLeft {
        room: String,
        connection_id: ConnectionId,
    },

    /// Chat line posted to a room
    RoomMessage {
        room: String,
        sender: ConnectionId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender_name: Option<String>,
        message: String,
    },

    /// Heartbeat reply
    Pong,

    /// Malformed client frame
    Error { code: String, message: String },
}

/// Delivery wrapper with metadata
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(flatten)]
    pub event: RelayEvent,

    /// Unix timestamp when the event was routed
    pub timestamp: i64,
}

impl Envelope {
    pub fn new(event: RelayEvent) -> Self {
        Self {
            event,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl From<RelayEvent> for Envelope {
    fn from(event: RelayEvent) -> Self {
        Self::new(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_message_wire_shape() {
        let env = Envelope {
            event: RelayEvent::PrivateMessage {
                sender: ConnectionId::from("a1"),
                sender_name: None,
                message: "hi".to_string(),
            },
            timestamp: 42,
        };

        let json: serde_json::Value = serde_json::to_value(&env).unwrap();
        assert_eq!(json["type"], "privateMessage");
        assert_eq!(json["sender"], "a1");
        assert_eq!(json["message"], "hi");
        assert_eq!(json["timestamp"], 42);
        assert!(json.get("senderName").is_none());
    }

    #[test]
    fn test_member_joined_uses_camel_case_fields() {
        let json = serde_json::to_string(&RelayEvent::MemberJoined {
            room: "general".to_string(),
            connection_id: ConnectionId::from("b2"),
            user: Some("bob".to_string()),
        })
        .unwrap();

        assert!(json.contains(r#""type":"memberJoined""#));
        assert!(json.contains(r#""connectionId":"b2""#));
        assert!(json.contains(r#""user":"bob""#));
    }
}
