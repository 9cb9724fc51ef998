//! Client → server WebSocket frames

use serde::{Deserialize, Serialize};

use crate::relay::GatewayEvent;
use crate::types::ConnectionId;

/// Client message types. Unknown extra fields (such as a client-supplied
/// `sender`) are ignored; the sender is always the connection itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Direct message to another connection
    PrivateMessage { receiver: ConnectionId, message: String },

    /// Join (and implicitly create) a room
    #[serde(alias = "joinRoom")]
    CreateRoom { room: String },

    LeaveRoom { room: String },

    /// Post to a room the client has joined
    RoomMessage { room: String, message: String },

    /// Heartbeat
    Ping,
}

impl ClientMessage {
    /// Map onto a gateway event. `Ping` is answered by the transport and has none.
    pub fn into_gateway_event(self, connection_id: ConnectionId) -> Option<GatewayEvent> {
        let event = match self {
            ClientMessage::PrivateMessage { receiver, message } => GatewayEvent::PrivateMessage {
                connection_id,
                receiver,
                payload: message,
            },
            ClientMessage::CreateRoom { room } => GatewayEvent::JoinRoom { connection_id, room },
            ClientMessage::LeaveRoom { room } => GatewayEvent::LeaveRoom { connection_id, room },
            ClientMessage::RoomMessage { room, message } => GatewayEvent::RoomMessage {
                connection_id,
                room,
                payload: message,
            },
            ClientMessage::Ping => return None,
        };
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_parsing() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Ping);
    }

    #[test]
    fn test_private_message_ignores_client_sender() {
        let json = r#"{"type":"privateMessage","sender":"spoofed","receiver":"b2","message":"hi"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();

        assert_eq!(
            msg,
            ClientMessage::PrivateMessage {
                receiver: ConnectionId::from("b2"),
                message: "hi".to_string(),
            }
        );
    }

    #[test]
    fn test_join_room_alias() {
        let create: ClientMessage =
            serde_json::from_str(r#"{"type":"createRoom","room":"general"}"#).unwrap();
        let join: ClientMessage =
            serde_json::from_str(r#"{"type":"joinRoom","room":"general"}"#).unwrap();
        assert_eq!(create, join);
    }

    #[test]
    fn test_into_gateway_event_uses_connection_as_sender() {
        let msg = ClientMessage::RoomMessage {
            room: "general".to_string(),
            message: "hello".to_string(),
        };

        let event = msg.into_gateway_event(ConnectionId::from("a1")).unwrap();

        assert!(matches!(
            event,
            GatewayEvent::RoomMessage { connection_id, room, payload }
                if connection_id.as_str() == "a1" && room == "general" && payload == "hello"
        ));
        assert!(ClientMessage::Ping.into_gateway_event(ConnectionId::from("a1")).is_none());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"shout"}"#).is_err());
    }
}
