use serde::{Deserialize, Serialize};

use super::types::{ConnectionRole, PlayerId};
use crate::room::RoomSnapshot;

/// Messages a client may send over the room WebSocket.
///
/// A connection must `register` before anything else; exactly one
/// registration is allowed per connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    Register {
        role: ConnectionRole,
        #[serde(default)]
        host_secret: Option<String>,
        #[serde(default)]
        player_id: Option<PlayerId>,
    },
    Buzz,
}

/// Messages the server pushes over the room WebSocket.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    Registered {
        role: ConnectionRole,
        #[serde(skip_serializing_if = "Option::is_none")]
        player_id: Option<PlayerId>,
    },
    /// Role-aware snapshot, sent on registration and after every transition.
    State { payload: RoomSnapshot },
    Error { message: String },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_host_parses() {
        let raw = r#"{"type":"register","role":"host","hostSecret":"s3cr3t-s3cr3t"}"#;
        let parsed: ClientEvent = serde_json::from_str(raw).unwrap();
        match parsed {
            ClientEvent::Register {
                role,
                host_secret,
                player_id,
            } => {
                assert_eq!(role, ConnectionRole::Host);
                assert_eq!(host_secret.as_deref(), Some("s3cr3t-s3cr3t"));
                assert!(player_id.is_none());
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn register_player_parses() {
        let raw = r#"{"type":"register","role":"player","playerId":"p-0123456789"}"#;
        let parsed: ClientEvent = serde_json::from_str(raw).unwrap();
        match parsed {
            ClientEvent::Register {
                role, player_id, ..
            } => {
                assert_eq!(role, ConnectionRole::Player);
                assert_eq!(player_id.as_deref(), Some("p-0123456789"));
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn buzz_parses() {
        let parsed: ClientEvent = serde_json::from_str(r#"{"type":"buzz"}"#).unwrap();
        assert!(matches!(parsed, ClientEvent::Buzz));
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(serde_json::from_str::<ClientEvent>(r#"{"type":"shout"}"#).is_err());
    }

    #[test]
    fn registered_event_shape() {
        let event = ServerEvent::Registered {
            role: ConnectionRole::Player,
            player_id: Some("p-0123456789".to_string()),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "registered");
        assert_eq!(json["role"], "player");
        assert_eq!(json["playerId"], "p-0123456789");
    }

    #[test]
    fn error_event_shape() {
        let json = serde_json::to_value(ServerEvent::error("Session closed by host")).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "Session closed by host");
    }
}
