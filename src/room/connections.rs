//! Per-room set of live outbound connections.
//!
//! The set depends only on the narrow [`StateSink`] capability so the real
//! WebSocket transport and in-memory test recorders are interchangeable.
//! Connection records carry no back-pointers into room state; they reference
//! their room by code at the transport layer.

use std::sync::Arc;

use uuid::Uuid;

use crate::protocol::{ConnectionRole, PlayerId, ServerEvent};

/// Outbound capability of one connection.
///
/// `send` returns `false` when the sink is permanently dead (peer gone);
/// transient drops of individual frames are allowed, delivery is best-effort.
pub trait StateSink: Send + Sync {
    fn send(&self, event: ServerEvent) -> bool;
    fn is_closed(&self) -> bool;
    fn close(&self);
}

/// Unique id for one connection within a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One registered connection: an authenticated role plus its sink.
#[derive(Clone)]
pub struct RoomConnection {
    pub id: ConnectionId,
    pub role: ConnectionRole,
    pub player_id: Option<PlayerId>,
    pub sink: Arc<dyn StateSink>,
}

/// All live connections of one room.
#[derive(Default)]
pub struct ConnectionSet {
    connections: Vec<RoomConnection>,
}

impl ConnectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an authenticated connection. The caller has already verified the
    /// role (host via secret, player via known id).
    pub fn add(
        &mut self,
        role: ConnectionRole,
        player_id: Option<PlayerId>,
        sink: Arc<dyn StateSink>,
    ) -> ConnectionId {
        let id = ConnectionId::new();
        self.connections.push(RoomConnection {
            id,
            role,
            player_id,
            sink,
        });
        id
    }

    /// Remove a connection. Idempotent: removing an unknown id is a no-op.
    pub fn remove(&mut self, id: ConnectionId) {
        self.connections.retain(|c| c.id != id);
    }

    /// Close and drop every connection tagged with `player_id`.
    pub fn drop_player_connections(&mut self, player_id: &str) {
        self.connections.retain(|c| {
            if c.player_id.as_deref() == Some(player_id) {
                c.sink.close();
                false
            } else {
                true
            }
        });
    }

    /// Snapshot the current membership for a broadcast. The caller sends
    /// outside the room lock and reports dead sinks back via [`Self::remove`].
    pub fn collect(&self) -> Vec<RoomConnection> {
        self.connections
            .iter()
            .filter(|c| !c.sink.is_closed())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Whether any host-role connection is currently attached.
    pub fn has_host(&self) -> bool {
        self.connections
            .iter()
            .any(|c| c.role == ConnectionRole::Host && !c.sink.is_closed())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use super::*;

    /// In-memory sink that records every event it receives.
    #[derive(Default)]
    pub struct RecorderSink {
        pub events: Mutex<Vec<ServerEvent>>,
        pub closed: Mutex<bool>,
    }

    impl RecorderSink {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn recorded(&self) -> Vec<ServerEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl StateSink for RecorderSink {
        fn send(&self, event: ServerEvent) -> bool {
            if *self.closed.lock().unwrap() {
                return false;
            }
            self.events.lock().unwrap().push(event);
            true
        }

        fn is_closed(&self) -> bool {
            *self.closed.lock().unwrap()
        }

        fn close(&self) {
            *self.closed.lock().unwrap() = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::RecorderSink;
    use super::*;

    #[test]
    fn add_and_remove_is_idempotent() {
        let mut set = ConnectionSet::new();
        let sink = RecorderSink::new();
        let id = set.add(ConnectionRole::Host, None, sink);
        assert_eq!(set.len(), 1);
        assert!(set.has_host());

        set.remove(id);
        assert!(set.is_empty());
        set.remove(id);
        assert!(set.is_empty());
    }

    #[test]
    fn drop_player_connections_closes_sinks() {
        let mut set = ConnectionSet::new();
        let alice = RecorderSink::new();
        let bob = RecorderSink::new();
        set.add(
            ConnectionRole::Player,
            Some("alice-0123456789".to_string()),
            alice.clone(),
        );
        set.add(
            ConnectionRole::Player,
            Some("bob-0123456789".to_string()),
            bob.clone(),
        );

        set.drop_player_connections("alice-0123456789");
        assert_eq!(set.len(), 1);
        assert!(alice.is_closed());
        assert!(!bob.is_closed());
    }

    #[test]
    fn collect_skips_closed_sinks() {
        let mut set = ConnectionSet::new();
        let live = RecorderSink::new();
        let dead = RecorderSink::new();
        dead.close();
        set.add(ConnectionRole::Player, Some("p-0123456789".to_string()), live);
        set.add(ConnectionRole::Host, None, dead);

        let collected = set.collect();
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].role, ConnectionRole::Player);
        assert!(!set.has_host());
    }
}
