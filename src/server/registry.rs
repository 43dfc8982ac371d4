//! Room registry and share-code index.
//!
//! The registry map is guarded separately from the per-room locks; lock
//! order is always registry-then-room. Guards on the underlying maps are
//! dropped before any room lock is taken or any await point is crossed.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::error::GameError;
use crate::protocol::{
    generate_host_secret, generate_room_code, generate_share_code, normalize_room_code,
};
use crate::room::RoomState;

/// One room plus its transition lock. All mutating access to the state goes
/// through the mutex so transitions form a single total order per room.
pub struct RoomHandle {
    pub code: String,
    pub state: Mutex<RoomState>,
}

/// Owner of every live room, keyed by canonical uppercase code.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: DashMap<String, Arc<RoomHandle>>,
    /// Secondary index: share code digits -> room code.
    share_codes: DashMap<String, String>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh room under a code nobody else holds. The code space is
    /// ~1M combinations; repeated draws terminate quickly at any realistic
    /// room count.
    pub fn create(&self) -> Arc<RoomHandle> {
        loop {
            let code = generate_room_code();
            match self.rooms.entry(code.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(vacant) => {
                    let state = RoomState::new(code.clone(), generate_host_secret());
                    let handle = Arc::new(RoomHandle {
                        code,
                        state: Mutex::new(state),
                    });
                    vacant.insert(handle.clone());
                    return handle;
                }
            }
        }
    }

    pub fn get(&self, code: &str) -> Result<Arc<RoomHandle>, GameError> {
        let code = normalize_room_code(code);
        self.rooms
            .get(&code)
            .map(|entry| entry.value().clone())
            .ok_or(GameError::RoomNotFound)
    }

    pub fn has(&self, code: &str) -> bool {
        self.rooms.contains_key(&normalize_room_code(code))
    }

    /// Drop a room and any share code pointing at it.
    pub fn delete(&self, code: &str) {
        let code = normalize_room_code(code);
        self.rooms.remove(&code);
        self.share_codes.retain(|_, room_code| room_code != &code);
    }

    pub fn values(&self) -> Vec<Arc<RoomHandle>> {
        self.rooms
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Draw a share code unused across all rooms and bind it to `room_code`.
    /// The caller installs the digits into the room under its lock.
    pub fn reserve_share_code(&self, room_code: &str) -> String {
        loop {
            let code = generate_share_code();
            match self.share_codes.entry(code.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(vacant) => {
                    vacant.insert(room_code.to_string());
                    return code;
                }
            }
        }
    }

    /// Resolve a share code to its room code, if the binding still exists.
    pub fn share_code_target(&self, share_code: &str) -> Option<String> {
        self.share_codes
            .get(share_code)
            .map(|entry| entry.value().clone())
    }

    /// Drop a share-code binding (expired or superseded). Idempotent.
    pub fn release_share_code(&self, share_code: &str) {
        self.share_codes.remove(share_code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_rooms_are_unique_and_canonical() {
        let registry = RoomRegistry::new();
        let mut codes = std::collections::HashSet::new();
        for _ in 0..50 {
            let handle = registry.create();
            assert_eq!(handle.code.len(), 4);
            assert_eq!(handle.code, handle.code.to_ascii_uppercase());
            assert!(codes.insert(handle.code.clone()), "duplicate room code");
        }
        assert_eq!(registry.len(), 50);
    }

    #[tokio::test]
    async fn lookup_is_case_insensitive() {
        let registry = RoomRegistry::new();
        let handle = registry.create();
        let lower = handle.code.to_ascii_lowercase();

        assert!(registry.has(&lower));
        let found = registry.get(&lower).unwrap();
        assert_eq!(found.code, handle.code);
        assert_eq!(found.state.lock().await.code, handle.code);
    }

    #[test]
    fn missing_rooms_report_not_found() {
        let registry = RoomRegistry::new();
        assert!(matches!(
            registry.get("ZZZZ"),
            Err(GameError::RoomNotFound)
        ));
        assert!(!registry.has("ZZZZ"));
    }

    #[test]
    fn delete_removes_room_and_share_binding() {
        let registry = RoomRegistry::new();
        let handle = registry.create();
        let share = registry.reserve_share_code(&handle.code);
        assert_eq!(
            registry.share_code_target(&share).as_deref(),
            Some(handle.code.as_str())
        );

        registry.delete(&handle.code);
        assert!(!registry.has(&handle.code));
        assert!(registry.share_code_target(&share).is_none());
    }

    #[test]
    fn share_codes_are_unique_across_rooms() {
        let registry = RoomRegistry::new();
        let a = registry.create();
        let b = registry.create();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..20 {
            let code = registry.reserve_share_code(&a.code);
            assert!(seen.insert(code.clone()));
            let code_b = registry.reserve_share_code(&b.code);
            assert!(seen.insert(code_b));
            // Codes stay reserved until released, so draws never collide.
        }
        for code in &seen {
            registry.release_share_code(code);
        }
        assert!(registry.share_code_target(seen.iter().next().unwrap()).is_none());
    }
}
