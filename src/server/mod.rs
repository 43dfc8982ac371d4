//! Command dispatch: the sole path by which external commands reach a room.
//!
//! Every mutating operation runs under the target room's lock, so all
//! transitions of one room form a single total order while different rooms
//! proceed fully in parallel. Broadcast payloads are collected under the
//! lock and written after it is released; a slow or dead peer can never
//! stall a transition.

pub mod registry;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::GameError;
use crate::protocol::{
    is_share_code, now_ms, validate_player_name, ConnectionRole, PlayerId, ServerEvent,
};
use crate::questions::{QuestionRequest, QuestionSource, QuestionSourceError};
use crate::room::{ConnectionId, RoomSnapshot, StateSink};

pub use registry::{RoomHandle, RoomRegistry};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRoom {
    pub code: String,
    pub host_secret: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedRoom {
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareIssued {
    pub share_code: String,
    pub expires_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareClaimed {
    pub code: String,
    pub host_secret: String,
    pub expires_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomListEntry {
    pub code: String,
    pub created_at: i64,
    pub player_count: usize,
    pub question_active: bool,
    pub host_online: bool,
    pub share_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_expires_at: Option<i64>,
}

/// How a question was judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkResult {
    Correct,
    Incorrect,
}

pub struct GameServer {
    config: Arc<Config>,
    registry: RoomRegistry,
    questions: Arc<dyn QuestionSource>,
}

impl GameServer {
    pub fn new(config: Arc<Config>, questions: Arc<dyn QuestionSource>) -> Arc<Self> {
        Arc::new(Self {
            config,
            registry: RoomRegistry::new(),
            questions,
        })
    }

    /// Create a room and best-effort preload its category map. A provider
    /// failure is logged and leaves categories absent; it never fails the
    /// room creation itself.
    pub async fn create_room(&self) -> CreatedRoom {
        let handle = self.registry.create();

        let categories = timeout(
            self.question_fetch_timeout(),
            self.questions.fetch_categories(),
        )
        .await;
        match categories {
            Ok(Ok(map)) => {
                let mut room = handle.state.lock().await;
                room.categories = Some(map);
            }
            Ok(Err(err)) => {
                warn!(room_code = %handle.code, error = %err, "Category preload failed");
            }
            Err(_) => {
                warn!(room_code = %handle.code, "Category preload timed out");
            }
        }

        let room = handle.state.lock().await;
        info!(room_code = %handle.code, "Room created");
        CreatedRoom {
            code: room.code.clone(),
            host_secret: room.host_secret.clone(),
        }
    }

    /// Project every room for the lobby listing, newest first.
    pub async fn list_rooms(&self) -> Vec<RoomListEntry> {
        let mut entries = Vec::new();
        for handle in self.registry.values() {
            let mut room = handle.state.lock().await;
            if let Some(purged) = room.cleanup_share_code(now_ms()) {
                self.registry.release_share_code(&purged);
            }
            entries.push(RoomListEntry {
                code: room.code.clone(),
                created_at: room.created_at,
                player_count: room.players.len(),
                question_active: room.question_active(),
                host_online: room.connections.has_host(),
                share_active: room.share_code.is_some(),
                share_expires_at: room.share_code_expires_at,
            });
        }
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries
    }

    /// Role-independent read. Served as the player-role projection so an
    /// unauthenticated spectator can never see answers or share digits.
    pub async fn snapshot(&self, code: &str) -> Result<RoomSnapshot, GameError> {
        let handle = self.registry.get(code)?;
        let mut room = handle.state.lock().await;
        if let Some(purged) = room.cleanup_share_code(now_ms()) {
            self.registry.release_share_code(&purged);
        }
        Ok(RoomSnapshot::project(&room, ConnectionRole::Player))
    }

    pub async fn join(&self, code: &str, name: &str) -> Result<JoinedRoom, GameError> {
        let name = validate_player_name(name)?;
        let handle = self.registry.get(code)?;
        let player_id = {
            let mut room = handle.state.lock().await;
            room.join(name)
        };
        info!(room_code = %handle.code, %player_id, "Player joined");
        self.broadcast(&handle).await;
        Ok(JoinedRoom { player_id })
    }

    /// Pure lookup used to authenticate a returning player.
    pub async fn reconnect(&self, code: &str, player_id: &str) -> Result<(), GameError> {
        let handle = self.registry.get(code)?;
        let room = handle.state.lock().await;
        if room.player_exists(player_id) {
            Ok(())
        } else {
            Err(GameError::PlayerNotFound)
        }
    }

    pub async fn leave(&self, code: &str, player_id: &str) -> Result<(), GameError> {
        let handle = self.registry.get(code)?;
        let abandoned = {
            let mut room = handle.state.lock().await;
            room.remove_player(player_id)?;
            room.is_abandoned()
        };
        info!(room_code = %handle.code, %player_id, "Player left");
        if abandoned {
            self.registry.delete(&handle.code);
            return Ok(());
        }
        self.broadcast(&handle).await;
        Ok(())
    }

    /// Tear the room down and tell every connection why, exactly once.
    pub async fn destroy(&self, code: &str, host_secret: &str) -> Result<(), GameError> {
        let handle = self.registry.get(code)?;
        let connections = {
            let room = handle.state.lock().await;
            room.verify_host(host_secret)?;
            room.connections.collect()
        };
        self.registry.delete(&handle.code);
        info!(room_code = %handle.code, "Room destroyed by host");
        for connection in connections {
            connection
                .sink
                .send(ServerEvent::error("Session closed by host"));
            connection.sink.close();
        }
        Ok(())
    }

    pub async fn set_turn(
        &self,
        code: &str,
        host_secret: &str,
        player_id: &str,
    ) -> Result<(), GameError> {
        let handle = self.registry.get(code)?;
        {
            let mut room = handle.state.lock().await;
            room.verify_host(host_secret)?;
            room.set_turn(player_id)?;
        }
        self.broadcast(&handle).await;
        Ok(())
    }

    /// Activate a question. The provider call happens with the room lock
    /// released; committing re-validates the captured preconditions.
    pub async fn activate(
        &self,
        code: &str,
        host_secret: &str,
        category: Option<String>,
        difficulty: Option<String>,
    ) -> Result<(), GameError> {
        let handle = self.registry.get(code)?;
        let plan = {
            let room = handle.state.lock().await;
            room.verify_host(host_secret)?;
            room.activation_inputs(category, difficulty)?
        };

        let request = QuestionRequest {
            category: plan.provider_category.clone(),
            difficulty: plan.difficulty.clone(),
            exclude_ids: plan.exclude_ids.clone(),
        };
        let question = match timeout(
            self.question_fetch_timeout(),
            self.questions.fetch_question(&request),
        )
        .await
        {
            Ok(Ok(question)) => question,
            Ok(Err(QuestionSourceError::Exhausted)) => {
                return Err(GameError::UniqueQuestionUnavailable)
            }
            Ok(Err(QuestionSourceError::Unavailable(err))) => {
                warn!(room_code = %handle.code, error = %err, "Question fetch failed");
                return Err(GameError::QuestionProviderUnavailable);
            }
            Err(_) => {
                warn!(room_code = %handle.code, "Question fetch timed out");
                return Err(GameError::QuestionProviderUnavailable);
            }
        };

        {
            let mut room = handle.state.lock().await;
            room.commit_activation(&plan, question)?;
        }
        debug!(room_code = %handle.code, "Question activated");
        self.broadcast(&handle).await;
        Ok(())
    }

    pub async fn open_buzzers(&self, code: &str, host_secret: &str) -> Result<(), GameError> {
        let handle = self.registry.get(code)?;
        {
            let mut room = handle.state.lock().await;
            room.verify_host(host_secret)?;
            room.open_buzzers()?;
        }
        self.broadcast(&handle).await;
        Ok(())
    }

    pub async fn buzz(&self, code: &str, player_id: &str) -> Result<(), GameError> {
        let handle = self.registry.get(code)?;
        {
            let mut room = handle.state.lock().await;
            room.buzz(player_id)?;
        }
        debug!(room_code = %handle.code, %player_id, "Buzz accepted");
        self.broadcast(&handle).await;
        Ok(())
    }

    pub async fn mark(
        &self,
        code: &str,
        host_secret: &str,
        result: MarkResult,
        player_id: Option<&str>,
        open_buzzers: bool,
    ) -> Result<(), GameError> {
        let handle = self.registry.get(code)?;
        {
            let mut room = handle.state.lock().await;
            room.verify_host(host_secret)?;
            match result {
                MarkResult::Correct => room.mark_correct(player_id)?,
                MarkResult::Incorrect => room.mark_incorrect(open_buzzers)?,
            }
        }
        self.broadcast(&handle).await;
        Ok(())
    }

    pub async fn cancel(&self, code: &str, host_secret: &str) -> Result<(), GameError> {
        let handle = self.registry.get(code)?;
        {
            let mut room = handle.state.lock().await;
            room.verify_host(host_secret)?;
            room.cancel();
        }
        self.broadcast(&handle).await;
        Ok(())
    }

    /// Issue a fresh share code, replacing any current one.
    pub async fn issue_share(
        &self,
        code: &str,
        host_secret: &str,
    ) -> Result<ShareIssued, GameError> {
        let handle = self.registry.get(code)?;
        let issued = {
            let mut room = handle.state.lock().await;
            room.verify_host(host_secret)?;
            let now = now_ms();
            if let Some(previous) = room.share_code.take() {
                self.registry.release_share_code(&previous);
            }
            room.share_code_issued_at = None;
            room.share_code_expires_at = None;
            let share_code = self.registry.reserve_share_code(&room.code);
            let expires_at = room.set_share_code(share_code.clone(), now);
            ShareIssued {
                share_code,
                expires_at,
            }
        };
        info!(room_code = %handle.code, "Share code issued");
        self.broadcast(&handle).await;
        Ok(issued)
    }

    /// Redeem a share code for the room's host credentials.
    pub async fn claim_share(&self, share_code: &str) -> Result<ShareClaimed, GameError> {
        if !is_share_code(share_code) {
            return Err(GameError::InvalidShareCode);
        }
        let Some(room_code) = self.registry.share_code_target(share_code) else {
            return Err(GameError::ShareCodeNotFound);
        };
        let Ok(handle) = self.registry.get(&room_code) else {
            self.registry.release_share_code(share_code);
            return Err(GameError::ShareCodeNotFound);
        };

        let mut room = handle.state.lock().await;
        if let Some(purged) = room.cleanup_share_code(now_ms()) {
            self.registry.release_share_code(&purged);
        }
        if room.share_code.as_deref() != Some(share_code) {
            // Stale binding from a superseded or expired issuance.
            self.registry.release_share_code(share_code);
            return Err(GameError::ShareCodeNotFound);
        }
        let expires_at = room
            .share_code_expires_at
            .ok_or(GameError::ShareCodeNotFound)?;
        Ok(ShareClaimed {
            code: room.code.clone(),
            host_secret: room.host_secret.clone(),
            expires_at,
        })
    }

    /// Attach an authenticated connection and return its initial snapshot.
    pub async fn register_connection(
        &self,
        code: &str,
        role: ConnectionRole,
        host_secret: Option<&str>,
        player_id: Option<&str>,
        sink: Arc<dyn StateSink>,
    ) -> Result<(ConnectionId, RoomSnapshot), GameError> {
        let handle = self.registry.get(code)?;
        let mut room = handle.state.lock().await;
        let player_id = match role {
            ConnectionRole::Host => {
                let secret = host_secret.ok_or(GameError::Forbidden)?;
                room.verify_host(secret)?;
                None
            }
            ConnectionRole::Player => {
                let id = player_id.ok_or(GameError::PlayerNotFound)?;
                if !room.player_exists(id) {
                    return Err(GameError::PlayerNotFound);
                }
                Some(id.to_string())
            }
        };
        let connection_id = room.connections.add(role, player_id, sink);
        if let Some(purged) = room.cleanup_share_code(now_ms()) {
            self.registry.release_share_code(&purged);
        }
        let snapshot = RoomSnapshot::project(&room, role);
        Ok((connection_id, snapshot))
    }

    /// Detach a connection. Drops the room once it holds neither players nor
    /// connections.
    pub async fn unregister_connection(&self, code: &str, connection_id: ConnectionId) {
        let Ok(handle) = self.registry.get(code) else {
            return;
        };
        let abandoned = {
            let mut room = handle.state.lock().await;
            room.connections.remove(connection_id);
            room.is_abandoned()
        };
        if abandoned {
            self.registry.delete(&handle.code);
            info!(room_code = %handle.code, "Room removed after last connection dropped");
        }
    }

    /// Fan the post-transition state out to every connection. Snapshots and
    /// sink handles are collected under the lock; writes happen outside it
    /// and a dead sink only ever removes itself.
    pub async fn broadcast(&self, handle: &Arc<RoomHandle>) {
        let (targets, host_snapshot, player_snapshot) = {
            let mut room = handle.state.lock().await;
            if let Some(purged) = room.cleanup_share_code(now_ms()) {
                self.registry.release_share_code(&purged);
            }
            let targets = room.connections.collect();
            if targets.is_empty() {
                return;
            }
            let host = RoomSnapshot::project(&room, ConnectionRole::Host);
            let player = RoomSnapshot::project(&room, ConnectionRole::Player);
            (targets, host, player)
        };

        let mut dead = Vec::new();
        for connection in &targets {
            let payload = match connection.role {
                ConnectionRole::Host => host_snapshot.clone(),
                ConnectionRole::Player => player_snapshot.clone(),
            };
            if !connection.sink.send(ServerEvent::State { payload }) {
                dead.push(connection.id);
            }
        }

        if !dead.is_empty() {
            let abandoned = {
                let mut room = handle.state.lock().await;
                for id in dead {
                    room.connections.remove(id);
                }
                room.is_abandoned()
            };
            if abandoned {
                self.registry.delete(&handle.code);
            }
        }
    }

    /// Periodic sweep for rooms that were created but never joined. Rooms
    /// with players or connections are left alone; event-driven removal on
    /// leave and disconnect handles those.
    pub async fn cleanup_task(self: Arc<Self>) {
        let interval = Duration::from_secs(self.config.server.sweep_interval_secs);
        let max_idle_ms = i64::try_from(self.config.server.empty_room_timeout_secs)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let now = now_ms();
            for handle in self.registry.values() {
                let abandoned = {
                    let room = handle.state.lock().await;
                    room.is_abandoned() && now.saturating_sub(room.created_at) > max_idle_ms
                };
                if abandoned {
                    self.registry.delete(&handle.code);
                    info!(room_code = %handle.code, "Swept abandoned room");
                }
            }
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    fn question_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.config.server.question_fetch_timeout_secs)
    }
}
