//! Role-aware projections of room state.
//!
//! A snapshot is what a connection sees after every transition. Hosts get
//! the correct answer, the choice list and the share-code digits; players
//! only ever learn that a share is active and which ids already attempted.
//! Every cross-reference resolves through [`RoomSnapshot::player_ref`] so a
//! player who left can never appear as a dangling id.

use serde::Serialize;

use crate::protocol::{ConnectionRole, PlayerId, QuestionStage};
use crate::questions::CategoryMap;

use super::state::RoomState;

/// Which sensitive fields the consumer is allowed to see.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotOptions {
    pub include_correct_answer: bool,
    pub include_share_code: bool,
}

impl SnapshotOptions {
    pub fn for_role(role: ConnectionRole) -> Self {
        match role {
            ConnectionRole::Host => Self {
                include_correct_answer: true,
                include_share_code: true,
            },
            ConnectionRole::Player => Self {
                include_correct_answer: false,
                include_share_code: false,
            },
        }
    }
}

/// `{playerId, name}` pair used for every cross-reference.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRef {
    pub player_id: PlayerId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub player_id: PlayerId,
    pub name: String,
    pub score: u32,
    pub joined_at: i64,
    pub is_turn: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buzzed_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveQuestionSnapshot {
    pub id: String,
    pub stage: QuestionStage,
    pub category: String,
    pub difficulty: String,
    pub question: String,
    pub points: u32,
    pub assigned_to: Option<PlayerRef>,
    pub answering_player: Option<PlayerRef>,
    pub attempted_player_ids: Vec<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResultSnapshot {
    pub id: String,
    pub category: String,
    pub difficulty: String,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    pub points: u32,
    pub answered_correctly: bool,
    pub answered_by: Option<PlayerRef>,
    pub points_awarded: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub code: String,
    pub created_at: i64,
    pub players: Vec<PlayerSnapshot>,
    pub current_turn: Option<PlayerRef>,
    pub question_active: bool,
    pub active_question: Option<ActiveQuestionSnapshot>,
    pub buzzed_by: Option<PlayerRef>,
    pub last_result: Option<QuestionResultSnapshot>,
    pub used_category_slots: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<CategoryMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_code_issued_at: Option<i64>,
    /// Present for every role so players learn a share is active without
    /// learning the digits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_code_expires_at: Option<i64>,
}

impl RoomSnapshot {
    /// Project the current room state for one role. The caller has already
    /// expired any stale share code.
    pub fn project(room: &RoomState, role: ConnectionRole) -> Self {
        Self::project_with(room, SnapshotOptions::for_role(role))
    }

    pub fn project_with(room: &RoomState, options: SnapshotOptions) -> Self {
        let players = room
            .turn_order
            .iter()
            .filter_map(|id| room.players.get(id))
            .map(|player| PlayerSnapshot {
                player_id: player.id.clone(),
                name: player.name.clone(),
                score: player.score,
                joined_at: player.joined_at,
                is_turn: room.current_turn_id.as_ref() == Some(&player.id),
                buzzed_at: player.buzzed_at,
            })
            .collect();

        let active_question = room.active_question.as_ref().map(|active| {
            ActiveQuestionSnapshot {
                id: active.id.clone(),
                stage: active.stage,
                category: active.category.clone(),
                difficulty: active.difficulty.clone(),
                question: active.question.clone(),
                points: active.points,
                assigned_to: active
                    .assigned_to
                    .as_deref()
                    .and_then(|id| Self::resolve(room, id)),
                answering_player: active
                    .answering_player_id
                    .as_deref()
                    .and_then(|id| Self::resolve(room, id)),
                attempted_player_ids: active.attempted_player_ids.iter().cloned().collect(),
                choices: options
                    .include_correct_answer
                    .then(|| active.choices.clone()),
                correct_answer: options
                    .include_correct_answer
                    .then(|| active.correct_answer.clone()),
            }
        });

        let last_result = room.last_result.as_ref().map(|result| QuestionResultSnapshot {
            id: result.id.clone(),
            category: result.category.clone(),
            difficulty: result.difficulty.clone(),
            question: result.question.clone(),
            correct_answer: options
                .include_correct_answer
                .then(|| result.correct_answer.clone()),
            points: result.points,
            answered_correctly: result.answered_correctly,
            answered_by: result
                .answered_by
                .as_deref()
                .and_then(|id| Self::resolve(room, id)),
            points_awarded: result.points_awarded,
        });

        let mut used_category_slots: Vec<String> =
            room.used_category_slots.iter().cloned().collect();
        used_category_slots.sort();

        Self {
            code: room.code.clone(),
            created_at: room.created_at,
            players,
            current_turn: room
                .current_turn_id
                .as_deref()
                .and_then(|id| Self::resolve(room, id)),
            question_active: room.question_active(),
            active_question,
            buzzed_by: room
                .buzzed_by
                .as_deref()
                .and_then(|id| Self::resolve(room, id)),
            last_result,
            used_category_slots,
            categories: room.categories.clone(),
            share_code: options
                .include_share_code
                .then(|| room.share_code.clone())
                .flatten(),
            share_code_issued_at: options
                .include_share_code
                .then_some(room.share_code_issued_at)
                .flatten(),
            share_code_expires_at: room.share_code_expires_at,
        }
    }

    fn resolve(room: &RoomState, player_id: &str) -> Option<PlayerRef> {
        room.players.get(player_id).map(|player| PlayerRef {
            player_id: player.id.clone(),
            name: player.name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::state::test_support::{activate, question, test_room};

    #[test]
    fn host_sees_answer_and_choices_players_do_not() {
        let mut room = test_room();
        room.join("Alice".to_string());
        room.join("Bob".to_string());
        activate(&mut room, Some("science"), question("Q1", "science", "medium")).unwrap();

        let host = RoomSnapshot::project(&room, ConnectionRole::Host);
        let player = RoomSnapshot::project(&room, ConnectionRole::Player);

        let host_q = host.active_question.as_ref().unwrap();
        assert_eq!(host_q.correct_answer.as_deref(), Some("42"));
        assert_eq!(host_q.choices.as_ref().map(Vec::len), Some(4));

        let player_q = player.active_question.as_ref().unwrap();
        assert!(player_q.correct_answer.is_none());
        assert!(player_q.choices.is_none());
        assert_eq!(player_q.attempted_player_ids.len(), 1);

        // Serialized form must not even carry the keys.
        let json = serde_json::to_value(&player).unwrap();
        let active = &json["activeQuestion"];
        assert!(active.get("correctAnswer").is_none());
        assert!(active.get("choices").is_none());
    }

    #[test]
    fn share_digits_are_host_only_but_expiry_is_public() {
        let mut room = test_room();
        room.join("Alice".to_string());
        room.set_share_code("7421".to_string(), 1_000);

        let host = RoomSnapshot::project(&room, ConnectionRole::Host);
        assert_eq!(host.share_code.as_deref(), Some("7421"));
        assert_eq!(host.share_code_issued_at, Some(1_000));
        assert!(host.share_code_expires_at.is_some());

        let player = RoomSnapshot::project(&room, ConnectionRole::Player);
        assert!(player.share_code.is_none());
        assert!(player.share_code_issued_at.is_none());
        assert_eq!(player.share_code_expires_at, host.share_code_expires_at);

        let json = serde_json::to_value(&player).unwrap();
        assert!(json.get("shareCode").is_none());
        assert!(json.get("shareCodeIssuedAt").is_none());
        assert!(json.get("shareCodeExpiresAt").is_some());
    }

    #[test]
    fn is_turn_flags_exactly_one_player() {
        let mut room = test_room();
        let alice = room.join("Alice".to_string());
        room.join("Bob".to_string());

        let snapshot = RoomSnapshot::project(&room, ConnectionRole::Player);
        let turns: Vec<_> = snapshot.players.iter().filter(|p| p.is_turn).collect();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].player_id, alice);
        assert_eq!(
            snapshot.current_turn.as_ref().map(|r| r.player_id.as_str()),
            Some(alice.as_str())
        );
    }

    #[test]
    fn last_result_answer_is_host_only() {
        let mut room = test_room();
        room.join("Alice".to_string());
        activate(&mut room, Some("science"), question("Q1", "science", "medium")).unwrap();
        room.mark_correct(None).unwrap();

        let host = RoomSnapshot::project(&room, ConnectionRole::Host);
        assert_eq!(
            host.last_result.as_ref().unwrap().correct_answer.as_deref(),
            Some("42")
        );

        let player = RoomSnapshot::project(&room, ConnectionRole::Player);
        let result = player.last_result.as_ref().unwrap();
        assert!(result.correct_answer.is_none());
        assert!(result.answered_correctly);

        let json = serde_json::to_value(&player).unwrap();
        assert!(json["lastResult"].get("correctAnswer").is_none());
    }

    #[test]
    fn departed_players_resolve_to_null_not_dangling_ids() {
        let mut room = test_room();
        room.join("Alice".to_string());
        let bob = room.join("Bob".to_string());
        activate(&mut room, None, question("Q1", "science", "easy")).unwrap();
        room.open_buzzers().unwrap();
        room.buzz(&bob).unwrap();
        room.mark_incorrect(false).unwrap();
        // Bob answered Q1 and then leaves; the stored result still names him.
        room.remove_player(&bob).unwrap();

        let snapshot = RoomSnapshot::project(&room, ConnectionRole::Host);
        let result = snapshot.last_result.as_ref().unwrap();
        assert!(result.answered_by.is_none());
        assert!(!result.answered_correctly);
    }

    #[test]
    fn snapshot_is_idempotent_without_transitions() {
        let mut room = test_room();
        room.join("Alice".to_string());
        room.join("Bob".to_string());
        activate(&mut room, Some("history"), question("Q1", "history", "hard")).unwrap();

        let first = RoomSnapshot::project(&room, ConnectionRole::Host);
        let second = RoomSnapshot::project(&room, ConnectionRole::Host);
        assert_eq!(first, second);
    }

    #[test]
    fn used_slots_are_sorted_for_stable_output() {
        let mut room = test_room();
        room.join("Alice".to_string());
        room.used_category_slots.insert("science|medium".to_string());
        room.used_category_slots.insert("history|hard".to_string());
        room.used_category_slots.insert("art|easy".to_string());

        let snapshot = RoomSnapshot::project(&room, ConnectionRole::Player);
        assert_eq!(
            snapshot.used_category_slots,
            vec!["art|easy", "history|hard", "science|medium"]
        );
    }
}
