//! The per-room authoritative state machine.
//!
//! Every mutating method is a single transition: it either commits fully or
//! returns a taxonomy error and leaves the room untouched. The command
//! dispatcher serializes calls under the per-room lock, so nothing here
//! observes a half-applied transition.

use std::collections::{BTreeSet, HashMap, HashSet};

use rand::RngExt;
use subtle::ConstantTimeEq;

use crate::error::GameError;
use crate::protocol::{
    generate_player_id, now_ms, points_for_difficulty, PlayerId, QuestionId, QuestionStage,
};
use crate::questions::{CategoryMap, Question};

use super::connections::ConnectionSet;

/// Share codes live for five minutes from issuance.
pub const SHARE_CODE_TTL_MS: i64 = 5 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub joined_at: i64,
    pub score: u32,
    pub buzzed_at: Option<i64>,
}

/// The single question currently in play in a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveQuestion {
    pub id: QuestionId,
    pub stage: QuestionStage,
    /// The player whose turn activated the question.
    pub assigned_to: Option<PlayerId>,
    /// The player the host is currently judging.
    pub answering_player_id: Option<PlayerId>,
    /// Everyone who has had a shot at this question.
    pub attempted_player_ids: BTreeSet<PlayerId>,
    /// Turn index captured at activation; finish advances from here so that
    /// mid-question `setTurn` calls do not perturb the rotation.
    pub turn_index: Option<usize>,
    /// The slot category, never the provider's returned sub-category.
    pub category: String,
    pub difficulty: String,
    pub question: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
    pub choices: Vec<String>,
    pub points: u32,
}

/// Projection of a finished question, replaced on each finish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionResult {
    pub id: QuestionId,
    pub category: String,
    pub difficulty: String,
    pub question: String,
    pub correct_answer: String,
    pub points: u32,
    pub answered_correctly: bool,
    pub answered_by: Option<PlayerId>,
    pub points_awarded: u32,
}

/// Inputs gathered under the room lock before the question fetch.
///
/// `activate` releases the lock for the provider call; committing re-checks
/// these against the live state so a concurrent transition fails cleanly
/// instead of corrupting the room.
#[derive(Debug, Clone)]
pub struct ActivationPlan {
    pub requested_category: Option<String>,
    pub provider_category: Option<String>,
    pub difficulty: Option<String>,
    pub turn_id: PlayerId,
    pub turn_index: usize,
    pub exclude_ids: HashSet<QuestionId>,
}

/// Authoritative state of one room.
pub struct RoomState {
    pub code: String,
    pub host_secret: String,
    pub created_at: i64,
    pub players: HashMap<PlayerId, Player>,
    pub turn_order: Vec<PlayerId>,
    pub current_turn_index: Option<usize>,
    pub current_turn_id: Option<PlayerId>,
    pub active_question: Option<ActiveQuestion>,
    /// Winner of the current buzz episode, if any.
    pub buzzed_by: Option<PlayerId>,
    pub last_result: Option<QuestionResult>,
    /// Ids of questions that reached a terminal result. Cancelled questions
    /// are not recorded here.
    pub used_questions: HashSet<QuestionId>,
    /// `"<category>|<difficulty>"` slots consumed at activation, including
    /// by questions that were later cancelled.
    pub used_category_slots: HashSet<String>,
    pub categories: Option<CategoryMap>,
    pub share_code: Option<String>,
    pub share_code_issued_at: Option<i64>,
    pub share_code_expires_at: Option<i64>,
    pub connections: ConnectionSet,
}

impl RoomState {
    pub fn new(code: String, host_secret: String) -> Self {
        Self {
            code,
            host_secret,
            created_at: now_ms(),
            players: HashMap::new(),
            turn_order: Vec::new(),
            current_turn_index: None,
            current_turn_id: None,
            active_question: None,
            buzzed_by: None,
            last_result: None,
            used_questions: HashSet::new(),
            used_category_slots: HashSet::new(),
            categories: None,
            share_code: None,
            share_code_issued_at: None,
            share_code_expires_at: None,
            connections: ConnectionSet::new(),
        }
    }

    /// Constant-time host-secret check.
    pub fn verify_host(&self, secret: &str) -> Result<(), GameError> {
        let matches: bool = self
            .host_secret
            .as_bytes()
            .ct_eq(secret.as_bytes())
            .into();
        if matches {
            Ok(())
        } else {
            Err(GameError::Forbidden)
        }
    }

    /// The buzzers-live flag exposed to players.
    pub fn question_active(&self) -> bool {
        matches!(
            &self.active_question,
            Some(q) if q.stage == QuestionStage::OpenForBuzz
        )
    }

    pub fn player_exists(&self, player_id: &str) -> bool {
        self.players.contains_key(player_id)
    }

    /// Append a new player and hand them the turn if nobody holds it.
    pub fn join(&mut self, name: String) -> PlayerId {
        let id = generate_player_id();
        self.players.insert(
            id.clone(),
            Player {
                id: id.clone(),
                name,
                joined_at: now_ms(),
                score: 0,
                buzzed_at: None,
            },
        );
        self.turn_order.push(id.clone());
        if self.current_turn_index.is_none() {
            self.current_turn_index = Some(0);
            self.current_turn_id = self.turn_order.first().cloned();
        }
        id
    }

    pub fn set_turn(&mut self, player_id: &str) -> Result<(), GameError> {
        let index = self
            .turn_order
            .iter()
            .position(|id| id == player_id)
            .ok_or(GameError::PlayerNotFound)?;
        self.current_turn_index = Some(index);
        self.current_turn_id = Some(player_id.to_string());
        Ok(())
    }

    /// First half of `activate`: validate preconditions and capture the
    /// inputs the provider call needs. Runs under the lock; the fetch itself
    /// happens with the lock released.
    pub fn activation_inputs(
        &self,
        requested_category: Option<String>,
        requested_difficulty: Option<String>,
    ) -> Result<ActivationPlan, GameError> {
        if self.active_question.is_some() {
            return Err(GameError::QuestionAlreadyInPlay);
        }
        let turn_id = self.current_turn_id.clone().ok_or(GameError::TurnRequired)?;
        let turn_index = self.current_turn_index.ok_or(GameError::TurnRequired)?;

        let provider_category = requested_category
            .as_deref()
            .map(|cat| self.resolve_provider_category(cat));

        Ok(ActivationPlan {
            requested_category,
            provider_category,
            difficulty: requested_difficulty,
            turn_id,
            turn_index,
            exclude_ids: self.used_questions.clone(),
        })
    }

    /// When the requested category names a known group with sub-slugs, pick
    /// one sub-slug at random as the provider category; otherwise pass the
    /// request through unchanged.
    fn resolve_provider_category(&self, requested: &str) -> String {
        if let Some(subs) = self.categories.as_ref().and_then(|c| c.get(requested)) {
            if !subs.is_empty() {
                let mut rng = rand::rng();
                let idx = rng.random_range(0..subs.len());
                if let Some(sub) = subs.get(idx) {
                    return sub.clone();
                }
            }
        }
        requested.to_string()
    }

    /// Second half of `activate`: re-validate against the live state and
    /// commit. The slot is consumed here, never before the fetch succeeded.
    pub fn commit_activation(
        &mut self,
        plan: &ActivationPlan,
        question: Question,
    ) -> Result<(), GameError> {
        if self.active_question.is_some() {
            return Err(GameError::QuestionAlreadyInPlay);
        }
        // A turn change during the in-flight fetch also aborts the commit;
        // it reports as a question conflict, same as the lost-race case.
        if self.current_turn_id.as_deref() != Some(plan.turn_id.as_str()) {
            return Err(GameError::QuestionAlreadyInPlay);
        }

        let slot_category = plan
            .requested_category
            .clone()
            .unwrap_or_else(|| question.category.clone());
        let slot_key = format!("{slot_category}|{}", question.difficulty);
        if self.used_category_slots.contains(&slot_key) {
            return Err(GameError::SlotAlreadyUsed);
        }
        self.used_category_slots.insert(slot_key);

        let points = points_for_difficulty(&question.difficulty);
        let mut choices = Vec::with_capacity(question.incorrect_answers.len() + 1);
        choices.push(question.correct_answer.clone());
        choices.extend(question.incorrect_answers.iter().cloned());
        let choices = shuffled(choices);

        let mut attempted = BTreeSet::new();
        attempted.insert(plan.turn_id.clone());

        self.active_question = Some(ActiveQuestion {
            id: question.id,
            stage: QuestionStage::AwaitingHostDecision,
            assigned_to: Some(plan.turn_id.clone()),
            answering_player_id: Some(plan.turn_id.clone()),
            attempted_player_ids: attempted,
            turn_index: Some(plan.turn_index),
            category: slot_category,
            difficulty: question.difficulty,
            question: question.text,
            correct_answer: question.correct_answer,
            incorrect_answers: question.incorrect_answers,
            choices,
            points,
        });
        self.last_result = None;
        self.buzzed_by = None;
        self.clear_buzzes();
        Ok(())
    }

    /// Release the question to the floor: any player who has not yet
    /// attempted may buzz.
    pub fn open_buzzers(&mut self) -> Result<(), GameError> {
        let active = self
            .active_question
            .as_mut()
            .ok_or(GameError::NoActiveQuestion)?;
        if active.stage == QuestionStage::OpenForBuzz {
            return Err(GameError::BuzzersAlreadyOpen);
        }
        if let Some(answering) = active.answering_player_id.take() {
            active.attempted_player_ids.insert(answering);
        }
        active.stage = QuestionStage::OpenForBuzz;
        self.buzzed_by = None;
        self.clear_buzzes();
        Ok(())
    }

    /// First serialized buzz wins; the stage flips back to host judgment so
    /// every later buzz sees a clean `BuzzNotAvailable`.
    pub fn buzz(&mut self, player_id: &str) -> Result<(), GameError> {
        if !self.players.contains_key(player_id) {
            return Err(GameError::PlayerNotFound);
        }
        let active = self
            .active_question
            .as_mut()
            .ok_or(GameError::BuzzNotAvailable)?;
        if active.stage != QuestionStage::OpenForBuzz {
            return Err(GameError::BuzzNotAvailable);
        }
        if active.attempted_player_ids.contains(player_id) {
            return Err(GameError::AlreadyAttempted);
        }

        active.attempted_player_ids.insert(player_id.to_string());
        active.answering_player_id = Some(player_id.to_string());
        active.stage = QuestionStage::AwaitingHostDecision;
        self.buzzed_by = Some(player_id.to_string());
        if let Some(player) = self.players.get_mut(player_id) {
            player.buzzed_at = Some(now_ms());
        }
        Ok(())
    }

    /// Award the active question to `explicit` or the current answerer.
    pub fn mark_correct(&mut self, explicit: Option<&str>) -> Result<(), GameError> {
        let active = self
            .active_question
            .as_ref()
            .ok_or(GameError::NoActiveQuestion)?;
        let answered_by = explicit
            .map(ToString::to_string)
            .or_else(|| active.answering_player_id.clone())
            .ok_or(GameError::NoAnsweringPlayer)?;
        if !self.players.contains_key(&answered_by) {
            return Err(GameError::PlayerNotFound);
        }

        let result = QuestionResult {
            id: active.id.clone(),
            category: active.category.clone(),
            difficulty: active.difficulty.clone(),
            question: active.question.clone(),
            correct_answer: active.correct_answer.clone(),
            points: active.points,
            answered_correctly: true,
            answered_by: Some(answered_by.clone()),
            points_awarded: active.points,
        };

        if let Some(player) = self.players.get_mut(&answered_by) {
            player.score += result.points_awarded;
        }
        self.used_questions.insert(result.id.clone());
        self.last_result = Some(result);
        self.finish();
        Ok(())
    }

    /// Judge the current answer wrong. With `open_buzzers` the question goes
    /// back to the floor, even when nobody was answering (the host's escape
    /// hatch to broaden a question); otherwise the question closes.
    pub fn mark_incorrect(&mut self, open_buzzers: bool) -> Result<(), GameError> {
        let answering = {
            let active = self
                .active_question
                .as_mut()
                .ok_or(GameError::NoActiveQuestion)?;
            let answering = active.answering_player_id.clone();
            if let Some(answering) = &answering {
                active.attempted_player_ids.insert(answering.clone());
            }
            answering
        };

        if open_buzzers {
            return self.open_buzzers();
        }

        let active = self
            .active_question
            .as_ref()
            .ok_or(GameError::NoActiveQuestion)?;
        let result = QuestionResult {
            id: active.id.clone(),
            category: active.category.clone(),
            difficulty: active.difficulty.clone(),
            question: active.question.clone(),
            correct_answer: active.correct_answer.clone(),
            points: active.points,
            answered_correctly: false,
            answered_by: answering,
            points_awarded: 0,
        };
        self.used_questions.insert(result.id.clone());
        self.last_result = Some(result);
        self.finish();
        Ok(())
    }

    /// Abandon the active question. The consumed slot stays consumed and the
    /// question id stays reusable.
    pub fn cancel(&mut self) {
        if self.active_question.is_none() {
            return;
        }
        self.active_question = None;
        self.buzzed_by = None;
        self.clear_buzzes();
    }

    /// Delete a player, splice the turn order, and scrub every reference the
    /// active question held to them.
    pub fn remove_player(&mut self, player_id: &str) -> Result<(), GameError> {
        let index = self
            .turn_order
            .iter()
            .position(|id| id == player_id)
            .ok_or(GameError::PlayerNotFound)?;
        self.players.remove(player_id);
        self.turn_order.remove(index);

        self.current_turn_index = match self.current_turn_index {
            None => None,
            Some(_) if self.turn_order.is_empty() => None,
            Some(current) if index < current => Some(current - 1),
            Some(current) if current >= self.turn_order.len() => Some(0),
            Some(current) => Some(current),
        };
        self.current_turn_id = self
            .current_turn_index
            .and_then(|i| self.turn_order.get(i).cloned());

        if let Some(active) = self.active_question.as_mut() {
            if active.assigned_to.as_deref() == Some(player_id) {
                active.assigned_to = None;
            }
            active.attempted_player_ids.remove(player_id);
            if active.answering_player_id.as_deref() == Some(player_id) {
                // The host must explicitly resolve or cancel; the question
                // stays but nobody is answering it.
                active.answering_player_id = None;
                self.buzzed_by = None;
            }
        }
        if self.buzzed_by.as_deref() == Some(player_id) {
            self.buzzed_by = None;
        }

        self.connections.drop_player_connections(player_id);
        Ok(())
    }

    /// Close out the active question and advance the turn from the index the
    /// question captured at activation.
    fn finish(&mut self) {
        let captured = self
            .active_question
            .as_ref()
            .and_then(|q| q.turn_index)
            .or(self.current_turn_index);
        self.active_question = None;
        self.buzzed_by = None;
        self.clear_buzzes();

        if self.turn_order.is_empty() {
            self.current_turn_index = None;
            self.current_turn_id = None;
            return;
        }
        let len = self.turn_order.len();
        let next = captured.map_or(0, |i| (i + 1) % len);
        self.current_turn_index = Some(next);
        self.current_turn_id = self.turn_order.get(next).cloned();
    }

    fn clear_buzzes(&mut self) {
        for player in self.players.values_mut() {
            player.buzzed_at = None;
        }
    }

    /// Lazily expire a stale share code. Returns the purged code so the
    /// caller can drop it from the share index.
    pub fn cleanup_share_code(&mut self, now: i64) -> Option<String> {
        match self.share_code_expires_at {
            Some(expires_at) if expires_at <= now => {
                let code = self.share_code.take();
                self.share_code_issued_at = None;
                self.share_code_expires_at = None;
                code
            }
            _ => None,
        }
    }

    /// Install a freshly drawn share code. Returns its expiry timestamp.
    pub fn set_share_code(&mut self, code: String, now: i64) -> i64 {
        let expires_at = now + SHARE_CODE_TTL_MS;
        self.share_code = Some(code);
        self.share_code_issued_at = Some(now);
        self.share_code_expires_at = Some(expires_at);
        expires_at
    }

    /// Whether the room should be dropped from the registry.
    pub fn is_abandoned(&self) -> bool {
        self.players.is_empty() && self.connections.is_empty()
    }
}

fn shuffled(mut items: Vec<String>) -> Vec<String> {
    let mut rng = rand::rng();
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..i + 1);
        items.swap(i, j);
    }
    items
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn test_room() -> RoomState {
        RoomState::new("ABCD".to_string(), "super-secret-host-token".to_string())
    }

    pub fn question(id: &str, category: &str, difficulty: &str) -> Question {
        Question {
            id: id.to_string(),
            category: category.to_string(),
            difficulty: difficulty.to_string(),
            text: format!("Question {id}?"),
            correct_answer: "42".to_string(),
            incorrect_answers: vec!["7".to_string(), "12".to_string(), "99".to_string()],
        }
    }

    /// Drive a full activation for tests that do not care about the split.
    pub fn activate(
        room: &mut RoomState,
        category: Option<&str>,
        q: Question,
    ) -> Result<(), GameError> {
        let plan = room.activation_inputs(
            category.map(ToString::to_string),
            Some(q.difficulty.clone()),
        )?;
        room.commit_activation(&plan, q)
    }

    pub fn assert_invariants(room: &RoomState) {
        // Turn order mirrors the player set exactly.
        let order: std::collections::HashSet<_> = room.turn_order.iter().cloned().collect();
        assert_eq!(order.len(), room.turn_order.len(), "duplicate turn entries");
        assert_eq!(order.len(), room.players.len(), "turn order out of sync");
        for id in &room.turn_order {
            assert!(room.players.contains_key(id), "dangling turn id {id}");
        }

        // Current turn resolves through the order.
        match (&room.current_turn_id, room.current_turn_index) {
            (None, _) => assert!(room.turn_order.is_empty() || room.current_turn_index.is_none()),
            (Some(id), Some(index)) => {
                assert_eq!(room.turn_order.get(index), Some(id));
                assert!(room.players.contains_key(id));
            }
            (Some(_), None) => panic!("turn id without index"),
        }

        if let Some(active) = &room.active_question {
            // Buzzers-live flag tracks the stage.
            assert_eq!(
                room.question_active(),
                active.stage == QuestionStage::OpenForBuzz
            );
            if active.stage == QuestionStage::OpenForBuzz {
                assert!(active.answering_player_id.is_none());
            }
            if let Some(answering) = &active.answering_player_id {
                assert!(
                    active.attempted_player_ids.contains(answering),
                    "answerer not in attempted set"
                );
            }
            // The active question's slot was consumed at activation.
            let slot = format!("{}|{}", active.category, active.difficulty);
            assert!(room.used_category_slots.contains(&slot));
        } else {
            assert!(!room.question_active());
        }
    }
}
