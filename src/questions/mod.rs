//! Trivia question sourcing.
//!
//! The room core depends only on the [`QuestionSource`] trait; the real
//! implementation ([`trivia_api::TriviaApiSource`]) talks to an upstream
//! HTTP provider and falls back to an embedded local set when the upstream
//! is unreachable or keeps returning already-used questions.

pub mod fallback;
pub mod trivia_api;

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use thiserror::Error;

use crate::protocol::QuestionId;

pub use trivia_api::TriviaApiSource;

/// A single trivia question, normalized from whichever source produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub category: String,
    pub difficulty: String,
    pub text: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
}

/// Filters for a question fetch.
#[derive(Debug, Clone, Default)]
pub struct QuestionRequest {
    /// Provider category slug. For grouped categories the caller has already
    /// resolved the group to one of its sub-slugs.
    pub category: Option<String>,
    pub difficulty: Option<String>,
    /// Question ids that must not be returned again.
    pub exclude_ids: HashSet<QuestionId>,
}

#[derive(Debug, Error)]
pub enum QuestionSourceError {
    /// The upstream provider could not be reached or answered garbage.
    #[error("question provider unavailable: {0}")]
    Unavailable(String),
    /// Neither upstream nor the local fallback had an unused question left.
    #[error("no unused question available")]
    Exhausted,
}

/// Map of category group (slugified) to its provider sub-category slugs.
pub type CategoryMap = BTreeMap<String, Vec<String>>;

/// Upstream trivia provider as seen by the room core.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn fetch_categories(&self) -> Result<CategoryMap, QuestionSourceError>;

    async fn fetch_question(
        &self,
        request: &QuestionRequest,
    ) -> Result<Question, QuestionSourceError>;
}

/// Slugify a category label: lowercase, `&` becomes `and`, every other
/// non-alphanumeric run collapses to a single `_`, trimmed at both ends.
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    for ch in label.to_lowercase().chars() {
        if ch == '&' {
            if !slug.is_empty() && !slug.ends_with('_') {
                slug.push('_');
            }
            slug.push_str("and");
        } else if ch.is_alphanumeric() {
            slug.push(ch);
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}
