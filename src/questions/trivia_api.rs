//! HTTP client for the upstream trivia provider.
//!
//! Fetches single questions and the category map from a Trivia-API-compatible
//! endpoint. Every question fetch makes up to three upstream attempts,
//! discarding any attempt that returns an already-used id, and falls back to
//! the embedded local set when the upstream misbehaves.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{fallback, slugify, CategoryMap, Question, QuestionRequest, QuestionSource};
use super::QuestionSourceError;

const UPSTREAM_ATTEMPTS: usize = 3;

/// Provider wire format: question payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiQuestion {
    id: String,
    category: String,
    difficulty: String,
    question: ApiQuestionText,
    correct_answer: String,
    incorrect_answers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ApiQuestionText {
    text: String,
}

impl ApiQuestion {
    fn into_question(self) -> Question {
        Question {
            id: self.id,
            category: slugify(&self.category),
            difficulty: self.difficulty,
            text: self.question.text,
            correct_answer: self.correct_answer,
            incorrect_answers: self.incorrect_answers,
        }
    }
}

/// Reqwest-backed [`QuestionSource`] implementation.
pub struct TriviaApiSource {
    client: Client,
    base_url: String,
}

impl TriviaApiSource {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_one_upstream(
        &self,
        request: &QuestionRequest,
    ) -> Result<Question, QuestionSourceError> {
        let url = format!("{}/questions", self.base_url);
        let mut query: Vec<(&str, String)> = vec![("limit", "1".to_string())];
        if let Some(category) = &request.category {
            query.push(("categories", category.clone()));
        }
        if let Some(difficulty) = &request.difficulty {
            query.push(("difficulties", difficulty.clone()));
        }

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| QuestionSourceError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(QuestionSourceError::Unavailable(format!(
                "provider returned {}",
                response.status()
            )));
        }

        let mut questions: Vec<ApiQuestion> = response
            .json()
            .await
            .map_err(|e| QuestionSourceError::Unavailable(e.to_string()))?;

        match questions.pop() {
            Some(q) => Ok(q.into_question()),
            None => Err(QuestionSourceError::Unavailable(
                "provider returned an empty batch".to_string(),
            )),
        }
    }
}

#[async_trait]
impl QuestionSource for TriviaApiSource {
    async fn fetch_categories(&self) -> Result<CategoryMap, QuestionSourceError> {
        let url = format!("{}/categories", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| QuestionSourceError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(QuestionSourceError::Unavailable(format!(
                "provider returned {}",
                response.status()
            )));
        }

        let raw: BTreeMap<String, Vec<String>> = response
            .json()
            .await
            .map_err(|e| QuestionSourceError::Unavailable(e.to_string()))?;

        Ok(raw
            .into_iter()
            .map(|(group, subs)| (slugify(&group), subs))
            .collect())
    }

    async fn fetch_question(
        &self,
        request: &QuestionRequest,
    ) -> Result<Question, QuestionSourceError> {
        for attempt in 1..=UPSTREAM_ATTEMPTS {
            match self.fetch_one_upstream(request).await {
                Ok(question) if !request.exclude_ids.contains(&question.id) => {
                    return Ok(question);
                }
                Ok(question) => {
                    debug!(
                        question_id = %question.id,
                        attempt,
                        "Provider repeated an already-used question"
                    );
                }
                Err(err) => {
                    warn!(attempt, error = %err, "Question fetch attempt failed");
                }
            }
        }

        warn!("Falling back to the embedded question set");
        fallback::pick(request).ok_or(QuestionSourceError::Exhausted)
    }
}
