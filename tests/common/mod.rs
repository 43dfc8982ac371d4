//! Shared helpers for integration tests: a scriptable question source and an
//! in-memory recorder sink standing in for the WebSocket transport.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use buzzer_server::config::Config;
use buzzer_server::protocol::ServerEvent;
use buzzer_server::questions::{
    CategoryMap, Question, QuestionRequest, QuestionSource, QuestionSourceError,
};
use buzzer_server::room::StateSink;
use buzzer_server::server::GameServer;

/// Question source fed from a script of canned questions.
#[derive(Default)]
pub struct FakeQuestionSource {
    queue: Mutex<VecDeque<Question>>,
    categories: Mutex<CategoryMap>,
    pub fail_categories: Mutex<bool>,
}

impl FakeQuestionSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, question: Question) {
        self.queue.lock().unwrap().push_back(question);
    }

    pub fn set_categories(&self, categories: CategoryMap) {
        *self.categories.lock().unwrap() = categories;
    }
}

#[async_trait]
impl QuestionSource for FakeQuestionSource {
    async fn fetch_categories(&self) -> Result<CategoryMap, QuestionSourceError> {
        if *self.fail_categories.lock().unwrap() {
            return Err(QuestionSourceError::Unavailable("scripted outage".into()));
        }
        Ok(self.categories.lock().unwrap().clone())
    }

    async fn fetch_question(
        &self,
        request: &QuestionRequest,
    ) -> Result<Question, QuestionSourceError> {
        let mut queue = self.queue.lock().unwrap();
        while let Some(question) = queue.pop_front() {
            if !request.exclude_ids.contains(&question.id) {
                return Ok(question);
            }
        }
        Err(QuestionSourceError::Exhausted)
    }
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

/// Recorder sink: collects every event a connection would have been sent.
#[derive(Default)]
pub struct RecorderSink {
    events: Mutex<Vec<ServerEvent>>,
    closed: Mutex<bool>,
}

impl RecorderSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn recorded(&self) -> Vec<ServerEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn last_state(&self) -> Option<ServerEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|e| matches!(e, ServerEvent::State { .. }))
            .cloned()
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

pub fn test_server(questions: Arc<FakeQuestionSource>) -> Arc<GameServer> {
    let mut config = Config::default();
    config.server.question_fetch_timeout_secs = 2;
    GameServer::new(Arc::new(config), questions)
}
