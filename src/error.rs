use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Closed error taxonomy for every room transition.
///
/// Every mutating operation either commits fully or fails with one of these
/// and leaves the room untouched. The boundary layers translate variants to
/// HTTP statuses ([`GameError::status_code`]) or WebSocket error frames.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("Room not found")]
    RoomNotFound,
    #[error("Invalid host secret")]
    Forbidden,
    #[error("Player not found")]
    PlayerNotFound,
    #[error("A question is already in play")]
    QuestionAlreadyInPlay,
    #[error("No active question")]
    NoActiveQuestion,
    #[error("Buzzers are already open")]
    BuzzersAlreadyOpen,
    #[error("Buzzing is not available right now")]
    BuzzNotAvailable,
    #[error("You already had a shot at this question")]
    AlreadyAttempted,
    #[error("No player is currently answering")]
    NoAnsweringPlayer,
    #[error("Set a player's turn before activating a question")]
    TurnRequired,
    #[error("That category and difficulty has already been played")]
    SlotAlreadyUsed,
    #[error("No unused question is available for this selection")]
    UniqueQuestionUnavailable,
    #[error("The question provider is unavailable")]
    QuestionProviderUnavailable,
    #[error("Share code must be exactly 4 digits")]
    InvalidShareCode,
    #[error("Share code not found")]
    ShareCodeNotFound,
    #[error("{0}")]
    Validation(String),
    #[error("Unexpected error")]
    Internal,
}

impl GameError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RoomNotFound | Self::PlayerNotFound | Self::ShareCodeNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::QuestionAlreadyInPlay
            | Self::NoActiveQuestion
            | Self::BuzzersAlreadyOpen
            | Self::BuzzNotAvailable
            | Self::AlreadyAttempted
            | Self::TurnRequired
            | Self::SlotAlreadyUsed => StatusCode::CONFLICT,
            Self::NoAnsweringPlayer | Self::InvalidShareCode | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::UniqueQuestionUnavailable | Self::QuestionProviderUnavailable => {
                StatusCode::BAD_GATEWAY
            }
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// All error responses are `{"message": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
