use serde::{Deserialize, Serialize};

/// Opaque server-issued player identifier (URL-safe, at least 10 chars).
pub type PlayerId = String;

/// Provider-scoped question identifier.
pub type QuestionId = String;

/// Role a WebSocket connection registered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionRole {
    Host,
    Player,
}

/// Requested question difficulty. Providers may return other strings; this
/// enum only constrains what a host is allowed to ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

/// Phase of the question currently in play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionStage {
    /// The host is judging a single answering player; buzzers are closed.
    AwaitingHostDecision,
    /// Any player who has not yet attempted may buzz in.
    OpenForBuzz,
}

/// Points awarded for a correctly answered question of the given difficulty.
pub fn points_for_difficulty(difficulty: &str) -> u32 {
    match difficulty {
        "easy" => 150,
        "medium" => 250,
        "hard" => 400,
        _ => 200,
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_table() {
        assert_eq!(points_for_difficulty("easy"), 150);
        assert_eq!(points_for_difficulty("medium"), 250);
        assert_eq!(points_for_difficulty("hard"), 400);
        assert_eq!(points_for_difficulty("impossible"), 200);
        assert_eq!(points_for_difficulty(""), 200);
    }

    #[test]
    fn difficulty_round_trips_lowercase() {
        let parsed: Difficulty = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(parsed, Difficulty::Medium);
        assert_eq!(serde_json::to_string(&Difficulty::Hard).unwrap(), "\"hard\"");
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ConnectionRole::Host).unwrap(),
            "\"host\""
        );
        let parsed: ConnectionRole = serde_json::from_str("\"player\"").unwrap();
        assert_eq!(parsed, ConnectionRole::Player);
    }

    #[test]
    fn stage_serializes_camel_case() {
        assert_eq!(
            serde_json::to_string(&QuestionStage::AwaitingHostDecision).unwrap(),
            "\"awaitingHostDecision\""
        );
        assert_eq!(
            serde_json::to_string(&QuestionStage::OpenForBuzz).unwrap(),
            "\"openForBuzz\""
        );
    }
}
