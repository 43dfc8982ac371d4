use crate::error::GameError;

pub const MIN_PLAYER_NAME_LENGTH: usize = 1;
pub const MAX_PLAYER_NAME_LENGTH: usize = 32;

/// Validate and canonicalize a player name: surrounding whitespace is
/// trimmed, the result must be 1-32 characters and contain no control
/// characters.
pub fn validate_player_name(raw: &str) -> Result<String, GameError> {
    let name = raw.trim();
    if name.chars().count() < MIN_PLAYER_NAME_LENGTH {
        return Err(GameError::Validation("Name must not be empty".to_string()));
    }
    if name.chars().count() > MAX_PLAYER_NAME_LENGTH {
        return Err(GameError::Validation(format!(
            "Name must be at most {MAX_PLAYER_NAME_LENGTH} characters"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(GameError::Validation(
            "Name contains invalid characters".to_string(),
        ));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn trims_and_accepts_normal_names() {
        assert_eq!(validate_player_name("  Alice  ").unwrap(), "Alice");
        assert_eq!(validate_player_name("Bob").unwrap(), "Bob");
        assert_eq!(validate_player_name("玩家一").unwrap(), "玩家一");
        assert_eq!(validate_player_name("Player One").unwrap(), "Player One");
    }

    #[test]
    fn rejects_empty_and_whitespace_only() {
        assert!(validate_player_name("").is_err());
        assert!(validate_player_name("   ").is_err());
        assert!(validate_player_name("\t\n").is_err());
    }

    #[test]
    fn rejects_overlong_names() {
        let long = "x".repeat(MAX_PLAYER_NAME_LENGTH + 1);
        assert!(validate_player_name(&long).is_err());
        let max = "x".repeat(MAX_PLAYER_NAME_LENGTH);
        assert_eq!(validate_player_name(&max).unwrap(), max);
    }

    #[test]
    fn rejects_control_characters() {
        assert!(validate_player_name("Al\u{0007}ice").is_err());
        assert!(validate_player_name("Ali\tce").is_err());
    }

    proptest! {
        #[test]
        fn validation_matches_predicate(raw in "\\PC{0,40}") {
            let trimmed = raw.trim();
            let expected = !trimmed.is_empty()
                && trimmed.chars().count() <= MAX_PLAYER_NAME_LENGTH
                && !trimmed.chars().any(char::is_control);
            prop_assert_eq!(validate_player_name(&raw).is_ok(), expected);
        }
    }
}
