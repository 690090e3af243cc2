use thiserror::Error;

pub const MAX_PLAYER_NAME_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Player name is required")]
    PlayerNameRequired,

    #[error("Player name must be 64 characters or less")]
    PlayerNameTooLong,

    #[error("Player name can only contain letters, numbers, spaces, hyphens, and underscores")]
    PlayerNameInvalidCharacters,

    #[error("Answer is required")]
    AnswerRequired,

    #[error("Answer must be a valid number")]
    AnswerNotANumber,
}

/// Checks a player name against the rules the scoring service enforces.
///
/// The name is trimmed first; the trimmed value must be 1..=64 characters
/// drawn from `[A-Za-z0-9 _-]`.
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::PlayerNameRequired);
    }

    if trimmed.chars().count() > MAX_PLAYER_NAME_LEN {
        return Err(ValidationError::PlayerNameTooLong);
    }

    if !trimmed.chars().all(is_player_name_char) {
        return Err(ValidationError::PlayerNameInvalidCharacters);
    }

    Ok(())
}

fn is_player_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-')
}

/// Trims the name. No other normalization; validation is the gate.
pub fn sanitize_player_name(name: &str) -> String {
    name.trim().to_string()
}

/// Parses a typed answer, returning the numeric value when it is a finite number.
pub fn validate_numeric_answer(answer: &str) -> Result<f64, ValidationError> {
    let trimmed = answer.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::AnswerRequired);
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ValidationError::AnswerNotANumber),
    }
}
