//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Slotwise
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SlotwiseError {
    #[error("No participants supplied")]
    NoParticipants,

    #[error("Too many participants: {0}")]
    TooManyParticipants(usize),

    #[error("Invalid slot duration: {0} minutes")]
    InvalidDuration(i64),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("All calendar providers failed")]
    AllProvidersFailed,

    #[error("Quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("Not invited: {0}")]
    NotInvited(String),

    #[error("Not joined: {0}")]
    NotJoined(String),

    #[error("Already responded: {0}")]
    AlreadyResponded(String),

    #[error("Suggestion already finalized: {0}")]
    SuggestionFinalized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Slotwise operations
pub type Result<T> = std::result::Result<T, SlotwiseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_serialize_with_type_tag() {
        let err = SlotwiseError::NotInvited("ada@example.com".to_string());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "NotInvited");
        assert_eq!(json["message"], "ada@example.com");
    }

    #[test]
    fn unit_variants_round_trip() {
        let json = serde_json::to_string(&SlotwiseError::AllProvidersFailed).unwrap();
        let back: SlotwiseError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SlotwiseError::AllProvidersFailed);
    }

    #[test]
    fn display_includes_payload() {
        let err = SlotwiseError::TooManyParticipants(51);
        assert_eq!(err.to_string(), "Too many participants: 51");
    }
}
