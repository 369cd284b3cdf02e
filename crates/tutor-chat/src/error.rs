//! Error types for tutoring sessions.
//!
//! Encoding and decoding never fail; these errors cover request validation,
//! session lookup, and the model call around them.

use tutor_core::error::TutorError;
use tutor_core::types::QuestionType;

/// Errors from the turn orchestrator.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),
    #[error("session is a {expected} conversation, got a {found} turn")]
    QuestionTypeMismatch {
        expected: QuestionType,
        found: QuestionType,
    },
    #[error("completion error: {0}")]
    Completion(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<TutorError> for ChatError {
    fn from(err: TutorError) -> Self {
        match err {
            TutorError::Llm(msg) => ChatError::Completion(msg),
            other => ChatError::Storage(other.to_string()),
        }
    }
}
