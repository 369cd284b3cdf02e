//! Session and turn types for the orchestrator.

use serde::{Deserialize, Serialize};
use tutor_core::types::{CodeOutputPreference, ParsedResponse, QuestionType, Role};
use uuid::Uuid;

use crate::history::History;

/// One conversation: its question type, the code under discussion, the
/// typed history that is replayed into prompts, and the chat transcript.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TutorSession {
    pub id: Uuid,
    pub question_type: QuestionType,
    pub preference: CodeOutputPreference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub history: History,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// Epoch seconds.
    pub created_at: i64,
    /// Epoch seconds.
    pub updated_at: i64,
}

impl TutorSession {
    pub fn new(question_type: QuestionType, preference: CodeOutputPreference, now: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            question_type,
            preference,
            code: None,
            language: None,
            history: History::new(question_type),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The persisted wire records, oldest first.
    pub fn records(&self) -> Vec<String> {
        self.history.to_records()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            question_type: self.question_type,
            turn_count: self.history.len(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// One chat-transcript entry as shown to the student.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: Role,
    pub content: String,
    /// Structured answer, on assistant messages only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed: Option<ParsedResponse>,
    pub created_at: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub question_type: QuestionType,
    pub turn_count: usize,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for one tutoring turn.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnRequest {
    /// Continue this session; `None` starts a new one.
    #[serde(default)]
    pub session_id: Option<Uuid>,
    pub question_type: QuestionType,
    pub question: String,
    /// Code for this turn. Replaces the session's code when present.
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    /// Falls back to the session's, then the configured default.
    #[serde(default)]
    pub preference: Option<CodeOutputPreference>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl TurnRequest {
    pub fn new(question_type: QuestionType, question: impl Into<String>) -> Self {
        Self {
            question_type,
            question: question.into(),
            ..Default::default()
        }
    }

    pub fn in_session(mut self, session_id: Uuid) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>, language: Option<&str>) -> Self {
        self.code = Some(code.into());
        self.language = language.map(str::to_string);
        self
    }

    pub fn with_preference(mut self, preference: CodeOutputPreference) -> Self {
        self.preference = Some(preference);
        self
    }
}

/// Result of one tutoring turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub session_id: Uuid,
    pub parsed: ParsedResponse,
    /// The completion exactly as returned; stored as the turn's answer.
    pub raw: String,
    /// The wire record appended for this turn.
    pub record: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_empty() {
        let session = TutorSession::new(QuestionType::HelpFixCode, CodeOutputPreference::NoCode, 42);
        assert_eq!(session.history.question_type, QuestionType::HelpFixCode);
        assert!(session.records().is_empty());
        assert_eq!(session.created_at, 42);
        assert_eq!(session.updated_at, 42);

        let summary = session.summary();
        assert_eq!(summary.id, session.id);
        assert_eq!(summary.turn_count, 0);
    }

    #[test]
    fn test_session_serde_round_trip() {
        let mut session =
            TutorSession::new(QuestionType::GeneralQuestion, CodeOutputPreference::WithCode, 1);
        session.history.push("q", None, "[answer]: a");
        session.messages.push(ChatMessage {
            id: Uuid::new_v4(),
            session_id: session.id,
            role: Role::Assistant,
            content: "a".to_string(),
            parsed: Some(ParsedResponse {
                content: "a".to_string(),
                ..Default::default()
            }),
            created_at: 2,
        });

        let json = serde_json::to_string(&session).unwrap();
        assert!(!json.contains("\"code\""));
        let back: TutorSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn test_turn_request_builder() {
        let id = Uuid::new_v4();
        let request = TurnRequest::new(QuestionType::QuestionFromCode, "why?")
            .in_session(id)
            .with_code("int x;", Some("c"))
            .with_preference(CodeOutputPreference::PseudoCode);
        assert_eq!(request.session_id, Some(id));
        assert_eq!(request.code.as_deref(), Some("int x;"));
        assert_eq!(request.language.as_deref(), Some("c"));
        assert_eq!(request.preference, Some(CodeOutputPreference::PseudoCode));
    }

    #[test]
    fn test_turn_request_deserializes_with_defaults() {
        let request: TurnRequest =
            serde_json::from_str(r#"{"question_type":"codeExplanation","question":""}"#).unwrap();
        assert_eq!(request.question_type, QuestionType::CodeExplanation);
        assert!(request.session_id.is_none());
        assert!(request.temperature.is_none());
    }
}
