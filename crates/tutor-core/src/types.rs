use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// The kind of help a student asks for.
///
/// Selects the tag vocabulary, seed exchanges, and sampling parameters used
/// to build a prompt. Unknown labels fall back to `GeneralQuestion`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum QuestionType {
    /// Conceptual programming question.
    #[default]
    GeneralQuestion,
    /// Question about a piece of code the student supplied.
    QuestionFromCode,
    /// Request to explain supplied code step by step.
    CodeExplanation,
    /// Request to fix supplied code given its intended behavior.
    HelpFixCode,
    /// Request to write new code from a description.
    HelpWriteCode,
}

impl QuestionType {
    /// Every question type, in declaration order.
    pub const ALL: [QuestionType; 5] = [
        QuestionType::GeneralQuestion,
        QuestionType::QuestionFromCode,
        QuestionType::CodeExplanation,
        QuestionType::HelpFixCode,
        QuestionType::HelpWriteCode,
    ];

    /// Canonical label, as used on the wire and in model classifications.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::GeneralQuestion => "GeneralQuestion",
            QuestionType::QuestionFromCode => "QuestionFromCode",
            QuestionType::CodeExplanation => "CodeExplanation",
            QuestionType::HelpFixCode => "HelpFixCode",
            QuestionType::HelpWriteCode => "HelpWriteCode",
        }
    }

    /// Whether the student's code is embedded under the type's own tags.
    pub fn embeds_code(&self) -> bool {
        matches!(
            self,
            QuestionType::QuestionFromCode | QuestionType::CodeExplanation | QuestionType::HelpFixCode
        )
    }

    /// Parse a label, falling back to `GeneralQuestion` when unrecognized.
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or_default()
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = UnknownLabel;

    /// Case-insensitive; `_`, `-` and spaces are ignored, so
    /// `help_fix_code` and `Help Fix Code` both parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "generalquestion" | "general" => Ok(QuestionType::GeneralQuestion),
            "questionfromcode" => Ok(QuestionType::QuestionFromCode),
            "codeexplanation" | "explaincode" => Ok(QuestionType::CodeExplanation),
            "helpfixcode" | "fixcode" => Ok(QuestionType::HelpFixCode),
            "helpwritecode" | "writecode" => Ok(QuestionType::HelpWriteCode),
            _ => Err(UnknownLabel(s.to_string())),
        }
    }
}

impl From<String> for QuestionType {
    fn from(label: String) -> Self {
        QuestionType::from_label(&label)
    }
}

/// How much code the student wants in answers.
///
/// Only changes the system instruction, never the tag vocabulary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum CodeOutputPreference {
    /// Conceptual answers only.
    NoCode,
    /// Structured pseudocode, no C/C++ syntax.
    PseudoCode,
    /// Complete, compilable C/C++ examples.
    #[default]
    WithCode,
}

impl CodeOutputPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeOutputPreference::NoCode => "NoCode",
            CodeOutputPreference::PseudoCode => "PseudoCode",
            CodeOutputPreference::WithCode => "WithCode",
        }
    }

    /// Parse a label, falling back to `WithCode` when unrecognized.
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or_default()
    }
}

impl fmt::Display for CodeOutputPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodeOutputPreference {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "nocode" | "none" => Ok(CodeOutputPreference::NoCode),
            "pseudocode" | "pseudo" => Ok(CodeOutputPreference::PseudoCode),
            "withcode" | "code" => Ok(CodeOutputPreference::WithCode),
            _ => Err(UnknownLabel(s.to_string())),
        }
    }
}

impl From<String> for CodeOutputPreference {
    fn from(label: String) -> Self {
        CodeOutputPreference::from_label(&label)
    }
}

/// A label that names no known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown label: {0}")]
pub struct UnknownLabel(pub String);

fn normalize_label(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' ' | '[' | ']'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Author of a chat-completion message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Prompt
// =============================================================================

/// One role-tagged message of an outbound chat-completion request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A complete, ready-to-send request: messages plus sampling parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptConfig {
    /// System message, seed exchanges, replayed history, then the new turn.
    pub messages: Vec<PromptMessage>,
    /// Strings that end generation.
    pub stop: Vec<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl PromptConfig {
    /// Check the chat-completion role pattern: exactly one leading system
    /// message, then strictly alternating user/assistant, ending on user.
    pub fn has_valid_role_sequence(&self) -> bool {
        let Some((first, rest)) = self.messages.split_first() else {
            return false;
        };
        if first.role != Role::System || rest.is_empty() {
            return false;
        }
        let alternates = rest.iter().enumerate().all(|(i, m)| {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            m.role == expected
        });
        alternates && rest.len() % 2 == 1
    }

    /// The final message, i.e. the turn being asked.
    pub fn new_turn(&self) -> Option<&PromptMessage> {
        self.messages.last()
    }
}

// =============================================================================
// Parsed response
// =============================================================================

/// Structured answer extracted from a raw completion.
///
/// `content` is always present (possibly empty). `code_title` and
/// `post_code_content` are only ever set together with `raw_code`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedResponse {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_code_content: Option<String>,
    /// Up to six short topic labels, in the order the model listed them.
    #[serde(default)]
    pub topics: Vec<String>,
    /// Free-text classification, not validated against [`QuestionType`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probable_question_type: Option<String>,
}

impl ParsedResponse {
    pub fn has_code(&self) -> bool {
        self.raw_code.is_some()
    }

    /// The model's classification, if it names a known question type.
    pub fn classified_question_type(&self) -> Option<QuestionType> {
        self.probable_question_type
            .as_deref()
            .and_then(|label| label.parse().ok())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ---- QuestionType ----

    #[test]
    fn test_question_type_canonical_labels_round_trip() {
        for qt in QuestionType::ALL {
            assert_eq!(qt.as_str().parse::<QuestionType>().unwrap(), qt);
            assert_eq!(qt.to_string(), qt.as_str());
        }
    }

    #[test]
    fn test_question_type_lenient_spellings() {
        assert_eq!(
            "help_fix_code".parse::<QuestionType>().unwrap(),
            QuestionType::HelpFixCode
        );
        assert_eq!(
            "question-from-code".parse::<QuestionType>().unwrap(),
            QuestionType::QuestionFromCode
        );
        assert_eq!(
            "[CodeExplanation]".parse::<QuestionType>().unwrap(),
            QuestionType::CodeExplanation
        );
    }

    #[test]
    fn test_question_type_unknown_falls_back() {
        let err = "Poetry".parse::<QuestionType>().unwrap_err();
        assert_eq!(err, UnknownLabel("Poetry".to_string()));
        assert_eq!(err.to_string(), "unknown label: Poetry");
        assert_eq!(QuestionType::from_label("Poetry"), QuestionType::GeneralQuestion);
        assert_eq!(QuestionType::from_label(""), QuestionType::GeneralQuestion);
    }

    #[test]
    fn test_question_type_serde() {
        let json = serde_json::to_string(&QuestionType::HelpWriteCode).unwrap();
        assert_eq!(json, "\"HelpWriteCode\"");
        let back: QuestionType = serde_json::from_str("\"HelpWriteCode\"").unwrap();
        assert_eq!(back, QuestionType::HelpWriteCode);
        let unknown: QuestionType = serde_json::from_str("\"Mystery\"").unwrap();
        assert_eq!(unknown, QuestionType::GeneralQuestion);
    }

    #[test]
    fn test_embeds_code() {
        assert!(!QuestionType::GeneralQuestion.embeds_code());
        assert!(QuestionType::QuestionFromCode.embeds_code());
        assert!(QuestionType::CodeExplanation.embeds_code());
        assert!(QuestionType::HelpFixCode.embeds_code());
        assert!(!QuestionType::HelpWriteCode.embeds_code());
    }

    // ---- CodeOutputPreference ----

    #[test]
    fn test_preference_parse_and_fallback() {
        assert_eq!(
            CodeOutputPreference::from_label("NoCode"),
            CodeOutputPreference::NoCode
        );
        assert_eq!(
            CodeOutputPreference::from_label("pseudo_code"),
            CodeOutputPreference::PseudoCode
        );
        assert_eq!(
            CodeOutputPreference::from_label("whatever"),
            CodeOutputPreference::WithCode
        );
        assert_eq!(CodeOutputPreference::default(), CodeOutputPreference::WithCode);
    }

    // ---- Role ----

    #[test]
    fn test_role_serializes_lowercase() {
        let msg = PromptMessage::assistant("hi");
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }

    // ---- PromptConfig ----

    fn config_with(messages: Vec<PromptMessage>) -> PromptConfig {
        PromptConfig {
            messages,
            stop: vec!["[STOP]".to_string()],
            temperature: 0.1,
            max_tokens: 1024,
        }
    }

    #[test]
    fn test_valid_role_sequence() {
        let cfg = config_with(vec![
            PromptMessage::system("s"),
            PromptMessage::user("q1"),
            PromptMessage::assistant("a1"),
            PromptMessage::user("q2"),
        ]);
        assert!(cfg.has_valid_role_sequence());
        assert_eq!(cfg.new_turn().unwrap().content, "q2");
    }

    #[test]
    fn test_invalid_role_sequences() {
        let ends_on_assistant = config_with(vec![
            PromptMessage::system("s"),
            PromptMessage::user("q"),
            PromptMessage::assistant("a"),
        ]);
        assert!(!ends_on_assistant.has_valid_role_sequence());

        let two_systems = config_with(vec![
            PromptMessage::system("s"),
            PromptMessage::system("s2"),
            PromptMessage::user("q"),
        ]);
        assert!(!two_systems.has_valid_role_sequence());

        let double_user = config_with(vec![
            PromptMessage::system("s"),
            PromptMessage::user("q"),
            PromptMessage::user("q"),
        ]);
        assert!(!double_user.has_valid_role_sequence());

        assert!(!config_with(vec![]).has_valid_role_sequence());
        assert!(!config_with(vec![PromptMessage::system("s")]).has_valid_role_sequence());
    }

    // ---- ParsedResponse ----

    #[test]
    fn test_parsed_response_serializes_camel_case_and_skips_absent() {
        let parsed = ParsedResponse {
            content: "text".to_string(),
            raw_code: Some("int x;".to_string()),
            code_title: None,
            post_code_content: None,
            topics: vec!["ints".to_string()],
            probable_question_type: Some("GeneralQuestion".to_string()),
        };
        let json = serde_json::to_value(&parsed).unwrap();
        assert_eq!(json["rawCode"], "int x;");
        assert_eq!(json["probableQuestionType"], "GeneralQuestion");
        assert!(json.get("codeTitle").is_none());
        assert!(json.get("postCodeContent").is_none());
    }

    #[test]
    fn test_classified_question_type() {
        let mut parsed = ParsedResponse {
            probable_question_type: Some("HelpFixCode".to_string()),
            ..Default::default()
        };
        assert_eq!(parsed.classified_question_type(), Some(QuestionType::HelpFixCode));

        parsed.probable_question_type = Some("Something Else".to_string());
        assert_eq!(parsed.classified_question_type(), None);

        parsed.probable_question_type = None;
        assert_eq!(parsed.classified_question_type(), None);
    }
}
