//! Typed conversation history and its persisted wire records.
//!
//! Each stored record is one tagged string: the student's turn on its
//! leading line(s), then the assistant's answer verbatim. Records are parsed
//! into [`HistoryTurn`]s once, when a conversation is loaded, and rendered
//! back with [`HistoryTurn::to_record`] when it is saved.
//!
//! Parsing is best-effort. A record without its expected marker is dropped
//! and reported in [`HistoryParse::dropped`]; it never fails the load and
//! never shifts the pairing of the records around it.

use serde::{Deserialize, Serialize};
use tracing::trace;
use tutor_core::types::QuestionType;

use crate::tags::{self, line_starts_with_tag, strip_tag};

/// Position of a turn within its conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    /// The question that started the conversation.
    Opening,
    /// Any later question.
    FollowUp,
}

/// One replayable question/answer pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub kind: TurnKind,
    /// The student's question, or the intended behavior for fix-code turns.
    pub question: String,
    /// Code stored alongside the question, when the record carries any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// The assistant's answer exactly as stored.
    pub answer: String,
}

impl HistoryTurn {
    pub fn new(
        kind: TurnKind,
        question: impl Into<String>,
        code: Option<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            question: question.into(),
            code,
            answer: answer.into(),
        }
    }

    /// Render the persisted record for this turn.
    ///
    /// The question must fit on one line of the record, so line breaks in
    /// it are folded into spaces.
    pub fn to_record(&self, question_type: QuestionType) -> String {
        let question = single_line(&self.question);
        let code = self.code.as_deref();

        match (question_type, self.kind, code) {
            (QuestionType::HelpFixCode, kind, code) => {
                let tag = match kind {
                    TurnKind::Opening => tags::CODE,
                    TurnKind::FollowUp => tags::FOLLOW_UP_CODE,
                };
                format!(
                    "{}\n{}\n{} {}\n{}",
                    tag,
                    code.unwrap_or_default(),
                    tags::INTENDED_BEHAVIOR,
                    question,
                    self.answer
                )
            }
            (QuestionType::QuestionFromCode | QuestionType::CodeExplanation, TurnKind::Opening, Some(code)) => {
                format!(
                    "{}\n{}\n{} {}\n{}",
                    tags::CODE,
                    code,
                    tags::QUESTION,
                    question,
                    self.answer
                )
            }
            (_, TurnKind::Opening, _) => format!("{} {}\n{}", tags::QUESTION, question, self.answer),
            (_, TurnKind::FollowUp, _) => {
                format!("{} {}\n{}", tags::FOLLOW_UP_QUESTION, question, self.answer)
            }
        }
    }

    /// Parse one persisted record. `None` when its marker lines are missing.
    pub fn parse_record(question_type: QuestionType, kind: TurnKind, record: &str) -> Option<Self> {
        if record.trim().is_empty() {
            return None;
        }
        let lines: Vec<&str> = record.split('\n').collect();

        match (question_type, kind) {
            (QuestionType::HelpFixCode, TurnKind::Opening) => {
                parse_code_block_record(&lines, kind, tags::CODE, tags::INTENDED_BEHAVIOR)
            }
            (QuestionType::HelpFixCode, TurnKind::FollowUp) => {
                parse_code_block_record(&lines, kind, tags::FOLLOW_UP_CODE, tags::INTENDED_BEHAVIOR)
            }
            (QuestionType::QuestionFromCode | QuestionType::CodeExplanation, TurnKind::Opening)
                if line_starts_with_tag(lines[0], tags::CODE) =>
            {
                parse_code_block_record(&lines, kind, tags::CODE, tags::QUESTION)
            }
            (_, TurnKind::Opening) => {
                // The first line is the question whether or not it carries its tag.
                let (first, answer) = record.split_once('\n').unwrap_or((record, ""));
                let question = strip_tag(first, tags::QUESTION).unwrap_or(first);
                Some(Self::new(kind, clean_line(question), None, answer))
            }
            (_, TurnKind::FollowUp) => {
                let idx = lines
                    .iter()
                    .position(|line| line_starts_with_tag(line, tags::FOLLOW_UP_QUESTION))?;
                let question = strip_tag(lines[idx], tags::FOLLOW_UP_QUESTION)?;
                Some(Self::new(kind, clean_line(question), None, lines[idx + 1..].join("\n")))
            }
        }
    }
}

/// A `{code_tag}` line, code lines, a `{question_tag}` line, then the answer.
fn parse_code_block_record(
    lines: &[&str],
    kind: TurnKind,
    code_tag: &str,
    question_tag: &str,
) -> Option<HistoryTurn> {
    let code_idx = lines.iter().position(|line| line_starts_with_tag(line, code_tag))?;
    let question_idx = code_idx
        + 1
        + lines[code_idx + 1..]
            .iter()
            .position(|line| line_starts_with_tag(line, question_tag))?;

    let mut code_lines = Vec::with_capacity(question_idx - code_idx);
    let head = strip_tag(lines[code_idx], code_tag)?;
    if !head.trim().is_empty() {
        code_lines.push(head);
    }
    code_lines.extend_from_slice(&lines[code_idx + 1..question_idx]);
    let code = code_lines.join("\n");

    let question = strip_tag(lines[question_idx], question_tag)?;
    Some(HistoryTurn::new(
        kind,
        clean_line(question),
        (!code.is_empty()).then_some(code),
        lines[question_idx + 1..].join("\n"),
    ))
}

fn clean_line(line: &str) -> String {
    line.trim_end_matches('\r').to_string()
}

/// Fold any `\n`, `\r\n`, or lone `\r` break into a single space.
fn single_line(text: &str) -> String {
    text.split(['\r', '\n'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// =============================================================================
// History
// =============================================================================

/// Ordered turns of one conversation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    pub question_type: QuestionType,
    pub turns: Vec<HistoryTurn>,
}

/// Outcome of loading a history from wire records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryParse {
    pub history: History,
    /// Indices of records that were dropped as malformed.
    pub dropped: Vec<usize>,
}

impl History {
    pub fn new(question_type: QuestionType) -> Self {
        Self {
            question_type,
            turns: Vec::new(),
        }
    }

    /// Parse records in chronological order. The first record is the
    /// opening turn; every later one is a follow-up.
    pub fn from_records<S: AsRef<str>>(question_type: QuestionType, records: &[S]) -> HistoryParse {
        let mut history = History::new(question_type);
        let mut dropped = Vec::new();

        for (index, record) in records.iter().enumerate() {
            let kind = if index == 0 {
                TurnKind::Opening
            } else {
                TurnKind::FollowUp
            };
            match HistoryTurn::parse_record(question_type, kind, record.as_ref()) {
                Some(turn) => history.turns.push(turn),
                None => {
                    trace!(index, question_type = %question_type, "history record has no marker");
                    dropped.push(index);
                }
            }
        }

        HistoryParse { history, dropped }
    }

    /// Render every turn back to its wire record.
    pub fn to_records(&self) -> Vec<String> {
        self.turns
            .iter()
            .map(|turn| turn.to_record(self.question_type))
            .collect()
    }

    /// Append a completed turn; the first one becomes the opening turn.
    pub fn push(&mut self, question: impl Into<String>, code: Option<String>, answer: impl Into<String>) {
        let kind = if self.turns.is_empty() {
            TurnKind::Opening
        } else {
            TurnKind::FollowUp
        };
        self.turns.push(HistoryTurn::new(kind, question, code, answer));
    }

    /// Code attached to the opening turn, if it was stored.
    pub fn opening_code(&self) -> Option<&str> {
        self.turns
            .iter()
            .find(|turn| turn.kind == TurnKind::Opening)
            .and_then(|turn| turn.code.as_deref())
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANSWER: &str = "[answer]: Use a loop.\n[code]:\n[code-title]: loop\nfor (;;) {}\n[end-code]\nTopics covered: loops;";

    // ---- record round trips ----

    #[test]
    fn test_opening_record_round_trip() {
        let turn = HistoryTurn::new(TurnKind::Opening, "how do I loop?", None, ANSWER);
        let record = turn.to_record(QuestionType::GeneralQuestion);
        assert!(record.starts_with("[question]: how do I loop?\n"));

        let parsed =
            HistoryTurn::parse_record(QuestionType::GeneralQuestion, TurnKind::Opening, &record)
                .unwrap();
        assert_eq!(parsed, turn);
    }

    #[test]
    fn test_follow_up_record_round_trip() {
        let turn = HistoryTurn::new(TurnKind::FollowUp, "and backwards?", None, ANSWER);
        let record = turn.to_record(QuestionType::HelpWriteCode);
        assert!(record.starts_with("[follow-up-question]: and backwards?\n"));

        let parsed =
            HistoryTurn::parse_record(QuestionType::HelpWriteCode, TurnKind::FollowUp, &record)
                .unwrap();
        assert_eq!(parsed, turn);
    }

    #[test]
    fn test_fix_code_records_round_trip() {
        let opening = HistoryTurn::new(
            TurnKind::Opening,
            "return the sum",
            Some("int sum(int a, int b) {\n    return a - b;\n}".to_string()),
            "[answer]: wrong operator\n[fixed-code]:\nreturn a + b;\n[end-fixed-code]",
        );
        let record = opening.to_record(QuestionType::HelpFixCode);
        assert!(record.starts_with("[code]:\nint sum"));
        assert!(record.contains("\n[intended-behavior]: return the sum\n"));
        let parsed =
            HistoryTurn::parse_record(QuestionType::HelpFixCode, TurnKind::Opening, &record)
                .unwrap();
        assert_eq!(parsed, opening);

        let follow_up = HistoryTurn::new(
            TurnKind::FollowUp,
            "handle overflow",
            Some("int sum(int a, int b) { return a + b; }".to_string()),
            "[answer]: check limits first",
        );
        let record = follow_up.to_record(QuestionType::HelpFixCode);
        assert!(record.starts_with("[follow-up-code]:\n"));
        let parsed =
            HistoryTurn::parse_record(QuestionType::HelpFixCode, TurnKind::FollowUp, &record)
                .unwrap();
        assert_eq!(parsed, follow_up);
    }

    #[test]
    fn test_opening_with_embedded_code_round_trip() {
        let turn = HistoryTurn::new(
            TurnKind::Opening,
            "why does this print twice?",
            Some("printf(\"a\\n\");\nprintf(\"a\\n\");".to_string()),
            "[answer]: There are two calls.",
        );
        let record = turn.to_record(QuestionType::QuestionFromCode);
        let parsed =
            HistoryTurn::parse_record(QuestionType::QuestionFromCode, TurnKind::Opening, &record)
                .unwrap();
        assert_eq!(parsed, turn);
    }

    #[test]
    fn test_empty_answer_round_trip() {
        let turn = HistoryTurn::new(TurnKind::FollowUp, "q", None, "");
        let record = turn.to_record(QuestionType::GeneralQuestion);
        let parsed =
            HistoryTurn::parse_record(QuestionType::GeneralQuestion, TurnKind::FollowUp, &record)
                .unwrap();
        assert_eq!(parsed.answer, "");
    }

    #[test]
    fn test_multiline_question_folded() {
        let turn = HistoryTurn::new(TurnKind::Opening, "line one\nline two", None, "a");
        let record = turn.to_record(QuestionType::GeneralQuestion);
        assert_eq!(record, "[question]: line one line two\na");
    }

    #[test]
    fn test_carriage_returns_folded() {
        let turn = HistoryTurn::new(TurnKind::Opening, "why?\r", None, "a");
        let record = turn.to_record(QuestionType::GeneralQuestion);
        assert_eq!(record, "[question]: why?\na");

        let turn = HistoryTurn::new(TurnKind::FollowUp, "one\r\ntwo\rthree", None, "b");
        let record = turn.to_record(QuestionType::GeneralQuestion);
        assert_eq!(record, "[follow-up-question]: one two three\nb");

        let parsed =
            HistoryTurn::parse_record(QuestionType::GeneralQuestion, TurnKind::FollowUp, &record)
                .unwrap();
        assert_eq!(parsed.question, "one two three");
        assert_eq!(parsed.to_record(QuestionType::GeneralQuestion), record);
    }

    // ---- lenient parsing ----

    #[test]
    fn test_opening_without_tag_uses_first_line() {
        let parsed = HistoryTurn::parse_record(
            QuestionType::GeneralQuestion,
            TurnKind::Opening,
            "what is a struct?\n[answer]: A grouping.",
        )
        .unwrap();
        assert_eq!(parsed.question, "what is a struct?");
        assert_eq!(parsed.answer, "[answer]: A grouping.");
    }

    #[test]
    fn test_follow_up_marker_may_be_indented() {
        let parsed = HistoryTurn::parse_record(
            QuestionType::GeneralQuestion,
            TurnKind::FollowUp,
            "  [follow-up-question]: why?\nbecause",
        )
        .unwrap();
        assert_eq!(parsed.question, "why?");
        assert_eq!(parsed.answer, "because");
    }

    #[test]
    fn test_code_on_tag_line_is_kept() {
        let parsed = HistoryTurn::parse_record(
            QuestionType::HelpFixCode,
            TurnKind::Opening,
            "[code]: int x = 1\n[intended-behavior]: compile\n[answer]: add a semicolon",
        )
        .unwrap();
        assert_eq!(parsed.code.as_deref(), Some("int x = 1"));
        assert_eq!(parsed.question, "compile");
    }

    #[test]
    fn test_malformed_records_rejected() {
        assert!(HistoryTurn::parse_record(
            QuestionType::GeneralQuestion,
            TurnKind::FollowUp,
            "[answer]: no question marker"
        )
        .is_none());
        assert!(HistoryTurn::parse_record(
            QuestionType::HelpFixCode,
            TurnKind::Opening,
            "[code]:\nint x;\n[answer]: no behavior line"
        )
        .is_none());
        assert!(HistoryTurn::parse_record(
            QuestionType::HelpFixCode,
            TurnKind::FollowUp,
            "[intended-behavior]: behavior before code\n[follow-up-code]:\nint x;"
        )
        .is_none());
        assert!(HistoryTurn::parse_record(
            QuestionType::GeneralQuestion,
            TurnKind::Opening,
            "   "
        )
        .is_none());
    }

    // ---- History ----

    #[test]
    fn test_from_records_drops_without_shifting_pairs() {
        let records = vec![
            "[question]: q1\na1".to_string(),
            "garbage with no marker".to_string(),
            "[follow-up-question]: q3\na3".to_string(),
        ];
        let parse = History::from_records(QuestionType::GeneralQuestion, &records);
        assert_eq!(parse.dropped, vec![1]);
        let turns = &parse.history.turns;
        assert_eq!(turns.len(), 2);
        assert_eq!((turns[0].question.as_str(), turns[0].answer.as_str()), ("q1", "a1"));
        assert_eq!((turns[1].question.as_str(), turns[1].answer.as_str()), ("q3", "a3"));
        assert_eq!(turns[1].kind, TurnKind::FollowUp);
    }

    #[test]
    fn test_push_and_to_records() {
        let mut history = History::new(QuestionType::GeneralQuestion);
        assert!(history.is_empty());
        history.push("first", None, "answer one");
        history.push("second", None, "answer two");
        assert_eq!(history.len(), 2);
        assert_eq!(history.turns[0].kind, TurnKind::Opening);
        assert_eq!(history.turns[1].kind, TurnKind::FollowUp);

        let records = history.to_records();
        assert_eq!(
            records,
            vec![
                "[question]: first\nanswer one".to_string(),
                "[follow-up-question]: second\nanswer two".to_string(),
            ]
        );

        let reparsed = History::from_records(QuestionType::GeneralQuestion, &records);
        assert!(reparsed.dropped.is_empty());
        assert_eq!(reparsed.history, history);
    }

    #[test]
    fn test_opening_code() {
        let mut history = History::new(QuestionType::CodeExplanation);
        assert_eq!(history.opening_code(), None);
        history.push("", Some("int x;".to_string()), "a");
        assert_eq!(history.opening_code(), Some("int x;"));
    }

    #[test]
    fn test_history_serde() {
        let mut history = History::new(QuestionType::HelpFixCode);
        history.push("b", Some("c".to_string()), "a");
        let json = serde_json::to_string(&history).unwrap();
        assert!(json.contains("\"question_type\":\"HelpFixCode\""));
        assert!(json.contains("\"kind\":\"opening\""));
        let back: History = serde_json::from_str(&json).unwrap();
        assert_eq!(back, history);
    }
}
