//! Conversation Encoder: question type, question, code, and history in,
//! ready-to-send [`PromptConfig`] out.
//!
//! One routine serves all five question types. Everything that differs per
//! type comes from [`template_for`]; the tag layout of each user turn is
//! chosen in [`user_turn`].

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use tutor_core::config::ChatConfig;
use tutor_core::types::{CodeOutputPreference, PromptConfig, PromptMessage, QuestionType};

use crate::decoder;
use crate::history::{History, HistoryTurn, TurnKind};
use crate::system_prompt;
use crate::tags;
use crate::templates::{template_for, ModeTemplate};

const DEFAULT_LANGUAGE: &str = "c";

/// Whether earlier turns are replayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Fresh,
    Continuation,
}

/// Everything the encoder needs for one turn.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodeRequest {
    pub question_type: QuestionType,
    /// The new question. Passed through even when empty.
    pub question: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub preference: CodeOutputPreference,
    /// Stored wire records of earlier turns, oldest first.
    #[serde(default)]
    pub previous_responses: Vec<String>,
    #[serde(default)]
    pub temperature_override: Option<f32>,
}

impl EncodeRequest {
    pub fn new(question_type: QuestionType, question: impl Into<String>) -> Self {
        Self {
            question_type,
            question: question.into(),
            ..Default::default()
        }
    }

    pub fn with_code(mut self, code: impl Into<String>, language: Option<&str>) -> Self {
        self.code = Some(code.into());
        self.language = language.map(str::to_string);
        self
    }

    pub fn with_preference(mut self, preference: CodeOutputPreference) -> Self {
        self.preference = preference;
        self
    }

    pub fn with_previous_responses<S: Into<String>>(mut self, records: impl IntoIterator<Item = S>) -> Self {
        self.previous_responses = records.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature_override = Some(temperature);
        self
    }

    /// Code context, if any non-blank code was supplied.
    fn code(&self) -> Option<&str> {
        self.code.as_deref().filter(|code| !code.trim().is_empty())
    }
}

/// An encoded prompt plus the indices of history records that were dropped.
#[derive(Clone, Debug, PartialEq)]
pub struct Encoded {
    pub prompt: PromptConfig,
    pub mode: Mode,
    pub dropped: Vec<usize>,
}

/// Builds prompts. Holds only settings, so one instance can serve any
/// number of concurrent turns.
#[derive(Clone, Debug, Default)]
pub struct ConversationEncoder {
    strict_history: bool,
    temperature_override: Option<f32>,
}

impl ConversationEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self {
            strict_history: config.strict_history,
            temperature_override: config.temperature_override,
        }
    }

    /// Log dropped history records at `warn` instead of `debug`.
    pub fn with_strict_history(mut self, strict: bool) -> Self {
        self.strict_history = strict;
        self
    }

    pub fn with_temperature_override(mut self, temperature: Option<f32>) -> Self {
        self.temperature_override = temperature;
        self
    }

    /// Encode a turn from its wire records.
    pub fn encode(&self, request: &EncodeRequest) -> PromptConfig {
        self.encode_with_report(request).prompt
    }

    /// Encode a turn from its wire records, reporting dropped records.
    ///
    /// Continuation mode is used whenever any record was supplied, even if
    /// every one of them turns out to be malformed.
    pub fn encode_with_report(&self, request: &EncodeRequest) -> Encoded {
        let parse = History::from_records(request.question_type, &request.previous_responses);
        if !parse.dropped.is_empty() {
            if self.strict_history {
                warn!(
                    question_type = %request.question_type,
                    dropped = parse.dropped.len(),
                    records = request.previous_responses.len(),
                    indices = ?parse.dropped,
                    "Dropped malformed history records"
                );
            } else {
                debug!(
                    question_type = %request.question_type,
                    dropped = parse.dropped.len(),
                    "Dropped malformed history records"
                );
            }
        }

        let mode = if request.previous_responses.is_empty() {
            Mode::Fresh
        } else {
            Mode::Continuation
        };
        Encoded {
            prompt: self.build(request, &parse.history, mode),
            mode,
            dropped: parse.dropped,
        }
    }

    /// Encode a turn against an already-typed history.
    /// `request.previous_responses` is ignored.
    pub fn encode_history(&self, request: &EncodeRequest, history: &History) -> PromptConfig {
        let mode = if history.is_empty() {
            Mode::Fresh
        } else {
            Mode::Continuation
        };
        self.build(request, history, mode)
    }

    fn build(&self, request: &EncodeRequest, history: &History, mode: Mode) -> PromptConfig {
        let question_type = request.question_type;
        let template = template_for(question_type);
        let mode_template: &ModeTemplate = match mode {
            Mode::Fresh => &template.fresh,
            Mode::Continuation => &template.continuation,
        };

        let mut messages = Vec::with_capacity(2 + 2 * (mode_template.seeds.len() + history.len()));
        messages.push(PromptMessage::system(system_prompt::compose(
            question_type,
            request.preference,
            mode,
            mode_template.instruction,
        )));
        for seed in mode_template.seeds {
            messages.push(PromptMessage::user(seed.user));
            messages.push(PromptMessage::assistant(seed.assistant));
        }

        if mode == Mode::Continuation {
            let replay = Replay::new(question_type, history, request.code());
            for turn in &history.turns {
                messages.push(PromptMessage::user(replay.user_message(turn)));
                messages.push(PromptMessage::assistant(turn.answer.clone()));
            }
        }

        messages.push(PromptMessage::user(user_turn(
            question_type,
            mode,
            &request.question,
            request.code(),
            request.language.as_deref(),
        )));

        let temperature = request
            .temperature_override
            .or(self.temperature_override)
            .unwrap_or(mode_template.temperature);

        let prompt = PromptConfig {
            messages,
            stop: vec![mode_template.stop.to_string()],
            temperature,
            max_tokens: template.max_tokens,
        };

        debug!(
            question_type = %question_type,
            mode = ?mode,
            messages = prompt.messages.len(),
            replayed = history.len(),
            stop = ?prompt.stop,
            temperature = prompt.temperature,
            max_tokens = prompt.max_tokens,
            "Encoded prompt"
        );
        prompt
    }
}

/// Context for re-rendering stored turns as user messages.
struct Replay<'a> {
    question_type: QuestionType,
    /// Code shown with the opening turn when its record carried none.
    current_code: Option<&'a str>,
    /// Code shown with explanation follow-ups: the annotated code from the
    /// opening answer, else the opening code.
    follow_up_code: Option<String>,
}

impl<'a> Replay<'a> {
    fn new(question_type: QuestionType, history: &'a History, current_code: Option<&'a str>) -> Self {
        let follow_up_code = if question_type == QuestionType::CodeExplanation {
            let opening = history.turns.iter().find(|t| t.kind == TurnKind::Opening);
            opening
                .and_then(|turn| decoder::decode(&turn.answer).raw_code)
                .or_else(|| opening.and_then(|turn| turn.code.clone()))
                .or_else(|| current_code.map(str::to_string))
        } else {
            None
        };
        Self {
            question_type,
            current_code,
            follow_up_code,
        }
    }

    fn user_message(&self, turn: &HistoryTurn) -> String {
        let code = turn.code.as_deref().or(self.current_code);
        match (self.question_type, turn.kind) {
            (QuestionType::HelpFixCode, TurnKind::Opening) => {
                code_then(tags::CODE, code, tags::INTENDED_BEHAVIOR, &turn.question)
            }
            (QuestionType::HelpFixCode, TurnKind::FollowUp) => {
                code_then(tags::FOLLOW_UP_CODE, code, tags::INTENDED_BEHAVIOR, &turn.question)
            }
            (QuestionType::QuestionFromCode | QuestionType::CodeExplanation, TurnKind::Opening) => {
                code_question(self.question_type, code, &turn.question)
            }
            (QuestionType::CodeExplanation, TurnKind::FollowUp) => match &self.follow_up_code {
                Some(code) => code_then(
                    tags::FOLLOW_UP_CODE,
                    Some(code.as_str()),
                    tags::FOLLOW_UP_QUESTION,
                    &turn.question,
                ),
                None => tagged(tags::FOLLOW_UP_QUESTION, &turn.question),
            },
            (_, TurnKind::Opening) => tagged(tags::QUESTION, &turn.question),
            (_, TurnKind::FollowUp) => tagged(tags::FOLLOW_UP_QUESTION, &turn.question),
        }
    }
}

/// The new user turn, tagged for its question type and mode.
pub fn user_turn(
    question_type: QuestionType,
    mode: Mode,
    question: &str,
    code: Option<&str>,
    language: Option<&str>,
) -> String {
    match (question_type, mode) {
        (QuestionType::HelpFixCode, Mode::Fresh) => {
            code_then(tags::CODE, code, tags::INTENDED_BEHAVIOR, question)
        }
        (QuestionType::HelpFixCode, Mode::Continuation) => {
            code_then(tags::FOLLOW_UP_CODE, code, tags::INTENDED_BEHAVIOR, question)
        }
        (QuestionType::QuestionFromCode | QuestionType::CodeExplanation, Mode::Fresh) => {
            code_question(question_type, code, question)
        }
        (QuestionType::QuestionFromCode | QuestionType::CodeExplanation, Mode::Continuation) => {
            tagged(tags::FOLLOW_UP_QUESTION, question)
        }
        (_, mode) => {
            let tag = match mode {
                Mode::Fresh => tags::QUESTION,
                Mode::Continuation => tags::FOLLOW_UP_QUESTION,
            };
            let mut message = tagged(tag, question);
            if let Some(code) = code {
                let language = language
                    .filter(|l| !l.trim().is_empty())
                    .unwrap_or(DEFAULT_LANGUAGE);
                message.push_str(&format!(
                    "\n\nCode provided ({language}):\n```{language}\n{code}\n```"
                ));
            }
            message
        }
    }
}

fn tagged(tag: &str, text: &str) -> String {
    format!("{} {}", tag, text)
}

/// `{code_tag}` block followed by a tagged question line.
fn code_then(code_tag: &str, code: Option<&str>, question_tag: &str, question: &str) -> String {
    format!(
        "{}\n{}\n{} {}",
        code_tag,
        code.unwrap_or_default(),
        question_tag,
        question
    )
}

/// Opening turn of a code-bearing question: code, then the question. An
/// explanation request with no question sends the code alone.
fn code_question(question_type: QuestionType, code: Option<&str>, question: &str) -> String {
    match code {
        Some(code) if question_type == QuestionType::CodeExplanation && question.trim().is_empty() => {
            format!("{}\n{}", tags::CODE, code)
        }
        Some(code) => code_then(tags::CODE, Some(code), tags::QUESTION, question),
        None => tagged(tags::QUESTION, question),
    }
}
