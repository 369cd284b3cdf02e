//! Turn orchestrator: validates a question, resolves its session, encodes,
//! calls the model once, decodes, and records the turn.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Local;
use tracing::{debug, info, warn};
use tutor_core::config::ChatConfig;
use tutor_core::types::{PromptConfig, QuestionType, Role};
use tutor_llm::CompletionService;
use uuid::Uuid;

use crate::decoder::ResponseDecoder;
use crate::encoder::{ConversationEncoder, EncodeRequest};
use crate::error::ChatError;
use crate::history::History;
use crate::types::{ChatMessage, SessionSummary, TurnOutcome, TurnRequest, TutorSession};

/// Coordinates encoder, completion service, and decoder over in-memory
/// sessions.
pub struct TutorOrchestrator<C: CompletionService> {
    completion: C,
    encoder: ConversationEncoder,
    decoder: ResponseDecoder,
    sessions: Mutex<HashMap<Uuid, TutorSession>>,
    config: ChatConfig,
}

impl<C: CompletionService> TutorOrchestrator<C> {
    pub fn new(completion: C, config: ChatConfig) -> Self {
        Self {
            completion,
            encoder: ConversationEncoder::from_config(&config),
            decoder: ResponseDecoder::new(),
            sessions: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn completion(&self) -> &C {
        &self.completion
    }

    /// Run one tutoring turn.
    ///
    /// The session lock is released while the model call is in flight. A new
    /// session is only stored, and an existing one only updated, once the
    /// completion has been decoded.
    pub async fn handle_turn(&self, request: TurnRequest) -> Result<TurnOutcome, ChatError> {
        self.validate(&request)?;
        let prepared = self.prepare(&request)?;

        let prompt = self
            .encoder
            .encode_history(&prepared.encode_request, &prepared.history);
        debug!(
            session_id = %prepared.session_id,
            turns = prepared.history.len(),
            messages = prompt.messages.len(),
            "Calling completion service"
        );

        let raw = self
            .completion
            .complete(&prompt.messages, &prompt.stop, prompt.temperature, prompt.max_tokens)
            .await
            .map_err(|e| ChatError::Completion(e.to_string()))?;
        let parsed = self.decoder.decode(&raw);

        let session_id = prepared.session_id;
        let encode_request = prepared.encode_request;
        let mut sessions = self.lock_sessions()?;
        if let Some(created) = prepared.created {
            info!(session_id = %session_id, question_type = %created.question_type, "Session created");
            sessions.insert(session_id, created);
        }
        let session = sessions
            .get_mut(&session_id)
            .ok_or(ChatError::SessionNotFound(session_id))?;

        session.code = encode_request.code.clone();
        session.language = encode_request.language.clone();
        session.preference = encode_request.preference;

        // Code is kept wherever the wire record carries it: every fix-code
        // turn, and the opening turn of the other code-bearing types.
        let opening = session.history.is_empty();
        let turn_code = encode_request.code.clone().filter(|_| match session.question_type {
            QuestionType::HelpFixCode => true,
            question_type => opening && question_type.embeds_code(),
        });
        session
            .history
            .push(request.question.clone(), turn_code, raw.clone());
        let record = session
            .history
            .turns
            .last()
            .map(|turn| turn.to_record(session.question_type))
            .unwrap_or_default();

        let now = now();
        session.messages.push(ChatMessage {
            id: Uuid::new_v4(),
            session_id,
            role: Role::User,
            content: request.question,
            parsed: None,
            created_at: now,
        });
        session.messages.push(ChatMessage {
            id: Uuid::new_v4(),
            session_id,
            role: Role::Assistant,
            content: parsed.content.clone(),
            parsed: Some(parsed.clone()),
            created_at: now,
        });
        session.updated_at = now;

        info!(
            session_id = %session_id,
            turns = session.history.len(),
            has_code = parsed.has_code(),
            topics = parsed.topics.len(),
            "Turn completed"
        );

        Ok(TurnOutcome {
            session_id,
            parsed,
            raw,
            record,
        })
    }

    /// Encode the next turn of a session without calling the model.
    ///
    /// Resolves session, code, and preference exactly as [`Self::handle_turn`]
    /// does, so the preview is the prompt that turn would send.
    pub fn preview_prompt(&self, request: &TurnRequest) -> Result<PromptConfig, ChatError> {
        let prepared = self.prepare(request)?;
        Ok(self
            .encoder
            .encode_history(&prepared.encode_request, &prepared.history))
    }

    pub fn get_session(&self, session_id: Uuid) -> Option<TutorSession> {
        self.sessions
            .lock()
            .ok()
            .and_then(|s| s.get(&session_id).cloned())
    }

    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        let sessions = match self.sessions.lock() {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        let mut summaries: Vec<SessionSummary> = sessions.values().map(TutorSession::summary).collect();
        summaries.sort_by_key(|s| (s.created_at, s.id));
        summaries
    }

    pub fn delete_session(&self, session_id: Uuid) -> Result<(), ChatError> {
        let mut sessions = self.lock_sessions()?;
        if sessions.remove(&session_id).is_some() {
            Ok(())
        } else {
            Err(ChatError::SessionNotFound(session_id))
        }
    }

    /// Chat transcript of a session.
    pub fn get_history(&self, session_id: Uuid) -> Result<Vec<ChatMessage>, ChatError> {
        let sessions = self.lock_sessions()?;
        sessions
            .get(&session_id)
            .map(|s| s.messages.clone())
            .ok_or(ChatError::SessionNotFound(session_id))
    }

    /// Persisted wire records of a session, oldest first.
    pub fn export_records(&self, session_id: Uuid) -> Result<Vec<String>, ChatError> {
        let sessions = self.lock_sessions()?;
        sessions
            .get(&session_id)
            .map(TutorSession::records)
            .ok_or(ChatError::SessionNotFound(session_id))
    }

    pub fn export_session(&self, session_id: Uuid) -> Result<TutorSession, ChatError> {
        self.get_session(session_id)
            .ok_or(ChatError::SessionNotFound(session_id))
    }

    /// Insert or replace a session, e.g. one loaded from disk.
    pub fn import_session(&self, session: TutorSession) -> Result<Uuid, ChatError> {
        let id = session.id;
        let mut sessions = self.lock_sessions()?;
        if sessions.insert(id, session).is_some() {
            debug!(session_id = %id, "Session replaced on import");
        }
        Ok(id)
    }

    /// Start a session from stored wire records. Malformed records are
    /// dropped and counted in the log.
    pub fn import_records<S: AsRef<str>>(
        &self,
        question_type: QuestionType,
        records: &[S],
    ) -> Result<Uuid, ChatError> {
        let parse = History::from_records(question_type, records);
        if !parse.dropped.is_empty() {
            if self.config.strict_history {
                warn!(dropped = parse.dropped.len(), "Dropped malformed history records on import");
            } else {
                debug!(dropped = parse.dropped.len(), "Dropped malformed history records on import");
            }
        }
        let mut session = TutorSession::new(question_type, self.config.default_code_output_preference, now());
        session.code = parse.history.opening_code().map(str::to_string);
        session.history = parse.history;
        self.import_session(session)
    }

    // -- Private helpers --

    fn validate(&self, request: &TurnRequest) -> Result<(), ChatError> {
        let has_code = request.code.as_deref().is_some_and(|c| !c.trim().is_empty());
        let code_only_explanation =
            request.question_type == QuestionType::CodeExplanation && has_code;
        if request.question.trim().is_empty() && !code_only_explanation {
            return Err(ChatError::EmptyMessage);
        }
        let max = self.config.max_message_length;
        if request.question.chars().count() > max {
            return Err(ChatError::MessageTooLong(max));
        }
        Ok(())
    }

    /// Resolve the session a turn belongs to and the values it encodes with,
    /// without changing any stored state.
    ///
    /// Code supplied with the request replaces the session's code; otherwise
    /// the session's code is reused. The same goes for the preference.
    fn prepare(&self, request: &TurnRequest) -> Result<PreparedTurn, ChatError> {
        let sessions = self.lock_sessions()?;
        let mut created = None;
        let session: &TutorSession = match request.session_id {
            Some(id) => {
                let session = sessions.get(&id).ok_or(ChatError::SessionNotFound(id))?;
                if session.question_type != request.question_type {
                    return Err(ChatError::QuestionTypeMismatch {
                        expected: session.question_type,
                        found: request.question_type,
                    });
                }
                session
            }
            None => &*created.insert(TutorSession::new(
                request.question_type,
                self.config.default_code_output_preference,
                now(),
            )),
        };

        let (code, language) = match request.code.as_ref().filter(|c| !c.trim().is_empty()) {
            Some(code) => (Some(code.clone()), request.language.clone()),
            None => (session.code.clone(), session.language.clone()),
        };
        let encode_request = EncodeRequest {
            question_type: session.question_type,
            question: request.question.clone(),
            code,
            language,
            preference: request.preference.unwrap_or(session.preference),
            previous_responses: Vec::new(),
            temperature_override: request.temperature,
        };
        let session_id = session.id;
        let history = session.history.clone();

        Ok(PreparedTurn {
            session_id,
            created,
            encode_request,
            history,
        })
    }

    fn lock_sessions(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, TutorSession>>, ChatError> {
        self.sessions
            .lock()
            .map_err(|e| ChatError::Storage(format!("session lock poisoned: {}", e)))
    }
}

/// A turn resolved against its session, ready to encode.
struct PreparedTurn {
    session_id: Uuid,
    /// Set when the turn opens a new session; stored after a successful turn.
    created: Option<TutorSession>,
    encode_request: EncodeRequest,
    history: History,
}

fn now() -> i64 {
    Local::now().timestamp()
}

// =============================================================================
// Tests
// =============================================================================
