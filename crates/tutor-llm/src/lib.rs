//! Language-model collaborator for the tutor.
//!
//! The conversation core only needs one operation: send a role-tagged
//! message list with sampling parameters and get one completion string back.
//! [`CompletionService`] is that seam; [`MockCompletionService`] serves tests
//! and dry runs, [`OpenAiCompletionService`] talks to a chat-completions API.

pub mod error;
pub mod openai_service;

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;

use tutor_core::types::{PromptMessage, Role};

pub use error::{make_snippet, LlmError};
pub use openai_service::OpenAiCompletionService;

// =============================================================================
// Trait
// =============================================================================

/// A single, non-streaming chat completion.
///
/// One call per user turn. Implementations do not retry; timeouts and
/// cancellation belong to the implementation or the caller.
pub trait CompletionService: Send + Sync {
    fn complete(
        &self,
        messages: &[PromptMessage],
        stop: &[String],
        temperature: f32,
        max_tokens: u32,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;
}

// =============================================================================
// Mock implementation
// =============================================================================

/// One recorded call to [`MockCompletionService`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionCall {
    pub messages: Vec<PromptMessage>,
    pub stop: Vec<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Completion service that replays queued responses.
///
/// When the queue is empty it echoes the last user message back as an
/// `[answer]:`. Every call is recorded for inspection.
#[derive(Debug, Default)]
pub struct MockCompletionService {
    responses: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<CompletionCall>>,
}

impl MockCompletionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock that answers with `responses` in order, then echoes.
    pub fn with_responses<S: Into<String>>(responses: impl IntoIterator<Item = S>) -> Self {
        let mock = Self::new();
        for response in responses {
            mock.push_response(response);
        }
        mock
    }

    pub fn push_response(&self, response: impl Into<String>) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(Ok(response.into()));
        }
    }

    /// Queue a failure for the next call.
    pub fn push_error(&self, message: impl Into<String>) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(Err(message.into()));
        }
    }

    pub fn calls(&self) -> Vec<CompletionCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }
}

impl CompletionService for MockCompletionService {
    async fn complete(
        &self,
        messages: &[PromptMessage],
        stop: &[String],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(CompletionCall {
                messages: messages.to_vec(),
                stop: stop.to_vec(),
                temperature,
                max_tokens,
            });
        }

        let queued = self
            .responses
            .lock()
            .map_err(|e| LlmError::Mock(format!("response queue poisoned: {}", e)))?
            .pop_front();

        let response = match queued {
            Some(Ok(text)) => text,
            Some(Err(message)) => return Err(LlmError::Mock(message)),
            None => {
                let last_user = messages
                    .iter()
                    .rev()
                    .find(|m| m.role == Role::User)
                    .map(|m| m.content.as_str())
                    .unwrap_or_default();
                format!("[answer]: {}", last_user)
            }
        };

        tracing::debug!(
            messages = messages.len(),
            temperature = temperature,
            max_tokens = max_tokens,
            response_len = response.len(),
            "Mock completion generated"
        );
        Ok(response)
    }
}

// =============================================================================
// Tests
// =============================================================================
