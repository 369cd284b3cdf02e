use thiserror::Error;
use tutor_core::error::TutorError;

/// Longest response-body excerpt carried in an error.
const SNIPPET_MAX_CHARS: usize = 512;

/// Errors from a completion call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LlmError {
    #[error("API key is missing (set {0})")]
    MissingApiKey(String),

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("HTTP {status} from {url}: {snippet}")]
    HttpStatus {
        status: u16,
        url: String,
        snippet: String,
    },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mock completion failed: {0}")]
    Mock(String),
}

impl From<LlmError> for TutorError {
    fn from(err: LlmError) -> Self {
        TutorError::Llm(err.to_string())
    }
}

/// Bounded, single-line excerpt of a response body for logs and errors.
pub fn make_snippet(body: &str) -> String {
    let flat: String = body
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let flat = flat.trim();
    if flat.chars().count() <= SNIPPET_MAX_CHARS {
        return flat.to_string();
    }
    let mut snippet: String = flat.chars().take(SNIPPET_MAX_CHARS).collect();
    snippet.push_str("...");
    snippet
}
