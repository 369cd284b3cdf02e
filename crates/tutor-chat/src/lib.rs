//! Conversation protocol for the programming tutor.
//!
//! Builds chat-completion prompts from a question type, the student's
//! question, optional code, and the stored history of earlier turns, and
//! parses raw completions back into structured answers. Both directions
//! share the bracketed tag vocabulary defined in [`tags`].

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod history;
pub mod orchestrator;
pub mod system_prompt;
pub mod tags;
pub mod templates;
pub mod types;

pub use decoder::{decode, ResponseDecoder};
pub use encoder::{ConversationEncoder, EncodeRequest, Encoded, Mode};
pub use error::ChatError;
pub use history::{History, HistoryParse, HistoryTurn, TurnKind};
pub use orchestrator::TutorOrchestrator;
pub use templates::{template_for, ModeTemplate, QuestionTemplate, SeedExchange};
pub use types::{ChatMessage, SessionSummary, TurnOutcome, TurnRequest, TutorSession};
