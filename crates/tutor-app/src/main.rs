//! Tutor application binary.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialise tracing (RUST_LOG, else --log-level, else config)
//! 3. Run one command: `encode` (dry run), `decode`, or `ask`

mod cli;
mod session_file;

use std::io::Read;

use clap::Parser;
use tutor_chat::{ConversationEncoder, EncodeRequest, ResponseDecoder, TurnRequest, TutorOrchestrator};
use tutor_core::config::TutorConfig;
use tutor_core::types::ParsedResponse;
use tutor_llm::OpenAiCompletionService;

use crate::cli::{CliArgs, Command, TurnArgs};
use crate::session_file::{expand_home, read_records, SessionStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let config = TutorConfig::load_or_default(&config_file);

    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    tracing::debug!(path = %config_file.display(), "Configuration resolved");

    match args.command {
        Command::Encode { turn, history } => {
            let records = match history {
                Some(path) => read_records(&path)?,
                None => Vec::new(),
            };
            let request = encode_request(&turn, &config, records)?;
            let encoded = ConversationEncoder::from_config(&config.chat).encode_with_report(&request);
            if !encoded.dropped.is_empty() {
                tracing::warn!(dropped = ?encoded.dropped, "Some history records were skipped");
            }
            println!("{}", serde_json::to_string_pretty(&encoded.prompt)?);
        }
        Command::Decode { input } => {
            let raw = match input {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let parsed = ResponseDecoder::new().decode(&raw);
            println!("{}", serde_json::to_string_pretty(&parsed)?);
        }
        Command::Ask { turn, session, json } => {
            let store = SessionStore::new(expand_home(&config.general.data_dir));
            let service = OpenAiCompletionService::from_env(&config.llm)?;
            let orchestrator = TutorOrchestrator::new(service, config.chat.clone());

            // A saved session keeps its own question type.
            let mut question_type = turn.question_type;
            if let Some(id) = session {
                let loaded = store.load(id)?;
                question_type = loaded.question_type;
                orchestrator.import_session(loaded)?;
            }

            let mut request = TurnRequest::new(question_type, turn.question.clone());
            request.session_id = session;
            request.code = turn.read_code()?;
            request.language = turn.language.clone();
            request.preference = turn.preference;
            request.temperature = turn.temperature;

            let outcome = orchestrator.handle_turn(request).await?;
            let saved = store.save(&orchestrator.export_session(outcome.session_id)?)?;
            tracing::info!(session_id = %outcome.session_id, path = %saved.display(), "Turn saved");

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print!("{}", render(&outcome.parsed));
                eprintln!("session: {}", outcome.session_id);
            }
        }
    }

    Ok(())
}

fn encode_request(
    turn: &TurnArgs,
    config: &TutorConfig,
    records: Vec<String>,
) -> std::io::Result<EncodeRequest> {
    Ok(EncodeRequest {
        question_type: turn.question_type,
        question: turn.question.clone(),
        code: turn.read_code()?,
        language: turn.language.clone(),
        preference: turn
            .preference
            .unwrap_or(config.chat.default_code_output_preference),
        previous_responses: records,
        temperature_override: turn.temperature,
    })
}

/// Plain-text rendering of a parsed answer for the terminal.
fn render(parsed: &ParsedResponse) -> String {
    let mut out = String::new();
    if !parsed.content.is_empty() {
        out.push_str(&parsed.content);
        out.push_str("\n\n");
    }
    if let Some(code) = &parsed.raw_code {
        if let Some(title) = &parsed.code_title {
            out.push_str(&format!("// {}\n", title));
        }
        out.push_str(code);
        out.push_str("\n\n");
        if let Some(post) = &parsed.post_code_content {
            out.push_str(post);
            out.push_str("\n\n");
        }
    }
    if !parsed.topics.is_empty() {
        out.push_str(&format!("Topics: {}\n", parsed.topics.join(", ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_full_answer() {
        let parsed = ResponseDecoder::new().decode(
            "[answer]: Use fopen.\n[code]:\n[code-title]: demo\nFILE *f;\n[end-code]\nCheck NULL.\nTopics covered: files, fopen;",
        );
        assert_eq!(
            render(&parsed),
            "Use fopen.\n\n// demo\nFILE *f;\n\nCheck NULL.\n\nTopics: files, fopen\n"
        );
    }

    #[test]
    fn test_render_plain_text() {
        let parsed = ResponseDecoder::new().decode("just text");
        assert_eq!(render(&parsed), "just text\n\n");
    }

    #[test]
    fn test_encode_request_uses_config_preference() {
        let args = CliArgs::try_parse_from(["tutor", "encode", "q"]).unwrap();
        let Command::Encode { turn, .. } = args.command else {
            panic!("expected encode");
        };
        let mut config = TutorConfig::default();
        config.chat.default_code_output_preference = tutor_core::types::CodeOutputPreference::NoCode;
        let request = encode_request(&turn, &config, vec!["[question]: a\nb".to_string()]).unwrap();
        assert_eq!(
            request.preference,
            tutor_core::types::CodeOutputPreference::NoCode
        );
        assert_eq!(request.previous_responses.len(), 1);
        assert!(request.code.is_none());
    }
}
