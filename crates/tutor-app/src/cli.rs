//! CLI argument definitions for the tutor binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tutor_core::types::{CodeOutputPreference, QuestionType};
use uuid::Uuid;

/// Tutor: C/C++ programming help over a tagged chat protocol.
#[derive(Parser, Debug)]
#[command(name = "tutor", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the prompt that would be sent for a turn, as JSON.
    Encode {
        #[command(flatten)]
        turn: TurnArgs,

        /// JSON file holding an array of stored records, oldest first.
        #[arg(long = "history")]
        history: Option<PathBuf>,
    },

    /// Parse a raw completion (file, or stdin when omitted) and print it as JSON.
    Decode {
        input: Option<PathBuf>,
    },

    /// Ask the configured model and save the session.
    Ask {
        #[command(flatten)]
        turn: TurnArgs,

        /// Continue a saved session.
        #[arg(short = 's', long = "session")]
        session: Option<Uuid>,

        /// Print the full turn outcome as JSON.
        #[arg(long = "json")]
        json: bool,
    },
}

/// The student's side of one turn.
#[derive(Args, Debug, Clone)]
pub struct TurnArgs {
    /// The question. May be empty for code explanations.
    #[arg(default_value = "")]
    pub question: String,

    /// Question type; unknown labels fall back to GeneralQuestion. Ignored
    /// when continuing a saved session.
    #[arg(short = 't', long = "type", default_value = "GeneralQuestion", value_parser = parse_question_type)]
    pub question_type: QuestionType,

    /// File with the code under discussion.
    #[arg(long = "code")]
    pub code_file: Option<PathBuf>,

    /// Language label for the code.
    #[arg(long = "language")]
    pub language: Option<String>,

    /// NoCode, PseudoCode, or WithCode.
    #[arg(short = 'p', long = "preference", value_parser = parse_preference)]
    pub preference: Option<CodeOutputPreference>,

    /// Sampling temperature, overriding every default.
    #[arg(long = "temperature")]
    pub temperature: Option<f32>,
}

impl TurnArgs {
    /// Read the code file, if one was given.
    pub fn read_code(&self) -> std::io::Result<Option<String>> {
        self.code_file
            .as_ref()
            .map(std::fs::read_to_string)
            .transpose()
    }
}

fn parse_question_type(s: &str) -> Result<QuestionType, String> {
    Ok(QuestionType::from_label(s))
}

fn parse_preference(s: &str) -> Result<CodeOutputPreference, String> {
    s.parse().map_err(|e: tutor_core::types::UnknownLabel| e.to_string())
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > TUTOR_CONFIG env var > ~/.tutor/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("TUTOR_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".tutor").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".tutor").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_encode_defaults() {
        let cli = parse(&["tutor", "encode", "What is a pointer?"]);
        match cli.command {
            Command::Encode { turn, history } => {
                assert_eq!(turn.question, "What is a pointer?");
                assert_eq!(turn.question_type, QuestionType::GeneralQuestion);
                assert!(turn.preference.is_none());
                assert!(history.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_lenient_question_type() {
        let cli = parse(&["tutor", "encode", "-t", "help_fix_code", "x"]);
        let Command::Encode { turn, .. } = cli.command else {
            panic!("expected encode");
        };
        assert_eq!(turn.question_type, QuestionType::HelpFixCode);

        let cli = parse(&["tutor", "encode", "--type", "nonsense", "x"]);
        let Command::Encode { turn, .. } = cli.command else {
            panic!("expected encode");
        };
        assert_eq!(turn.question_type, QuestionType::GeneralQuestion);
    }

    #[test]
    fn test_bad_preference_rejected() {
        assert!(CliArgs::try_parse_from(["tutor", "encode", "-p", "lots", "x"]).is_err());
        let cli = parse(&["tutor", "encode", "-p", "pseudo-code", "x"]);
        let Command::Encode { turn, .. } = cli.command else {
            panic!("expected encode");
        };
        assert_eq!(turn.preference, Some(CodeOutputPreference::PseudoCode));
    }

    #[test]
    fn test_ask_with_session_and_globals() {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let cli = parse(&[
            "tutor",
            "ask",
            "--session",
            &id_str,
            "and then?",
            "--log-level",
            "debug",
            "--config",
            "/tmp/tutor.toml",
        ]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.resolve_config_path(), PathBuf::from("/tmp/tutor.toml"));
        assert_eq!(cli.resolve_log_level("info"), "debug");
        match cli.command {
            Command::Ask { turn, session, json } => {
                assert_eq!(session, Some(id));
                assert_eq!(turn.question, "and then?");
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_decode_stdin() {
        let cli = parse(&["tutor", "decode"]);
        assert!(matches!(cli.command, Command::Decode { input: None }));
        assert_eq!(cli.resolve_log_level("warn"), "warn");
    }

    #[test]
    fn test_read_code() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"int x;").unwrap();
        let path = file.path().to_string_lossy().to_string();
        let cli = parse(&["tutor", "encode", "--code", &path, "why?"]);
        let Command::Encode { turn, .. } = cli.command else {
            panic!("expected encode");
        };
        assert_eq!(turn.read_code().unwrap().as_deref(), Some("int x;"));
    }
}
