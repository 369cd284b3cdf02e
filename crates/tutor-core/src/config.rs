use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, TutorError};
use crate::types::CodeOutputPreference;

/// Top-level configuration for the tutor.
///
/// Loaded from `~/.tutor/config.toml` by default. Every section falls back to
/// its defaults when omitted, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TutorConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl TutorConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TutorConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| TutorError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Directory where CLI session files are kept.
    pub data_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            data_dir: "~/.tutor/sessions".to_string(),
        }
    }
}

/// Language-model endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API (without `/v1/...`).
    pub endpoint: String,
    /// Chat model identifier.
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Optional nucleus sampling cutoff.
    pub top_p: Option<f32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
            top_p: None,
        }
    }
}

/// Conversation pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Preference used when a request does not name one.
    pub default_code_output_preference: CodeOutputPreference,
    /// Log dropped history records at `warn` instead of `debug`.
    pub strict_history: bool,
    /// Maximum accepted question length in characters.
    pub max_message_length: usize,
    /// Sampling temperature applied to every turn, overriding the per-type table.
    pub temperature_override: Option<f32>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_code_output_preference: CodeOutputPreference::WithCode,
            strict_history: false,
            max_message_length: 8000,
            temperature_override: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = TutorConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.data_dir, "~/.tutor/sessions");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.endpoint, "https://api.openai.com");
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.llm.timeout_secs, 60);
        assert_eq!(
            config.chat.default_code_output_preference,
            CodeOutputPreference::WithCode
        );
        assert!(!config.chat.strict_history);
        assert!(config.chat.temperature_override.is_none());
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"

[llm]
model = "gpt-4o-mini"
timeout_secs = 15

[chat]
default_code_output_preference = "PseudoCode"
strict_history = true
temperature_override = 0.4
"#;
        let file = create_temp_config(content);
        let config = TutorConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.data_dir, "~/.tutor/sessions");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.timeout_secs, 15);
        assert_eq!(config.llm.endpoint, "https://api.openai.com");
        assert_eq!(
            config.chat.default_code_output_preference,
            CodeOutputPreference::PseudoCode
        );
        assert!(config.chat.strict_history);
        assert_eq!(config.chat.temperature_override, Some(0.4));
    }

    #[test]
    fn test_load_empty_file_gives_defaults() {
        let file = create_temp_config("");
        let config = TutorConfig::load(file.path()).unwrap();
        assert_eq!(config.chat.max_message_length, 8000);
    }

    #[test]
    fn test_load_invalid_toml_is_config_error() {
        let file = create_temp_config("[chat\nstrict_history = ");
        let err = TutorConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, TutorError::Config(_)));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = TutorConfig::load_or_default(Path::new("/nonexistent/tutor/config.toml"));
        assert_eq!(config.llm.model, "gpt-4o");
    }

    #[test]
    fn test_unknown_preference_falls_back() {
        let file = create_temp_config("[chat]\ndefault_code_output_preference = \"Poetry\"\n");
        let config = TutorConfig::load(file.path()).unwrap();
        assert_eq!(
            config.chat.default_code_output_preference,
            CodeOutputPreference::WithCode
        );
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = TutorConfig::default();
        config.llm.model = "local-model".to_string();
        config.chat.strict_history = true;
        config.save(&path).unwrap();

        let reloaded = TutorConfig::load(&path).unwrap();
        assert_eq!(reloaded.llm.model, "local-model");
        assert!(reloaded.chat.strict_history);
    }
}
