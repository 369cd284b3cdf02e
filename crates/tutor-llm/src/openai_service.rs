//! OpenAI-compatible chat-completions client.
//!
//! POST {endpoint}/v1/chat/completions, non-streaming. The encoded prompt's
//! messages, stop sequences, temperature and token budget are sent as-is;
//! model and `top_p` come from [`LlmConfig`].

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use tutor_core::config::LlmConfig;
use tutor_core::types::{PromptMessage, Role};

use crate::error::{make_snippet, LlmError};
use crate::CompletionService;

/// Returned when a completion carries no text.
pub const NO_RESPONSE: &str = "No response found";

/// Client for `/v1/chat/completions`, holding a preconfigured
/// `reqwest::Client` with timeout and auth headers.
#[derive(Debug)]
pub struct OpenAiCompletionService {
    client: reqwest::Client,
    model: String,
    top_p: Option<f32>,
    url_chat: String,
}

impl OpenAiCompletionService {
    /// Build a client from config and an API key.
    ///
    /// # Errors
    /// - [`LlmError::MissingApiKey`] if `api_key` is absent or blank
    /// - [`LlmError::InvalidEndpoint`] if the endpoint is not http(s)
    /// - [`LlmError::Transport`] if the HTTP client cannot be built
    pub fn new(config: &LlmConfig, api_key: Option<String>) -> Result<Self, LlmError> {
        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| LlmError::MissingApiKey(config.api_key_env.clone()))?;

        let endpoint = config.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(LlmError::InvalidEndpoint(config.endpoint.clone()));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
                .map_err(|e| LlmError::Decode(format!("invalid API key header: {e}")))?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        let url_chat = format!("{}/v1/chat/completions", endpoint.trim_end_matches('/'));

        info!(
            model = %config.model,
            endpoint = %config.endpoint,
            timeout_secs = config.timeout_secs,
            "OpenAiCompletionService initialized"
        );

        Ok(Self {
            client,
            model: config.model.clone(),
            top_p: config.top_p,
            url_chat,
        })
    }

    /// Build a client reading the key from the variable named by
    /// `config.api_key_env`.
    pub fn from_env(config: &LlmConfig) -> Result<Self, LlmError> {
        Self::new(config, std::env::var(&config.api_key_env).ok())
    }

    fn request_body<'a>(
        &'a self,
        messages: &'a [PromptMessage],
        stop: &'a [String],
        temperature: f32,
        max_tokens: u32,
    ) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role,
                    content: &m.content,
                })
                .collect(),
            temperature: Some(temperature),
            top_p: self.top_p,
            max_tokens: Some(max_tokens),
            stop: (!stop.is_empty()).then_some(stop),
        }
    }
}

impl CompletionService for OpenAiCompletionService {
    async fn complete(
        &self,
        messages: &[PromptMessage],
        stop: &[String],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let started = Instant::now();
        let body = self.request_body(messages, stop, temperature, max_tokens);

        debug!(
            model = %self.model,
            messages = messages.len(),
            temperature = temperature,
            max_tokens = max_tokens,
            "POST {}", self.url_chat
        );

        let resp = self.client.post(&self.url_chat).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_chat.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                model = %self.model,
                latency_ms = started.elapsed().as_millis(),
                "chat completion returned non-success status"
            );

            return Err(LlmError::HttpStatus {
                status: status.as_u16(),
                url,
                snippet,
            });
        }

        let out: ChatCompletionResponse = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                error!(
                    error = %e,
                    model = %self.model,
                    latency_ms = started.elapsed().as_millis(),
                    "failed to decode chat completion response"
                );
                return Err(LlmError::Decode(format!(
                    "serde error: {e}; expected `choices[0].message.content`"
                )));
            }
        };

        let content = first_content(out);

        info!(
            model = %self.model,
            latency_ms = started.elapsed().as_millis(),
            response_len = content.len(),
            "chat completion completed"
        );

        Ok(content)
    }
}

/// Text of the first choice, or [`NO_RESPONSE`].
fn first_content(out: ChatCompletionResponse) -> String {
    out.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_else(|| NO_RESPONSE.to_string())
}

// =============================================================================
// HTTP payloads
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LlmConfig {
        LlmConfig::default()
    }

    // ---- construction ----

    #[test]
    fn test_new_requires_api_key() {
        let err = OpenAiCompletionService::new(&config(), None).unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey(ref var) if var == "OPENAI_API_KEY"));

        let err = OpenAiCompletionService::new(&config(), Some("   ".to_string())).unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey(_)));
    }

    #[test]
    fn test_new_rejects_bad_endpoint() {
        let cfg = LlmConfig {
            endpoint: "api.openai.com".to_string(),
            ..config()
        };
        let err = OpenAiCompletionService::new(&cfg, Some("sk-test".to_string())).unwrap_err();
        assert!(matches!(err, LlmError::InvalidEndpoint(_)));
    }

    #[test]
    fn test_new_builds_chat_url() {
        let cfg = LlmConfig {
            endpoint: "http://localhost:8080/".to_string(),
            ..config()
        };
        let service = OpenAiCompletionService::new(&cfg, Some("sk-test".to_string())).unwrap();
        assert_eq!(service.url_chat, "http://localhost:8080/v1/chat/completions");
    }

    // ---- payloads ----

    #[test]
    fn test_request_body_maps_prompt() {
        let cfg = LlmConfig {
            top_p: Some(0.9),
            ..config()
        };
        let service = OpenAiCompletionService::new(&cfg, Some("sk-test".to_string())).unwrap();
        let messages = vec![
            PromptMessage::system("sys"),
            PromptMessage::user("[question]: q"),
            PromptMessage::assistant("[answer]: a"),
            PromptMessage::user("[follow-up-question]: f"),
        ];
        let stop = vec!["[STOP-end-question-answer-STOP]".to_string()];
        let body = service.request_body(&messages, &stop, 0.15, 2048);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"].as_array().unwrap().len(), 4);
        assert_eq!(json["messages"][2]["role"], "assistant");
        assert_eq!(json["messages"][3]["content"], "[follow-up-question]: f");
        assert_eq!(json["stop"][0], "[STOP-end-question-answer-STOP]");
        assert_eq!(json["max_tokens"], 2048);
        assert!((json["temperature"].as_f64().unwrap() - 0.15).abs() < 1e-6);
        assert!((json["top_p"].as_f64().unwrap() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_request_body_omits_empty_stop() {
        let service = OpenAiCompletionService::new(&config(), Some("sk".to_string())).unwrap();
        let body = service.request_body(&[], &[], 0.1, 10);
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("stop").is_none());
        assert!(json.get("top_p").is_none());
    }

    #[test]
    fn test_first_content() {
        let out: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"[answer]: hi"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_content(out), "[answer]: hi");
    }

    #[test]
    fn test_first_content_missing_text() {
        let out: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert_eq!(first_content(out), NO_RESPONSE);

        let out: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(first_content(out), NO_RESPONSE);
    }
}
