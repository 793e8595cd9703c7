use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::OracleError;
use crate::model::OracleRequest;
use crate::oracle::Oracle;
use crate::prompt::PromptBuilder;

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_keys: Vec<String>,
    pub model: String,
    pub api_base: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            model: "gpt-4o-mini".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            temperature: 0.0,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Oracle backed by an OpenAI-compatible chat-completions endpoint
///
/// Keys are tried in order; a 429 moves on to the next key.
pub struct OpenAiOracle {
    client: Client,
    prompt: PromptBuilder,
    config: OpenAiConfig,
}

impl OpenAiOracle {
    pub fn new(config: OpenAiConfig) -> Result<Self, OracleError> {
        if config.api_keys.is_empty() {
            return Err(OracleError::invalid_request("missing API key for oracle"));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| {
                OracleError::invalid_request(format!("failed to build HTTP client: {err}"))
            })?;
        Ok(Self {
            client,
            prompt: PromptBuilder::new(),
            config,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl Oracle for OpenAiOracle {
    async fn ask(&self, request: &OracleRequest) -> Result<String, OracleError> {
        let url = self.endpoint();
        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: self.prompt.system_prompt().to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.prompt.clone(),
                },
            ],
        };

        let mut last_error: Option<OracleError> = None;
        for (index, key) in self.config.api_keys.iter().enumerate() {
            let response = match self
                .client
                .post(&url)
                .bearer_auth(key)
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(err) => {
                    warn!(target: "oracle", %err, attempt = index + 1, "oracle request failed");
                    last_error = Some(OracleError::transport(format!("request failed: {err}")));
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<response unavailable>".to_string());
                if status.as_u16() == 429 {
                    let friendly = rate_limit_message(&text);
                    warn!(
                        target: "oracle",
                        message = %friendly,
                        attempt = index + 1,
                        remaining = self.config.api_keys.len() - index - 1,
                        "oracle rate limited; switching API key"
                    );
                    last_error = Some(OracleError::RateLimited(friendly));
                    continue;
                }
                return Err(classify_status(status.as_u16(), &text));
            }

            let response: ChatCompletionResponse = response
                .json()
                .await
                .map_err(|err| OracleError::malformed(format!("invalid response body: {err}")))?;
            let content = response
                .choices
                .first()
                .and_then(|choice| choice.message.content.as_text())
                .ok_or_else(|| OracleError::malformed("response missing content"))?;
            debug!(target: "oracle", chars = content.len(), "oracle answered");
            return Ok(content);
        }

        Err(last_error.unwrap_or_else(|| OracleError::transport("all API keys exhausted")))
    }
}

fn classify_status(status: u16, body: &str) -> OracleError {
    let message = format!("oracle returned {status}: {body}");
    if (400..500).contains(&status) {
        OracleError::InvalidRequest(message)
    } else {
        OracleError::Transport(message)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: ChatCompletionContent,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChatCompletionContent {
    Text(String),
    Parts(Vec<ChatCompletionPart>),
}

impl ChatCompletionContent {
    fn as_text(&self) -> Option<String> {
        let text = match self {
            ChatCompletionContent::Text(value) => value.clone(),
            ChatCompletionContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect::<Vec<_>>()
                .join("\n"),
        };
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: Option<String>,
}

fn rate_limit_message(raw: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(raw) {
        if let Some(message) = envelope.error.message {
            return format!("rate limit exceeded: {}", message.trim());
        }
    }
    "rate limit exceeded".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_rejected() {
        let err = OpenAiOracle::new(OpenAiConfig::default()).err().unwrap();
        assert!(matches!(err, OracleError::InvalidRequest(_)));
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let oracle = OpenAiOracle::new(OpenAiConfig {
            api_keys: vec!["k".into()],
            api_base: "http://localhost:8080/v1/".into(),
            ..OpenAiConfig::default()
        })
        .unwrap();
        assert_eq!(oracle.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn rate_limit_message_reads_envelope() {
        let raw = r#"{"error":{"message":" Too many requests "}}"#;
        assert_eq!(rate_limit_message(raw), "rate limit exceeded: Too many requests");
        assert_eq!(rate_limit_message("nope"), "rate limit exceeded");
    }

    #[test]
    fn content_parts_are_joined() {
        let parsed: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":[{"text":"MULTIPLE:"},{"text":"A"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_text().as_deref(),
            Some("MULTIPLE:\nA")
        );
    }

    #[test]
    fn status_classification() {
        assert!(matches!(classify_status(400, ""), OracleError::InvalidRequest(_)));
        assert!(matches!(classify_status(503, ""), OracleError::Transport(_)));
    }
}
