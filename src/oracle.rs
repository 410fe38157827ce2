//! The extraction oracle: a blocking chat-completion endpoint.
//!
//! The oracle is an external collaborator, treated strictly as a boundary:
//! one prompt in, one raw text reply out. The core never retries, never
//! inspects model identity, and propagates any failure upward as fatal for
//! the current chapter.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::error::OracleError;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:1234/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.3";
pub const DEFAULT_TOKEN: &str = "lm-studio";
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_MAX_TOKENS: u32 = 12_000;
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

/// System message sent ahead of the user prompt on every request.
const SYSTEM_MESSAGE: &str = "You are a helpful assistant.";

/// Connection settings for [`HttpOracle`].
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Chat-completions endpoint URL.
    pub endpoint: String,
    /// Model identifier passed through in the request body.
    pub model: String,
    /// Static bearer token. Local inference servers accept a placeholder.
    pub token: String,
    /// Whole-request timeout. Extraction over a long chapter is slow.
    pub timeout: Duration,
}

impl Default for OracleConfig {
    fn default() -> Self {
        OracleConfig {
            endpoint: DEFAULT_ENDPOINT.into(),
            model: DEFAULT_MODEL.into(),
            token: DEFAULT_TOKEN.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Per-request sampling knobs.
#[derive(Debug, Clone, Copy)]
pub struct RequestParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for RequestParams {
    fn default() -> Self {
        RequestParams {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// A completed oracle round-trip.
///
/// Carries both the full response document (persisted verbatim as an
/// artifact) and the extracted message content. The content may be empty;
/// the pipeline decides when that is fatal, after the artifacts are on disk.
#[derive(Debug, Clone)]
pub struct OracleReply {
    /// Full chat-completion response document.
    pub document: Value,
    /// `choices[0].message.content`, trimmed. Empty if absent.
    pub content: String,
}

/// Blocking completion oracle.
pub trait Oracle {
    fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<OracleReply, OracleError>;
}

/// Synchronous `ureq` client for an OpenAI-style chat-completions server.
pub struct HttpOracle {
    config: OracleConfig,
    agent: ureq::Agent,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

impl HttpOracle {
    pub fn new(config: OracleConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        HttpOracle { config, agent }
    }
}

impl Oracle for HttpOracle {
    fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<OracleReply, OracleError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_MESSAGE,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens,
            temperature,
        };

        tracing::debug!(
            endpoint = %self.config.endpoint,
            model = %self.config.model,
            prompt_chars = prompt.len(),
            "sending completion request"
        );

        let response = self
            .agent
            .post(&self.config.endpoint)
            .set("Authorization", &format!("Bearer {}", self.config.token))
            .send_json(&request);

        let response = match response {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                return Err(OracleError::Http {
                    status,
                    body: response.into_string().unwrap_or_default(),
                });
            }
            Err(err) => {
                return Err(OracleError::Transport {
                    message: err.to_string(),
                });
            }
        };

        let document: Value = response.into_json().map_err(|err| OracleError::Decode {
            message: err.to_string(),
        })?;
        let content = extract_content(&document);
        Ok(OracleReply { document, content })
    }
}

/// Pull `choices[0].message.content` out of a completion document,
/// tolerating any missing step along the path.
pub fn extract_content(document: &Value) -> String {
    document
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_matches_the_wire_contract() {
        let request = ChatRequest {
            model: "mistralai/Mistral-7B-Instruct-v0.3",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_MESSAGE,
                },
                ChatMessage {
                    role: "user",
                    content: "Extract entities.",
                },
            ],
            max_tokens: 12_000,
            temperature: 0.0,
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "mistralai/Mistral-7B-Instruct-v0.3",
                "messages": [
                    {"role": "system", "content": "You are a helpful assistant."},
                    {"role": "user", "content": "Extract entities."}
                ],
                "max_tokens": 12000,
                "temperature": 0.0
            })
        );
    }

    #[test]
    fn content_extraction_walks_the_choices_path() {
        let document = json!({
            "choices": [{"message": {"content": "  {\"entities\": {}} \n"}}],
            "usage": {"total_tokens": 42}
        });
        assert_eq!(extract_content(&document), "{\"entities\": {}}");
    }

    #[test]
    fn content_extraction_defaults_to_empty() {
        assert_eq!(extract_content(&json!({})), "");
        assert_eq!(extract_content(&json!({"choices": []})), "");
        assert_eq!(extract_content(&json!({"choices": [{}]})), "");
        assert_eq!(
            extract_content(&json!({"choices": [{"message": {}}]})),
            ""
        );
        assert_eq!(
            extract_content(&json!({"choices": [{"message": {"content": 7}}]})),
            ""
        );
    }
}
