//! Async LLM client
//!
//! Model-agnostic HTTP client for Anthropic and OpenAI-compatible APIs
//! (DeepSeek, Ollama, ...). Supports one-shot completions and streamed
//! replies over server-sent events.

use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::error::{HearthError, Result};
use crate::llm::reasoner::{Reasoner, ReasoningError, ReplyStream};

/// API format type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApiFormat {
    Anthropic,
    OpenAI,
}

/// Async LLM client for making API calls
pub struct LlmClient {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    api_format: ApiFormat,
    max_tokens: u32,
}

impl LlmClient {
    /// Create a new LLM client with explicit configuration
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        let api_format = Self::detect_api_format(&api_url);
        Self {
            client: Client::new(),
            api_key,
            api_url,
            model,
            api_format,
            max_tokens: 1024,
        }
    }

    /// Detect API format from URL
    fn detect_api_format(url: &str) -> ApiFormat {
        if url.contains("anthropic.com") {
            ApiFormat::Anthropic
        } else {
            ApiFormat::OpenAI
        }
    }

    /// Create a client from environment variables
    ///
    /// Required: LLM_API_KEY
    /// Optional: LLM_API_URL (defaults to Anthropic API)
    /// Optional: LLM_MODEL (defaults to claude-3-haiku-20240307)
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("LLM_API_KEY")
            .map_err(|_| HearthError::Config("LLM_API_KEY not set".into()))?;
        let api_url = std::env::var("LLM_API_URL")
            .unwrap_or_else(|_| "https://api.anthropic.com/v1/messages".into());
        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| "claude-3-haiku-20240307".into());

        Ok(Self::new(api_key, api_url, model))
    }

    pub fn api_format(&self) -> ApiFormat {
        self.api_format
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self, system: &str, user: &str, schema: Option<&serde_json::Value>, stream: bool) -> reqwest::RequestBuilder {
        match self.api_format {
            ApiFormat::Anthropic => {
                // No native JSON mode: describe the expected shape instead
                let system = match schema {
                    Some(schema) => format!("{}\nReply with JSON matching this schema: {}", system, schema),
                    None => system.to_string(),
                };
                let body = AnthropicRequest {
                    model: self.model.clone(),
                    max_tokens: self.max_tokens,
                    system,
                    messages: vec![Message {
                        role: "user".into(),
                        content: user.into(),
                    }],
                    stream,
                };
                self.client
                    .post(&self.api_url)
                    .header("x-api-key", &self.api_key)
                    .header("anthropic-version", "2023-06-01")
                    .header("content-type", "application/json")
                    .json(&body)
            }
            ApiFormat::OpenAI => {
                let body = OpenAIRequest {
                    model: self.model.clone(),
                    max_tokens: self.max_tokens,
                    messages: vec![
                        Message {
                            role: "system".into(),
                            content: system.into(),
                        },
                        Message {
                            role: "user".into(),
                            content: user.into(),
                        },
                    ],
                    response_format: schema.map(|_| ResponseFormat {
                        kind: "json_object".into(),
                    }),
                    stream,
                };
                self.client
                    .post(&self.api_url)
                    .header("Authorization", format!("Bearer {}", self.api_key))
                    .header("content-type", "application/json")
                    .json(&body)
            }
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> std::result::Result<reqwest::Response, ReasoningError> {
        let response = builder
            .send()
            .await
            .map_err(|e| ReasoningError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReasoningError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

impl Reasoner for LlmClient {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        schema: Option<&serde_json::Value>,
    ) -> std::result::Result<String, ReasoningError> {
        let response = self.send(self.request(system, user, schema, false)).await?;

        let text = match self.api_format {
            ApiFormat::Anthropic => {
                let completion: AnthropicResponse = response
                    .json()
                    .await
                    .map_err(|e| ReasoningError::Malformed(e.to_string()))?;
                completion.content.into_iter().next().map(|c| c.text)
            }
            ApiFormat::OpenAI => {
                let completion: OpenAIResponse = response
                    .json()
                    .await
                    .map_err(|e| ReasoningError::Malformed(e.to_string()))?;
                completion.choices.into_iter().next().map(|c| c.message.content)
            }
        };

        match text {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(ReasoningError::Empty),
        }
    }

    async fn stream(&self, system: &str, user: &str) -> std::result::Result<ReplyStream, ReasoningError> {
        let response = self.send(self.request(system, user, None, true)).await?;
        Ok(sse_text_stream(response.bytes_stream(), self.api_format))
    }
}

/// Split an SSE body into lines and pull the text delta out of each event.
/// A final line without a trailing newline is still read.
fn sse_text_stream<S, B, E>(body: S, format: ApiFormat) -> ReplyStream
where
    S: futures::Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let state = (Box::pin(body), SseLines::default(), false);
    let events = futures::stream::unfold(state, move |(mut body, mut lines, finished)| async move {
        if finished {
            return None;
        }
        let (items, finished): (Vec<std::result::Result<String, ReasoningError>>, bool) = match body.next().await {
            Some(Ok(bytes)) => {
                let texts = lines.feed(bytes.as_ref());
                (texts.iter().filter_map(|line| parse_sse_line(line, format)).map(Ok).collect(), false)
            }
            Some(Err(e)) => (vec![Err(ReasoningError::Transport(e.to_string()))], false),
            None => {
                let tail = lines.finish().and_then(|line| parse_sse_line(&line, format));
                (tail.into_iter().map(Ok).collect(), true)
            }
        };
        Some((futures::stream::iter(items), (body, lines, finished)))
    })
    .flatten();
    Box::pin(events)
}

/// Reassembles lines from arbitrarily split body chunks
#[derive(Debug, Default)]
struct SseLines {
    buffer: Vec<u8>,
}

impl SseLines {
    /// Complete lines now available, trimmed
    fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            lines.push(String::from_utf8_lossy(&line).trim().to_string());
        }
        lines
    }

    /// Whatever is left once the body ends
    fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        let line = String::from_utf8_lossy(&rest).trim().to_string();
        (!line.is_empty()).then_some(line)
    }
}

/// Text carried by one SSE line, if any.
///
/// Anthropic sends `content_block_delta` events; OpenAI-compatible APIs send
/// `choices[0].delta.content` and finish with `[DONE]`.
pub fn parse_sse_line(line: &str, format: ApiFormat) -> Option<String> {
    let data = line.strip_prefix("data:")?.trim();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }
    let event: serde_json::Value = serde_json::from_str(data).ok()?;
    let text = match format {
        ApiFormat::Anthropic => {
            if event.get("type")?.as_str()? != "content_block_delta" {
                return None;
            }
            event.get("delta")?.get("text")?.as_str()?
        }
        ApiFormat::OpenAI => event
            .get("choices")?
            .get(0)?
            .get("delta")?
            .get("content")?
            .as_str()?,
    };
    (!text.is_empty()).then(|| text.to_string())
}

// Anthropic API format
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

// OpenAI-compatible API format (DeepSeek, OpenAI, etc.)
#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

// Shared
#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}
