//! Completion provider client (Groq, OpenAI-compatible chat completions).
//!
//! Requests are sent with `stream: true` and the server-sent events are
//! concatenated into one string. A provider answering with a plain JSON body
//! instead of an event stream is handled too.

use crate::config::CompletionConfig;
use async_trait::async_trait;
use futures::StreamExt;
use log::debug;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::{Deserialize, Serialize};
use std::fmt;

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

#[derive(Debug)]
pub enum CompletionError {
    HttpError(reqwest::Error),
    Timeout,
    Status { status: u16, body: String },
    StreamError(String),
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionError::HttpError(err) => write!(f, "Completion request failed: {}", err),
            CompletionError::Timeout => write!(f, "Completion request timed out"),
            CompletionError::Status { status, body } => {
                write!(f, "Completion provider returned status {}: {}", status, body)
            }
            CompletionError::StreamError(msg) => {
                write!(f, "Could not read completion stream: {}", msg)
            }
        }
    }
}

impl std::error::Error for CompletionError {}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CompletionError::Timeout
        } else {
            CompletionError::HttpError(err)
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_completion_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ResponseChoice>,
}

#[derive(Debug, Deserialize)]
struct ResponseChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

impl GroqClient {
    pub fn new(config: &CompletionConfig) -> Result<Self, CompletionError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionProvider for GroqClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_completion_tokens: self.max_tokens,
            top_p: self.top_p,
            stream: true,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let is_json_body = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map_or(false, |value| value.starts_with("application/json"));

        if is_json_body {
            let body: ChatCompletionResponse = response
                .json()
                .await
                .map_err(|e| CompletionError::StreamError(e.to_string()))?;
            return Ok(body
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .unwrap_or_default());
        }

        let mut stream = response.bytes_stream();
        let mut decoder = EventStreamDecoder::default();
        let mut text = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for data in decoder.feed(&chunk) {
                if append_event(&mut text, &data)? {
                    debug!("Completion stream finished ({} chars)", text.len());
                    return Ok(text);
                }
            }
        }
        if let Some(data) = decoder.finish() {
            append_event(&mut text, &data)?;
        }

        Ok(text)
    }
}

/// Append one `data:` payload. Returns `true` on the `[DONE]` marker.
fn append_event(text: &mut String, data: &str) -> Result<bool, CompletionError> {
    if data == "[DONE]" {
        return Ok(true);
    }

    let chunk: ChatCompletionChunk = serde_json::from_str(data)
        .map_err(|e| CompletionError::StreamError(format!("{}: {}", e, data)))?;

    // Providers report failures mid-stream as an `error` event
    if let Some(error) = chunk.error {
        let message = error
            .get("message")
            .and_then(|message| message.as_str())
            .map(str::to_owned)
            .unwrap_or_else(|| error.to_string());
        return Err(CompletionError::StreamError(message));
    }

    if let Some(content) = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
    {
        text.push_str(&content);
    }

    Ok(false)
}

/// Splits a server-sent event byte stream into `data:` payloads. Lines are cut
/// on raw `\n` bytes so multi-byte characters split across chunks survive.
#[derive(Default)]
struct EventStreamDecoder {
    buffer: Vec<u8>,
}

impl EventStreamDecoder {
    fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(data) = data_payload(&line) {
                payloads.push(data);
            }
        }
        payloads
    }

    fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        data_payload(&rest)
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let data = line.trim_end_matches(&['\r', '\n'][..]).strip_prefix("data:")?;
    let data = data.trim();
    if data.is_empty() {
        None
    } else {
        Some(data.to_string())
    }
}
