//! Model API client.
//!
//! Speaks the Anthropic-compatible Messages API, with non-streaming
//! completions for the tool loop and SSE streaming for the chat stream
//! endpoint. The endpoint URL and model id come from [`ModelConfig`], so
//! any provider exposing the same wire format works.

use std::sync::Arc;

use async_stream::stream;
use futures::Stream;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::instrument;

use crate::config::ModelConfig;

use super::error::{ApiErrorResponse, ModelError};
use super::types::{CompletionRequest, CompletionResponse, Message, StreamEvent, Tool};

const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Model API client.
///
/// Cheap to clone; the HTTP client and configuration live behind an `Arc`.
#[derive(Clone)]
pub struct ModelClient {
    inner: Arc<ModelClientInner>,
}

struct ModelClientInner {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl ModelClient {
    /// Create a new model client.
    ///
    /// # Panics
    ///
    /// Panics if the API key contains invalid header characters.
    #[must_use]
    pub fn new(config: &ModelConfig) -> Self {
        let api_key = config.api_key.expose_secret();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(api_key).expect("Invalid API key for header"),
        );
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            inner: Arc::new(ModelClientInner {
                client,
                base_url: config.base_url.clone(),
                model: config.model.clone(),
            }),
        }
    }

    /// Request a complete (non-streaming) response.
    ///
    /// Used by the tool loop, which needs the whole response before
    /// deciding whether to execute tools and continue.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the provider reports one.
    #[instrument(skip(self, messages, tools), fields(model = %self.inner.model))]
    pub async fn complete(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        tools: Option<Vec<Tool>>,
    ) -> Result<CompletionResponse, ModelError> {
        let request = CompletionRequest {
            model: self.inner.model.clone(),
            max_tokens: DEFAULT_MAX_TOKENS,
            messages,
            system,
            tools,
            stream: None,
        };

        let response = self
            .inner
            .client
            .post(&self.inner.base_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from_status(status, response).await);
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| ModelError::Parse(format!("Failed to parse response: {e}")))
    }

    /// Request a streaming response.
    ///
    /// Returns a stream of parsed SSE events; the caller accumulates text
    /// deltas and tool-use blocks.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial request fails; transport errors
    /// mid-stream are yielded as stream items.
    #[instrument(skip(self, messages, tools), fields(model = %self.inner.model))]
    pub async fn complete_stream(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        tools: Option<Vec<Tool>>,
    ) -> Result<impl Stream<Item = Result<StreamEvent, ModelError>> + use<>, ModelError> {
        let request = CompletionRequest {
            model: self.inner.model.clone(),
            max_tokens: DEFAULT_MAX_TOKENS,
            messages,
            system,
            tools,
            stream: Some(true),
        };

        let response = self
            .inner
            .client
            .post(&self.inner.base_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from_status(status, response).await);
        }

        Ok(stream! {
            use futures::StreamExt;

            let mut buffer = String::new();
            let mut byte_stream = std::pin::pin!(response.bytes_stream());

            while let Some(chunk_result) = byte_stream.next().await {
                match chunk_result {
                    Ok(chunk) => {
                        match std::str::from_utf8(&chunk) {
                            Ok(text) => buffer.push_str(text),
                            Err(e) => {
                                yield Err(ModelError::Parse(format!("Invalid UTF-8: {e}")));
                                continue;
                            }
                        }

                        while let Some(event) = next_sse_event(&mut buffer) {
                            if let Some(parsed) = parse_sse_event(&event) {
                                yield parsed;
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(ModelError::Stream(e.to_string()));
                    }
                }
            }

            if let Some(err) = incomplete_stream(&buffer) {
                yield Err(err);
            }
        })
    }
}

/// Detect a stream that closed with a partial event still buffered.
///
/// A clean close leaves only whitespace behind; anything else is the head
/// of an event the provider never finished sending.
fn incomplete_stream(buffer: &str) -> Option<ModelError> {
    let leftover = buffer.trim();
    (!leftover.is_empty()).then(|| ModelError::Interrupted(leftover.len()))
}

/// Translate an error status into a `ModelError`, consuming the body.
async fn error_from_status(status: reqwest::StatusCode, response: reqwest::Response) -> ModelError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        return ModelError::RateLimited(retry_after);
    }

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return ModelError::Unauthorized("Invalid API key".to_string());
    }

    match response.text().await {
        Ok(body) => match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(api_error) => ModelError::Api {
                error_type: api_error.error.error_type,
                message: api_error.error.message,
            },
            Err(_) => ModelError::Api {
                error_type: "unknown".to_string(),
                message: body,
            },
        },
        Err(e) => ModelError::Http(e),
    }
}

/// Pop the next complete SSE event off the buffer.
///
/// Events are separated by blank lines; an incomplete trailing event stays
/// in the buffer until more bytes arrive.
fn next_sse_event(buffer: &mut String) -> Option<String> {
    buffer.find("\n\n").map(|idx| {
        let event = buffer[..idx].to_string();
        *buffer = buffer[idx + 2..].to_string();
        event
    })
}

/// Parse one SSE event into a `StreamEvent`.
///
/// Returns `None` for events with no data payload (comments, keep-alives).
fn parse_sse_event(event: &str) -> Option<Result<StreamEvent, ModelError>> {
    let data = event
        .lines()
        .find_map(|line| line.strip_prefix("data: "))?;

    if data == "[DONE]" {
        return None;
    }

    match serde_json::from_str::<StreamEvent>(data) {
        Ok(stream_event) => Some(Ok(stream_event)),
        Err(e) => Some(Err(ModelError::Parse(format!(
            "Failed to parse stream event: {e}"
        )))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_sse_event_splits_on_blank_line() {
        let mut buffer =
            "event: message_start\ndata: {\"type\":\"message_start\"}\n\nevent: ping\ndata: {\"type\":\"ping\"}\n\n"
                .to_string();

        let first = next_sse_event(&mut buffer).expect("first event");
        assert!(first.contains("message_start"));

        let second = next_sse_event(&mut buffer).expect("second event");
        assert!(second.contains("ping"));

        assert!(next_sse_event(&mut buffer).is_none());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_next_sse_event_keeps_incomplete_tail() {
        let mut buffer = "event: message_start\ndata: {\"partial".to_string();
        assert!(next_sse_event(&mut buffer).is_none());
        assert_eq!(buffer, "event: message_start\ndata: {\"partial");
    }

    #[test]
    fn test_parse_sse_event_ping() {
        let result = parse_sse_event("event: ping\ndata: {\"type\":\"ping\"}");
        let event = result.expect("has data").expect("parses");
        assert!(matches!(event, StreamEvent::Ping));
    }

    #[test]
    fn test_parse_sse_event_without_data_is_skipped() {
        assert!(parse_sse_event("").is_none());
        assert!(parse_sse_event(": keep-alive comment").is_none());
        assert!(parse_sse_event("data: [DONE]").is_none());
    }

    #[test]
    fn test_incomplete_stream_flags_partial_tail() {
        assert!(incomplete_stream("").is_none());
        assert!(incomplete_stream("\n\n").is_none());

        let err = incomplete_stream("data: {\"partial").expect("partial tail");
        assert!(matches!(err, ModelError::Interrupted(15)));
    }

    #[test]
    fn test_model_client_is_clone_send_sync() {
        fn assert_clone_send_sync<T: Clone + Send + Sync>() {}
        assert_clone_send_sync::<ModelClient>();
    }
}
