//! Chat service orchestrating model conversations.
//!
//! Handles the complete flow for one inbound question:
//! 1. Load recent dialogue context for the thread
//! 2. Send to the model with the shopping tools
//! 3. Execute tools when requested, loop until a final text answer
//! 4. Persist the question/answer pair to the conversation log

use futures::Stream;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use shopmate_core::ThreadId;

use crate::db::{ChatHistoryRepository, RepositoryError};
use crate::models::ChatRecord;

use super::client::ModelClient;
use super::error::ModelError;
use super::prompt::SYSTEM_PROMPT;
use super::tools::{ToolError, ToolExecutor, shop_tools};
use super::types::{
    ContentBlock, ContentBlockDelta, ContentBlockStart, Message, MessageContent, StopReason,
    StreamEvent,
};

/// Maximum number of tool use iterations to prevent infinite loops.
const MAX_TOOL_ITERATIONS: usize = 10;

/// Errors that can occur in the chat service.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] RepositoryError),

    /// Model API error.
    #[error("model API error: {0}")]
    Model(#[from] ModelError),

    /// Too many tool iterations (possible infinite loop).
    #[error("too many tool iterations")]
    TooManyToolIterations,
}

/// Events on the streaming chat path.
///
/// Serialized shapes are part of the HTTP contract: `{"content": ...}`
/// fragments followed by stream close, or a single `{"error": ...}`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ChatStreamEvent {
    /// An incremental fragment of the answer.
    Content {
        /// Text to append.
        content: String,
    },
    /// The request failed; no further fragments follow.
    Error {
        /// Generic failure description.
        error: String,
    },
}

/// Chat service for one request.
pub struct ChatService<'a> {
    pool: &'a PgPool,
    client: &'a ModelClient,
    history_limit: i64,
}

impl<'a> ChatService<'a> {
    /// Create a new chat service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, client: &'a ModelClient, history_limit: i64) -> Self {
        Self {
            pool,
            client,
            history_limit,
        }
    }

    /// Answer a question, blocking until the final text is ready.
    ///
    /// Runs the bounded tool loop and persists the Q/A turn on success.
    ///
    /// # Errors
    ///
    /// Returns an error if the model call, a store operation, or the
    /// iteration bound fails.
    #[instrument(skip(self, question), fields(thread_id = %thread_id))]
    pub async fn answer(&self, thread_id: &ThreadId, question: &str) -> Result<String, ChatError> {
        let history = ChatHistoryRepository::new(self.pool);

        let recent = history.recent(thread_id, self.history_limit).await?;
        let mut messages = build_context(&recent);
        messages.push(Message::user(question));

        let tools = shop_tools();
        let executor = ToolExecutor::new(self.pool);

        let mut answer = String::new();
        let mut iterations = 0;

        loop {
            iterations += 1;
            if iterations > MAX_TOOL_ITERATIONS {
                warn!("too many tool iterations, stopping");
                return Err(ChatError::TooManyToolIterations);
            }

            let response = self
                .client
                .complete(
                    messages.clone(),
                    Some(SYSTEM_PROMPT.to_string()),
                    Some(tools.clone()),
                )
                .await?;

            info!(
                stop_reason = ?response.stop_reason,
                content_blocks = response.content.len(),
                "model response received"
            );

            let mut tool_results: Vec<ContentBlock> = Vec::new();

            for block in &response.content {
                match block {
                    ContentBlock::Text { text } => {
                        if !answer.is_empty() {
                            answer.push('\n');
                        }
                        answer.push_str(text);
                    }
                    ContentBlock::ToolUse { id, name, input } => {
                        tool_results.push(run_tool(&executor, id, name, input).await?);
                    }
                    ContentBlock::ToolResult { .. } => {
                        // Never produced by the model.
                    }
                }
            }

            if !tool_results.is_empty() && response.stop_reason == Some(StopReason::ToolUse) {
                messages.push(Message {
                    role: "assistant".to_string(),
                    content: MessageContent::Blocks(response.content.clone()),
                });
                messages.push(Message {
                    role: "user".to_string(),
                    content: MessageContent::Blocks(tool_results),
                });
                continue;
            }

            break;
        }

        history.save(thread_id, question, &answer).await?;

        Ok(answer)
    }
}

/// Execute one tool call and shape the result for the next model turn.
///
/// Inputs the model can correct come back as in-band error results;
/// storage failures abort the request.
async fn run_tool(
    executor: &ToolExecutor<'_>,
    id: &str,
    name: &str,
    input: &serde_json::Value,
) -> Result<ContentBlock, ChatError> {
    let (content, is_error) = match executor.execute(name, input).await {
        Ok(result) => (result, false),
        Err(e @ (ToolError::UnknownTool(_) | ToolError::InvalidArguments(_))) => {
            warn!(tool = name, error = %e, "tool rejected input");
            let payload = serde_json::json!({ "error": "invalid_tool_call", "message": e.to_string() });
            (payload.to_string(), true)
        }
        Err(ToolError::Storage(e)) => return Err(ChatError::Database(e)),
    };

    Ok(ContentBlock::ToolResult {
        tool_use_id: id.to_string(),
        content,
        is_error: Some(is_error),
    })
}

/// Build alternating user/assistant context from persisted Q/A turns.
///
/// The log hands back turns newest-first; presentation order is
/// oldest-first.
fn build_context(recent: &[ChatRecord]) -> Vec<Message> {
    let mut messages = Vec::with_capacity(recent.len() * 2);
    for record in recent.iter().rev() {
        messages.push(Message::user(record.question.clone()));
        messages.push(Message::assistant(record.answer.clone()));
    }
    messages
}

/// Answer a question as a stream of text fragments.
///
/// Text deltas are forwarded to the caller as they arrive. Turns that end
/// in tool use are executed and the loop continues; the Q/A pair is
/// persisted once the final turn completes. If the caller disconnects
/// mid-stream the partial answer is dropped, not persisted.
///
/// Failures surface as a single terminal [`ChatStreamEvent::Error`];
/// storage and model details stay out of the client-facing message.
pub fn stream_answer(
    pool: PgPool,
    client: ModelClient,
    thread_id: ThreadId,
    question: String,
    history_limit: i64,
) -> impl Stream<Item = ChatStreamEvent> {
    async_stream::stream! {
        let history = ChatHistoryRepository::new(&pool);

        let recent = match history.recent(&thread_id, history_limit).await {
            Ok(recent) => recent,
            Err(e) => {
                warn!(error = %e, "failed to load dialogue context");
                yield ChatStreamEvent::Error { error: "Internal server error".to_string() };
                return;
            }
        };

        let mut messages = build_context(&recent);
        messages.push(Message::user(question.clone()));

        let tools = shop_tools();
        let executor = ToolExecutor::new(&pool);

        let mut answer = String::new();
        let mut iterations = 0;

        loop {
            iterations += 1;
            if iterations > MAX_TOOL_ITERATIONS {
                warn!("too many tool iterations, stopping stream");
                yield ChatStreamEvent::Error { error: "Request processing exceeded limits".to_string() };
                return;
            }

            let events = match client
                .complete_stream(
                    messages.clone(),
                    Some(SYSTEM_PROMPT.to_string()),
                    Some(tools.clone()),
                )
                .await
            {
                Ok(events) => events,
                Err(e) => {
                    warn!(error = %e, "model stream request failed");
                    yield ChatStreamEvent::Error { error: "Model service unavailable".to_string() };
                    return;
                }
            };

            let mut collector = TurnCollector::default();

            {
                use futures::StreamExt;
                let mut events = std::pin::pin!(events);

                while let Some(event) = events.next().await {
                    match event {
                        Ok(event) => {
                            if let Some(text) = collector.absorb(event) {
                                yield ChatStreamEvent::Content { content: text };
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "model stream interrupted");
                            yield ChatStreamEvent::Error { error: "Model service unavailable".to_string() };
                            return;
                        }
                    }
                }
            }

            if let Some(error) = collector.error.take() {
                warn!(error = %error, "model reported stream error");
                yield ChatStreamEvent::Error { error: "Model service unavailable".to_string() };
                return;
            }

            let turn = collector.finish();

            if !turn.text.is_empty() {
                if !answer.is_empty() {
                    answer.push('\n');
                }
                answer.push_str(&turn.text);
            }

            if turn.tool_uses.is_empty() || turn.stop_reason != Some(StopReason::ToolUse) {
                break;
            }

            // Execute the collected tool calls, then loop for the next turn.
            let mut assistant_blocks: Vec<ContentBlock> = Vec::new();
            if !turn.text.is_empty() {
                assistant_blocks.push(ContentBlock::Text { text: turn.text.clone() });
            }

            let mut tool_results: Vec<ContentBlock> = Vec::new();
            for tool_use in turn.tool_uses {
                assistant_blocks.push(ContentBlock::ToolUse {
                    id: tool_use.id.clone(),
                    name: tool_use.name.clone(),
                    input: tool_use.input.clone(),
                });

                match run_tool(&executor, &tool_use.id, &tool_use.name, &tool_use.input).await {
                    Ok(result) => tool_results.push(result),
                    Err(e) => {
                        warn!(error = %e, "tool execution failed during stream");
                        yield ChatStreamEvent::Error { error: "Internal server error".to_string() };
                        return;
                    }
                }
            }

            messages.push(Message {
                role: "assistant".to_string(),
                content: MessageContent::Blocks(assistant_blocks),
            });
            messages.push(Message {
                role: "user".to_string(),
                content: MessageContent::Blocks(tool_results),
            });
        }

        if let Err(e) = history.save(&thread_id, &question, &answer).await {
            // The answer already reached the caller; log and close anyway.
            warn!(error = %e, "failed to persist streamed answer");
        }
    }
}

/// A completed tool-use block accumulated from stream deltas.
#[derive(Debug, Clone)]
struct CollectedToolUse {
    id: String,
    name: String,
    input: serde_json::Value,
}

/// One fully assembled model turn.
#[derive(Debug, Default)]
struct CollectedTurn {
    text: String,
    tool_uses: Vec<CollectedToolUse>,
    stop_reason: Option<StopReason>,
}

/// Assembles stream events into a turn.
///
/// Text deltas are returned immediately for forwarding; tool-use input
/// arrives as partial JSON keyed by block index and is parsed when the
/// block stops.
#[derive(Debug, Default)]
struct TurnCollector {
    turn: CollectedTurn,
    pending_tools: std::collections::HashMap<usize, (String, String, String)>,
    error: Option<String>,
}

impl TurnCollector {
    /// Process one event; returns text to forward to the caller, if any.
    fn absorb(&mut self, event: StreamEvent) -> Option<String> {
        match event {
            StreamEvent::ContentBlockStart {
                index,
                content_block: ContentBlockStart::ToolUse { id, name },
            } => {
                self.pending_tools.insert(index, (id, name, String::new()));
                None
            }
            StreamEvent::ContentBlockDelta { index, delta } => match delta {
                ContentBlockDelta::TextDelta { text } => {
                    self.turn.text.push_str(&text);
                    Some(text)
                }
                ContentBlockDelta::InputJsonDelta { partial_json } => {
                    if let Some((_, _, input)) = self.pending_tools.get_mut(&index) {
                        input.push_str(&partial_json);
                    }
                    None
                }
            },
            StreamEvent::ContentBlockStop { index } => {
                if let Some((id, name, input)) = self.pending_tools.remove(&index) {
                    let input = if input.trim().is_empty() {
                        serde_json::json!({})
                    } else {
                        serde_json::from_str(&input).unwrap_or(serde_json::Value::Null)
                    };
                    self.turn.tool_uses.push(CollectedToolUse { id, name, input });
                }
                None
            }
            StreamEvent::MessageDelta { delta } => {
                if delta.stop_reason.is_some() {
                    self.turn.stop_reason = delta.stop_reason;
                }
                None
            }
            StreamEvent::Error { error } => {
                self.error = Some(error.message);
                None
            }
            StreamEvent::MessageStart
            | StreamEvent::MessageStop
            | StreamEvent::Ping
            | StreamEvent::ContentBlockStart { .. } => None,
        }
    }

    fn finish(self) -> CollectedTurn {
        self.turn
    }
}
