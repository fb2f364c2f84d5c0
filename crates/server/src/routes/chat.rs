//! Chat route handlers.
//!
//! Two endpoints over the same chat service: a blocking one that returns
//! the finished answer, and a streaming one that forwards answer
//! fragments as SSE events while they are generated.

use std::convert::Infallible;

use axum::response::sse::{Event, KeepAlive};
use axum::{
    Json, Router,
    extract::State,
    response::Sse,
    routing::post,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use shopmate_core::ThreadId;

use crate::agent::{ChatService, stream_answer};
use crate::error::AppError;
use crate::state::AppState;

/// Build the chat router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/chat", post(ask))
        .route("/api/chat/stream", post(ask_stream))
}

/// Request to ask the assistant a question.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    /// The customer's question.
    pub question: String,
    /// Conversation thread the question belongs to.
    pub thread_id: String,
}

/// Response with the finished answer.
#[derive(Debug, Serialize)]
pub struct AskResponse {
    /// The assistant's answer.
    pub answer: String,
}

impl AskRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.question.trim().is_empty() {
            return Err(AppError::BadRequest("question must not be empty".to_string()));
        }
        if self.thread_id.trim().is_empty() {
            return Err(AppError::BadRequest("thread_id must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Ask a question and wait for the complete answer.
///
/// POST /api/chat
async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    request.validate()?;

    let service = ChatService::new(state.pool(), state.model(), state.config().history_limit);
    let thread_id = ThreadId::new(request.thread_id);

    let answer = service.answer(&thread_id, &request.question).await?;

    Ok(Json(AskResponse { answer }))
}

/// Ask a question and stream the answer via SSE.
///
/// POST /api/chat/stream
///
/// Fragments arrive as `{"content": ...}` events; a failure produces a
/// single `{"error": ...}` event and the stream closes.
async fn ask_stream(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Sse<impl futures::Stream<Item = Result<Event, Infallible>>>, AppError> {
    request.validate()?;

    // Clone owned values for the streaming function (all use Arc internally)
    let pool = state.pool().clone();
    let model = state.model().clone();
    let thread_id = ThreadId::new(request.thread_id);
    let history_limit = state.config().history_limit;

    let event_stream = stream_answer(pool, model, thread_id, request.question, history_limit);

    let sse_stream = event_stream.map(|event| {
        let json = serde_json::to_string(&event)
            .unwrap_or_else(|_| r#"{"error":"Failed to serialize event"}"#.to_string());
        Ok(Event::default().data(json))
    });

    Ok(Sse::new(sse_stream).keep_alive(KeepAlive::default()))
}
