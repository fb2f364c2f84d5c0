//! Language-model agent integration.
//!
//! The agent decides which tool to call; everything in this module sits at
//! that boundary: the Messages API client, the tool adapter layer that
//! turns resolved tool invocations into store/workflow calls, and the chat
//! service that runs the conversation loop and persists Q/A turns.

pub mod client;
pub mod error;
pub mod prompt;
pub mod service;
pub mod tools;
pub mod types;

pub use client::ModelClient;
pub use error::ModelError;
pub use service::{ChatError, ChatService, ChatStreamEvent, stream_answer};
pub use tools::{ToolError, ToolExecutor, shop_tools};
