//! Conversation log model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shopmate_core::ThreadId;

/// One persisted question/answer turn in a conversation thread.
///
/// Append-only; read back most-recent-first with a caller-supplied limit,
/// then re-ordered oldest-first when building dialogue context.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChatRecord {
    /// Globally unique message ID.
    pub id: Uuid,
    /// Conversation thread this turn belongs to.
    pub thread_id: ThreadId,
    /// What the user asked.
    pub question: String,
    /// What the assistant answered.
    pub answer: String,
    /// When the turn was recorded.
    pub created_at: DateTime<Utc>,
}
