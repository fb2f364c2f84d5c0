//! Database operations for the conversation log.

use sqlx::PgPool;
use uuid::Uuid;

use shopmate_core::ThreadId;

use super::RepositoryError;
use crate::models::ChatRecord;

/// Repository for conversation log operations.
pub struct ChatHistoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ChatHistoryRepository<'a> {
    /// Create a new chat history repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append a question/answer turn to a thread.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn save(
        &self,
        thread_id: &ThreadId,
        question: &str,
        answer: &str,
    ) -> Result<Uuid, RepositoryError> {
        let (id,): (Uuid,) = sqlx::query_as(
            r"
            INSERT INTO message (thread_id, question, answer)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(thread_id)
        .bind(question)
        .bind(answer)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// Get the most recent turns for a thread, newest first.
    ///
    /// Callers building dialogue context reverse the result to present the
    /// turns oldest-first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent(
        &self,
        thread_id: &ThreadId,
        limit: i64,
    ) -> Result<Vec<ChatRecord>, RepositoryError> {
        let records = sqlx::query_as::<_, ChatRecord>(
            r"
            SELECT id, thread_id, question, answer, created_at
            FROM message
            WHERE thread_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            ",
        )
        .bind(thread_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }
}
