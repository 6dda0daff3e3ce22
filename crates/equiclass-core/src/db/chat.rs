//! Chat session and message persistence

use super::Database;
use crate::error::Result;
use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSessionRecord {
    pub session_id: String,
    pub created_at: String,
    pub messages: Vec<ChatMessageRecord>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageRecord {
    pub message_id: i64,
    pub session_id: String,
    pub sender: String,
    pub message_content: String,
    pub timestamp: String,
}

impl Database {
    /// Create a chat session; an existing session is left untouched.
    /// Returns true when a row was inserted.
    pub fn create_chat_session(&self, session_id: &str, created_at: DateTime<Utc>) -> Result<bool> {
        let rows = self.conn()?.execute(
            "INSERT OR IGNORE INTO chat_sessions (session_id, created_at) VALUES (?1, ?2)",
            params![session_id, created_at.to_rfc3339()],
        )?;

        if rows == 0 {
            tracing::debug!("Chat session {} already exists", session_id);
        }
        Ok(rows > 0)
    }

    pub fn append_chat_message(
        &self,
        session_id: &str,
        sender: &str,
        content: &str,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<i64> {
        let timestamp = timestamp.unwrap_or_else(Utc::now).to_rfc3339();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO chat_messages (session_id, sender, message_content, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![session_id, sender, content, timestamp],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Session with its messages in insertion order
    pub fn get_chat_session(&self, session_id: &str) -> Result<Option<ChatSessionRecord>> {
        let conn = self.conn()?;
        let created_at = conn.query_row(
            "SELECT created_at FROM chat_sessions WHERE session_id = ?1",
            params![session_id],
            |row| row.get::<_, String>(0),
        );
        let created_at = match created_at {
            Ok(created_at) => created_at,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut stmt = conn.prepare(
            "SELECT message_id, session_id, sender, message_content, timestamp
             FROM chat_messages WHERE session_id = ?1 ORDER BY message_id",
        )?;
        let messages = stmt
            .query_map(params![session_id], |row| {
                Ok(ChatMessageRecord {
                    message_id: row.get(0)?,
                    session_id: row.get(1)?,
                    sender: row.get(2)?,
                    message_content: row.get(3)?,
                    timestamp: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Some(ChatSessionRecord {
            session_id: session_id.to_string(),
            created_at,
            messages,
        }))
    }
}
