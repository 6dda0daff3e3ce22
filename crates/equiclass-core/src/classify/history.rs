//! Optional audit trail of prompts and model responses

use crate::db::Database;
use crate::error::Result;
use crate::llm::{ChatMessage, ContentPart, MessageContent};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Author of a stored message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatSender {
    System,
    User,
    Assistant,
}

impl ChatSender {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatSender::System => "System",
            ChatSender::User => "User",
            ChatSender::Assistant => "Assistant",
        }
    }

    fn from_role(role: &str) -> Self {
        match role {
            "system" => ChatSender::System,
            "assistant" => ChatSender::Assistant,
            _ => ChatSender::User,
        }
    }
}

/// Persistence for chat history
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn create_session(&self, session_id: &str, created_at: DateTime<Utc>) -> Result<()>;

    async fn append_message(
        &self,
        session_id: &str,
        sender: ChatSender,
        content: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<()>;
}

#[async_trait]
impl HistoryStore for Database {
    async fn create_session(&self, session_id: &str, created_at: DateTime<Utc>) -> Result<()> {
        self.create_chat_session(session_id, created_at)?;
        Ok(())
    }

    async fn append_message(
        &self,
        session_id: &str,
        sender: ChatSender,
        content: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        self.append_chat_message(session_id, sender.as_str(), content, Some(timestamp))?;
        Ok(())
    }
}

/// Writes history when enabled. Write failures are logged and swallowed.
#[derive(Clone, Default)]
pub struct ChatHistory {
    store: Option<Arc<dyn HistoryStore>>,
}

impl ChatHistory {
    pub fn new(store: Arc<dyn HistoryStore>, enabled: bool) -> Self {
        Self {
            store: enabled.then_some(store),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Store an extraction exchange: system prompt, each user part, then
    /// the raw response
    pub async fn record_extraction(&self, session_id: &str, messages: &[ChatMessage], response: &str) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = write_extraction(store.as_ref(), session_id, messages, response).await {
            tracing::warn!("Failed to save chat history for session {}: {}", session_id, e);
        }
    }

    /// Store the query-building prompt and the query it produced
    pub async fn record_nlp(&self, session_id: &str, prompt: &str, query: &str) {
        let Some(store) = &self.store else {
            return;
        };
        let result = async {
            store.create_session(session_id, Utc::now()).await?;
            store
                .append_message(session_id, ChatSender::System, prompt, Utc::now())
                .await?;
            store
                .append_message(session_id, ChatSender::Assistant, query, Utc::now())
                .await
        }
        .await;
        if let Err(e) = result {
            tracing::warn!("Failed to save NLP history for session {}: {}", session_id, e);
        }
    }
}

async fn write_extraction(
    store: &dyn HistoryStore,
    session_id: &str,
    messages: &[ChatMessage],
    response: &str,
) -> Result<()> {
    store.create_session(session_id, Utc::now()).await?;

    for message in messages {
        let sender = ChatSender::from_role(&message.role);
        match &message.content {
            MessageContent::Text(text) => {
                store.append_message(session_id, sender, text, Utc::now()).await?;
            }
            MessageContent::Parts(parts) => {
                for part in parts {
                    let content = match part {
                        ContentPart::Text { text } => text.as_str(),
                        ContentPart::ImageUrl { image_url } => image_url.url.as_str(),
                    };
                    store.append_message(session_id, sender, content, Utc::now()).await?;
                }
            }
        }
    }

    store
        .append_message(session_id, ChatSender::Assistant, response, Utc::now())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EquiclassError;
    use crate::llm::ImageDetail;

    fn db() -> Arc<Database> {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        Arc::new(db)
    }

    fn exchange() -> Vec<ChatMessage> {
        vec![
            ChatMessage::system("extract"),
            ChatMessage::user_parts(vec![
                ContentPart::text("look"),
                ContentPart::image("https://blob/a.jpg", ImageDetail::High),
                ContentPart::image("https://blob/b.jpg", ImageDetail::High),
            ]),
        ]
    }

    #[tokio::test]
    async fn test_records_one_message_per_part() {
        let db = db();
        let history = ChatHistory::new(db.clone(), true);

        history.record_extraction("s-1", &exchange(), "{}").await;
        history.record_nlp("s-1", "nlp prompt", "+\"Pro V1\"").await;

        let session = db.get_chat_session("s-1").unwrap().unwrap();
        let senders: Vec<&str> = session.messages.iter().map(|m| m.sender.as_str()).collect();
        assert_eq!(
            senders,
            vec!["System", "User", "User", "User", "Assistant", "System", "Assistant"]
        );
        assert_eq!(session.messages[2].message_content, "https://blob/a.jpg");
        assert_eq!(session.messages[4].message_content, "{}");
    }

    #[tokio::test]
    async fn test_disabled_writes_nothing() {
        let db = db();
        let history = ChatHistory::new(db.clone(), false);
        assert!(!history.is_enabled());

        history.record_extraction("s-1", &exchange(), "{}").await;
        assert!(db.get_chat_session("s-1").unwrap().is_none());
    }

    struct BrokenStore;

    #[async_trait]
    impl HistoryStore for BrokenStore {
        async fn create_session(&self, _: &str, _: DateTime<Utc>) -> Result<()> {
            Err(EquiclassError::ExternalError("offline".into()))
        }

        async fn append_message(&self, _: &str, _: ChatSender, _: &str, _: DateTime<Utc>) -> Result<()> {
            Err(EquiclassError::ExternalError("offline".into()))
        }
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let history = ChatHistory::new(Arc::new(BrokenStore), true);
        history.record_extraction("s-1", &exchange(), "{}").await;
        history.record_nlp("s-1", "p", "q").await;
    }
}
