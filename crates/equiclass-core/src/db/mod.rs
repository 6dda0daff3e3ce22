//! Database layer for equiclass
//!
//! SQLite storage for:
//! - the golf ball equipment catalog
//! - chat/audit history per session

mod chat;
mod equipment;
mod schema;

pub use chat::{ChatMessageRecord, ChatSessionRecord};
pub use equipment::GolfBall;
pub use schema::Database;
use std::path::PathBuf;

impl Database {
    /// Get the default database path
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CACHE_DIR_NAME)
            .join("equiclass.sqlite")
    }
}
