//! Equiclass Core Library
//!
//! Identifies golf balls from photographs.
//!
//! # Features
//! - Image upload to blob storage with time-limited read URLs
//! - Multi-pass vision LLM extraction with a consolidating pass
//! - Natural-language query and filter generation
//! - Semantic + vector search with reranker score thresholding
//! - SQLite equipment catalog and optional chat history

pub mod classify;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod search;
pub mod storage;

pub use classify::{
    ClassificationResponse, Classifier, Collaborators, ExtractionRecord, ImageUpload, SearchQuery,
};
pub use config::{Config, LLMServiceConfig, PipelineConfig, SearchServiceConfig, StorageConfig};
pub use db::{ChatSessionRecord, Database, GolfBall};
pub use error::{EquiclassError, Error, Result};
pub use llm::{HttpLLMClient, LLMClient, MetricsSnapshot};
pub use search::{AzureSearchIndex, Indexer, SearchHit, SearchIndex};
pub use storage::BlobStore;

/// Default data directory name
pub const CACHE_DIR_NAME: &str = "equiclass";

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "equiclass";
