//! Configuration management

use crate::error::{EquiclassError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Chat and embedding service
    #[serde(default)]
    pub llm: LLMServiceConfig,

    /// Managed semantic/vector search index
    #[serde(default)]
    pub search: SearchServiceConfig,

    /// Image blob storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Relational store (equipment catalog and chat history)
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Classification pipeline tuning
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// LLM service configuration for chat completions and embeddings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMServiceConfig {
    /// Base URL of the LLM service
    pub url: String,

    /// Chat model name (Azure: deployment name)
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Embedding model name (Azure: deployment name)
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// API key (Bearer token, or `api-key` header for Azure)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Azure OpenAI API version; when set, Azure deployment URLs are used
    #[serde(default)]
    pub api_version: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Sampling temperature for extraction and query calls
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum output tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl LLMServiceConfig {
    pub fn is_azure(&self) -> bool {
        self.api_version.is_some()
    }
}

impl Default for LLMServiceConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("EQUICLASS_LLM_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            model: default_chat_model(),
            embedding_model: default_embedding_model(),
            api_key: std::env::var("EQUICLASS_LLM_API_KEY").ok(),
            api_version: std::env::var("EQUICLASS_LLM_API_VERSION").ok(),
            timeout_secs: default_timeout(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_chat_model() -> String {
    std::env::var("EQUICLASS_LLM_MODEL").unwrap_or_else(|_| "gpt-4o".to_string())
}

fn default_embedding_model() -> String {
    std::env::var("EQUICLASS_EMBEDDING_MODEL")
        .unwrap_or_else(|_| "text-embedding-3-small".to_string())
}

fn default_timeout() -> u64 {
    60
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    800
}

/// Search service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchServiceConfig {
    /// Search service endpoint, e.g. `https://<name>.search.windows.net`
    pub endpoint: String,

    /// Admin key (`api-key` header)
    #[serde(default)]
    pub admin_key: Option<String>,

    #[serde(default = "default_index_name")]
    pub index_name: String,

    #[serde(default = "default_search_api_version")]
    pub api_version: String,

    #[serde(default = "default_semantic_config")]
    pub semantic_configuration: String,

    #[serde(default)]
    pub vector: VectorIndexConfig,
}

impl Default for SearchServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: std::env::var("EQUICLASS_SEARCH_URL").unwrap_or_default(),
            admin_key: std::env::var("EQUICLASS_SEARCH_KEY").ok(),
            index_name: default_index_name(),
            api_version: default_search_api_version(),
            semantic_configuration: default_semantic_config(),
            vector: VectorIndexConfig::default(),
        }
    }
}

fn default_index_name() -> String {
    std::env::var("EQUICLASS_SEARCH_INDEX").unwrap_or_else(|_| "golf-balls".to_string())
}

fn default_search_api_version() -> String {
    "2024-07-01".to_string()
}

fn default_semantic_config() -> String {
    "golf-semantic-config".to_string()
}

/// Vector search parameters baked into the index definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndexConfig {
    pub profile: String,
    pub algorithm: String,
    pub vectorizer: String,
    pub m: u32,
    pub ef_construction: u32,
    pub ef_search: u32,
    pub metric: String,
    /// Embedding dimensions of `vectorContent`
    pub dimensions: usize,
    /// Azure OpenAI resource used by the index-side vectorizer
    #[serde(default)]
    pub vectorizer_resource_uri: Option<String>,
    #[serde(default)]
    pub vectorizer_deployment: Option<String>,
    #[serde(default)]
    pub vectorizer_api_key: Option<String>,
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            profile: "golf-vector-profile".to_string(),
            algorithm: "golfHnsw".to_string(),
            vectorizer: "golfOpenAIVectorizer".to_string(),
            m: 4,
            ef_construction: 400,
            ef_search: 500,
            metric: "cosine".to_string(),
            dimensions: std::env::var("EQUICLASS_EMBEDDING_DIMS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1536),
            vectorizer_resource_uri: std::env::var("EQUICLASS_VECTORIZER_URL").ok(),
            vectorizer_deployment: None,
            vectorizer_api_key: None,
        }
    }
}

/// Which blob storage backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    AzureBlob,
    Local,
}

/// Blob storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackend,

    /// Storage account name (azure_blob)
    #[serde(default)]
    pub account: Option<String>,

    /// Base64 account key used to sign SAS tokens (azure_blob)
    #[serde(default)]
    pub account_key: Option<String>,

    /// Blob endpoint override; defaults to `https://<account>.blob.core.windows.net`
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_container")]
    pub container: String,

    /// Root directory (local)
    #[serde(default = "default_local_root")]
    pub local_root: PathBuf,

    /// Lifetime of temporary read URLs in minutes
    #[serde(default = "default_read_url_ttl")]
    pub read_url_ttl_minutes: u64,
}

impl StorageConfig {
    pub fn read_url_ttl(&self) -> Duration {
        Duration::from_secs(self.read_url_ttl_minutes.saturating_mul(60))
    }

    pub fn blob_endpoint(&self) -> Option<String> {
        self.endpoint.clone().or_else(|| {
            self.account
                .as_ref()
                .map(|a| format!("https://{}.blob.core.windows.net", a))
        })
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let account = std::env::var("EQUICLASS_STORAGE_ACCOUNT").ok();
        Self {
            backend: if account.is_some() {
                StorageBackend::AzureBlob
            } else {
                default_storage_backend()
            },
            account,
            account_key: std::env::var("EQUICLASS_STORAGE_KEY").ok(),
            endpoint: None,
            container: default_container(),
            local_root: default_local_root(),
            read_url_ttl_minutes: default_read_url_ttl(),
        }
    }
}

fn default_storage_backend() -> StorageBackend {
    StorageBackend::Local
}

fn default_container() -> String {
    "images".to_string()
}

fn default_local_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(crate::CACHE_DIR_NAME)
        .join("images")
}

/// Upper bound for configured lifetimes (one week)
pub const MAX_TTL_MINUTES: u64 = 7 * 24 * 60;

fn default_read_url_ttl() -> u64 {
    10
}

/// Relational store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: std::env::var("EQUICLASS_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|_| crate::Database::default_path()),
        }
    }
}

/// Pipeline tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Hits scoring below this reranker score are dropped
    #[serde(default = "default_min_reranker_score")]
    pub min_reranker_score: f64,

    /// Number of results requested from the index
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Nearest neighbours considered by the vector query
    #[serde(default = "default_k_nearest")]
    pub k_nearest: usize,

    #[serde(default = "default_manufacturer_cache_minutes")]
    pub manufacturer_cache_minutes: u64,

    /// Persist prompts and responses to chat history
    #[serde(default)]
    pub enable_chat_history: bool,
}

impl PipelineConfig {
    pub fn manufacturer_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.manufacturer_cache_minutes.saturating_mul(60))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_reranker_score: default_min_reranker_score(),
            top_k: default_top_k(),
            k_nearest: default_k_nearest(),
            manufacturer_cache_minutes: default_manufacturer_cache_minutes(),
            enable_chat_history: std::env::var("EQUICLASS_CHAT_HISTORY")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

fn default_min_reranker_score() -> f64 {
    2.0
}

fn default_top_k() -> usize {
    5
}

fn default_k_nearest() -> usize {
    10
}

fn default_manufacturer_cache_minutes() -> u64 {
    120
}

impl Config {
    /// Load config from `EQUICLASS_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        let path = std::env::var("EQUICLASS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path());
        Self::load_from(&path)
    }

    /// Load config from a specific path; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            Ok(config)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    /// Save config to a path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Reject values no collaborator can work with
    pub fn validate(&self) -> Result<()> {
        if self.llm.url.trim().is_empty() {
            return Err(EquiclassError::Config("llm.url must not be empty".into()));
        }
        if self.llm.max_tokens == 0 {
            return Err(EquiclassError::Config("llm.max_tokens must be positive".into()));
        }
        if self.pipeline.top_k == 0 {
            return Err(EquiclassError::Config("pipeline.top_k must be positive".into()));
        }
        if self.pipeline.k_nearest == 0 {
            return Err(EquiclassError::Config(
                "pipeline.k_nearest must be positive".into(),
            ));
        }
        if !(1..=MAX_TTL_MINUTES).contains(&self.pipeline.manufacturer_cache_minutes) {
            return Err(EquiclassError::Config(format!(
                "pipeline.manufacturer_cache_minutes must be between 1 and {}",
                MAX_TTL_MINUTES
            )));
        }
        if !(1..=MAX_TTL_MINUTES).contains(&self.storage.read_url_ttl_minutes) {
            return Err(EquiclassError::Config(format!(
                "storage.read_url_ttl_minutes must be between 1 and {}",
                MAX_TTL_MINUTES
            )));
        }
        if self.storage.backend == StorageBackend::AzureBlob {
            if self.storage.blob_endpoint().is_none() {
                return Err(EquiclassError::Config(
                    "storage.account or storage.endpoint is required for azure_blob".into(),
                ));
            }
            if self.storage.account.is_none() || self.storage.account_key.is_none() {
                return Err(EquiclassError::Config(
                    "storage.account and storage.account_key are required for azure_blob".into(),
                ));
            }
        }
        Ok(())
    }

    /// Validation for commands that talk to the search index
    pub fn validate_search(&self) -> Result<()> {
        if self.search.endpoint.trim().is_empty() {
            return Err(EquiclassError::Config("search.endpoint must not be empty".into()));
        }
        if self.search.index_name.trim().is_empty() {
            return Err(EquiclassError::Config(
                "search.index_name must not be empty".into(),
            ));
        }
        Ok(())
    }
}
