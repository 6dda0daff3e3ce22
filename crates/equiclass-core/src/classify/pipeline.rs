//! Request-level orchestration: upload, extract, query, search, retry once

use super::consolidate::Consolidator;
use super::extractor::ImageExtractor;
use super::history::{ChatHistory, HistoryStore};
use super::manufacturers::{ManufacturerCache, ManufacturerSource};
use super::query_builder::QueryBuilder;
use super::record::ClassificationResponse;
use super::session::resolve_session_id;
use crate::config::{Config, PipelineConfig};
use crate::db::Database;
use crate::error::{EquiclassError, Result};
use crate::llm::{CompletionOptions, HttpLLMClient, LLMClient};
use crate::search::{retain_qualifying, AzureSearchIndex, SearchIndex, SearchRequest};
use crate::storage::{self, blob_path, content_type_for, BlobStore};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// First pass plus at most one retry when nothing qualifies
pub const MAX_PASSES: usize = 2;

/// One image as received from the caller
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            EquiclassError::InvalidInput(format!("Cannot read image {}: {}", path.display(), e))
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self { file_name, bytes })
    }
}

/// External services the classifier talks to
pub struct Collaborators {
    pub llm: Arc<dyn LLMClient>,
    pub manufacturers: Arc<dyn ManufacturerSource>,
    pub storage: Arc<dyn BlobStore>,
    pub search: Arc<dyn SearchIndex>,
    pub history: Arc<dyn HistoryStore>,
}

impl Collaborators {
    /// HTTP LLM client, configured storage backend, Azure AI Search, and
    /// the SQLite database for manufacturers and history
    pub fn from_config(config: &Config, db: Arc<Database>) -> Result<Self> {
        Ok(Self {
            llm: Arc::new(HttpLLMClient::new(config.llm.clone())?),
            manufacturers: db.clone(),
            storage: storage::from_config(&config.storage)?,
            search: Arc::new(AzureSearchIndex::new(config.search.clone())?),
            history: db,
        })
    }
}

pub struct Classifier {
    storage: Arc<dyn BlobStore>,
    search: Arc<dyn SearchIndex>,
    consolidator: Consolidator,
    query_builder: QueryBuilder,
    pipeline: PipelineConfig,
    read_url_ttl: Duration,
}

impl Classifier {
    pub fn new(collaborators: Collaborators, config: &Config) -> Self {
        let Collaborators {
            llm,
            manufacturers,
            storage,
            search,
            history,
        } = collaborators;

        let history = ChatHistory::new(history, config.pipeline.enable_chat_history);
        let options = CompletionOptions::from_config(&config.llm);
        let cache = Arc::new(ManufacturerCache::new(
            manufacturers,
            config.pipeline.manufacturer_cache_ttl(),
        ));

        let extractor = ImageExtractor::new(llm.clone(), cache, history.clone(), options.clone());

        Self {
            storage,
            search,
            consolidator: Consolidator::new(extractor),
            query_builder: QueryBuilder::new(llm, history, options),
            pipeline: config.pipeline.clone(),
            read_url_ttl: config.storage.read_url_ttl(),
        }
    }

    pub fn from_config(config: &Config, db: Arc<Database>) -> Result<Self> {
        config.validate()?;
        config.validate_search()?;
        Ok(Self::new(Collaborators::from_config(config, db)?, config))
    }

    /// Classify the ball in `images`.
    ///
    /// An empty image list is rejected with `InvalidInput` before any
    /// upstream call. Any later failure is logged here and returned as
    /// `ClassificationFailed` carrying only the session id.
    pub async fn classify(
        &self,
        session_id: Option<String>,
        images: Vec<ImageUpload>,
    ) -> Result<ClassificationResponse> {
        if images.is_empty() {
            return Err(EquiclassError::InvalidInput("No images supplied".into()));
        }

        let session_id = resolve_session_id(session_id)?;
        tracing::info!(
            "Classifying {} image(s) in session {}",
            images.len(),
            session_id
        );

        match self.run(&session_id, &images).await {
            Ok(response) => Ok(response),
            Err(e) => {
                tracing::error!("Classification failed for session {}: {}", session_id, e);
                Err(EquiclassError::ClassificationFailed { session_id })
            }
        }
    }

    async fn run(&self, session_id: &str, images: &[ImageUpload]) -> Result<ClassificationResponse> {
        let image_urls = self.upload_images(session_id, images).await?;

        let mut pass = 1;
        loop {
            let record = self
                .consolidator
                .extract_and_consolidate(session_id, &image_urls)
                .await;
            let query = self.query_builder.build_query(session_id, &record).await;

            let request = SearchRequest {
                query_text: query.nlp_query.clone(),
                filter: query.filter.clone(),
                top_k: self.pipeline.top_k,
                k_nearest: self.pipeline.k_nearest,
            };
            let hits = self.search.search(&request).await?;
            let total = hits.len();
            let results = retain_qualifying(hits, self.pipeline.min_reranker_score);

            tracing::info!(
                "Pass {}: {}/{} hits at or above reranker score {}",
                pass,
                results.len(),
                total,
                self.pipeline.min_reranker_score
            );

            if !results.is_empty() || pass >= MAX_PASSES {
                return Ok(ClassificationResponse {
                    session_id: session_id.to_string(),
                    results,
                    nlp_query: query.nlp_query,
                    filter: query.filter,
                });
            }

            tracing::info!("No qualifying results, rerunning the pipeline");
            pass += 1;
        }
    }

    async fn upload_images(&self, session_id: &str, images: &[ImageUpload]) -> Result<Vec<String>> {
        let mut urls = Vec::with_capacity(images.len());
        for image in images {
            let path = blob_path(session_id, &image.file_name);
            self.storage
                .upload(&image.bytes, &path, content_type_for(&path))
                .await?;
            urls.push(
                self.storage
                    .temporary_read_url(&path, self.read_url_ttl)
                    .await?,
            );
        }
        Ok(urls)
    }
}
