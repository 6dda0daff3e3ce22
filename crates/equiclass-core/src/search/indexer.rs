//! Push the equipment catalog into the search index

use super::{IndexDocument, SearchIndex};
use crate::db::Database;
use crate::error::{EquiclassError, Result};
use crate::llm::LLMClient;
use futures::stream::{self, StreamExt};
use std::sync::Arc;

const DEFAULT_BATCH_SIZE: usize = 32;
const DEFAULT_CONCURRENT: usize = 4;

pub struct Indexer {
    db: Arc<Database>,
    llm: Arc<dyn LLMClient>,
    index: Arc<dyn SearchIndex>,
    batch_size: usize,
    concurrency: usize,
}

impl Indexer {
    pub fn new(db: Arc<Database>, llm: Arc<dyn LLMClient>, index: Arc<dyn SearchIndex>) -> Self {
        Self {
            db,
            llm,
            index,
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: DEFAULT_CONCURRENT,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Embed every catalog record and upload it. Returns the number of
    /// documents the index accepted.
    pub async fn populate(&self) -> Result<usize> {
        let balls = self.db.get_golf_balls()?;
        if balls.is_empty() {
            tracing::warn!("Catalog is empty, nothing to index");
            return Ok(0);
        }

        let chunks: Vec<_> = balls.chunks(self.batch_size).collect();
        let total_chunks = chunks.len();

        tracing::info!(
            "Indexing {} records in {} batches ({} concurrent)",
            balls.len(),
            total_chunks,
            self.concurrency
        );

        let results: Vec<_> = stream::iter(chunks)
            .enumerate()
            .map(|(idx, chunk)| async move {
                tracing::debug!("Embedding batch {}/{}", idx + 1, total_chunks);
                let texts: Vec<String> = chunk.iter().map(|b| b.embedding_text()).collect();
                let result = self.llm.embed_batch(&texts).await.and_then(|embeddings| {
                    if embeddings.len() != chunk.len() {
                        return Err(EquiclassError::Llm(format!(
                            "Expected {} embeddings, got {}",
                            chunk.len(),
                            embeddings.len()
                        )));
                    }
                    Ok(chunk
                        .iter()
                        .zip(embeddings)
                        .map(|(ball, vector)| IndexDocument::from_ball(ball, vector))
                        .collect::<Vec<_>>())
                });
                (idx, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut sorted_results = results;
        sorted_results.sort_by_key(|(idx, _)| *idx);

        let mut documents = Vec::with_capacity(balls.len());
        for (_, result) in sorted_results {
            documents.extend(result?);
        }

        let accepted = self.index.upload_documents(&documents).await?;
        tracing::info!("Index accepted {}/{} documents", accepted, documents.len());
        Ok(accepted)
    }
}
