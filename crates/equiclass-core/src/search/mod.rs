//! Search collaborator
//!
//! Provides:
//! - the `SearchIndex` trait over a managed semantic/vector index
//! - an Azure AI Search REST implementation
//! - index population from the equipment catalog

mod azure;
mod index_schema;
mod indexer;

pub use azure::AzureSearchIndex;
pub use index_schema::{index_definition, SELECT_FIELDS};
pub use indexer::Indexer;

use crate::db::GolfBall;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One search call
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Natural-language query text
    pub query_text: String,
    /// Filter expression (`colour eq 'white' and manufacturer eq 'Titleist'`)
    pub filter: String,
    /// Number of results requested
    pub top_k: usize,
    /// Nearest neighbours considered by the vector query
    pub k_nearest: usize,
}

/// A ranked equipment record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub manufacturer: Option<String>,
    pub usga_lot_num: Option<String>,
    pub pole_marking: Option<String>,
    pub colour: Option<String>,
    pub const_code: Option<String>,
    pub ball_specs: Option<String>,
    pub dimples: Option<String>,
    pub spin: Option<String>,
    pub pole_2: Option<String>,
    pub seam_marking: Option<String>,
    pub image_url: Option<String>,
    /// Relevance from the first-stage (BM25 + vector) ranking
    pub score: f64,
    /// Relevance from the semantic ranker
    pub reranker_score: Option<f64>,
}

impl SearchHit {
    /// True when the semantic reranker scored this hit at or above `minimum`.
    /// Hits the reranker did not score never qualify.
    pub fn meets_reranker_score(&self, minimum: f64) -> bool {
        self.reranker_score.is_some_and(|score| score >= minimum)
    }
}

/// Keep only hits whose reranker score meets `minimum`
pub fn retain_qualifying(hits: Vec<SearchHit>, minimum: f64) -> Vec<SearchHit> {
    hits.into_iter()
        .filter(|hit| hit.meets_reranker_score(minimum))
        .collect()
}

/// Document pushed to the index
#[derive(Debug, Clone, Serialize)]
pub struct IndexDocument {
    #[serde(rename = "@search.action")]
    pub action: &'static str,
    pub id: String,
    pub manufacturer: String,
    pub usga_lot_num: String,
    pub pole_marking: String,
    pub colour: String,
    #[serde(rename = "constCode")]
    pub const_code: String,
    #[serde(rename = "ballSpecs")]
    pub ball_specs: String,
    pub dimples: Option<i32>,
    pub spin: String,
    pub pole_2: String,
    pub seam_marking: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "vectorContent")]
    pub vector_content: Vec<f32>,
}

impl IndexDocument {
    pub fn from_ball(ball: &GolfBall, vector_content: Vec<f32>) -> Self {
        let id = if ball.id.trim().is_empty() {
            ball.derived_id()
        } else {
            ball.id.clone()
        };

        Self {
            action: "mergeOrUpload",
            id,
            manufacturer: ball.manufacturer.clone(),
            usga_lot_num: ball.usga_lot_num.clone(),
            pole_marking: ball.pole_marking.clone(),
            colour: ball.colour.to_lowercase(),
            const_code: ball.const_code.clone(),
            ball_specs: ball.ball_specs.clone(),
            dimples: ball.dimples.trim().parse().ok(),
            spin: ball.spin.clone(),
            pole_2: ball.pole_2.clone(),
            seam_marking: ball.seam_marking.clone(),
            image_url: ball.image_url.clone(),
            vector_content,
        }
    }
}

/// Managed search index
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Run a semantic + vector query
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>>;

    /// Create the index, or update its definition in place
    async fn create_or_update_index(&self) -> Result<()>;

    /// Drop the index; a missing index is not an error
    async fn delete_index(&self) -> Result<()>;

    /// Upsert documents; returns how many the service accepted
    async fn upload_documents(&self, documents: &[IndexDocument]) -> Result<usize>;
}
